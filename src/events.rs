// 7.0: every committed mutation produces exactly one event. used for audit trails and
// state reconstruction; failed calls emit nothing because they change nothing.

use crate::risk::RiskParams;
use crate::types::{AccountId, MarketId, OracleId, Price, Quote, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // trade events
    PositionOpened(PositionOpenedEvent),
    PositionClosed(PositionClosedEvent),
    CollateralChanged(CollateralChangedEvent),
    PositionLiquidated(PositionLiquidatedEvent),

    // staking events
    Staked(StakedEvent),
    Unstaked(UnstakedEvent),

    // reward events
    RewardsClaimed(RewardsClaimedEvent),

    // oracle events
    PriceRefreshed(PriceRefreshedEvent),

    // admin events
    MarketAdded(MarketAddedEvent),
    InsuranceSet(InsuranceSetEvent),
    OracleAdded(OracleAddedEvent),
    OracleRemoved(OracleRemovedEvent),
    OracleChanged(OracleChangedEvent),
    RiskChanged(RiskChangedEvent),

    // funding boundary
    Deposit(DepositEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub market_id: MarketId,
    pub account_id: AccountId,
    pub is_long: bool,
    pub notional: Quote,
    pub collateral: Quote,
    pub execution_price: Price,
    pub fee: Quote,
    pub slippage: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub market_id: MarketId,
    pub account_id: AccountId,
    pub close_ratio: Decimal,
    pub execution_price: Price,
    pub realized_pnl: Quote,
    pub returned: Quote,
    pub fee: Quote,
    pub fully_closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralChangedEvent {
    pub market_id: MarketId,
    pub account_id: AccountId,
    pub amount: Quote,
    pub is_add: bool,
    pub new_collateral: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLiquidatedEvent {
    pub market_id: MarketId,
    pub account_id: AccountId,
    pub keeper: AccountId,
    pub margin_ratio: Decimal,
    pub liquidator_fee: Quote,
    pub routed: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakedEvent {
    pub venue: MarketId,
    pub account_id: AccountId,
    pub amount: Quote,
    pub new_tvl: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnstakedEvent {
    pub venue: MarketId,
    pub account_id: AccountId,
    pub amount: Quote,
    pub returned_lp: Quote,
    pub penalty: Quote,
    pub new_tvl: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsClaimedEvent {
    pub account_id: AccountId,
    pub amount: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRefreshedEvent {
    pub oracle_id: OracleId,
    pub price: Price,
    pub keeper: AccountId,
    pub keeper_reward: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAddedEvent {
    pub market_id: MarketId,
    pub asset_oracle: OracleId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceSetEvent {
    pub insurance_id: MarketId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleAddedEvent {
    pub oracle_id: OracleId,
    pub keeper_reward: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRemovedEvent {
    pub oracle_id: OracleId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleChangedEvent {
    pub oracle_id: OracleId,
    pub is_active: bool,
    pub keeper_reward: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskChangedEvent {
    pub params: RiskParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    pub account_id: AccountId,
    pub amount: Quote,
    pub new_balance: Quote,
}
