//! Venue records: trading markets and the insurance fund.
//!
//! Both venue kinds embed the same staking pool and rewarder; a market
//! additionally carries a mark price that trades push around. Venues are
//! created exactly once by an admin action and their id never changes.

use crate::rewards::{RewardParams, Rewarder};
use crate::staking::SlpPool;
use crate::types::{MarketId, OracleId, Price, Quote, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const SECS_PER_YEAR: Decimal = dec!(31536000);

// per-venue creation parameters, fixed for the venue's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueParams {
    pub initial_price: Price,
    pub penalty_period_secs: i64,
    pub penalty_fee: Decimal,
    pub rewards: RewardParams,
}

impl VenueParams {
    // production-like market preset
    pub fn market_defaults() -> Self {
        Self {
            initial_price: Price::new_unchecked(dec!(1.17)),
            penalty_period_secs: 604_800,
            penalty_fee: dec!(0.02),
            rewards: RewardParams {
                rate_trader_per_sec: dec!(0.3944613563),
                rate_staker_per_sec: dec!(0.03944613563),
                wash_time_secs: 150,
                period_length_secs: 2_592_000,
            },
        }
    }

    // the insurance fund streams staker rewards only and skips the wash gate
    pub fn insurance_defaults() -> Self {
        Self {
            initial_price: Price::new_unchecked(dec!(1)),
            penalty_period_secs: 604_800,
            penalty_fee: dec!(0.02),
            rewards: RewardParams {
                rate_trader_per_sec: Decimal::ZERO,
                rate_staker_per_sec: dec!(0.059169),
                wash_time_secs: 0,
                period_length_secs: 0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub created: bool,
    pub is_insurance: bool,
    // prices the venue's reference asset; the LP oracle is registry-wide
    pub asset_oracle: OracleId,
    pub mark_price: Price,
    pub pool: SlpPool,
    pub rewarder: Rewarder,
}

impl Market {
    pub fn new(
        id: MarketId,
        is_insurance: bool,
        asset_oracle: OracleId,
        params: &VenueParams,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            created: true,
            is_insurance,
            asset_oracle,
            mark_price: params.initial_price,
            pool: SlpPool::new(params.penalty_period_secs, params.penalty_fee),
            rewarder: Rewarder::new(params.rewards, now),
        }
    }

    // staked depth valued in trading tokens. the slippage curve saturates against it
    // and it doubles as the max notional figure on dashboards.
    pub fn depth(&self, lp_price: Price) -> Quote {
        self.pool.depth_value(lp_price)
    }

    pub fn asset_data(&self, oracle_price: Price, lp_price: Price) -> AssetData {
        let depth = self.depth(lp_price);
        let apy = if depth.is_zero() {
            Decimal::ZERO
        } else {
            self.rewarder.params.rate_staker_per_sec * SECS_PER_YEAR / depth.value()
        };

        AssetData {
            is_insurance: self.is_insurance,
            asset: self.id,
            market_price: self.mark_price,
            oracle_price,
            max_notional: depth,
            tvl: self.pool.total_staked,
            apy,
        }
    }
}

// dashboard summary row, one per venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetData {
    pub is_insurance: bool,
    pub asset: MarketId,
    pub market_price: Price,
    pub oracle_price: Price,
    pub max_notional: Quote,
    pub tvl: Quote,
    pub apy: Decimal,
}

// registry entry as the view dispatcher reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub created: bool,
    pub market: MarketId,
}
