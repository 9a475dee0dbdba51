//! Typed action dispatch: three closed request enums routed through one match
//! each. View dispatch never mutates; state dispatch touches caller-scoped
//! state only; every admin kind checks the caller identity before anything
//! else and leaves the registry untouched on failure. The opaque byte
//! boundary that feeds these lives in `wire.rs`.

use super::core::Engine;
use super::results::EngineError;
use super::views::{PositionData, RewardsData};
use crate::events::{
    EventPayload, InsuranceSetEvent, MarketAddedEvent, OracleAddedEvent, OracleChangedEvent,
    OracleRemovedEvent, RewardsClaimedEvent, RiskChangedEvent,
};
use crate::fees::{CloseQuote, FeeAndSlippage};
use crate::market::{Market, MarketInfo, VenueParams};
use crate::oracle::{OracleConfig, OracleError, OracleInfo};
use crate::risk::RiskParams;
use crate::types::{AccountId, MarketId, OracleId, Quote};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub enum ViewAction {
    GetOracles,
    GetMarkets,
    CalcFeeAndSlippage {
        market: MarketId,
        notional: Quote,
        is_long: bool,
    },
    GetPosition {
        market: MarketId,
        account: AccountId,
    },
    CalcClose {
        market: MarketId,
        account: AccountId,
        close_ratio: Decimal,
    },
    CalcRewards {
        account: AccountId,
    },
}

#[derive(Debug, Clone)]
pub enum ViewResponse {
    Oracles(Vec<OracleInfo>),
    Markets(Vec<MarketInfo>),
    FeeAndSlippage(FeeAndSlippage),
    Position(PositionData),
    Close(CloseQuote),
    Rewards(RewardsData),
}

#[derive(Debug, Clone)]
pub enum StateAction {
    ClaimRewards { account: AccountId },
}

#[derive(Debug, Clone)]
pub enum StateResponse {
    RewardsClaimed { account: AccountId, amount: Quote },
}

#[derive(Debug, Clone)]
pub enum AdminAction {
    AddMarket {
        asset_oracle: OracleId,
        params: VenueParams,
    },
    AddOracle {
        config: OracleConfig,
    },
    RemoveOracle {
        oracle: OracleId,
    },
    ChangeOracle {
        oracle: OracleId,
        config: OracleConfig,
    },
    SetInsurance {
        params: VenueParams,
    },
    ChangeRisk {
        params: RiskParams,
    },
}

#[derive(Debug, Clone)]
pub enum AdminResponse {
    MarketAdded { market: MarketId },
    OracleAdded { oracle: OracleId },
    OracleRemoved { oracle: OracleId },
    OracleChanged { oracle: OracleId },
    InsuranceSet { venue: MarketId },
    RiskChanged,
}

impl Engine {
    pub fn dispatch_view(&self, action: ViewAction) -> Result<ViewResponse, EngineError> {
        match action {
            ViewAction::GetOracles => Ok(ViewResponse::Oracles(self.list_oracles())),
            ViewAction::GetMarkets => Ok(ViewResponse::Markets(self.list_markets())),
            ViewAction::CalcFeeAndSlippage {
                market,
                notional,
                is_long,
            } => self
                .quote_fee_and_slippage(market, notional, is_long)
                .map(ViewResponse::FeeAndSlippage),
            ViewAction::GetPosition { market, account } => {
                self.position_view(account, market).map(ViewResponse::Position)
            }
            ViewAction::CalcClose {
                market,
                account,
                close_ratio,
            } => self
                .calc_close_view(account, market, close_ratio)
                .map(ViewResponse::Close),
            ViewAction::CalcRewards { account } => {
                Ok(ViewResponse::Rewards(self.calc_rewards(account)))
            }
        }
    }

    pub fn dispatch_state(&mut self, action: StateAction) -> Result<StateResponse, EngineError> {
        match action {
            StateAction::ClaimRewards { account } => {
                let amount = self.claim_rewards(account);
                Ok(StateResponse::RewardsClaimed { account, amount })
            }
        }
    }

    pub fn dispatch_admin(
        &mut self,
        caller: AccountId,
        action: AdminAction,
    ) -> Result<AdminResponse, EngineError> {
        if caller != self.config.admin {
            return Err(EngineError::Unauthorized);
        }

        match action {
            AdminAction::AddMarket {
                asset_oracle,
                params,
            } => {
                let market = self.add_market(asset_oracle, &params)?;
                Ok(AdminResponse::MarketAdded { market })
            }
            AdminAction::AddOracle { config } => {
                let oracle = self.add_oracle(config);
                Ok(AdminResponse::OracleAdded { oracle })
            }
            AdminAction::RemoveOracle { oracle } => {
                self.remove_oracle(oracle)?;
                Ok(AdminResponse::OracleRemoved { oracle })
            }
            AdminAction::ChangeOracle { oracle, config } => {
                self.change_oracle(oracle, config)?;
                Ok(AdminResponse::OracleChanged { oracle })
            }
            AdminAction::SetInsurance { params } => {
                let venue = self.set_insurance(&params)?;
                Ok(AdminResponse::InsuranceSet { venue })
            }
            AdminAction::ChangeRisk { params } => {
                self.change_risk(params)?;
                Ok(AdminResponse::RiskChanged)
            }
        }
    }

    // drains both reward streams across every venue into the reward balance.
    // claiming again with nothing newly accrued pays zero.
    pub fn claim_rewards(&mut self, account: AccountId) -> Quote {
        let now = self.current_time;

        let mut total = Quote::zero();
        for market in self.markets.values_mut() {
            total = total.add(market.rewarder.claim(account, now));
        }
        if let Some(ins) = &mut self.insurance {
            total = total.add(ins.rewarder.claim(account, now));
        }

        self.ensure_account(account).credit_reward(total);
        self.emit_event(EventPayload::RewardsClaimed(RewardsClaimedEvent {
            account_id: account,
            amount: total,
        }));
        total
    }

    fn add_market(
        &mut self,
        asset_oracle: OracleId,
        params: &VenueParams,
    ) -> Result<MarketId, EngineError> {
        if !self.oracles.contains(asset_oracle) {
            return Err(OracleError::NotFound(asset_oracle).into());
        }

        let id = self.alloc_venue_id();
        let market = Market::new(id, false, asset_oracle, params, self.current_time);
        self.markets.insert(id, market);

        self.emit_event(EventPayload::MarketAdded(MarketAddedEvent {
            market_id: id,
            asset_oracle,
        }));
        Ok(id)
    }

    fn add_oracle(&mut self, config: OracleConfig) -> OracleId {
        let keeper_reward = config.keeper_reward;
        let id = self.oracles.add(config, self.current_time);

        self.emit_event(EventPayload::OracleAdded(OracleAddedEvent {
            oracle_id: id,
            keeper_reward,
        }));
        id
    }

    fn remove_oracle(&mut self, id: OracleId) -> Result<(), EngineError> {
        self.oracles.remove(id)?;
        self.emit_event(EventPayload::OracleRemoved(OracleRemovedEvent {
            oracle_id: id,
        }));
        Ok(())
    }

    fn change_oracle(&mut self, id: OracleId, config: OracleConfig) -> Result<(), EngineError> {
        self.oracles.change(id, config)?;
        self.emit_event(EventPayload::OracleChanged(OracleChangedEvent {
            oracle_id: id,
            is_active: config.is_active,
            keeper_reward: config.keeper_reward,
        }));
        Ok(())
    }

    // the insurance venue is created exactly once; its shares and TVL must not be
    // silently discarded by a repeat call.
    fn set_insurance(&mut self, params: &VenueParams) -> Result<MarketId, EngineError> {
        if let Some(ins) = &self.insurance {
            return Err(EngineError::MarketExists(ins.id));
        }
        let lp_oracle = self.lp_oracle.ok_or(EngineError::BadParams)?;

        let id = self.alloc_venue_id();
        self.insurance = Some(Market::new(id, true, lp_oracle, params, self.current_time));

        self.emit_event(EventPayload::InsuranceSet(InsuranceSetEvent {
            insurance_id: id,
        }));
        Ok(id)
    }

    // whole-table swap: readers never see a half-updated risk table
    fn change_risk(&mut self, params: RiskParams) -> Result<(), EngineError> {
        params.validate()?;
        self.risk = params.clone();
        self.emit_event(EventPayload::RiskChanged(RiskChangedEvent { params }));
        Ok(())
    }
}
