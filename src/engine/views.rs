//! Read-only projections over committed state.
//!
//! Everything here takes `&self` and assembles wire-shaped rows. The aggregate
//! infos power dashboards; called with the anonymous zero identity they return
//! asset summaries with empty per-account arrays instead of failing.

use super::core::Engine;
use super::results::EngineError;
use crate::fees::{calc_close, calc_fee_and_slippage, CloseQuote, FeeAndSlippage};
use crate::market::{AssetData, MarketInfo};
use crate::oracle::OracleInfo;
use crate::position::Position;
use crate::types::{AccountId, MarketId, Quote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// one position joined with its live pnl and margin figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionData {
    pub market: MarketId,
    pub pnl: Quote,
    pub margin_ratio: Decimal,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingInfo {
    pub asset_data: Vec<AssetData>,
    pub position_data: Vec<PositionData>,
}

// the caller's stake in one venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingData {
    pub asset: MarketId,
    pub total_staked: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingInfo {
    pub asset_data: Vec<AssetData>,
    pub staking_data: Vec<StakingData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsData {
    pub account: AccountId,
    pub rewards_total: Quote,
}

impl Engine {
    pub fn list_oracles(&self) -> Vec<OracleInfo> {
        self.oracles.list()
    }

    pub fn list_markets(&self) -> Vec<MarketInfo> {
        self.markets
            .values()
            .map(|m| MarketInfo {
                created: m.created,
                market: m.id,
            })
            .collect()
    }

    // read-only twin of the open path's projection. identical inputs against
    // identical state yield exactly the numbers execution would apply.
    pub fn quote_fee_and_slippage(
        &self,
        market_id: MarketId,
        notional: Quote,
        is_long: bool,
    ) -> Result<FeeAndSlippage, EngineError> {
        let lp_price = self.lp_price()?;
        let market = self
            .market(market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let oracle_price = self.oracles.price(market.asset_oracle)?;

        Ok(calc_fee_and_slippage(
            market_id,
            market.mark_price,
            oracle_price,
            market.depth(lp_price),
            notional,
            is_long,
            &self.risk,
        ))
    }

    // a missing market and a missing position both report NO_POSITION: either way
    // the caller asked about a position that does not exist.
    pub fn position_view(
        &self,
        account_id: AccountId,
        market_id: MarketId,
    ) -> Result<PositionData, EngineError> {
        let market = self.market(market_id).ok_or(EngineError::NoPosition)?;
        let position = self
            .account(account_id)
            .and_then(|a| a.position(market_id))
            .filter(|p| p.is_active)
            .cloned()
            .ok_or(EngineError::NoPosition)?;

        Ok(PositionData {
            market: market_id,
            pnl: position.pnl(market.mark_price),
            margin_ratio: position.margin_ratio(market.mark_price),
            position,
        })
    }

    // close popup projection; the same quote the mutating close path validates against
    pub fn calc_close_view(
        &self,
        account_id: AccountId,
        market_id: MarketId,
        close_ratio: Decimal,
    ) -> Result<CloseQuote, EngineError> {
        if close_ratio <= Decimal::ZERO || close_ratio > Decimal::ONE {
            return Err(EngineError::BadParams);
        }

        let lp_price = self.lp_price()?;
        let market = self
            .market(market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let oracle_price = self.oracles.price(market.asset_oracle)?;

        let position = self
            .account(account_id)
            .and_then(|a| a.position(market_id))
            .filter(|p| p.is_active)
            .cloned()
            .ok_or(EngineError::NoPosition)?;

        Ok(calc_close(
            &position,
            market.mark_price,
            oracle_price,
            market.depth(lp_price),
            close_ratio,
            &self.risk,
        ))
    }

    // total claimable across both streams of every venue, lazily valued at now
    pub fn calc_rewards(&self, account_id: AccountId) -> RewardsData {
        let now = self.current_time;
        let mut total = Quote::zero();
        for market in self.markets.values() {
            total = total.add(market.rewarder.pending(account_id, now));
        }
        if let Some(ins) = &self.insurance {
            total = total.add(ins.rewarder.pending(account_id, now));
        }

        RewardsData {
            account: account_id,
            rewards_total: total,
        }
    }

    pub fn get_trading_info(&self, account_id: AccountId) -> Result<TradingInfo, EngineError> {
        let asset_data = self.all_asset_data()?;

        let mut position_data = Vec::new();
        if !account_id.is_zero() {
            if let Some(account) = self.account(account_id) {
                for market in self.markets.values() {
                    let Some(position) = account.position(market.id).filter(|p| p.is_active)
                    else {
                        continue;
                    };
                    position_data.push(PositionData {
                        market: market.id,
                        pnl: position.pnl(market.mark_price),
                        margin_ratio: position.margin_ratio(market.mark_price),
                        position: position.clone(),
                    });
                }
            }
        }

        Ok(TradingInfo {
            asset_data,
            position_data,
        })
    }

    pub fn get_staking_info(&self, account_id: AccountId) -> Result<StakingInfo, EngineError> {
        let asset_data = self.all_asset_data()?;

        let mut staking_data = Vec::new();
        if !account_id.is_zero() {
            for market in self.markets.values() {
                let staked = market.pool.staked_of(account_id);
                if !staked.is_zero() {
                    staking_data.push(StakingData {
                        asset: market.id,
                        total_staked: staked,
                    });
                }
            }
            if let Some(ins) = &self.insurance {
                let staked = ins.pool.staked_of(account_id);
                if !staked.is_zero() {
                    staking_data.push(StakingData {
                        asset: ins.id,
                        total_staked: staked,
                    });
                }
            }
        }

        Ok(StakingInfo {
            asset_data,
            staking_data,
        })
    }

    // one dashboard row per venue, markets first then the insurance fund
    fn all_asset_data(&self) -> Result<Vec<AssetData>, EngineError> {
        let lp_price = self.lp_price()?;

        let mut rows = Vec::with_capacity(self.markets.len() + 1);
        for market in self.markets.values() {
            let oracle_price = self.oracles.price(market.asset_oracle)?;
            rows.push(market.asset_data(oracle_price, lp_price));
        }
        if let Some(ins) = &self.insurance {
            let oracle_price = self.oracles.price(ins.asset_oracle)?;
            rows.push(ins.asset_data(oracle_price, lp_price));
        }
        Ok(rows)
    }
}
