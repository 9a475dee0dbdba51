//! Staking entry points. Markets and the insurance fund take stakes through the
//! same path; the venue id picks the pool.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{EventPayload, StakedEvent, UnstakedEvent};
use crate::rewards::RewardStream;
use crate::staking::ProfitParams;
use crate::types::{AccountId, MarketId, Quote};
use rust_decimal::Decimal;

impl Engine {
    // mints pool shares 1:1 with the staked LP amount and raises the venue's TVL
    // in the same call.
    pub fn stake(
        &mut self,
        account_id: AccountId,
        venue_id: MarketId,
        amount: Quote,
    ) -> Result<(), EngineError> {
        if amount.value() <= Decimal::ZERO {
            return Err(EngineError::BadParams);
        }
        let lp_price = self.lp_price()?;
        if self.venue(venue_id).is_none() {
            return Err(EngineError::MarketNotFound(venue_id));
        }

        self.account_mut(account_id)?.debit_staking(amount)?;

        let now = self.current_time;
        let venue = self.venue_mut(venue_id)?;
        venue.pool.stake(account_id, amount, lp_price, now);
        let staked_total = venue.pool.staked_of(account_id);
        venue
            .rewarder
            .set_weight(RewardStream::Staker, account_id, staked_total, now);
        let new_tvl = venue.pool.total_staked;

        self.emit_event(EventPayload::Staked(StakedEvent {
            venue: venue_id,
            account_id,
            amount,
            new_tvl,
        }));
        Ok(())
    }

    // burns shares and settles in one call: TVL drops by exactly the principal
    // removed, the penalty (if the wash window is still open) stays behind in the
    // pool, and the staker gets LP principal back plus any profit share in
    // trading tokens.
    pub fn unstake(
        &mut self,
        account_id: AccountId,
        venue_id: MarketId,
        amount: Quote,
    ) -> Result<ProfitParams, EngineError> {
        if amount.value() <= Decimal::ZERO {
            return Err(EngineError::BadParams);
        }
        let lp_price = self.lp_price()?;
        if !self.accounts.contains_key(&account_id) {
            return Err(EngineError::AccountNotFound(account_id));
        }

        let now = self.current_time;
        let venue = self.venue_mut(venue_id)?;
        let params = venue.pool.unstake(account_id, amount, lp_price, now)?;
        let staked_total = venue.pool.staked_of(account_id);
        venue
            .rewarder
            .set_weight(RewardStream::Staker, account_id, staked_total, now);
        let new_tvl = venue.pool.total_staked;

        let account = self.account_mut(account_id)?;
        account.credit_staking(params.unstake_amount_lp);
        account.credit_trading(params.staking_profit.max(Quote::zero()));

        self.emit_event(EventPayload::Unstaked(UnstakedEvent {
            venue: venue_id,
            account_id,
            amount,
            returned_lp: params.unstake_amount_lp,
            penalty: params.staking_fee,
            new_tvl,
        }));
        Ok(params)
    }

    // pure projection of an unstake, shown before the user commits
    pub fn calc_profit(
        &self,
        account_id: AccountId,
        venue_id: MarketId,
        amount: Quote,
    ) -> Result<ProfitParams, EngineError> {
        let lp_price = self.lp_price()?;
        let venue = self
            .venue(venue_id)
            .ok_or(EngineError::MarketNotFound(venue_id))?;
        Ok(venue
            .pool
            .calc_profit(account_id, amount, lp_price, self.current_time)?)
    }
}
