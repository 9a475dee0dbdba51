// 5.0: SLP pool accounting. shares mint 1:1 with staked principal; the pool also holds a
// trading-token profit pot fed by fee routing and trader losses and drained by trader wins.
// 5.1: the wash/penalty window hangs off an amount-weighted stake timestamp, so topping up
// a stake drags the whole lot's clock forward proportionally instead of resetting it.
// market and insurance venues embed the same pool; only fee routing differs upstream.

use crate::types::{AccountId, Price, Quote, Timestamp};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StakeLot {
    // share balance, 1:1 with principal at mint time
    pub amount: Quote,
    // amount-weighted deposit time; anchors the penalty window
    pub staked_at: Timestamp,
    // amount-weighted LP price at deposit; anchors lp_profit / usdc_loss
    pub entry_lp_price: Price,
}

// unstake projection, original wire shape. also returned by the real unstake so the
// popup quote and the executed numbers cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitParams {
    // share units actually returned after penalty and loss deductions
    pub unstake_amount_lp: Quote,
    // total proceeds valued in trading tokens
    pub unstake_amount_trading: Quote,
    // this stake's share of the pool profit pot (signed)
    pub staking_profit: Quote,
    // penalty value deducted, in trading tokens
    pub staking_fee: Quote,
    // seconds until the penalty window ends, 0 once elapsed
    pub penalty_left_secs: i64,
    // pool-wide staked principal at quote time
    pub total_staked: Quote,
    pub lp_price: Price,
    // value gained from LP price movement since deposit
    pub lp_profit: Quote,
    // value lost from LP price movement since deposit
    pub usdc_loss: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlpPool {
    pub penalty_period_secs: i64,
    pub penalty_fee: Decimal,
    // staked principal in share units. the TVL figure.
    pub total_staked: Quote,
    // trading-token pot. negative when traders are net winners against the pool.
    pub accumulated_profit: Quote,
    stakes: HashMap<AccountId, StakeLot>,
}

impl SlpPool {
    pub fn new(penalty_period_secs: i64, penalty_fee: Decimal) -> Self {
        Self {
            penalty_period_secs,
            penalty_fee,
            total_staked: Quote::zero(),
            accumulated_profit: Quote::zero(),
            stakes: HashMap::new(),
        }
    }

    pub fn staked_of(&self, account: AccountId) -> Quote {
        self.stakes
            .get(&account)
            .map(|lot| lot.amount)
            .unwrap_or_else(Quote::zero)
    }

    pub fn lot(&self, account: AccountId) -> Option<&StakeLot> {
        self.stakes.get(&account)
    }

    // share-value of the pool in trading tokens; the depth the slippage curve sees
    pub fn depth_value(&self, lp_price: Price) -> Quote {
        Quote::new(self.total_staked.value() * lp_price.value())
    }

    // fee routing and trader losses land here
    pub fn absorb(&mut self, amount: Quote) {
        self.accumulated_profit = self.accumulated_profit.add(amount);
    }

    // trader wins come out of here
    pub fn pay_out(&mut self, amount: Quote) {
        self.accumulated_profit = self.accumulated_profit.sub(amount);
    }

    pub fn stake(&mut self, account: AccountId, amount: Quote, lp_price: Price, now: Timestamp) {
        debug_assert!(amount.value() > Decimal::ZERO);

        let lot = match self.stakes.get(&account) {
            None => StakeLot {
                amount,
                staked_at: now,
                entry_lp_price: lp_price,
            },
            Some(existing) => {
                let combined = existing.amount.add(amount);
                let w_old = existing.amount.value() / combined.value();
                let w_new = amount.value() / combined.value();

                let blended_ts = w_old * Decimal::from(existing.staked_at.as_millis())
                    + w_new * Decimal::from(now.as_millis());
                let blended_price = w_old * existing.entry_lp_price.value()
                    + w_new * lp_price.value();

                StakeLot {
                    amount: combined,
                    staked_at: Timestamp::from_millis(
                        blended_ts.round().to_i64().unwrap_or(now.as_millis()),
                    ),
                    entry_lp_price: Price::new_unchecked(blended_price),
                }
            }
        };

        self.stakes.insert(account, lot);
        self.total_staked = self.total_staked.add(amount);
    }

    pub fn calc_profit(
        &self,
        account: AccountId,
        amount: Quote,
        lp_price: Price,
        now: Timestamp,
    ) -> Result<ProfitParams, StakingError> {
        let lot = self.stakes.get(&account).ok_or(StakingError::NoStake(account))?;
        if amount.value() <= Decimal::ZERO || amount > lot.amount {
            return Err(StakingError::InsufficientStake {
                requested: amount,
                available: lot.amount,
            });
        }
        Ok(self.project(lot, amount, lp_price, now))
    }

    // 5.2: burn shares and settle. TVL drops by exactly the principal removed in the same
    // call; the penalty value and any loss-deducted shares convert into the profit pot.
    pub fn unstake(
        &mut self,
        account: AccountId,
        amount: Quote,
        lp_price: Price,
        now: Timestamp,
    ) -> Result<ProfitParams, StakingError> {
        let params = self.calc_profit(account, amount, lp_price, now)?;

        let lot = self
            .stakes
            .get_mut(&account)
            .ok_or(StakingError::NoStake(account))?;
        let remaining = lot.amount.sub(amount);
        if remaining.is_zero() {
            self.stakes.remove(&account);
        } else {
            lot.amount = remaining;
        }

        self.total_staked = self.total_staked.sub(amount);
        self.accumulated_profit = self.accumulated_profit.sub(params.staking_profit);
        // penalty shares and loss-deducted shares stay behind as pot value
        let retained_lp = amount.sub(params.unstake_amount_lp);
        self.accumulated_profit = self
            .accumulated_profit
            .add(retained_lp.mul(lp_price.value()));

        Ok(params)
    }

    fn project(
        &self,
        lot: &StakeLot,
        amount: Quote,
        lp_price: Price,
        now: Timestamp,
    ) -> ProfitParams {
        let penalty_end = lot.staked_at.plus_secs(self.penalty_period_secs);
        let penalty_left_ms = (penalty_end.as_millis() - now.as_millis()).max(0);
        let penalty_left_secs = penalty_left_ms / 1000;

        let penalty_lp = if penalty_left_ms > 0 {
            amount.mul(self.penalty_fee)
        } else {
            Quote::zero()
        };

        let share = if self.total_staked.is_zero() {
            Decimal::ZERO
        } else {
            amount.value() / self.total_staked.value()
        };
        let staking_profit = self.accumulated_profit.mul(share);

        let mut lp_out = amount.sub(penalty_lp);
        if staking_profit.is_negative() {
            // pool is in deficit; the staker's share of it comes out of their principal
            let owed_lp = Quote::new(staking_profit.value().abs() / lp_price.value());
            lp_out = lp_out.sub(owed_lp.min(lp_out)).max(Quote::zero());
        }

        let price_move = lp_price.value() - lot.entry_lp_price.value();
        let lp_profit = Quote::new((price_move * amount.value()).max(Decimal::ZERO));
        let usdc_loss = Quote::new((-price_move * amount.value()).max(Decimal::ZERO));

        let paid_profit = staking_profit.max(Quote::zero());
        let unstake_amount_trading = lp_out.mul(lp_price.value()).add(paid_profit);

        ProfitParams {
            unstake_amount_lp: lp_out,
            unstake_amount_trading,
            staking_profit,
            staking_fee: penalty_lp.mul(lp_price.value()),
            penalty_left_secs,
            total_staked: self.total_staked,
            lp_price,
            lp_profit,
            usdc_loss,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StakingError {
    #[error("NO_STAKE: {0:?}")]
    NoStake(AccountId),

    #[error("INSUFFICIENT_STAKE: requested {requested}, available {available}")]
    InsufficientStake { requested: Quote, available: Quote },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const WEEK_SECS: i64 = 604_800;

    fn pool() -> SlpPool {
        SlpPool::new(WEEK_SECS, dec!(0.02))
    }

    fn par() -> Price {
        Price::new_unchecked(dec!(1))
    }

    #[test]
    fn stake_mints_one_to_one() {
        let mut p = pool();
        p.stake(AccountId(1), Quote::new(dec!(100)), par(), Timestamp::from_millis(0));

        assert_eq!(p.staked_of(AccountId(1)).value(), dec!(100));
        assert_eq!(p.total_staked.value(), dec!(100));
    }

    #[test]
    fn topup_blends_timestamp_by_amount() {
        let mut p = pool();
        p.stake(AccountId(1), Quote::new(dec!(100)), par(), Timestamp::from_millis(0));
        p.stake(
            AccountId(1),
            Quote::new(dec!(300)),
            par(),
            Timestamp::from_millis(40_000),
        );

        let lot = p.lot(AccountId(1)).unwrap();
        assert_eq!(lot.amount.value(), dec!(400));
        // 0.25 * 0 + 0.75 * 40000
        assert_eq!(lot.staked_at.as_millis(), 30_000);
    }

    #[test]
    fn early_unstake_pays_penalty_and_drops_tvl_by_principal() {
        let mut p = pool();
        let t0 = Timestamp::from_millis(0);
        p.stake(AccountId(1), Quote::new(dec!(100)), par(), t0);

        let params = p
            .unstake(AccountId(1), Quote::new(dec!(100)), par(), t0.plus_secs(60))
            .unwrap();

        assert_eq!(params.unstake_amount_lp.value(), dec!(98));
        assert_eq!(params.staking_fee.value(), dec!(2));
        assert!(params.penalty_left_secs > 0);
        assert_eq!(p.total_staked.value(), dec!(0));
        // the penalty value stays behind as pool profit
        assert_eq!(p.accumulated_profit.value(), dec!(2));
    }

    #[test]
    fn unstake_after_window_has_no_penalty() {
        let mut p = pool();
        let t0 = Timestamp::from_millis(0);
        p.stake(AccountId(1), Quote::new(dec!(100)), par(), t0);

        let params = p
            .unstake(
                AccountId(1),
                Quote::new(dec!(100)),
                par(),
                t0.plus_secs(WEEK_SECS + 1),
            )
            .unwrap();

        assert_eq!(params.unstake_amount_lp.value(), dec!(100));
        assert_eq!(params.staking_fee.value(), dec!(0));
        assert_eq!(params.penalty_left_secs, 0);
    }

    #[test]
    fn profit_pot_shares_proportionally() {
        let mut p = pool();
        let t0 = Timestamp::from_millis(0);
        p.stake(AccountId(1), Quote::new(dec!(100)), par(), t0);
        p.stake(AccountId(2), Quote::new(dec!(300)), par(), t0);
        p.absorb(Quote::new(dec!(40)));

        let late = t0.plus_secs(WEEK_SECS + 1);
        let params = p
            .calc_profit(AccountId(1), Quote::new(dec!(100)), par(), late)
            .unwrap();

        // 100 / 400 of the 40 pot
        assert_eq!(params.staking_profit.value(), dec!(10));
        assert_eq!(params.unstake_amount_trading.value(), dec!(110));
    }

    #[test]
    fn deficit_comes_out_of_principal() {
        let mut p = pool();
        let t0 = Timestamp::from_millis(0);
        p.stake(AccountId(1), Quote::new(dec!(100)), par(), t0);
        p.pay_out(Quote::new(dec!(30))); // traders won 30

        let late = t0.plus_secs(WEEK_SECS + 1);
        let params = p
            .unstake(AccountId(1), Quote::new(dec!(100)), par(), late)
            .unwrap();

        assert_eq!(params.staking_profit.value(), dec!(-30));
        assert_eq!(params.unstake_amount_lp.value(), dec!(70));
        // pot settles back to zero once the loss is realized
        assert_eq!(p.accumulated_profit.value(), dec!(0));
    }

    #[test]
    fn lp_price_move_reported_both_ways() {
        let mut p = pool();
        let t0 = Timestamp::from_millis(0);
        p.stake(AccountId(1), Quote::new(dec!(100)), par(), t0);

        let late = t0.plus_secs(WEEK_SECS + 1);
        let up = p
            .calc_profit(
                AccountId(1),
                Quote::new(dec!(100)),
                Price::new_unchecked(dec!(1.2)),
                late,
            )
            .unwrap();
        assert_eq!(up.lp_profit.value(), dec!(20));
        assert_eq!(up.usdc_loss.value(), dec!(0));

        let down = p
            .calc_profit(
                AccountId(1),
                Quote::new(dec!(100)),
                Price::new_unchecked(dec!(0.9)),
                late,
            )
            .unwrap();
        assert_eq!(down.lp_profit.value(), dec!(0));
        assert_eq!(down.usdc_loss.value(), dec!(10));
    }

    #[test]
    fn unstake_more_than_staked_fails() {
        let mut p = pool();
        p.stake(AccountId(1), Quote::new(dec!(100)), par(), Timestamp::from_millis(0));

        let result = p.unstake(
            AccountId(1),
            Quote::new(dec!(101)),
            par(),
            Timestamp::from_millis(0),
        );
        assert!(matches!(
            result,
            Err(StakingError::InsufficientStake { .. })
        ));
    }

    #[test]
    fn calc_profit_is_a_pure_projection() {
        let mut p = pool();
        let t0 = Timestamp::from_millis(0);
        p.stake(AccountId(1), Quote::new(dec!(100)), par(), t0);

        let before_tvl = p.total_staked;
        let _ = p.calc_profit(AccountId(1), Quote::new(dec!(50)), par(), t0).unwrap();
        assert_eq!(p.total_staked, before_tvl);
        assert_eq!(p.staked_of(AccountId(1)).value(), dec!(100));
    }
}
