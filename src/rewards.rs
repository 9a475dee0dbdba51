// 6.0: reward distribution. two independent streams per venue (trader-side, staker-side),
// each paying a fixed token rate per second split across eligible participants by weight.
// nothing ticks in the background: accrual is settled lazily at every weight change,
// query, and claim, as rate * elapsed since the last checkpoint.
// 6.1: the wash window. a weight increase only starts counting wash_time after it was
// set, so flash-staking or flash-trading right before a claim earns nothing.

use crate::types::{AccountId, Quote, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardParams {
    pub rate_trader_per_sec: Decimal,
    pub rate_staker_per_sec: Decimal,
    pub wash_time_secs: i64,
    pub period_length_secs: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RewardSlot {
    pub weight: Quote,
    // weight counts toward the split only from here on
    pub eligible_from: Timestamp,
    pub accrued: Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardStream {
    Trader,
    Staker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rewarder {
    pub params: RewardParams,
    trader_slots: HashMap<AccountId, RewardSlot>,
    staker_slots: HashMap<AccountId, RewardSlot>,
    last_checkpoint: Timestamp,
}

impl Rewarder {
    pub fn new(params: RewardParams, now: Timestamp) -> Self {
        Self {
            params,
            trader_slots: HashMap::new(),
            staker_slots: HashMap::new(),
            last_checkpoint: now,
        }
    }

    // settle both streams up to now. must run before any weight change so the old
    // weights earn their share of the elapsed interval.
    pub fn checkpoint(&mut self, now: Timestamp) {
        if now <= self.last_checkpoint {
            return;
        }
        let from = self.last_checkpoint;
        accrue_interval(
            &mut self.trader_slots,
            self.params.rate_trader_per_sec,
            from,
            now,
        );
        accrue_interval(
            &mut self.staker_slots,
            self.params.rate_staker_per_sec,
            from,
            now,
        );
        self.last_checkpoint = now;
    }

    pub fn set_weight(
        &mut self,
        stream: RewardStream,
        account: AccountId,
        weight: Quote,
        now: Timestamp,
    ) {
        self.checkpoint(now);

        let wash = self.params.wash_time_secs;
        let slots = match stream {
            RewardStream::Trader => &mut self.trader_slots,
            RewardStream::Staker => &mut self.staker_slots,
        };

        match slots.get_mut(&account) {
            Some(slot) => {
                // an increase re-arms the wash window; a decrease keeps eligibility
                if weight > slot.weight {
                    slot.eligible_from = now.plus_secs(wash);
                }
                slot.weight = weight;
            }
            None => {
                slots.insert(
                    account,
                    RewardSlot {
                        weight,
                        eligible_from: now.plus_secs(wash),
                        accrued: Quote::zero(),
                    },
                );
            }
        }
    }

    // projection of what a claim right now would pay. does not mutate.
    pub fn pending(&self, account: AccountId, now: Timestamp) -> Quote {
        let trader = pending_in(
            &self.trader_slots,
            self.params.rate_trader_per_sec,
            account,
            self.last_checkpoint,
            now,
        );
        let staker = pending_in(
            &self.staker_slots,
            self.params.rate_staker_per_sec,
            account,
            self.last_checkpoint,
            now,
        );
        trader.add(staker)
    }

    // drains both streams for the account. a second call with no elapsed time pays zero.
    pub fn claim(&mut self, account: AccountId, now: Timestamp) -> Quote {
        self.checkpoint(now);

        let mut total = Quote::zero();
        for slots in [&mut self.trader_slots, &mut self.staker_slots] {
            if let Some(slot) = slots.get_mut(&account) {
                total = total.add(slot.accrued);
                slot.accrued = Quote::zero();
            }
        }
        total
    }
}

fn eligible_weight_total(
    slots: &HashMap<AccountId, RewardSlot>,
    now: Timestamp,
) -> Decimal {
    slots
        .values()
        .filter(|s| s.eligible_from <= now && !s.weight.is_zero())
        .map(|s| s.weight.value())
        .sum()
}

fn accrue_interval(
    slots: &mut HashMap<AccountId, RewardSlot>,
    rate: Decimal,
    from: Timestamp,
    to: Timestamp,
) {
    if rate.is_zero() {
        return;
    }
    let total = eligible_weight_total(slots, to);
    if total.is_zero() {
        return;
    }
    for slot in slots.values_mut() {
        if slot.eligible_from > to || slot.weight.is_zero() {
            continue;
        }
        // a slot that became eligible mid-interval only earns its tail
        let start = if slot.eligible_from > from {
            slot.eligible_from
        } else {
            from
        };
        let elapsed = start.elapsed_secs(to);
        let share = slot.weight.value() / total;
        slot.accrued = slot.accrued.add(Quote::new(rate * elapsed * share));
    }
}

fn pending_in(
    slots: &HashMap<AccountId, RewardSlot>,
    rate: Decimal,
    account: AccountId,
    from: Timestamp,
    now: Timestamp,
) -> Quote {
    let Some(slot) = slots.get(&account) else {
        return Quote::zero();
    };
    let mut amount = slot.accrued;

    if !rate.is_zero() && slot.eligible_from <= now && !slot.weight.is_zero() {
        let total = eligible_weight_total(slots, now);
        if !total.is_zero() {
            let start = if slot.eligible_from > from {
                slot.eligible_from
            } else {
                from
            };
            let elapsed = start.elapsed_secs(now);
            let share = slot.weight.value() / total;
            amount = amount.add(Quote::new(rate * elapsed * share));
        }
    }
    amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params(wash: i64) -> RewardParams {
        RewardParams {
            rate_trader_per_sec: dec!(0.4),
            rate_staker_per_sec: dec!(0.04),
            wash_time_secs: wash,
            period_length_secs: 2_592_000,
        }
    }

    #[test]
    fn sole_participant_takes_the_whole_stream() {
        let t0 = Timestamp::from_millis(0);
        let mut r = Rewarder::new(params(0), t0);
        r.set_weight(RewardStream::Trader, AccountId(1), Quote::new(dec!(100)), t0);

        let pending = r.pending(AccountId(1), t0.plus_secs(100));
        assert_eq!(pending.value(), dec!(40)); // 0.4 * 100s
    }

    #[test]
    fn split_is_proportional_to_weight() {
        let t0 = Timestamp::from_millis(0);
        let mut r = Rewarder::new(params(0), t0);
        r.set_weight(RewardStream::Staker, AccountId(1), Quote::new(dec!(100)), t0);
        r.set_weight(RewardStream::Staker, AccountId(2), Quote::new(dec!(300)), t0);

        let t1 = t0.plus_secs(100);
        let one = r.pending(AccountId(1), t1);
        let two = r.pending(AccountId(2), t1);

        assert_eq!(one.value(), dec!(1)); // 0.04 * 100 * 1/4
        assert_eq!(two.value(), dec!(3));
    }

    #[test]
    fn wash_window_gates_eligibility() {
        let t0 = Timestamp::from_millis(0);
        let mut r = Rewarder::new(params(150), t0);
        r.set_weight(RewardStream::Trader, AccountId(1), Quote::new(dec!(100)), t0);

        assert_eq!(r.pending(AccountId(1), t0.plus_secs(100)).value(), dec!(0));
        // after the window only the post-wash tail accrues
        let after = r.pending(AccountId(1), t0.plus_secs(250));
        assert_eq!(after.value(), dec!(40)); // 0.4 * (250 - 150)
    }

    #[test]
    fn weight_increase_rearms_wash() {
        let t0 = Timestamp::from_millis(0);
        let mut r = Rewarder::new(params(150), t0);
        r.set_weight(RewardStream::Trader, AccountId(1), Quote::new(dec!(100)), t0);

        let t1 = t0.plus_secs(200);
        r.checkpoint(t1);
        let banked = r.pending(AccountId(1), t1);
        assert_eq!(banked.value(), dec!(20)); // 0.4 * 50s past wash

        // top up: banked accrual stays, new eligibility starts over
        r.set_weight(RewardStream::Trader, AccountId(1), Quote::new(dec!(200)), t1);
        assert_eq!(r.pending(AccountId(1), t1.plus_secs(100)).value(), dec!(20));
    }

    #[test]
    fn claim_is_idempotent() {
        let t0 = Timestamp::from_millis(0);
        let mut r = Rewarder::new(params(0), t0);
        r.set_weight(RewardStream::Trader, AccountId(1), Quote::new(dec!(100)), t0);

        let t1 = t0.plus_secs(10);
        let first = r.claim(AccountId(1), t1);
        assert_eq!(first.value(), dec!(4));

        let second = r.claim(AccountId(1), t1);
        assert_eq!(second.value(), dec!(0));
        assert_eq!(r.pending(AccountId(1), t1).value(), dec!(0));
    }

    #[test]
    fn zero_weight_keeps_banked_accrual() {
        let t0 = Timestamp::from_millis(0);
        let mut r = Rewarder::new(params(0), t0);
        r.set_weight(RewardStream::Trader, AccountId(1), Quote::new(dec!(100)), t0);

        let t1 = t0.plus_secs(10);
        r.set_weight(RewardStream::Trader, AccountId(1), Quote::zero(), t1);

        // position closed, nothing more accrues, but the earned 4 is claimable
        let t2 = t1.plus_secs(1_000);
        assert_eq!(r.pending(AccountId(1), t2).value(), dec!(4));
        assert_eq!(r.claim(AccountId(1), t2).value(), dec!(4));
    }

    #[test]
    fn idle_stream_pays_nothing() {
        let t0 = Timestamp::from_millis(0);
        let mut r = Rewarder::new(params(0), t0);
        assert_eq!(r.claim(AccountId(9), t0.plus_secs(100)).value(), dec!(0));
    }
}
