// 3.0: position records. pnl = direction * notional * (mark - entry) / entry.
// 3.1 has accumulate (repeat same-direction opens) and close_portion at the bottom.
// at most one active position per (account, market); repeat opens compose additively.

use crate::types::{MarketId, Price, Quote, Side, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub market_id: MarketId,
    pub is_long: bool,
    pub is_active: bool,
    pub is_liquidated: bool,
    // nominal size, always a positive magnitude; direction lives in is_long
    pub notional: Quote,
    pub collateral: Quote,
    pub initial_price: Price,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Position {
    pub fn new(
        market_id: MarketId,
        is_long: bool,
        notional: Quote,
        collateral: Quote,
        entry_price: Price,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            market_id,
            is_long,
            is_active: true,
            is_liquidated: false,
            notional,
            collateral,
            initial_price: entry_price,
            opened_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn side(&self) -> Side {
        Side::from_is_long(self.is_long)
    }

    // 3.1: paper gains/losses against the current mark
    pub fn pnl(&self, mark: Price) -> Quote {
        let fractional_move =
            (mark.value() - self.initial_price.value()) / self.initial_price.value();
        Quote::new(self.side().sign() * self.notional.value() * fractional_move)
    }

    // (collateral + pnl) / notional. the solvency signal for liquidation and
    // collateral removal. not defined for a closed position.
    pub fn margin_ratio(&self, mark: Price) -> Decimal {
        if self.notional.is_zero() {
            return Decimal::MAX;
        }
        (self.collateral.value() + self.pnl(mark).value()) / self.notional.value()
    }

    pub fn equity(&self, mark: Price) -> Quote {
        self.collateral.add(self.pnl(mark))
    }
}

// 3.2: repeat open in the same direction. sums notional and collateral, entry price
// becomes the notional-weighted average of old and new.
pub fn accumulate(
    position: &Position,
    add_notional: Quote,
    add_collateral: Quote,
    fill_price: Price,
    timestamp: Timestamp,
) -> Position {
    debug_assert!(position.is_active, "accumulate on a closed position");

    let old = position.notional.value();
    let add = add_notional.value();
    let combined = old + add;

    let new_entry = if combined > Decimal::ZERO {
        let weighted = old * position.initial_price.value() + add * fill_price.value();
        Price::new_unchecked(weighted / combined)
    } else {
        position.initial_price
    };

    Position {
        market_id: position.market_id,
        is_long: position.is_long,
        is_active: true,
        is_liquidated: false,
        notional: position.notional.add(add_notional),
        collateral: position.collateral.add(add_collateral),
        initial_price: new_entry,
        opened_at: position.opened_at,
        updated_at: timestamp,
    }
}

#[derive(Debug, Clone)]
pub struct CloseOutcome {
    // None when the whole position was closed
    pub remaining: Option<Position>,
    pub realized_pnl: Quote,
    pub collateral_released: Quote,
}

// 3.3: closes ratio of the position at the execution price. pnl realizes
// proportionally; entry price of the remainder is unchanged.
pub fn close_portion(
    position: &Position,
    close_ratio: Decimal,
    execution_price: Price,
    timestamp: Timestamp,
) -> CloseOutcome {
    debug_assert!(
        close_ratio > Decimal::ZERO && close_ratio <= Decimal::ONE,
        "close ratio must be in (0, 1]"
    );

    let full_pnl = position.pnl(execution_price);
    let realized_pnl = full_pnl.mul(close_ratio);
    let collateral_released = position.collateral.mul(close_ratio);

    if close_ratio == Decimal::ONE {
        return CloseOutcome {
            remaining: None,
            realized_pnl,
            collateral_released: position.collateral,
        };
    }

    let keep = Decimal::ONE - close_ratio;
    let remaining = Position {
        market_id: position.market_id,
        is_long: position.is_long,
        is_active: true,
        is_liquidated: false,
        notional: position.notional.mul(keep),
        collateral: position.collateral.sub(collateral_released),
        initial_price: position.initial_price,
        opened_at: position.opened_at,
        updated_at: timestamp,
    };

    CloseOutcome {
        remaining: Some(remaining),
        realized_pnl,
        collateral_released,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn short_position() -> Position {
        // 100 notional short opened at 1.17, fully collateralized
        Position::new(
            MarketId(1),
            false,
            Quote::new(dec!(100)),
            Quote::new(dec!(100)),
            Price::new_unchecked(dec!(1.17)),
            Timestamp::from_millis(0),
        )
    }

    #[test]
    fn short_profits_when_rate_drops() {
        let pos = short_position();
        let mark = Price::new_unchecked(dec!(1.053)); // -10%
        assert_eq!(pos.pnl(mark).value(), dec!(10));
    }

    #[test]
    fn short_loses_when_rate_rises() {
        let pos = short_position();
        let mark = Price::new_unchecked(dec!(1.287)); // +10%
        assert_eq!(pos.pnl(mark).value(), dec!(-10));
    }

    #[test]
    fn long_mirrors_short() {
        let mut pos = short_position();
        pos.is_long = true;
        let mark = Price::new_unchecked(dec!(1.287));
        assert_eq!(pos.pnl(mark).value(), dec!(10));
    }

    #[test]
    fn margin_ratio_at_entry_is_collateral_over_notional() {
        let pos = short_position();
        let ratio = pos.margin_ratio(Price::new_unchecked(dec!(1.17)));
        assert_eq!(ratio, dec!(1));
    }

    #[test]
    fn margin_ratio_degrades_with_loss() {
        let pos = short_position();
        let ratio = pos.margin_ratio(Price::new_unchecked(dec!(1.287)));
        assert_eq!(ratio, dec!(0.9));
    }

    #[test]
    fn accumulate_sums_and_averages_entry() {
        let pos = short_position();
        let grown = accumulate(
            &pos,
            Quote::new(dec!(100)),
            Quote::new(dec!(100)),
            Price::new_unchecked(dec!(1.23)),
            Timestamp::from_millis(1_000),
        );

        assert_eq!(grown.notional.value(), dec!(200));
        assert_eq!(grown.collateral.value(), dec!(200));
        assert_eq!(grown.initial_price.value(), dec!(1.2));
        assert!(grown.is_active);
    }

    #[test]
    fn partial_close_keeps_entry_price() {
        let pos = short_position();
        let outcome = close_portion(
            &pos,
            dec!(0.5),
            Price::new_unchecked(dec!(1.053)),
            Timestamp::from_millis(1_000),
        );

        let remaining = outcome.remaining.unwrap();
        assert_eq!(remaining.notional.value(), dec!(50));
        assert_eq!(remaining.collateral.value(), dec!(50));
        assert_eq!(remaining.initial_price.value(), dec!(1.17));
        // half of the +10 short profit
        assert_eq!(outcome.realized_pnl.value(), dec!(5));
        assert_eq!(outcome.collateral_released.value(), dec!(50));
    }

    #[test]
    fn full_close_releases_everything() {
        let pos = short_position();
        let outcome = close_portion(
            &pos,
            dec!(1),
            Price::new_unchecked(dec!(1.17)),
            Timestamp::from_millis(1_000),
        );

        assert!(outcome.remaining.is_none());
        assert_eq!(outcome.collateral_released.value(), dec!(100));
        assert_eq!(outcome.realized_pnl.value(), dec!(0));
    }
}
