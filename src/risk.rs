//! Protocol-wide risk parameters.
//!
//! One mutable table owned by the engine and passed by reference into every
//! margin and fee computation. Only the admin dispatcher may replace it, and
//! replacement is all-or-nothing so readers never see a half-updated table.

use crate::types::Quote;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// margin ratio must clear liquidation floor * this buffer before collateral may leave
pub const COLLATERAL_SAFETY_BUFFER: Decimal = dec!(1.2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
    // share of protocol fee routed to market stakers
    pub fund_fee_ratio: Decimal,
    // share of protocol fee routed to the dao wallet
    pub dao_fee_ratio: Decimal,
    // share of liquidated equity paid to the triggering keeper
    pub liquidator_fee_ratio: Decimal,
    // trading fee as a fraction of notional
    pub market_fee_ratio: Decimal,
    // share of protocol fee routed to the insurance pool
    pub insurance_profit_on_position_closed: Decimal,
    // margin ratio at or below which a position may be liquidated
    pub liquidation_margin_ratio: Decimal,
    // hard floor for any computed rate
    pub minimum_price_possible: Decimal,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            fund_fee_ratio: dec!(0.75),
            dao_fee_ratio: dec!(0.20),
            liquidator_fee_ratio: dec!(0.002),
            market_fee_ratio: dec!(0.95),
            insurance_profit_on_position_closed: dec!(0.05),
            liquidation_margin_ratio: dec!(0.035),
            minimum_price_possible: dec!(0.0001),
        }
    }
}

// fund + dao + insurance cut of one fee. the three shares never exceed the fee itself.
#[derive(Debug, Clone, Copy)]
pub struct FeeSplit {
    pub fund: Quote,
    pub dao: Quote,
    pub insurance: Quote,
}

impl RiskParams {
    pub fn validate(&self) -> Result<(), RiskError> {
        let unit = |v: Decimal| v >= Decimal::ZERO && v <= Decimal::ONE;

        if !unit(self.fund_fee_ratio)
            || !unit(self.dao_fee_ratio)
            || !unit(self.insurance_profit_on_position_closed)
        {
            return Err(RiskError::RatioOutOfRange("fee routing ratios"));
        }
        if self.fund_fee_ratio + self.dao_fee_ratio + self.insurance_profit_on_position_closed
            > Decimal::ONE
        {
            return Err(RiskError::RoutingExceedsFee);
        }
        if !unit(self.liquidator_fee_ratio) || !unit(self.market_fee_ratio) {
            return Err(RiskError::RatioOutOfRange("liquidator/market fee ratios"));
        }
        if self.liquidation_margin_ratio <= Decimal::ZERO
            || self.liquidation_margin_ratio >= Decimal::ONE
        {
            return Err(RiskError::RatioOutOfRange("liquidation margin ratio"));
        }
        if self.minimum_price_possible <= Decimal::ZERO {
            return Err(RiskError::NonPositiveMinimumPrice);
        }
        Ok(())
    }

    // money floor a position of this notional must keep after a partial close
    pub fn minimum_margin(&self, notional: Quote) -> Quote {
        Quote::new(notional.value().abs() * self.liquidation_margin_ratio)
    }

    // margin ratio floor for voluntary collateral removal
    pub fn collateral_removal_floor(&self) -> Decimal {
        self.liquidation_margin_ratio * COLLATERAL_SAFETY_BUFFER
    }

    pub fn split_fee(&self, fee: Quote) -> FeeSplit {
        FeeSplit {
            fund: fee.mul(self.fund_fee_ratio),
            dao: fee.mul(self.dao_fee_ratio),
            insurance: fee.mul(self.insurance_profit_on_position_closed),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RiskError {
    #[error("risk ratio out of [0, 1] range: {0}")]
    RatioOutOfRange(&'static str),

    #[error("fund + dao + insurance routing exceeds the whole fee")]
    RoutingExceedsFee,

    #[error("minimum possible price must be positive")]
    NonPositiveMinimumPrice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        assert!(RiskParams::default().validate().is_ok());
    }

    #[test]
    fn default_routing_consumes_whole_fee() {
        let risk = RiskParams::default();
        let sum = risk.fund_fee_ratio
            + risk.dao_fee_ratio
            + risk.insurance_profit_on_position_closed;
        assert_eq!(sum, dec!(1));
    }

    #[test]
    fn fee_split_conserves_total() {
        let risk = RiskParams::default();
        let split = risk.split_fee(Quote::new(dec!(95)));
        let routed = split.fund.add(split.dao).add(split.insurance);
        assert_eq!(routed.value(), dec!(95));
    }

    #[test]
    fn rejects_overcommitted_routing() {
        let risk = RiskParams {
            fund_fee_ratio: dec!(0.8),
            dao_fee_ratio: dec!(0.3),
            ..RiskParams::default()
        };
        assert!(matches!(risk.validate(), Err(RiskError::RoutingExceedsFee)));
    }

    #[test]
    fn rejects_degenerate_liquidation_ratio() {
        let risk = RiskParams {
            liquidation_margin_ratio: dec!(0),
            ..RiskParams::default()
        };
        assert!(risk.validate().is_err());
    }

    #[test]
    fn minimum_margin_scales_with_notional() {
        let risk = RiskParams::default();
        let min = risk.minimum_margin(Quote::new(dec!(1000)));
        assert_eq!(min.value(), dec!(35));
    }

    #[test]
    fn removal_floor_carries_buffer() {
        let risk = RiskParams::default();
        assert_eq!(risk.collateral_removal_floor(), dec!(0.042));
    }
}
