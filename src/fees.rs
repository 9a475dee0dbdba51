// 4.0: fee and slippage projections. every function here is a pure read of the inputs,
// and the mutating open/close paths call the same functions, so a quote taken before a
// trade is exactly what execution applies to the same state.
//
// impact model: a trade of size n against staked depth d moves the rate by n / (d + n)
// in the trade's direction. monotonic in n, saturates below 1, safe at zero depth.

use crate::position::Position;
use crate::risk::RiskParams;
use crate::types::{MarketId, Price, Quote, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// quote for a hypothetical or real trade, original wire shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAndSlippage {
    pub market: MarketId,
    pub market_rate: Price,
    pub oracle_rate: Price,
    pub fee: Quote,
    pub what_if_price: Price,
    pub slippage: Decimal,
}

// projection of a close before committing to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseQuote {
    pub market: MarketId,
    pub minimum_margin: Quote,
    pub pnl: Quote,
    pub margin_left: Quote,
    pub fee: Quote,
    pub slippage: Decimal,
    pub what_if_price: Price,
}

pub fn price_impact(notional: Quote, depth: Quote) -> Decimal {
    let n = notional.value().abs();
    if n.is_zero() {
        return Decimal::ZERO;
    }
    let d = depth.value().max(Decimal::ZERO);
    n / (d + n)
}

// post-trade rate: longs push the mark up, shorts push it down. clamped at the
// protocol-wide price floor.
pub fn what_if_price(mark: Price, side: Side, impact: Decimal, min_price: Decimal) -> Price {
    let shifted = mark.value() * (Decimal::ONE + side.sign() * impact);
    Price::new_unchecked(shifted.max(min_price))
}

pub fn trading_fee(notional: Quote, risk: &RiskParams) -> Quote {
    Quote::new(notional.value().abs() * risk.market_fee_ratio)
}

pub fn calc_fee_and_slippage(
    market: MarketId,
    mark: Price,
    oracle: Price,
    depth: Quote,
    notional: Quote,
    is_long: bool,
    risk: &RiskParams,
) -> FeeAndSlippage {
    let side = Side::from_is_long(is_long);
    let impact = price_impact(notional, depth);
    let what_if = what_if_price(mark, side, impact, risk.minimum_price_possible);
    let slippage = (what_if.value() - mark.value()).abs() / mark.value();

    FeeAndSlippage {
        market,
        market_rate: mark,
        oracle_rate: oracle,
        fee: trading_fee(notional, risk),
        what_if_price: what_if,
        slippage,
    }
}

// closing trades in the opposite direction of the position: buying back a short
// pushes the rate up, selling a long pushes it down.
pub fn calc_close(
    position: &Position,
    mark: Price,
    oracle: Price,
    depth: Quote,
    close_ratio: Decimal,
    risk: &RiskParams,
) -> CloseQuote {
    let close_notional = position.notional.mul(close_ratio);
    let quote = calc_fee_and_slippage(
        position.market_id,
        mark,
        oracle,
        depth,
        close_notional,
        !position.is_long,
        risk,
    );

    let full_pnl = position.pnl(quote.what_if_price);
    let keep = Decimal::ONE - close_ratio;
    let remaining_notional = position.notional.mul(keep);
    let margin_left = position.collateral.add(full_pnl).mul(keep);

    CloseQuote {
        market: position.market_id,
        minimum_margin: risk.minimum_margin(remaining_notional),
        pnl: full_pnl.mul(close_ratio),
        margin_left,
        fee: quote.fee,
        slippage: quote.slippage,
        what_if_price: quote.what_if_price,
    }
}
