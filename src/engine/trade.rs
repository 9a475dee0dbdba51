//! Trade entry points: open, close, change collateral, liquidate.
//!
//! Each operation validates everything it can, performs the one fallible
//! balance debit, and only then writes position, pool, and price state, so a
//! failure at any point leaves the ledger exactly as it was.

use super::core::Engine;
use super::results::{CloseResult, EngineError, LiquidationOutcome, OpenResult};
use crate::events::{
    CollateralChangedEvent, EventPayload, PositionClosedEvent, PositionLiquidatedEvent,
    PositionOpenedEvent,
};
use crate::fees::{calc_close, calc_fee_and_slippage};
use crate::position::{accumulate, close_portion, Position};
use crate::rewards::RewardStream;
use crate::types::{AccountId, MarketId, Quote};
use rust_decimal::Decimal;

impl Engine {
    // notional = collateral * leverage. the fee is paid from the trading balance on
    // top of collateral; the post-impact price is both the slippage reference and the
    // position's entry. repeat same-direction opens accumulate onto the record.
    pub fn open(
        &mut self,
        account_id: AccountId,
        market_id: MarketId,
        is_long: bool,
        collateral: Quote,
        leverage: Decimal,
        max_slippage: Decimal,
    ) -> Result<OpenResult, EngineError> {
        if collateral.value() <= Decimal::ZERO || leverage < Decimal::ONE {
            return Err(EngineError::BadParams);
        }

        let lp_price = self.lp_price()?;
        let market = self
            .market(market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let oracle_price = self.oracles.price(market.asset_oracle)?;
        let depth = market.depth(lp_price);
        let mark = market.mark_price;

        let notional = collateral.mul(leverage);
        let quote = calc_fee_and_slippage(
            market_id, mark, oracle_price, depth, notional, is_long, &self.risk,
        );
        if quote.slippage > max_slippage {
            return Err(EngineError::SlippageExceeded {
                realized: quote.slippage,
                bound: max_slippage,
            });
        }

        let existing = self
            .account(account_id)
            .ok_or(EngineError::AccountNotFound(account_id))?
            .position(market_id)
            .cloned();
        if let Some(ref position) = existing {
            if position.is_long != is_long {
                return Err(EngineError::WrongDirection);
            }
        }

        // the single fallible write: collateral plus fee in one debit
        let now = self.current_time;
        let account = self.account_mut(account_id)?;
        account.debit_trading(collateral.add(quote.fee))?;

        let position = match existing {
            Some(ref prior) => accumulate(prior, notional, collateral, quote.what_if_price, now),
            None => Position::new(
                market_id,
                is_long,
                notional,
                collateral,
                quote.what_if_price,
                now,
            ),
        };
        account.set_position(position.clone());

        self.route_fee(market_id, quote.fee);

        let venue = self.venue_mut(market_id)?;
        venue.mark_price = quote.what_if_price;
        venue
            .rewarder
            .set_weight(RewardStream::Trader, account_id, position.notional, now);

        self.emit_event(EventPayload::PositionOpened(PositionOpenedEvent {
            market_id,
            account_id,
            is_long,
            notional,
            collateral,
            execution_price: quote.what_if_price,
            fee: quote.fee,
            slippage: quote.slippage,
        }));

        Ok(OpenResult {
            market_id,
            execution_price: quote.what_if_price,
            fee: quote.fee,
            slippage: quote.slippage,
            position,
        })
    }

    // close_ratio = 1 is a full close; anything below shrinks the position
    // proportionally. a partial close must leave the remainder above the margin
    // floor; a full close may run below it (self-triggered liquidation equivalent)
    // but still honors the caller's slippage bound.
    pub fn close(
        &mut self,
        account_id: AccountId,
        market_id: MarketId,
        close_ratio: Decimal,
        max_slippage: Decimal,
    ) -> Result<CloseResult, EngineError> {
        if close_ratio <= Decimal::ZERO || close_ratio > Decimal::ONE {
            return Err(EngineError::BadParams);
        }

        let lp_price = self.lp_price()?;
        let market = self
            .market(market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let oracle_price = self.oracles.price(market.asset_oracle)?;
        let depth = market.depth(lp_price);
        let mark = market.mark_price;

        let position = self
            .account(account_id)
            .ok_or(EngineError::AccountNotFound(account_id))?
            .position(market_id)
            .filter(|p| p.is_active)
            .cloned()
            .ok_or(EngineError::NoPosition)?;

        let quote = calc_close(&position, mark, oracle_price, depth, close_ratio, &self.risk);
        if quote.slippage > max_slippage {
            return Err(EngineError::SlippageExceeded {
                realized: quote.slippage,
                bound: max_slippage,
            });
        }
        if close_ratio < Decimal::ONE && quote.margin_left < quote.minimum_margin {
            return Err(EngineError::InsufficientMargin {
                left: quote.margin_left,
                minimum: quote.minimum_margin,
            });
        }

        // fee comes out of the trading balance, not the closing proceeds
        let now = self.current_time;
        self.account_mut(account_id)?.debit_trading(quote.fee)?;

        let outcome = close_portion(&position, close_ratio, quote.what_if_price, now);

        // losses are collectable only up to the collateral being released
        let pnl = outcome
            .realized_pnl
            .max(outcome.collateral_released.negate());
        let returned = outcome.collateral_released.add(pnl);

        self.settle_pnl(market_id, pnl);
        let account = self.account_mut(account_id)?;
        account.credit_trading(returned);

        let fully_closed = outcome.remaining.is_none();
        let remaining_notional = match outcome.remaining {
            Some(remaining) => {
                let notional = remaining.notional;
                account.set_position(remaining);
                notional
            }
            None => {
                account.remove_position(market_id);
                Quote::zero()
            }
        };

        self.route_fee(market_id, quote.fee);

        let venue = self.venue_mut(market_id)?;
        venue.mark_price = quote.what_if_price;
        venue
            .rewarder
            .set_weight(RewardStream::Trader, account_id, remaining_notional, now);

        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            market_id,
            account_id,
            close_ratio,
            execution_price: quote.what_if_price,
            realized_pnl: pnl,
            returned,
            fee: quote.fee,
            fully_closed,
        }));

        Ok(CloseResult {
            market_id,
            execution_price: quote.what_if_price,
            realized_pnl: pnl,
            returned,
            fee: quote.fee,
            fully_closed,
            remaining_notional,
        })
    }

    // adding collateral only needs the balance pull; removing it must keep the
    // margin ratio above the liquidation floor scaled by the safety buffer.
    pub fn change_collateral(
        &mut self,
        account_id: AccountId,
        market_id: MarketId,
        amount: Quote,
        is_add: bool,
    ) -> Result<(), EngineError> {
        if amount.value() <= Decimal::ZERO {
            return Err(EngineError::BadParams);
        }

        let mark = self
            .market(market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?
            .mark_price;

        let mut position = self
            .account(account_id)
            .ok_or(EngineError::AccountNotFound(account_id))?
            .position(market_id)
            .filter(|p| p.is_active)
            .cloned()
            .ok_or(EngineError::NoPosition)?;

        if is_add {
            self.account_mut(account_id)?.debit_trading(amount)?;
            position.collateral = position.collateral.add(amount);
        } else {
            let new_collateral = position.collateral.sub(amount);
            let floor = self.risk.collateral_removal_floor();
            let new_ratio = if new_collateral.is_negative() {
                Decimal::MIN
            } else {
                (new_collateral.value() + position.pnl(mark).value())
                    / position.notional.value()
            };
            if new_ratio <= floor {
                return Err(EngineError::InsufficientMargin {
                    left: new_collateral.add(position.pnl(mark)),
                    minimum: position.notional.mul(floor),
                });
            }
            position.collateral = new_collateral;
            self.account_mut(account_id)?.credit_trading(amount);
        }

        position.updated_at = self.current_time;
        let new_collateral = position.collateral;
        self.account_mut(account_id)?.set_position(position);

        self.emit_event(EventPayload::CollateralChanged(CollateralChangedEvent {
            market_id,
            account_id,
            amount,
            is_add,
            new_collateral,
        }));
        Ok(())
    }

    // keeper entry point. only positions at or below the liquidation margin floor
    // can be taken; the keeper earns its ratio of remaining equity and the rest is
    // routed like any protocol fee.
    pub fn liquidate(
        &mut self,
        keeper: AccountId,
        market_id: MarketId,
        account_id: AccountId,
    ) -> Result<LiquidationOutcome, EngineError> {
        let mark = self
            .market(market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?
            .mark_price;

        let position = self
            .account(account_id)
            .ok_or(EngineError::AccountNotFound(account_id))?
            .position(market_id)
            .filter(|p| p.is_active)
            .cloned()
            .ok_or(EngineError::NoPosition)?;

        let margin_ratio = position.margin_ratio(mark);
        let floor = self.risk.liquidation_margin_ratio;
        if margin_ratio > floor {
            return Err(EngineError::NotLiquidatable {
                margin_ratio,
                floor,
            });
        }

        let now = self.current_time;
        let pnl = position
            .pnl(mark)
            .max(position.collateral.negate());
        let equity = position.collateral.add(pnl).max(Quote::zero());

        self.settle_pnl(market_id, pnl);

        let liquidator_fee = equity.mul(self.risk.liquidator_fee_ratio);
        let routed = equity.sub(liquidator_fee);
        self.ensure_account(keeper).credit_trading(liquidator_fee);
        self.route_fee(market_id, routed);

        self.account_mut(account_id)?.remove_position(market_id);

        let venue = self.venue_mut(market_id)?;
        venue
            .rewarder
            .set_weight(RewardStream::Trader, account_id, Quote::zero(), now);

        self.emit_event(EventPayload::PositionLiquidated(PositionLiquidatedEvent {
            market_id,
            account_id,
            keeper,
            margin_ratio,
            liquidator_fee,
            routed,
        }));

        Ok(LiquidationOutcome {
            market_id,
            account_id,
            margin_ratio,
            liquidator_fee,
            routed,
        })
    }

    // keeper sweep over every (account, market) pair. mirrors the external
    // liquidation keeper's upkeep call.
    pub fn liquidation_tick(&mut self, keeper: AccountId) -> Vec<LiquidationOutcome> {
        let floor = self.risk.liquidation_margin_ratio;
        let mut targets = Vec::new();

        for (account_id, account) in &self.accounts {
            for (market_id, position) in &account.positions {
                if !position.is_active {
                    continue;
                }
                let Some(market) = self.markets.get(market_id) else {
                    continue;
                };
                if position.margin_ratio(market.mark_price) <= floor {
                    targets.push((*account_id, *market_id));
                }
            }
        }

        let mut outcomes = Vec::new();
        for (account_id, market_id) in targets {
            if let Ok(outcome) = self.liquidate(keeper, market_id, account_id) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    // trader pnl settles against the market's staking pool: wins drain the profit
    // pot, losses feed it.
    fn settle_pnl(&mut self, market_id: MarketId, pnl: Quote) {
        if let Ok(venue) = self.venue_mut(market_id) {
            if pnl.is_negative() {
                venue.pool.absorb(pnl.abs());
            } else if !pnl.is_zero() {
                venue.pool.pay_out(pnl);
            }
        }
    }

    // fund share stays with the market's stakers, dao share goes to the dao wallet,
    // insurance share tops up the insurance pool (or the market pool when no
    // insurance venue is registered yet).
    fn route_fee(&mut self, market_id: MarketId, amount: Quote) {
        if amount.is_zero() {
            return;
        }
        let split = self.risk.split_fee(amount);
        let dao = self.config.dao;

        if let Ok(venue) = self.venue_mut(market_id) {
            venue.pool.absorb(split.fund);
        }
        self.ensure_account(dao).credit_trading(split.dao);

        match &mut self.insurance {
            Some(ins) => ins.pool.absorb(split.insurance),
            None => {
                if let Ok(venue) = self.venue_mut(market_id) {
                    venue.pool.absorb(split.insurance);
                }
            }
        }
    }
}
