//! Account balances and positions.
//!
//! The engine never moves real tokens; it records final ledger deltas against
//! three per-account balances (trading token, staking LP token, reward token)
//! and lets the external transfer layer settle them. A debit that the balance
//! cannot cover fails before any state is written.

use crate::position::Position;
use crate::types::{AccountId, MarketId, Quote, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    // collateral and fee currency (USDC-like)
    pub trading_balance: Quote,
    // LP token wallet balance available to stake
    pub staking_balance: Quote,
    // claimed rewards (STRP-like)
    pub reward_balance: Quote,
    pub positions: HashMap<MarketId, Position>,
    pub created_at: Timestamp,
}

impl Account {
    pub fn new(id: AccountId, timestamp: Timestamp) -> Self {
        Self {
            id,
            trading_balance: Quote::zero(),
            staking_balance: Quote::zero(),
            reward_balance: Quote::zero(),
            positions: HashMap::new(),
            created_at: timestamp,
        }
    }

    pub fn credit_trading(&mut self, amount: Quote) {
        self.trading_balance = self.trading_balance.add(amount);
    }

    pub fn debit_trading(&mut self, amount: Quote) -> Result<(), AccountError> {
        if amount > self.trading_balance {
            return Err(AccountError::InsufficientTradingBalance {
                requested: amount,
                available: self.trading_balance,
            });
        }
        self.trading_balance = self.trading_balance.sub(amount);
        Ok(())
    }

    pub fn credit_staking(&mut self, amount: Quote) {
        self.staking_balance = self.staking_balance.add(amount);
    }

    pub fn debit_staking(&mut self, amount: Quote) -> Result<(), AccountError> {
        if amount > self.staking_balance {
            return Err(AccountError::InsufficientStakingBalance {
                requested: amount,
                available: self.staking_balance,
            });
        }
        self.staking_balance = self.staking_balance.sub(amount);
        Ok(())
    }

    pub fn credit_reward(&mut self, amount: Quote) {
        self.reward_balance = self.reward_balance.add(amount);
    }

    pub fn position(&self, market_id: MarketId) -> Option<&Position> {
        self.positions.get(&market_id)
    }

    pub fn set_position(&mut self, position: Position) {
        self.positions.insert(position.market_id, position);
    }

    pub fn remove_position(&mut self, market_id: MarketId) -> Option<Position> {
        self.positions.remove(&market_id)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AccountError {
    #[error("INSUFFICIENT_COLLATERAL: requested {requested}, available {available}")]
    InsufficientTradingBalance { requested: Quote, available: Quote },

    #[error("INSUFFICIENT_COLLATERAL: staking token requested {requested}, available {available}")]
    InsufficientStakingBalance { requested: Quote, available: Quote },
}
