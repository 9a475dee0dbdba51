// 8.0.2: result types and errors for engine operations.
// error displays lead with the wire-level failure code; code() exposes it directly so
// the dispatcher boundary and tests never have to parse a message.

use crate::account::AccountError;
use crate::oracle::OracleError;
use crate::position::Position;
use crate::risk::RiskError;
use crate::staking::StakingError;
use crate::types::{AccountId, MarketId, Price, Quote};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct OpenResult {
    pub market_id: MarketId,
    pub execution_price: Price,
    pub fee: Quote,
    pub slippage: Decimal,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct CloseResult {
    pub market_id: MarketId,
    pub execution_price: Price,
    pub realized_pnl: Quote,
    // trading tokens credited back to the caller
    pub returned: Quote,
    pub fee: Quote,
    pub fully_closed: bool,
    pub remaining_notional: Quote,
}

#[derive(Debug, Clone)]
pub struct LiquidationOutcome {
    pub market_id: MarketId,
    pub account_id: AccountId,
    pub margin_ratio: Decimal,
    pub liquidator_fee: Quote,
    // equity routed fund/dao/insurance after the keeper's cut
    pub routed: Quote,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("BAD_PARAMS")]
    BadParams,

    #[error("UNAUTHORIZED")]
    Unauthorized,

    #[error("UNKNOWN_ACTION: tag {0}")]
    UnknownAction(u8),

    #[error("NO_POSITION")]
    NoPosition,

    #[error("INSUFFICIENT_MARGIN: left {left}, minimum {minimum}")]
    InsufficientMargin { left: Quote, minimum: Quote },

    #[error("SLIPPAGE_EXCEEDED: realized {realized}, bound {bound}")]
    SlippageExceeded { realized: Decimal, bound: Decimal },

    #[error("MARKET_NOT_FOUND: {0:?}")]
    MarketNotFound(MarketId),

    #[error("MARKET_EXISTS: {0:?}")]
    MarketExists(MarketId),

    #[error("ACCOUNT_NOT_FOUND: {0:?}")]
    AccountNotFound(AccountId),

    #[error("NOT_LIQUIDATABLE: margin ratio {margin_ratio} above floor {floor}")]
    NotLiquidatable { margin_ratio: Decimal, floor: Decimal },

    #[error("WRONG_DIRECTION")]
    WrongDirection,

    #[error("ENCODE_FAILED")]
    EncodeFailed,

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Staking(#[from] StakingError),

    #[error(transparent)]
    Risk(#[from] RiskError),
}

impl EngineError {
    // the stable failure code callers match on, independent of message details
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::BadParams => "BAD_PARAMS",
            EngineError::Unauthorized => "UNAUTHORIZED",
            EngineError::UnknownAction(_) => "UNKNOWN_ACTION",
            EngineError::NoPosition => "NO_POSITION",
            EngineError::InsufficientMargin { .. } => "INSUFFICIENT_MARGIN",
            EngineError::SlippageExceeded { .. } => "SLIPPAGE_EXCEEDED",
            EngineError::MarketNotFound(_) => "MARKET_NOT_FOUND",
            EngineError::MarketExists(_) => "MARKET_EXISTS",
            EngineError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            EngineError::NotLiquidatable { .. } => "NOT_LIQUIDATABLE",
            EngineError::WrongDirection => "WRONG_DIRECTION",
            EngineError::EncodeFailed => "ENCODE_FAILED",
            EngineError::Account(_) => "INSUFFICIENT_COLLATERAL",
            EngineError::Oracle(inner) => match inner {
                OracleError::NotFound(_) => "ORACLE_NOT_FOUND",
                OracleError::Inactive(_) => "ORACLE_INACTIVE",
                OracleError::NoPrice(_) => "NO_ORACLE_PRICE",
                OracleError::BadHint => "BAD_PARAMS",
            },
            EngineError::Staking(inner) => match inner {
                StakingError::NoStake(_) => "NO_STAKE",
                StakingError::InsufficientStake { .. } => "INSUFFICIENT_STAKE",
            },
            EngineError::Risk(_) => "BAD_PARAMS",
        }
    }
}
