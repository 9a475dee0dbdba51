// 8.0: the stateful engine. one shared ledger coordinates trades, staking, rewards,
// oracle upkeep, and the three action dispatchers. deterministic, no external I/O;
// every mutating call fully commits or leaves prior state untouched.

mod config;
mod core;
mod dispatch;
mod results;
mod staking;
mod trade;
mod views;
pub mod wire;

pub use config::EngineConfig;
pub use core::Engine;
pub use dispatch::{
    AdminAction, AdminResponse, StateAction, StateResponse, ViewAction, ViewResponse,
};
pub use results::{CloseResult, EngineError, LiquidationOutcome, OpenResult};
pub use views::{PositionData, RewardsData, StakingData, StakingInfo, TradingInfo};
pub use wire::{admin_dispatcher, state_dispatcher, view_dispatcher, RawAction};
