// perpstake-core: leveraged trading and liquidity staking accounting core.
// ledger-first architecture: every mutating call fully commits or reverts whole.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: ids, Side, Quote, Price, Timestamp
//   2.x  oracle.rs: oracle registry, price cache, keeper upkeep
//   3.x  position.rs: position record, pnl/margin math, accumulate/close
//   4.x  fees.rs: fee + slippage projections shared by quote and execution
//   5.x  staking.rs: SLP pool, penalty window, unstake profit projection
//   6.x  rewards.rs: per-second reward streams with wash gating
//   7.x  events.rs: state transition events for audit
//   8.x  engine/: core ledger, trade/staking entry points, views, dispatchers,
//        opaque wire boundary
//   market.rs: venue records (markets + insurance fund)
//   risk.rs: protocol-wide risk parameter table
//   account.rs: balances and the external transfer boundary

pub mod account;
pub mod engine;
pub mod events;
pub mod fees;
pub mod market;
pub mod oracle;
pub mod position;
pub mod rewards;
pub mod risk;
pub mod staking;
pub mod types;

// re exports for convenience
pub use account::*;
pub use engine::*;
pub use events::*;
pub use fees::*;
pub use market::*;
pub use oracle::*;
pub use position::*;
pub use rewards::*;
pub use risk::*;
pub use staking::*;
pub use types::*;
