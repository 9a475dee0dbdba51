// 8.0.1: engine runtime settings.

use crate::types::AccountId;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    // the only identity the admin dispatcher accepts
    pub admin: AccountId,
    // destination of the dao share of every routed fee
    pub dao: AccountId,
    pub verbose: bool,
    pub max_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin: AccountId(1),
            dao: AccountId(1),
            verbose: false,
            max_events: 10_000,
        }
    }
}
