// 2.0: oracle registry and price cache. one entry per price source, refreshed only by
// external keeper upkeep calls. read-only for every other part of the engine.
// 2.1 has the upkeep hint codec: the hint bytes are the oracle's own encoding, opaque
// to callers; the built-in codec is a JSON decimal.

use crate::types::{OracleId, Price, Quote, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    pub is_active: bool,
    // fixed fee credited to whichever keeper triggers this oracle's upkeep
    pub keeper_reward: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleState {
    pub config: OracleConfig,
    pub price: Option<Price>,
    pub updated_at: Timestamp,
}

// registry entry as the view dispatcher reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleInfo {
    pub is_active: bool,
    pub keeper_reward: Quote,
}

#[derive(Debug, Clone, Default)]
pub struct OracleRegistry {
    oracles: BTreeMap<OracleId, OracleState>,
    next_id: u32,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, config: OracleConfig, now: Timestamp) -> OracleId {
        self.next_id += 1;
        let id = OracleId(self.next_id);
        self.oracles.insert(
            id,
            OracleState {
                config,
                price: None,
                updated_at: now,
            },
        );
        id
    }

    pub fn remove(&mut self, id: OracleId) -> Result<(), OracleError> {
        self.oracles
            .remove(&id)
            .map(|_| ())
            .ok_or(OracleError::NotFound(id))
    }

    pub fn change(&mut self, id: OracleId, config: OracleConfig) -> Result<(), OracleError> {
        let state = self.oracles.get_mut(&id).ok_or(OracleError::NotFound(id))?;
        state.config = config;
        Ok(())
    }

    pub fn get(&self, id: OracleId) -> Option<&OracleState> {
        self.oracles.get(&id)
    }

    pub fn price(&self, id: OracleId) -> Result<Price, OracleError> {
        let state = self.oracles.get(&id).ok_or(OracleError::NotFound(id))?;
        state.price.ok_or(OracleError::NoPrice(id))
    }

    // insertion-ordered listing (ids are monotonic, map is ordered)
    pub fn list(&self) -> Vec<OracleInfo> {
        self.oracles
            .values()
            .map(|s| OracleInfo {
                is_active: s.config.is_active,
                keeper_reward: s.config.keeper_reward,
            })
            .collect()
    }

    pub fn contains(&self, id: OracleId) -> bool {
        self.oracles.contains_key(&id)
    }

    // 2.1: keeper upkeep. decodes the hint, refreshes the cache, reports the keeper fee due.
    pub fn refresh(
        &mut self,
        id: OracleId,
        hint: &[u8],
        now: Timestamp,
    ) -> Result<(Price, Quote), OracleError> {
        let state = self.oracles.get_mut(&id).ok_or(OracleError::NotFound(id))?;
        if !state.config.is_active {
            return Err(OracleError::Inactive(id));
        }
        let price = decode_price_hint(hint)?;
        state.price = Some(price);
        state.updated_at = now;
        Ok((price, state.config.keeper_reward))
    }
}

pub fn decode_price_hint(hint: &[u8]) -> Result<Price, OracleError> {
    let raw: Decimal = serde_json::from_slice(hint).map_err(|_| OracleError::BadHint)?;
    Price::new(raw).ok_or(OracleError::BadHint)
}

pub fn encode_price_hint(price: Price) -> Vec<u8> {
    serde_json::to_vec(&price.value()).unwrap_or_default()
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    #[error("ORACLE_NOT_FOUND: {0:?}")]
    NotFound(OracleId),

    #[error("ORACLE_INACTIVE: {0:?}")]
    Inactive(OracleId),

    #[error("NO_ORACLE_PRICE: {0:?}")]
    NoPrice(OracleId),

    #[error("BAD_PARAMS: undecodable upkeep hint")]
    BadHint,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn registry_with_two() -> (OracleRegistry, OracleId, OracleId) {
        let mut reg = OracleRegistry::new();
        let now = Timestamp::from_millis(0);
        let a = reg.add(
            OracleConfig {
                is_active: true,
                keeper_reward: Quote::new(dec!(22)),
            },
            now,
        );
        let b = reg.add(
            OracleConfig {
                is_active: true,
                keeper_reward: Quote::new(dec!(33)),
            },
            now,
        );
        (reg, a, b)
    }

    #[test]
    fn listing_preserves_registration_order() {
        let (reg, _, _) = registry_with_two();
        let listed = reg.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].keeper_reward.value(), dec!(22));
        assert_eq!(listed[1].keeper_reward.value(), dec!(33));
        assert!(listed.iter().all(|o| o.is_active));
    }

    #[test]
    fn refresh_caches_price_and_reports_reward() {
        let (mut reg, a, _) = registry_with_two();
        let hint = encode_price_hint(Price::new_unchecked(dec!(1.35)));

        let (price, reward) = reg.refresh(a, &hint, Timestamp::from_millis(5)).unwrap();
        assert_eq!(price.value(), dec!(1.35));
        assert_eq!(reward.value(), dec!(22));
        assert_eq!(reg.price(a).unwrap().value(), dec!(1.35));
    }

    #[test]
    fn refresh_rejects_inactive() {
        let (mut reg, a, _) = registry_with_two();
        reg.change(
            a,
            OracleConfig {
                is_active: false,
                keeper_reward: Quote::new(dec!(22)),
            },
        )
        .unwrap();

        let hint = encode_price_hint(Price::new_unchecked(dec!(1)));
        let result = reg.refresh(a, &hint, Timestamp::from_millis(5));
        assert!(matches!(result, Err(OracleError::Inactive(_))));
    }

    #[test]
    fn refresh_rejects_garbage_hint() {
        let (mut reg, a, _) = registry_with_two();
        let result = reg.refresh(a, b"not a price", Timestamp::from_millis(5));
        assert!(matches!(result, Err(OracleError::BadHint)));
    }

    #[test]
    fn price_before_first_upkeep_is_an_error() {
        let (reg, a, _) = registry_with_two();
        assert!(matches!(reg.price(a), Err(OracleError::NoPrice(_))));
    }

    #[test]
    fn remove_then_lookup_fails() {
        let (mut reg, a, _) = registry_with_two();
        reg.remove(a).unwrap();
        assert!(matches!(reg.price(a), Err(OracleError::NotFound(_))));
        assert_eq!(reg.list().len(), 1);
    }
}
