// 8.1 engine/core.rs: the shared ledger. all state lives here: risk table, oracle and
// market registries, the insurance venue, accounts, the event log, and a logical clock.
//
// execution model: every mutating operation takes &mut self and validates before it
// writes, so a call either fully commits or leaves prior state untouched. views take
// &self and can only observe committed state. the borrow checker is the single-writer
// lock.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::account::Account;
use crate::events::{DepositEvent, Event, EventId, EventPayload, PriceRefreshedEvent};
use crate::market::Market;
use crate::oracle::{OracleConfig, OracleRegistry};
use crate::risk::RiskParams;
use crate::types::{AccountId, MarketId, OracleId, Price, Quote, Timestamp};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) risk: RiskParams,
    pub(super) oracles: OracleRegistry,
    // prices the staking LP token across all venues; set once at bootstrap
    pub(super) lp_oracle: Option<OracleId>,
    pub(super) markets: BTreeMap<MarketId, Market>,
    pub(super) insurance: Option<Market>,
    pub(super) accounts: HashMap<AccountId, Account>,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) next_account_id: u64,
    pub(super) next_venue_id: u32,
    pub(super) current_time: Timestamp,
}

impl Engine {
    pub fn new(config: EngineConfig, risk: RiskParams) -> Self {
        Self {
            config,
            risk,
            oracles: OracleRegistry::new(),
            lp_oracle: None,
            markets: BTreeMap::new(),
            insurance: None,
            accounts: HashMap::new(),
            events: Vec::new(),
            next_event_id: 1,
            next_account_id: 1,
            next_venue_id: 0,
            current_time: Timestamp::from_millis(0),
        }
    }

    // ---- clock ----

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn advance_secs(&mut self, secs: i64) {
        self.current_time = self.current_time.plus_secs(secs);
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    // ---- accounts and funding boundary ----

    pub fn create_account(&mut self) -> AccountId {
        let id = AccountId(self.next_account_id);
        self.next_account_id += 1;
        self.accounts.insert(id, Account::new(id, self.current_time));
        id
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub(super) fn account_mut(&mut self, id: AccountId) -> Result<&mut Account, EngineError> {
        self.accounts
            .get_mut(&id)
            .ok_or(EngineError::AccountNotFound(id))
    }

    // dao wallets and keepers receive credits without ever having enrolled
    pub(super) fn ensure_account(&mut self, id: AccountId) -> &mut Account {
        let now = self.current_time;
        self.accounts.entry(id).or_insert_with(|| Account::new(id, now))
    }

    // external deposit of trading tokens onto the ledger
    pub fn fund_trading(&mut self, id: AccountId, amount: Quote) -> Result<(), EngineError> {
        let account = self.account_mut(id)?;
        account.credit_trading(amount);
        let new_balance = account.trading_balance;

        self.emit_event(EventPayload::Deposit(DepositEvent {
            account_id: id,
            amount,
            new_balance,
        }));
        Ok(())
    }

    // external deposit of LP tokens available to stake
    pub fn fund_staking(&mut self, id: AccountId, amount: Quote) -> Result<(), EngineError> {
        self.account_mut(id)?.credit_staking(amount);
        Ok(())
    }

    // ---- oracles ----

    // bootstrap-time registration of the LP valuation oracle
    pub fn register_lp_oracle(&mut self, config: OracleConfig) -> OracleId {
        let id = self.oracles.add(config, self.current_time);
        self.lp_oracle = Some(id);
        id
    }

    pub fn lp_price(&self) -> Result<Price, EngineError> {
        let id = self
            .lp_oracle
            .ok_or(EngineError::BadParams)?;
        Ok(self.oracles.price(id)?)
    }

    pub fn oracles(&self) -> &OracleRegistry {
        &self.oracles
    }

    // keeper upkeep: refresh one oracle's cached price and pay the keeper its fee
    pub fn perform_upkeep(
        &mut self,
        keeper: AccountId,
        oracle_id: OracleId,
        hint: &[u8],
    ) -> Result<Price, EngineError> {
        let now = self.current_time;
        let (price, reward) = self.oracles.refresh(oracle_id, hint, now)?;

        self.ensure_account(keeper).credit_trading(reward);
        self.emit_event(EventPayload::PriceRefreshed(PriceRefreshedEvent {
            oracle_id,
            price,
            keeper,
            keeper_reward: reward,
        }));
        Ok(price)
    }

    // ---- venues ----

    pub fn market(&self, id: MarketId) -> Option<&Market> {
        self.markets.get(&id)
    }

    // market or insurance, whichever carries the id
    pub fn venue(&self, id: MarketId) -> Option<&Market> {
        self.markets.get(&id).or(match &self.insurance {
            Some(ins) if ins.id == id => self.insurance.as_ref(),
            _ => None,
        })
    }

    pub(super) fn venue_mut(&mut self, id: MarketId) -> Result<&mut Market, EngineError> {
        if let Some(market) = self.markets.get_mut(&id) {
            return Ok(market);
        }
        match &mut self.insurance {
            Some(ins) if ins.id == id => Ok(ins),
            _ => Err(EngineError::MarketNotFound(id)),
        }
    }

    pub fn insurance(&self) -> Option<&Market> {
        self.insurance.as_ref()
    }

    // venue ids are shared between markets and the insurance fund so venue() lookups
    // stay unambiguous
    pub(super) fn alloc_venue_id(&mut self) -> MarketId {
        self.next_venue_id += 1;
        MarketId(self.next_venue_id)
    }

    pub fn markets_iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    // mark and oracle rate for one market
    pub fn get_prices(&self, market_id: MarketId) -> Result<(Price, Price), EngineError> {
        let market = self
            .market(market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let oracle_price = self.oracles.price(market.asset_oracle)?;
        Ok((market.mark_price, oracle_price))
    }

    pub fn positions_count(&self) -> usize {
        self.accounts
            .values()
            .map(|a| a.positions.len())
            .sum()
    }

    // ---- risk and config ----

    pub fn risk(&self) -> &RiskParams {
        &self.risk
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- event log ----

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::encode_price_hint;
    use rust_decimal_macros::dec;

    #[test]
    fn account_ids_are_sequential() {
        let mut engine = Engine::new(EngineConfig::default(), RiskParams::default());
        let a = engine.create_account();
        let b = engine.create_account();
        assert_eq!(a, AccountId(1));
        assert_eq!(b, AccountId(2));
    }

    #[test]
    fn upkeep_pays_the_keeper() {
        let mut engine = Engine::new(EngineConfig::default(), RiskParams::default());
        let keeper = engine.create_account();
        let oracle = engine.register_lp_oracle(OracleConfig {
            is_active: true,
            keeper_reward: Quote::new(dec!(22)),
        });

        let hint = encode_price_hint(Price::new_unchecked(dec!(1)));
        engine.perform_upkeep(keeper, oracle, &hint).unwrap();

        assert_eq!(engine.lp_price().unwrap().value(), dec!(1));
        assert_eq!(
            engine.account(keeper).unwrap().trading_balance.value(),
            dec!(22)
        );
    }

    #[test]
    fn event_log_is_bounded() {
        let mut engine = Engine::new(
            EngineConfig {
                max_events: 3,
                ..EngineConfig::default()
            },
            RiskParams::default(),
        );
        let a = engine.create_account();
        for _ in 0..10 {
            engine.fund_trading(a, Quote::new(dec!(1))).unwrap();
        }
        assert_eq!(engine.events().len(), 3);
    }
}
