//! Exchange — the public operation surface
//!
//! Owns every piece of state (ledger, token registry, order books, access
//! control, event log). Each operation takes `&mut self` and the caller's
//! address explicitly, runs to completion, and either appends its events
//! or fails leaving state and log untouched.
//!
//! External transfers:
//! - token deposits stage the credit, pull with `transfer_from`, then commit
//! - withdrawals commit the debit, push, and roll back if the push fails

use std::sync::Arc;
use tracing::{debug, info, warn};
use types::errors::ExchangeError;
use types::ids::{Address, OrderKey, Symbol};
use types::numeric::{Amount, Price, Volume};
use types::order::{Order, OrderResult, Side};

use matching_engine::{BookSnapshot, MarketBook};

use crate::commitment;
use crate::config::ExchangeConfig;
use crate::engine::MatchingEngine;
use crate::events::ExchangeEvent;
use crate::ledger::{Asset, Ledger};
use crate::registry::TokenRegistry;
use crate::security::AccessControl;
use crate::token::{EtherTransfer, EtherWallet, TokenContract, TokenHandle};

/// Custodial exchange core
pub struct Exchange {
    config: ExchangeConfig,
    access_control: AccessControl,
    registry: TokenRegistry,
    ledger: Ledger,
    engine: MatchingEngine,
    ether_rail: Arc<dyn EtherTransfer>,
    /// Emitted events log (append-only)
    events: Vec<ExchangeEvent>,
}

impl Exchange {
    /// Create an exchange with the given configuration.
    pub fn new(config: ExchangeConfig) -> Self {
        info!(
            admin = %config.admin,
            custody_address = %config.custody_address,
            starting_sequence = config.starting_sequence,
            emit_fill_events = config.emit_fill_events,
            "Exchange initialized"
        );

        Self {
            access_control: AccessControl::new(config.admin.clone()),
            registry: TokenRegistry::new(),
            ledger: Ledger::new(),
            engine: MatchingEngine::new(config.starting_sequence, config.emit_fill_events),
            ether_rail: Arc::new(EtherWallet::new()),
            events: Vec::new(),
            config,
        }
    }

    /// Create an exchange with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExchangeConfig::default())
    }

    /// Replace the rail ether withdrawals are paid out over
    pub fn with_ether_rail(mut self, rail: Arc<dyn EtherTransfer>) -> Self {
        self.ether_rail = rail;
        self
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    // ───────────────────────── Tokens ─────────────────────────

    /// Register a token under `symbol`. Owner-only.
    pub fn register_token(
        &mut self,
        caller: &Address,
        symbol: &str,
        handle: TokenHandle,
    ) -> Result<(), ExchangeError> {
        self.access_control.require_admin(caller)?;
        let symbol = Symbol::try_new(symbol).ok_or_else(|| ExchangeError::InvalidSymbol {
            symbol: symbol.to_string(),
        })?;

        let token = handle.address().clone();
        self.registry.register(symbol.clone(), handle)?;
        self.engine.open_market(&symbol);

        info!(symbol = %symbol, token = %token, "Token registered");
        self.events
            .push(ExchangeEvent::TokenRegistered { symbol, token });
        Ok(())
    }

    pub fn has_token(&self, symbol: &str) -> bool {
        Symbol::try_new(symbol).is_some_and(|s| self.registry.has(&s))
    }

    /// Hand registration rights to `new_admin`. Owner-only.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_admin: Address,
    ) -> Result<(), ExchangeError> {
        self.access_control.transfer_admin(caller, new_admin)
    }

    pub fn owner(&self) -> &Address {
        self.access_control.admin()
    }

    // ───────────────────────── Ether ─────────────────────────

    /// Credit ether attached to the call
    pub fn deposit_ether(&mut self, caller: &Address, amount: Amount) -> Result<(), ExchangeError> {
        self.require_external(caller)?;
        require_positive(amount)?;

        let mut batch = self.ledger.batch();
        batch.deposit(caller, &Asset::Ether, amount)?;
        let writes = batch.finish();
        self.ledger.commit(writes);

        debug!(account = %caller, amount, "Ether deposited");
        self.events.push(ExchangeEvent::EtherDeposited {
            account: caller.clone(),
            amount,
        });
        Ok(())
    }

    pub fn withdraw_ether(&mut self, caller: &Address, amount: Amount) -> Result<(), ExchangeError> {
        self.require_external(caller)?;
        require_positive(amount)?;

        let mut batch = self.ledger.batch();
        batch.withdraw(caller, &Asset::Ether, amount)?;
        let writes = batch.finish();
        let undo = self.ledger.commit(writes);

        if let Err(e) = self.ether_rail.send(caller, amount) {
            self.ledger.rollback(undo);
            warn!(account = %caller, amount, error = %e, "Ether payout failed, withdrawal rolled back");
            return Err(e.into_failed());
        }

        debug!(account = %caller, amount, "Ether withdrawn");
        self.events.push(ExchangeEvent::EtherWithdrawn {
            account: caller.clone(),
            amount,
        });
        Ok(())
    }

    // ───────────────────────── Tokens in custody ─────────────────────────

    /// Pull `amount` tokens from the caller and credit them.
    ///
    /// The caller must have approved the custody address for at least
    /// `amount` on the token contract.
    pub fn deposit_token(
        &mut self,
        caller: &Address,
        symbol: &str,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.require_external(caller)?;
        require_positive(amount)?;
        let symbol = self.known_symbol(symbol)?;
        let handle = self.registry.resolve(&symbol)?;

        let mut batch = self.ledger.batch();
        batch.deposit(caller, &Asset::Token(symbol.clone()), amount)?;
        let writes = batch.finish();

        let custody = &self.config.custody_address;
        if let Err(e) = handle.transfer_from(caller, custody, custody, amount) {
            warn!(symbol = %symbol, account = %caller, amount, error = %e, "Token pull rejected");
            return Err(e.into_authorization());
        }
        self.ledger.commit(writes);

        debug!(symbol = %symbol, account = %caller, amount, "Token deposited");
        self.events.push(ExchangeEvent::TokenDeposited {
            symbol,
            account: caller.clone(),
            amount,
        });
        Ok(())
    }

    pub fn withdraw_token(
        &mut self,
        caller: &Address,
        symbol: &str,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.require_external(caller)?;
        require_positive(amount)?;
        let symbol = self.known_symbol(symbol)?;
        let handle = self.registry.resolve(&symbol)?.clone();

        let mut batch = self.ledger.batch();
        batch.withdraw(caller, &Asset::Token(symbol.clone()), amount)?;
        let writes = batch.finish();
        let undo = self.ledger.commit(writes);

        if let Err(e) = handle.transfer(&self.config.custody_address, caller, amount) {
            self.ledger.rollback(undo);
            warn!(symbol = %symbol, account = %caller, amount, error = %e, "Token push failed, withdrawal rolled back");
            return Err(e.into_failed());
        }

        debug!(symbol = %symbol, account = %caller, amount, "Token withdrawn");
        self.events.push(ExchangeEvent::TokenWithdrawn {
            symbol,
            account: caller.clone(),
            amount,
        });
        Ok(())
    }

    // ───────────────────────── Trading ─────────────────────────

    /// Buy up to `volume` tokens paying at most `price` ether per token
    pub fn buy(
        &mut self,
        caller: &Address,
        symbol: &str,
        price: Price,
        volume: Volume,
    ) -> Result<OrderResult, ExchangeError> {
        self.submit(caller, symbol, Side::Buy, price, volume)
    }

    /// Sell up to `volume` tokens receiving at least `price` ether per token
    pub fn sell(
        &mut self,
        caller: &Address,
        symbol: &str,
        price: Price,
        volume: Volume,
    ) -> Result<OrderResult, ExchangeError> {
        self.submit(caller, symbol, Side::Sell, price, volume)
    }

    fn submit(
        &mut self,
        caller: &Address,
        symbol: &str,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Result<OrderResult, ExchangeError> {
        self.require_external(caller)?;
        let symbol = self.known_symbol(symbol)?;
        let (result, events) =
            self.engine
                .submit(&mut self.ledger, caller, &symbol, side, price, volume)?;
        self.events.extend(events);
        Ok(result)
    }

    /// Cancel the caller's resting order `key` on the named side at `price`
    pub fn cancel_order(
        &mut self,
        caller: &Address,
        symbol: &str,
        is_sell: bool,
        price: Price,
        key: &OrderKey,
    ) -> Result<(), ExchangeError> {
        let symbol = self.known_symbol(symbol)?;
        let event = self.engine.cancel(
            &mut self.ledger,
            caller,
            &symbol,
            Side::from_is_sell(is_sell),
            price,
            key,
        )?;
        self.events.push(event);
        Ok(())
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Every buy slot in insertion order, tombstones included
    pub fn buy_order_book(&self, symbol: &str) -> Result<BookSnapshot, ExchangeError> {
        Ok(self.market(symbol)?.book(Side::Buy).snapshot())
    }

    /// Every sell slot in insertion order, tombstones included
    pub fn sell_order_book(&self, symbol: &str) -> Result<BookSnapshot, ExchangeError> {
        Ok(self.market(symbol)?.book(Side::Sell).snapshot())
    }

    /// Live volume per price level, best price first
    pub fn depth(&self, symbol: &str, side: Side) -> Result<Vec<(Price, Volume)>, ExchangeError> {
        Ok(self.market(symbol)?.book(side).depth())
    }

    /// Look up a resting or tombstoned order by key
    pub fn order(&self, symbol: &str, key: &OrderKey) -> Result<Option<&Order>, ExchangeError> {
        Ok(self.market(symbol)?.order(key))
    }

    /// Available ether
    pub fn ether_balance(&self, account: &Address) -> Amount {
        self.ledger.available(account, &Asset::Ether)
    }

    /// Available tokens
    pub fn token_balance(&self, symbol: &str, account: &Address) -> Result<Amount, ExchangeError> {
        let symbol = self.known_symbol(symbol)?;
        Ok(self.ledger.available(account, &Asset::Token(symbol)))
    }

    /// Ether escrowed by the account's resting buys
    pub fn reserved_ether(&self, account: &Address) -> Amount {
        self.ledger.reserved(account, &Asset::Ether)
    }

    /// Tokens escrowed by the account's resting sells
    pub fn reserved_token(&self, symbol: &str, account: &Address) -> Result<Amount, ExchangeError> {
        let symbol = self.known_symbol(symbol)?;
        Ok(self.ledger.reserved(account, &Asset::Token(symbol)))
    }

    /// Total of `asset` held in custody across all accounts
    pub fn custody_total(&self, asset: &Asset) -> Amount {
        self.ledger.custody_total(asset)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    /// Digest of the full exchange state
    pub fn state_root(&self) -> [u8; 32] {
        commitment::state_root(&self.ledger, &self.registry, self.engine.markets())
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[ExchangeEvent] {
        &self.events
    }

    /// Drain all events (for processing).
    pub fn drain_events(&mut self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal ─────────────────────────

    /// The custody address holds everyone's funds and cannot act as an account
    fn require_external(&self, caller: &Address) -> Result<(), ExchangeError> {
        if *caller == self.config.custody_address {
            warn!(caller = %caller, "Custody address rejected as account");
            return Err(ExchangeError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Parse a symbol that must be registered
    fn known_symbol(&self, symbol: &str) -> Result<Symbol, ExchangeError> {
        Symbol::try_new(symbol)
            .filter(|s| self.registry.has(s))
            .ok_or_else(|| ExchangeError::UnknownToken {
                symbol: symbol.to_string(),
            })
    }

    fn market(&self, symbol: &str) -> Result<&MarketBook, ExchangeError> {
        let symbol = self.known_symbol(symbol)?;
        self.engine
            .markets()
            .get(&symbol)
            .ok_or_else(|| ExchangeError::UnknownToken {
                symbol: symbol.to_string(),
            })
    }
}

fn require_positive(amount: Amount) -> Result<(), ExchangeError> {
    if amount == 0 {
        return Err(ExchangeError::InvalidAmount);
    }
    Ok(())
}
