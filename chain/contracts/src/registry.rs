//! Token registry — symbol to contract handle
//!
//! Registrations are permanent. A `BTreeMap` keeps symbol iteration order
//! stable for commitments and listings.

use std::collections::BTreeMap;
use std::fmt;
use types::errors::ExchangeError;
use types::ids::{Address, Symbol};

use crate::token::{TokenContract, TokenHandle};

#[derive(Default, Clone)]
pub struct TokenRegistry {
    tokens: BTreeMap<Symbol, TokenHandle>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `symbol`.
    ///
    /// Fails with `DuplicateSymbol` if the symbol is taken.
    pub fn register(&mut self, symbol: Symbol, handle: TokenHandle) -> Result<(), ExchangeError> {
        if self.tokens.contains_key(&symbol) {
            return Err(ExchangeError::DuplicateSymbol {
                symbol: symbol.to_string(),
            });
        }
        self.tokens.insert(symbol, handle);
        Ok(())
    }

    pub fn resolve(&self, symbol: &Symbol) -> Result<&TokenHandle, ExchangeError> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| ExchangeError::UnknownToken {
                symbol: symbol.to_string(),
            })
    }

    pub fn has(&self, symbol: &Symbol) -> bool {
        self.tokens.contains_key(symbol)
    }

    /// Registered symbols in order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.tokens.keys()
    }

    /// Symbol and token address of every registration, in symbol order
    pub fn entries(&self) -> impl Iterator<Item = (&Symbol, &Address)> {
        self.tokens.iter().map(|(symbol, handle)| (symbol, handle.address()))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}
