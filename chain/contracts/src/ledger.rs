//! Ledger — custodial balances with explicit reservations
//!
//! Every account holds, per asset, an `available` amount it may spend or
//! withdraw and a `reserved` amount escrowed by its resting orders. The
//! ledger also tracks the custody total per asset: everything moved in by
//! deposits minus everything moved out by withdrawals. Trading only moves
//! value between accounts, so the custody total always equals the sum of
//! all account balances, and no single balance can exceed it.
//!
//! Mutations are staged in a [`LedgerBatch`], a write-set that reads
//! through to the committed state. A batch that hits any error is simply
//! dropped; a finished batch is applied with [`Ledger::commit`], which
//! returns an [`Undo`] record restoring the exact prior state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use types::errors::ExchangeError;
use types::ids::{Address, Symbol};
use types::numeric::Amount;

/// Asset held in custody
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Asset {
    /// Base settlement asset
    Ether,
    /// Registered fungible token
    Token(Symbol),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Ether => write!(f, "ether"),
            Asset::Token(symbol) => write!(f, "{symbol}"),
        }
    }
}

/// Per-account, per-asset balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Spendable and withdrawable
    pub available: Amount,
    /// Escrowed by resting orders
    pub reserved: Amount,
}

impl Balance {
    pub fn is_zero(&self) -> bool {
        self.available == 0 && self.reserved == 0
    }

    /// Available plus reserved, `None` on overflow
    pub fn total(&self) -> Option<Amount> {
        self.available.checked_add(self.reserved)
    }
}

/// Committed balance store
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Balances: account -> (asset -> balance). Zero balances are not stored.
    balances: BTreeMap<Address, BTreeMap<Asset, Balance>>,
    /// Custody totals per asset. Zero totals are not stored.
    custody: BTreeMap<Asset, Amount>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Get the balance for a specific account and asset.
    pub fn balance(&self, account: &Address, asset: &Asset) -> Balance {
        self.balances
            .get(account)
            .and_then(|assets| assets.get(asset))
            .copied()
            .unwrap_or_default()
    }

    pub fn available(&self, account: &Address, asset: &Asset) -> Amount {
        self.balance(account, asset).available
    }

    pub fn reserved(&self, account: &Address, asset: &Asset) -> Amount {
        self.balance(account, asset).reserved
    }

    /// Get all non-zero balances for an account.
    pub fn account_balances(&self, account: &Address) -> Option<&BTreeMap<Asset, Balance>> {
        self.balances.get(account)
    }

    /// Every account with a non-zero balance, in address order
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &BTreeMap<Asset, Balance>)> {
        self.balances.iter()
    }

    /// Total of `asset` held in custody
    pub fn custody_total(&self, asset: &Asset) -> Amount {
        self.custody.get(asset).copied().unwrap_or(0)
    }

    /// Non-zero custody totals, in asset order
    pub fn custody_totals(&self) -> impl Iterator<Item = (&Asset, &Amount)> {
        self.custody.iter()
    }

    /// Sum of available + reserved over all accounts, `None` on overflow.
    ///
    /// Always equals [`Ledger::custody_total`]; exposed for invariant checks.
    pub fn sum_of_balances(&self, asset: &Asset) -> Option<Amount> {
        self.balances
            .values()
            .filter_map(|assets| assets.get(asset))
            .try_fold(0u128, |acc, b| acc.checked_add(b.total()?))
    }

    // ───────────────────────── Staging ─────────────────────────

    /// Start a batch of mutations over the current state
    pub(crate) fn batch(&self) -> LedgerBatch<'_> {
        LedgerBatch {
            ledger: self,
            balances: BTreeMap::new(),
            custody: BTreeMap::new(),
        }
    }

    /// Apply a finished batch. Cannot fail; every check ran while staging.
    pub(crate) fn commit(&mut self, writes: PendingWrites) -> Undo {
        let mut undo = Undo::default();

        for ((account, asset), balance) in writes.balances {
            let prior = self.balance(&account, &asset);
            self.set_balance(&account, &asset, balance);
            undo.balances.push(((account, asset), prior));
        }
        for (asset, total) in writes.custody {
            let prior = self.custody_total(&asset);
            self.set_custody(&asset, total);
            undo.custody.push((asset, prior));
        }
        undo
    }

    /// Restore the state captured by `undo`
    pub(crate) fn rollback(&mut self, undo: Undo) {
        for ((account, asset), balance) in undo.balances {
            self.set_balance(&account, &asset, balance);
        }
        for (asset, total) in undo.custody {
            self.set_custody(&asset, total);
        }
    }

    fn set_balance(&mut self, account: &Address, asset: &Asset, balance: Balance) {
        if balance.is_zero() {
            if let Some(assets) = self.balances.get_mut(account) {
                assets.remove(asset);
                if assets.is_empty() {
                    self.balances.remove(account);
                }
            }
        } else {
            self.balances
                .entry(account.clone())
                .or_default()
                .insert(asset.clone(), balance);
        }
    }

    fn set_custody(&mut self, asset: &Asset, total: Amount) {
        if total == 0 {
            self.custody.remove(asset);
        } else {
            self.custody.insert(asset.clone(), total);
        }
    }
}

/// Staged balance writes, ready to commit
#[derive(Debug, Default)]
pub(crate) struct PendingWrites {
    balances: BTreeMap<(Address, Asset), Balance>,
    custody: BTreeMap<Asset, Amount>,
}

/// Prior values overwritten by a commit
#[derive(Debug, Default)]
pub(crate) struct Undo {
    balances: Vec<((Address, Asset), Balance)>,
    custody: Vec<(Asset, Amount)>,
}

/// Write-set over a committed ledger
///
/// Reads see this batch's own writes first. All arithmetic is checked;
/// an error leaves the batch in an unspecified state and it must be
/// dropped.
pub(crate) struct LedgerBatch<'a> {
    ledger: &'a Ledger,
    balances: BTreeMap<(Address, Asset), Balance>,
    custody: BTreeMap<Asset, Amount>,
}

impl<'a> LedgerBatch<'a> {
    pub(crate) fn balance(&self, account: &Address, asset: &Asset) -> Balance {
        self.balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or_else(|| self.ledger.balance(account, asset))
    }

    fn custody_total(&self, asset: &Asset) -> Amount {
        self.custody
            .get(asset)
            .copied()
            .unwrap_or_else(|| self.ledger.custody_total(asset))
    }

    fn update(
        &mut self,
        account: &Address,
        asset: &Asset,
        f: impl FnOnce(Balance) -> Result<Balance, ExchangeError>,
    ) -> Result<(), ExchangeError> {
        let next = f(self.balance(account, asset))?;
        self.balances.insert((account.clone(), asset.clone()), next);
        Ok(())
    }

    /// External funds entering custody, credited as available
    pub(crate) fn deposit(
        &mut self,
        account: &Address,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        let total = self
            .custody_total(asset)
            .checked_add(amount)
            .ok_or_else(|| ExchangeError::arithmetic(format!("{asset} custody total")))?;
        self.credit(account, asset, amount)?;
        self.custody.insert(asset.clone(), total);
        Ok(())
    }

    /// Available funds leaving custody
    pub(crate) fn withdraw(
        &mut self,
        account: &Address,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.debit(account, asset, amount)?;
        let total = self
            .custody_total(asset)
            .checked_sub(amount)
            .ok_or_else(|| ExchangeError::arithmetic(format!("{asset} custody total")))?;
        self.custody.insert(asset.clone(), total);
        Ok(())
    }

    /// Add to the available balance
    pub(crate) fn credit(
        &mut self,
        account: &Address,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.update(account, asset, |mut b| {
            b.available = b
                .available
                .checked_add(amount)
                .ok_or_else(|| ExchangeError::arithmetic(format!("{asset} balance credit")))?;
            Ok(b)
        })
    }

    /// Remove from the available balance
    pub(crate) fn debit(
        &mut self,
        account: &Address,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.update(account, asset, |mut b| {
            b.available = b
                .available
                .checked_sub(amount)
                .ok_or_else(|| ExchangeError::insufficient(asset, amount, b.available))?;
            Ok(b)
        })
    }

    /// Move funds from available into escrow
    pub(crate) fn reserve(
        &mut self,
        account: &Address,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.update(account, asset, |mut b| {
            b.available = b
                .available
                .checked_sub(amount)
                .ok_or_else(|| ExchangeError::insufficient(asset, amount, b.available))?;
            b.reserved = b
                .reserved
                .checked_add(amount)
                .ok_or_else(|| ExchangeError::arithmetic(format!("{asset} reservation")))?;
            Ok(b)
        })
    }

    /// Return escrowed funds to available
    pub(crate) fn release(
        &mut self,
        account: &Address,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.update(account, asset, |mut b| {
            b.reserved = b
                .reserved
                .checked_sub(amount)
                .ok_or_else(|| ExchangeError::arithmetic(format!("{asset} release")))?;
            b.available = b
                .available
                .checked_add(amount)
                .ok_or_else(|| ExchangeError::arithmetic(format!("{asset} release")))?;
            Ok(b)
        })
    }

    /// Consume escrowed funds handed to a counterparty
    pub(crate) fn settle_reserved(
        &mut self,
        account: &Address,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.update(account, asset, |mut b| {
            b.reserved = b
                .reserved
                .checked_sub(amount)
                .ok_or_else(|| ExchangeError::arithmetic(format!("{asset} settlement")))?;
            Ok(b)
        })
    }

    pub(crate) fn finish(self) -> PendingWrites {
        PendingWrites {
            balances: self.balances,
            custody: self.custody,
        }
    }
}
