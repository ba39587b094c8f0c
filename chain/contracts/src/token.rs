//! External transfer capabilities
//!
//! The exchange never holds token logic itself. Each registered token is a
//! [`TokenContract`] handle the exchange pulls deposits from and pushes
//! withdrawals through; ether payouts go over an [`EtherTransfer`] rail.
//!
//! [`FixedSupplyToken`] and [`EtherWallet`] are in-memory implementations
//! for embedding and tests.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use types::ids::Address;
use types::numeric::Amount;

use crate::errors::TransferError;

/// Fungible token contract, ERC-20 style
pub trait TokenContract: Send + Sync {
    /// Address the token is deployed at
    fn address(&self) -> &Address;

    fn balance_of(&self, holder: &Address) -> Amount;

    /// Amount `spender` may still pull from `holder`
    fn allowance(&self, holder: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `sender` to `recipient`
    fn transfer(
        &self,
        sender: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), TransferError>;

    /// Move `amount` from `holder` to `recipient` against the allowance
    /// `holder` granted `spender`
    fn transfer_from(
        &self,
        holder: &Address,
        spender: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), TransferError>;
}

/// Shared handle to a registered token
pub type TokenHandle = Arc<dyn TokenContract>;

/// Outbound ether rail
pub trait EtherTransfer: Send + Sync {
    /// Pay `amount` to `recipient`
    fn send(&self, recipient: &Address, amount: Amount) -> Result<(), TransferError>;
}

// ---------------------------------------------------------------------------
// Fixed-supply token
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TokenState {
    balances: BTreeMap<Address, Amount>,
    /// (holder, spender) -> approved amount
    allowances: BTreeMap<(Address, Address), Amount>,
}

impl TokenState {
    fn balance(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let available = self.balance(from);
        let debited = available
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientFunds {
                required: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;

        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

/// In-memory token whose whole supply is minted to one owner at creation
pub struct FixedSupplyToken {
    address: Address,
    total_supply: Amount,
    state: Mutex<TokenState>,
}

impl FixedSupplyToken {
    pub fn new(address: Address, owner: Address, total_supply: Amount) -> Self {
        let mut state = TokenState::default();
        state.balances.insert(owner, total_supply);
        Self {
            address,
            total_supply,
            state: Mutex::new(state),
        }
    }

    /// Create the token already wrapped in a handle
    pub fn shared(address: Address, owner: Address, total_supply: Amount) -> Arc<Self> {
        Arc::new(Self::new(address, owner, total_supply))
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Let `spender` pull up to `amount` from `holder`, replacing any
    /// previous approval
    pub fn approve(&self, holder: &Address, spender: &Address, amount: Amount) {
        self.state
            .lock()
            .allowances
            .insert((holder.clone(), spender.clone()), amount);
    }
}

impl fmt::Debug for FixedSupplyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedSupplyToken")
            .field("address", &self.address)
            .field("total_supply", &self.total_supply)
            .finish()
    }
}

impl TokenContract for FixedSupplyToken {
    fn address(&self) -> &Address {
        &self.address
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.state.lock().balance(holder)
    }

    fn allowance(&self, holder: &Address, spender: &Address) -> Amount {
        self.state
            .lock()
            .allowances
            .get(&(holder.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &self,
        sender: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.state.lock().move_balance(sender, recipient, amount)
    }

    fn transfer_from(
        &self,
        holder: &Address,
        spender: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let mut state = self.state.lock();
        let allowance_key = (holder.clone(), spender.clone());
        let approved = state.allowances.get(&allowance_key).copied().unwrap_or(0);
        let remaining = approved
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientAllowance {
                required: amount,
                approved,
            })?;

        state.move_balance(holder, recipient, amount)?;
        state.allowances.insert(allowance_key, remaining);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ether wallet
// ---------------------------------------------------------------------------

/// In-memory ether rail recording every payout
#[derive(Debug, Default)]
pub struct EtherWallet {
    received: Mutex<BTreeMap<Address, Amount>>,
}

impl EtherWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total ether paid out to `recipient` so far
    pub fn received(&self, recipient: &Address) -> Amount {
        self.received.lock().get(recipient).copied().unwrap_or(0)
    }
}

impl EtherTransfer for EtherWallet {
    fn send(&self, recipient: &Address, amount: Amount) -> Result<(), TransferError> {
        let mut received = self.received.lock();
        let total = received
            .get(recipient)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        received.insert(recipient.clone(), total);
        Ok(())
    }
}
