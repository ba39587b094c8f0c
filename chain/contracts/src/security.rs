//! Access control for privileged operations
//!
//! The exchange has a single owner. Only the owner may register tokens or
//! hand ownership to another address.

use tracing::info;
use types::errors::ExchangeError;
use types::ids::Address;

/// Single-owner access control
#[derive(Debug, Clone)]
pub struct AccessControl {
    admin: Address,
}

impl AccessControl {
    /// Create access control with an initial admin.
    pub fn new(admin: Address) -> Self {
        Self { admin }
    }

    /// Check if a caller is admin.
    pub fn is_admin(&self, caller: &Address) -> bool {
        self.admin == *caller
    }

    /// Fail with `Unauthorized` unless `caller` is admin
    pub fn require_admin(&self, caller: &Address) -> Result<(), ExchangeError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(ExchangeError::Unauthorized {
                caller: caller.to_string(),
            })
        }
    }

    /// Transfer admin to a new address.
    pub fn transfer_admin(
        &mut self,
        caller: &Address,
        new_admin: Address,
    ) -> Result<(), ExchangeError> {
        self.require_admin(caller)?;
        info!(from = %self.admin, to = %new_admin, "Ownership transferred");
        self.admin = new_admin;
        Ok(())
    }

    /// Get the current admin.
    pub fn admin(&self) -> &Address {
        &self.admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_control_admin() {
        let ac = AccessControl::new(Address::new("owner"));
        assert!(ac.is_admin(&Address::new("owner")));
        assert!(!ac.is_admin(&Address::new("bob")));
    }

    #[test]
    fn test_require_admin_rejects_others() {
        let ac = AccessControl::new(Address::new("owner"));
        let result = ac.require_admin(&Address::new("bob"));
        assert_eq!(
            result,
            Err(ExchangeError::Unauthorized {
                caller: "bob".to_string()
            })
        );
    }

    #[test]
    fn test_access_control_transfer_admin() {
        let mut ac = AccessControl::new(Address::new("owner"));
        ac.transfer_admin(&Address::new("owner"), Address::new("bob"))
            .unwrap();
        assert!(ac.is_admin(&Address::new("bob")));
        assert!(!ac.is_admin(&Address::new("owner")));
        assert_eq!(ac.admin().as_str(), "bob");
    }

    #[test]
    fn test_non_admin_cannot_transfer() {
        let mut ac = AccessControl::new(Address::new("owner"));
        assert!(ac
            .transfer_admin(&Address::new("bob"), Address::new("bob"))
            .is_err());
        assert_eq!(ac.admin().as_str(), "owner");
    }
}
