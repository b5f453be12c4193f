//! Account registry entries.

use alloy_primitives::Address;
use ev_common::module_address;
use serde::{Deserialize, Serialize};

/// An account known to the account registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address.
    pub address: Address,
    /// Globally unique number assigned at creation.
    pub account_number: u64,
    /// Number of transactions sent from the account.
    pub sequence: u64,
    /// Set for module accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

impl Account {
    /// Creates a fresh base account.
    pub const fn new(address: Address, account_number: u64) -> Self {
        Self { address, account_number, sequence: 0, module_name: None }
    }

    /// Creates the account of the named module, located at [`module_address`].
    pub fn module(name: &str, account_number: u64) -> Self {
        Self {
            address: module_address(name),
            account_number,
            sequence: 0,
            module_name: Some(name.to_string()),
        }
    }

    /// Returns true for module accounts.
    pub const fn is_module_account(&self) -> bool {
        self.module_name.is_some()
    }
}
