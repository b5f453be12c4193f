//! ERC20 token pairs.

use crate::coin::{validate_denom, CoinError};
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Which side controls the ERC20 contract of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    /// The contract was deployed by the erc20 module for a native coin.
    Module,
    /// The contract was deployed externally; the native coin is the wrapped form.
    External,
}

/// Binding between a native coin denomination and an ERC20 contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    /// ERC20 contract address.
    pub erc20_address: Address,
    /// Native coin denomination.
    pub denom: String,
    /// Whether conversions are allowed.
    pub enabled: bool,
    /// Owner of the ERC20 contract.
    pub contract_owner: Owner,
}

impl TokenPair {
    /// Creates an enabled pair.
    pub fn new(erc20_address: Address, denom: impl Into<String>, contract_owner: Owner) -> Self {
        Self { erc20_address, denom: denom.into(), enabled: true, contract_owner }
    }

    /// Stable identifier: `sha256("<checksummed erc20>|<denom>")`.
    pub fn id(&self) -> B256 {
        let preimage = format!("{}|{}", self.erc20_address.to_checksum(None), self.denom);
        B256::from_slice(&Sha256::digest(preimage.as_bytes()))
    }

    /// The native coin is the original asset and the contract is module owned.
    pub fn is_native_coin(&self) -> bool {
        self.contract_owner == Owner::Module
    }

    /// The ERC20 contract is the original asset.
    pub fn is_native_erc20(&self) -> bool {
        self.contract_owner == Owner::External
    }

    /// Checks the denomination format.
    pub fn validate(&self) -> Result<(), CoinError> {
        validate_denom(&self.denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn id_depends_on_both_sides() {
        let erc20 = address!("0x80b5a32E4F032B2a058b4F29EC95EEfEEB87aDcd");
        let pair = TokenPair::new(erc20, "aevmos", Owner::Module);
        assert_eq!(pair.id(), TokenPair::new(erc20, "aevmos", Owner::External).id());
        assert_ne!(pair.id(), TokenPair::new(erc20, "uatom", Owner::Module).id());
        assert!(pair.enabled);
        assert!(pair.is_native_coin());
    }
}
