use alloy_primitives::Address;
use thiserror::Error;

/// Errors raised while assembling the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two contracts share an address.
    #[error("precompiled contract already registered at {0}")]
    DuplicateAddress(Address),
    /// A contract declares the same selector twice.
    #[error("contract {contract} declares selector 0x{selector} more than once")]
    DuplicateSelector {
        /// Contract name.
        contract: String,
        /// Hex encoded selector.
        selector: String,
    },
    /// A contract exposes a method allowed to write state.
    #[error("contract {contract} exposes writable method 0x{selector}; only read-only methods are supported")]
    WritableMethod {
        /// Contract name.
        contract: String,
        /// Hex encoded selector.
        selector: String,
    },
}

/// Errors returned to the EVM by a precompiled contract call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrecompileCallError {
    /// The input does not hold a selector.
    #[error("invalid call input, minimum 4 bytes required, got {0}")]
    ShortInput(usize),
    /// No method of the contract has this selector.
    #[error("unknown method selector 0x{0}")]
    UnknownSelector(String),
    /// The call does not carry enough gas for the method.
    #[error("out of gas: method requires {required}, {available} available")]
    OutOfGas {
        /// Fixed cost of the method.
        required: u64,
        /// Gas passed with the call.
        available: u64,
    },
    /// Arguments could not be ABI decoded.
    #[error("failed to decode method input: {0}")]
    Abi(String),
}

impl From<alloy_sol_types::Error> for PrecompileCallError {
    fn from(err: alloy_sol_types::Error) -> Self {
        Self::Abi(err.to_string())
    }
}
