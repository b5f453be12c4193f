use alloy_primitives::Address;
use ev_context::ContextError;
use ev_primitives::CoinError;
use thiserror::Error;

/// Errors returned by ledger keepers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeeperError {
    /// Spendable balance does not cover the amount.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    /// No account exists at the address.
    #[error("account {0} does not exist")]
    UnknownAddress(Address),
    /// The named module account was never created.
    #[error("module account {0} does not exist")]
    UnknownModule(String),
    /// The address may not receive funds.
    #[error("{0} is not allowed to receive funds")]
    BlockedAddress(Address),
    /// Invalid coin set.
    #[error(transparent)]
    Coins(#[from] CoinError),
    /// Stored state could not be decoded.
    #[error(transparent)]
    Store(#[from] ContextError),
    /// Nothing is delegated to the validator.
    #[error("no delegation from {delegator} to {validator}")]
    NoDelegation {
        /// Delegator address.
        delegator: Address,
        /// Validator operator address.
        validator: Address,
    },
    /// A counter overflowed.
    #[error("{0} overflow")]
    Overflow(String),
    /// An EVM call reverted or could not be executed.
    #[error("evm call failed: {0}")]
    EvmCall(String),
}
