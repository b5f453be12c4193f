use alloy_primitives::{Address, U256};
use ev_common::{Bech32Error, ErrorKind};
use ev_context::ContextError;
use ev_keepers::KeeperError;
use ev_primitives::{CoinError, IbcError};
use thiserror::Error;

/// Errors returned by the erc20 keeper and its IBC callbacks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Erc20Error {
    /// Conversions are switched off module wide.
    #[error("erc20 module is disabled")]
    ModuleDisabled,
    /// No pair is registered for the denomination or contract.
    #[error("token pair not found: {0}")]
    TokenPairNotFound(String),
    /// The pair exists but its conversions are switched off.
    #[error("token pair for {0} is disabled")]
    TokenPairDisabled(String),
    /// The denomination or contract already belongs to a pair.
    #[error("token pair already registered: {0}")]
    TokenPairAlreadyExists(String),
    /// The receiver is a blocked module account.
    #[error("{0} is not allowed to receive transactions")]
    BlockedAddress(Address),
    /// The ERC20 balance does not cover the conversion.
    #[error("token balance {balance} < required amount {required}")]
    InsufficientTokenBalance {
        /// Current token balance.
        balance: U256,
        /// Amount to convert.
        required: U256,
    },
    /// A ledger did not move by exactly the converted amount.
    #[error("balance invariance: {0}")]
    BalanceInvariance(String),
    /// A token contract call reverted.
    #[error("evm call failed: {0}")]
    EvmCall(String),
    /// A bech32 address in packet data could not be decoded.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] Bech32Error),
    /// Acknowledgement or packet data could not be parsed.
    #[error("unknown request: {0}")]
    UnknownRequest(String),
    /// A required module account does not exist.
    #[error("the {0} module account has not been set")]
    MissingModuleAccount(String),
    /// Genesis state failed validation.
    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),
    #[error(transparent)]
    Coins(#[from] CoinError),
    #[error(transparent)]
    Ibc(#[from] IbcError),
    #[error(transparent)]
    Keeper(KeeperError),
    #[error(transparent)]
    Store(#[from] ContextError),
}

impl Erc20Error {
    /// Classifies the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BalanceInvariance(_) => ErrorKind::BalanceInvariance,
            Self::MissingModuleAccount(_) | Self::InvalidGenesis(_) | Self::Store(_) => {
                ErrorKind::LogicError
            }
            Self::Keeper(err) => match err {
                KeeperError::Store(_) | KeeperError::Overflow(_) => ErrorKind::LogicError,
                _ => ErrorKind::RejectedTransaction,
            },
            _ => ErrorKind::RejectedTransaction,
        }
    }
}

impl From<KeeperError> for Erc20Error {
    fn from(err: KeeperError) -> Self {
        match err {
            KeeperError::EvmCall(reason) => Self::EvmCall(reason),
            KeeperError::BlockedAddress(address) => Self::BlockedAddress(address),
            other => Self::Keeper(other),
        }
    }
}
