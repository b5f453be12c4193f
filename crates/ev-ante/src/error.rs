use alloy_primitives::Address;
use ev_common::ErrorKind;
use ev_context::ContextError;
use ev_erc20::Erc20Error;
use ev_keepers::KeeperError;
use ev_primitives::CoinError;
use thiserror::Error;

/// Reasons a transaction is refused admission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnteError {
    /// Unexpected message type, or a sender that is not an externally owned account.
    #[error("invalid type: {0}")]
    InvalidType(String),
    /// Sender missing or inconsistent with the signature.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Sender account does not exist.
    #[error("account {0} does not exist")]
    UnknownAddress(Address),
    /// Balance does not cover value or fees.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    /// Fee below the base fee, or unpayable even after claiming rewards.
    #[error("insufficient fee: {0}")]
    InsufficientFee(String),
    /// Gas limit below the intrinsic gas or above the block gas limit.
    #[error("out of gas: {0}")]
    OutOfGas(String),
    /// Nonce does not match the account sequence.
    #[error("invalid nonce; got {got}, expected {expected}")]
    InvalidSequence {
        /// Nonce carried by the message.
        got: u64,
        /// Current account sequence.
        expected: u64,
    },
    /// Missing or refused authorization grant.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Message that this pipeline cannot process.
    #[error("unknown request: {0}")]
    UnknownRequest(String),
    /// A collaborator returned an impossible value.
    #[error("logic error: {0}")]
    Logic(String),
    /// Paying fees out of ERC20 balance failed.
    #[error("convert ERC20 token to SDK coin: denom {denom}: {source}")]
    FeeConversion {
        /// Fee denomination being converted.
        denom: String,
        /// Conversion failure.
        #[source]
        source: Erc20Error,
    },
    /// Malformed coin amounts.
    #[error(transparent)]
    Coins(#[from] CoinError),
    /// Ledger failure.
    #[error(transparent)]
    Keeper(KeeperError),
    /// Store encoding failure.
    #[error(transparent)]
    Store(#[from] ContextError),
}

impl AnteError {
    /// Classifies the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Logic(_) | Self::Store(_) | Self::Keeper(KeeperError::Store(_) | KeeperError::Overflow(_)) => {
                ErrorKind::LogicError
            }
            Self::FeeConversion { source, .. } => match source.kind() {
                ErrorKind::BalanceInvariance => ErrorKind::BalanceInvariance,
                _ => ErrorKind::RejectedTransaction,
            },
            _ => ErrorKind::RejectedTransaction,
        }
    }
}

impl From<KeeperError> for AnteError {
    fn from(err: KeeperError) -> Self {
        match err {
            KeeperError::InsufficientFunds(reason) => Self::InsufficientFunds(reason),
            KeeperError::UnknownAddress(address) => Self::UnknownAddress(address),
            other => Self::Keeper(other),
        }
    }
}
