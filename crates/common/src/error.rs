//! Failure taxonomy shared by the module crates.

use std::fmt;

/// Coarse classification of a failure, used by callers to decide how to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The transaction or message is invalid; nothing was written.
    RejectedTransaction,
    /// A collaborator returned something that should be impossible.
    LogicError,
    /// A ledger did not move by exactly the expected amount.
    BalanceInvariance,
    /// Unrecoverable. Raised as a panic, never returned as an error value.
    FatalAbort,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RejectedTransaction => "rejected transaction",
            Self::LogicError => "logic error",
            Self::BalanceInvariance => "balance invariance",
            Self::FatalAbort => "fatal abort",
        };
        f.write_str(name)
    }
}
