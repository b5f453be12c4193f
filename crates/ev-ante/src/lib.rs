//! Admission pipeline for Ethereum transactions.
//!
//! A transaction is admitted by running it through an ordered chain of [`AnteDecorator`]s.
//! Each stage inspects the transaction against a [`Context`](ev_context::Context), may write
//! to it, and either rejects or hands over to the next stage. [`HandlerOptions`] assembles the
//! default chain:
//!
//! 1. [`EthSetUpContextDecorator`]
//! 2. [`EthAccountVerificationDecorator`]
//! 3. [`EthAuthorizationDecorator`]
//! 4. [`CanTransferDecorator`]
//! 5. [`EthGasConsumeDecorator`]
//! 6. [`EthIncrementSenderSequenceDecorator`]
//! 7. [`GasWantedDecorator`]

mod authz;
mod error;
mod evm;
mod handler;
mod interfaces;
mod options;
pub mod utils;

pub use authz::EthAuthorizationDecorator;
pub use error::AnteError;
pub use evm::{
    intrinsic_gas, tx_priority, verify_fee, CanTransferDecorator, EthAccountVerificationDecorator,
    EthGasConsumeDecorator, EthIncrementSenderSequenceDecorator, EthSetUpContextDecorator,
    GasWantedDecorator, ATTRIBUTE_KEY_FEE, EVENT_TYPE_TX,
};
pub use handler::{AnteDecorator, AnteHandler, Next};
pub use interfaces::Erc20Keeper;
pub use options::{HandlerOptions, HandlerOptionsError};
