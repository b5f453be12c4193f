//! Capability contracts of the ledgers the ev-cosmos modules depend on.
//!
//! The admission pipeline, the conversion engine and the IBC middleware never see concrete
//! ledger implementations; they are handed `Arc<dyn ...Keeper>` values implementing the narrow
//! traits below. All state is read from and written to the [`Context`](ev_context::Context)
//! passed in, so cached branches and rollbacks apply uniformly.
//!
//! The `test-utils` feature exposes [`memory`], a set of in-memory keepers backed by the
//! context store.

mod error;
mod evm;
mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use error::KeeperError;
pub use evm::{ChainConfig, EvmAccount, EvmParams, EMPTY_CODE_HASH};
pub use traits::{
    AccountKeeper, AuthzKeeper, BankKeeper, Delegation, DistributionKeeper, EvmKeeper,
    FeeMarketKeeper, StakingKeeper,
};
