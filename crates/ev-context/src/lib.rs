//! Execution context shared by the admission pipeline, the conversion engine and the
//! precompiles.
//!
//! A [`Context`] bundles a copy-on-write KV store, the transaction gas meter, block metadata
//! and the event log. Speculative work runs on a [`Context::branch`] that is merged back with
//! [`Context::commit`] (or scoped through [`Context::with_cache`]) only once it succeeded.

mod context;
mod events;
mod gas;
mod store;

pub use context::{BlockHeader, Context, ContextError};
pub use events::Event;
pub use gas::{recover_out_of_gas, Gas, GasMeter, KvGasConfig, OutOfGas};
pub use store::KvStore;
