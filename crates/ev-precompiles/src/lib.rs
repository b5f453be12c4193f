//! # System contracts
//!
//! Fixed-address contracts implemented natively and called from the EVM through their 4-byte
//! method selectors. Only read-only methods are supported: every call runs against a
//! disposable branch of the chain [`Context`](ev_context::Context).
//!
//! ## Available contracts
//!
//! | Address | Name | Description |
//! |---------|------|-------------|
//! | `0xcc02…02` | [`Bech32Precompile`] | bech32 encoding, decoding and chain prefixes |
//!
//! ## Integration
//!
//! Contracts are collected once at start-up into a [`PrecompileRegistry`], which is frozen
//! by [`PrecompileRegistryBuilder::build`]. [`install_precompiles`] then exposes the contracts
//! active at a protocol version through an `alloy_evm` [`PrecompilesMap`](alloy_evm::precompiles::PrecompilesMap).
//!
//! ```ignore
//! let registry = PrecompileRegistry::builder()
//!     .register(Arc::new(Bech32Precompile::new(Bech32Config::from_env()?)), 0)?
//!     .build();
//! install_precompiles(&mut precompiles, &registry, version, &ctx);
//! ```

pub mod address;
mod bech32;
mod dispatch;
mod error;
mod evm;
mod registry;

pub use bech32::{Bech32Precompile, IBech32, BECH32_CONTRACT_NAME, MAX_BECH32_ENCODE_BUFFER_SIZE};
pub use dispatch::{CallOutput, ExecutorEnv, MethodExecutor, PrecompiledMethod};
pub use error::{PrecompileCallError, RegistryError};
pub use evm::{install_precompiles, ChainPrecompile};
pub use registry::{PrecompileRegistry, PrecompileRegistryBuilder, PrecompiledContract, RegisteredContract};
