//! Exposes registered contracts to revm.

use crate::{
    error::PrecompileCallError,
    registry::{PrecompileRegistry, RegisteredContract},
};
use alloy_evm::{
    precompiles::{DynPrecompile, Precompile, PrecompileInput, PrecompilesMap},
    revm::precompile::{PrecompileError, PrecompileId, PrecompileResult},
};
use ev_context::Context;
use revm::precompile::PrecompileOutput;
use std::sync::Arc;

/// A registered contract bound to the chain context it reads from.
#[derive(Debug, Clone)]
pub struct ChainPrecompile {
    id: PrecompileId,
    contract: Arc<RegisteredContract>,
    ctx: Context,
}

impl ChainPrecompile {
    /// Binds `contract` to `ctx`. Every call runs on a fresh branch of `ctx`.
    pub fn new(contract: Arc<RegisteredContract>, ctx: Context) -> Self {
        Self { id: PrecompileId::custom(contract.name()), contract, ctx }
    }

    fn map_error(err: PrecompileCallError) -> PrecompileError {
        match err {
            PrecompileCallError::OutOfGas { .. } => PrecompileError::OutOfGas,
            other => PrecompileError::Other(other.to_string().into()),
        }
    }
}

impl Precompile for ChainPrecompile {
    fn precompile_id(&self) -> &PrecompileId {
        &self.id
    }

    fn call(&self, input: PrecompileInput<'_>) -> PrecompileResult {
        let out = self.contract.call(&self.ctx, input.caller, input.data, input.gas).map_err(Self::map_error)?;
        Ok(PrecompileOutput::new(out.gas_used, out.bytes))
    }

    fn is_pure(&self) -> bool {
        false
    }
}

/// Installs every contract of `registry` active at `version` into `precompiles`.
///
/// The installed contracts read from a snapshot of `ctx` taken here, so later writes to `ctx`
/// are not visible to them. Install into a fresh map for every block or transaction whose
/// state the contracts must observe.
pub fn install_precompiles(precompiles: &mut PrecompilesMap, registry: &PrecompileRegistry, version: u64, ctx: &Context) {
    for contract in registry.active_at(version) {
        let address = contract.address();
        let precompile = Arc::new(ChainPrecompile::new(contract, ctx.clone()));
        let id = precompile.id.clone();
        precompiles.apply_precompile(&address, move |_| {
            let precompile = Arc::clone(&precompile);
            Some(DynPrecompile::new_stateful(id, move |input| precompile.call(input)))
        });
        tracing::debug!(target: "ev_precompiles", %address, version, "installed precompile");
    }
}
