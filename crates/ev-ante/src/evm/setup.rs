use crate::{
    error::AnteError,
    handler::{AnteDecorator, Next},
};
use ev_context::{Context, GasMeter, KvGasConfig};
use ev_keepers::EvmKeeper;
use ev_primitives::Tx;
use std::sync::Arc;

/// Gives the pipeline an unmetered context and resets the EVM's per-transaction gas counter.
///
/// Gas is accounted by the gas consumption stage from the transaction's gas limits, not from
/// store access.
#[derive(Debug, Clone)]
pub struct EthSetUpContextDecorator {
    evm_keeper: Arc<dyn EvmKeeper>,
}

impl EthSetUpContextDecorator {
    /// Stage resetting the counters of `evm_keeper`.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper>) -> Self {
        Self { evm_keeper }
    }
}

impl AnteDecorator for EthSetUpContextDecorator {
    fn ante_handle(&self, ctx: &mut Context, tx: &Tx, simulate: bool, next: Next<'_>) -> Result<(), AnteError> {
        ctx.set_gas_meter(GasMeter::infinite());
        ctx.set_kv_gas_config(KvGasConfig::zero());
        self.evm_keeper.reset_transient_gas_used(ctx);
        next.run(ctx, tx, simulate)
    }
}
