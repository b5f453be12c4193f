use crate::{
    error::AnteError,
    handler::{AnteDecorator, Next},
};
use ev_context::Context;
use ev_keepers::{EvmKeeper, FeeMarketKeeper};
use ev_primitives::Tx;
use std::sync::Arc;

/// Adds the transaction's gas limit to the block's gas-wanted counter used by the base fee
/// calculation. Only active under London rules.
#[derive(Debug, Clone)]
pub struct GasWantedDecorator {
    evm_keeper: Arc<dyn EvmKeeper>,
    fee_market_keeper: Arc<dyn FeeMarketKeeper>,
}

impl GasWantedDecorator {
    /// Stage backed by the given keepers.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper>, fee_market_keeper: Arc<dyn FeeMarketKeeper>) -> Self {
        Self { evm_keeper, fee_market_keeper }
    }
}

impl AnteDecorator for GasWantedDecorator {
    fn ante_handle(&self, ctx: &mut Context, tx: &Tx, simulate: bool, next: Next<'_>) -> Result<(), AnteError> {
        let params = self.evm_keeper.params(ctx);
        if !params.chain_config.is_london(ctx.block_height()) {
            return next.run(ctx, tx, simulate);
        }

        let gas_wanted = tx.gas();
        let block_gas_limit = ctx.block_gas_limit();
        if gas_wanted > block_gas_limit {
            return Err(AnteError::OutOfGas(format!(
                "tx gas ({gas_wanted}) exceeds block gas limit ({block_gas_limit})"
            )));
        }

        if self.fee_market_keeper.base_fee_enabled(ctx) {
            let total = self.fee_market_keeper.add_transient_gas_wanted(ctx, gas_wanted)?;
            tracing::trace!(target: "ev_ante::gas", gas_wanted, total, "recorded block gas wanted");
        }

        next.run(ctx, tx, simulate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{eth_tx, legacy_tx, probe, Fixture, ALICE, BOB};
    use ev_context::{BlockHeader, GasMeter};
    use ev_keepers::{memory::MemoryFeeMarketKeeper, ChainConfig, EvmParams};

    fn block_ctx(limit: u64) -> Context {
        Context::new(BlockHeader::default()).with_block_gas_meter(GasMeter::new(limit))
    }

    #[test]
    fn records_gas_wanted() {
        let fixture = Fixture::new();
        let fee_market = MemoryFeeMarketKeeper::default();
        let decorator = GasWantedDecorator::new(fixture.evm.clone(), Arc::new(fee_market.clone()));
        let mut ctx = block_ctx(100_000);
        let tx = eth_tx(ALICE, legacy_tx(0, Some(BOB), 0, 40_000, 1));

        assert!(probe(&decorator, &mut ctx, &tx).1);
        assert!(probe(&decorator, &mut ctx, &tx).1);
        assert_eq!(fee_market.transient_gas_wanted(&ctx), 80_000);
    }

    #[test]
    fn rejects_gas_above_block_limit() {
        let fixture = Fixture::new();
        let fee_market = MemoryFeeMarketKeeper::default();
        let decorator = GasWantedDecorator::new(fixture.evm.clone(), Arc::new(fee_market.clone()));
        let mut ctx = block_ctx(30_000);

        let (result, reached) = probe(&decorator, &mut ctx, &eth_tx(ALICE, legacy_tx(0, Some(BOB), 0, 40_000, 1)));
        assert!(matches!(result, Err(AnteError::OutOfGas(_))));
        assert!(!reached);
        assert_eq!(fee_market.transient_gas_wanted(&ctx), 0);
    }

    #[test]
    fn skipped_before_london_or_without_base_fee() {
        let params = EvmParams {
            chain_config: ChainConfig { london_block: None, ..Default::default() },
            ..Default::default()
        };
        let fixture = Fixture::with_evm(|evm| evm.with_params(params));
        let fee_market = MemoryFeeMarketKeeper::default();
        let decorator = GasWantedDecorator::new(fixture.evm.clone(), Arc::new(fee_market.clone()));
        let mut ctx = block_ctx(30_000);
        let tx = eth_tx(ALICE, legacy_tx(0, Some(BOB), 0, 40_000, 1));
        assert!(probe(&decorator, &mut ctx, &tx).0.is_ok());
        assert_eq!(fee_market.transient_gas_wanted(&ctx), 0);

        let fixture = Fixture::new();
        let disabled = MemoryFeeMarketKeeper::new(false);
        let decorator = GasWantedDecorator::new(fixture.evm.clone(), Arc::new(disabled.clone()));
        let mut ctx = block_ctx(100_000);
        assert!(probe(&decorator, &mut ctx, &tx).0.is_ok());
        assert_eq!(disabled.transient_gas_wanted(&ctx), 0);
    }
}
