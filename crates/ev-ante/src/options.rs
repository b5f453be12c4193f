use crate::{
    authz::EthAuthorizationDecorator,
    evm::{
        CanTransferDecorator, EthAccountVerificationDecorator, EthGasConsumeDecorator,
        EthIncrementSenderSequenceDecorator, EthSetUpContextDecorator, GasWantedDecorator,
    },
    handler::{AnteDecorator, AnteHandler},
    interfaces::Erc20Keeper,
};
use ev_keepers::{
    AccountKeeper, AuthzKeeper, BankKeeper, DistributionKeeper, EvmKeeper, FeeMarketKeeper,
    StakingKeeper,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling the admission pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerOptionsError {
    /// A required keeper was not provided.
    #[error("{0} keeper is required for AnteHandler")]
    MissingKeeper(&'static str),
}

/// Keepers and limits the admission pipeline is built from.
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    /// Account registry.
    pub account_keeper: Option<Arc<dyn AccountKeeper>>,
    /// Native coin ledger.
    pub bank_keeper: Option<Arc<dyn BankKeeper>>,
    /// ERC20 conversion engine, used to pay fees from token balances.
    pub erc20_keeper: Option<Arc<dyn Erc20Keeper>>,
    /// Rewards ledger.
    pub distribution_keeper: Option<Arc<dyn DistributionKeeper>>,
    /// Staking ledger.
    pub staking_keeper: Option<Arc<dyn StakingKeeper>>,
    /// EVM state.
    pub evm_keeper: Option<Arc<dyn EvmKeeper>>,
    /// Fee market.
    pub fee_market_keeper: Option<Arc<dyn FeeMarketKeeper>>,
    /// Authorization grants.
    pub authz_keeper: Option<Arc<dyn AuthzKeeper>>,
    /// Per-message cap on gas wanted in check mode. Zero disables the cap.
    pub max_tx_gas_wanted: u64,
}

/// Returns the keeper or names it as missing.
fn required<T: ?Sized>(keeper: Option<&Arc<T>>, name: &'static str) -> Result<Arc<T>, HandlerOptionsError> {
    keeper.cloned().ok_or(HandlerOptionsError::MissingKeeper(name))
}

impl HandlerOptions {
    /// Checks that every keeper is present, reporting the first missing one.
    pub fn validate(&self) -> Result<(), HandlerOptionsError> {
        required(self.account_keeper.as_ref(), "account")?;
        required(self.bank_keeper.as_ref(), "bank")?;
        required(self.erc20_keeper.as_ref(), "erc20")?;
        required(self.distribution_keeper.as_ref(), "distribution")?;
        required(self.staking_keeper.as_ref(), "staking")?;
        required(self.evm_keeper.as_ref(), "evm")?;
        required(self.fee_market_keeper.as_ref(), "fee market")?;
        required(self.authz_keeper.as_ref(), "authz")?;
        Ok(())
    }

    /// Builds the default Ethereum admission chain.
    pub fn new_ante_handler(&self) -> Result<AnteHandler, HandlerOptionsError> {
        self.validate()?;
        let account = required(self.account_keeper.as_ref(), "account")?;
        let bank = required(self.bank_keeper.as_ref(), "bank")?;
        let erc20 = required(self.erc20_keeper.as_ref(), "erc20")?;
        let distribution = required(self.distribution_keeper.as_ref(), "distribution")?;
        let staking = required(self.staking_keeper.as_ref(), "staking")?;
        let evm = required(self.evm_keeper.as_ref(), "evm")?;
        let fee_market = required(self.fee_market_keeper.as_ref(), "fee market")?;
        let authz = required(self.authz_keeper.as_ref(), "authz")?;

        let decorators: Vec<Arc<dyn AnteDecorator>> = vec![
            Arc::new(EthSetUpContextDecorator::new(evm.clone())),
            Arc::new(EthAccountVerificationDecorator::new(account.clone(), evm.clone())),
            Arc::new(EthAuthorizationDecorator::new(authz)),
            Arc::new(CanTransferDecorator::new(evm.clone())),
            Arc::new(EthGasConsumeDecorator::new(
                bank,
                distribution,
                evm.clone(),
                staking,
                erc20,
                self.max_tx_gas_wanted,
            )),
            Arc::new(EthIncrementSenderSequenceDecorator::new(account)),
            Arc::new(GasWantedDecorator::new(evm, fee_market)),
        ];
        tracing::debug!(target: "ev_ante", stages = decorators.len(), "built ethereum ante handler");
        Ok(AnteHandler::new(decorators))
    }
}
