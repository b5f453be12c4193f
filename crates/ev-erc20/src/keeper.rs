use ev_keepers::{AccountKeeper, BankKeeper, EvmKeeper, StakingKeeper};
use std::sync::Arc;

/// The erc20 module keeper.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Debug, Clone)]
pub struct Keeper {
    pub(crate) account_keeper: Arc<dyn AccountKeeper>,
    pub(crate) bank_keeper: Arc<dyn BankKeeper>,
    pub(crate) evm_keeper: Arc<dyn EvmKeeper>,
    pub(crate) staking_keeper: Arc<dyn StakingKeeper>,
}

impl Keeper {
    /// Creates a keeper over the given ledgers.
    pub fn new(
        account_keeper: Arc<dyn AccountKeeper>,
        bank_keeper: Arc<dyn BankKeeper>,
        evm_keeper: Arc<dyn EvmKeeper>,
        staking_keeper: Arc<dyn StakingKeeper>,
    ) -> Self {
        Self { account_keeper, bank_keeper, evm_keeper, staking_keeper }
    }
}
