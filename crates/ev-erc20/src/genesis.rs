use crate::{error::Erc20Error, keeper::Keeper, params::Params};
use ev_common::ERC20_MODULE_NAME;
use ev_context::Context;
use ev_primitives::TokenPair;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Initial state of the erc20 module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    /// Module parameters.
    pub params: Params,
    /// Registered token pairs.
    #[serde(default)]
    pub token_pairs: Vec<TokenPair>,
}

impl GenesisState {
    /// Checks every pair and rejects duplicate ids, denominations or contracts.
    pub fn validate(&self) -> Result<(), Erc20Error> {
        let mut ids = HashSet::new();
        let mut denoms = HashSet::new();
        let mut contracts = HashSet::new();
        for pair in &self.token_pairs {
            pair.validate()?;
            if !ids.insert(pair.id()) {
                return Err(Erc20Error::InvalidGenesis(format!("duplicate token pair {}", pair.id())));
            }
            if !denoms.insert(pair.denom.as_str()) {
                return Err(Erc20Error::InvalidGenesis(format!("duplicate denomination {}", pair.denom)));
            }
            if !contracts.insert(pair.erc20_address) {
                return Err(Erc20Error::InvalidGenesis(format!("duplicate ERC20 contract {}", pair.erc20_address)));
            }
        }
        Ok(())
    }
}

impl Keeper {
    /// Loads `genesis` into the store. The erc20 module account must already exist.
    pub fn init_genesis(&self, ctx: &mut Context, genesis: &GenesisState) -> Result<(), Erc20Error> {
        genesis.validate()?;
        self.set_params(ctx, &genesis.params)?;
        if self.account_keeper.get_module_account(ctx, ERC20_MODULE_NAME).is_none() {
            return Err(Erc20Error::MissingModuleAccount(ERC20_MODULE_NAME.to_string()));
        }
        for pair in &genesis.token_pairs {
            self.store_token_pair(ctx, pair)?;
        }
        tracing::info!(target: "ev_erc20", pairs = genesis.token_pairs.len(), "initialized erc20 genesis");
        Ok(())
    }

    /// Current parameters and pairs.
    pub fn export_genesis(&self, ctx: &Context) -> Result<GenesisState, Erc20Error> {
        Ok(GenesisState { params: self.params(ctx)?, token_pairs: self.token_pairs(ctx)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{setup, TOKEN};
    use alloy_primitives::address;
    use ev_common::ErrorKind;
    use ev_primitives::Owner;

    #[test]
    fn duplicates_are_rejected() {
        let other = address!("0x0000000000000000000000000000000000000099");
        let genesis = GenesisState {
            params: Params::default(),
            token_pairs: vec![
                TokenPair::new(TOKEN, "acoin", Owner::Module),
                TokenPair::new(other, "acoin", Owner::External),
            ],
        };
        let err = genesis.validate().expect_err("duplicate denom");
        assert_eq!(err.kind(), ErrorKind::LogicError);
    }

    #[test]
    fn export_returns_what_was_imported() {
        let (keeper, _, mut ctx) = setup();
        let genesis = GenesisState {
            params: Params { enable_evm_hook: false, ..Params::default() },
            token_pairs: vec![TokenPair::new(TOKEN, "acoin", Owner::Module)],
        };
        keeper.init_genesis(&mut ctx, &genesis).expect("imports");
        assert_eq!(keeper.export_genesis(&ctx).expect("exports"), genesis);

        let json = serde_json::to_string(&genesis).expect("serializes");
        assert_eq!(serde_json::from_str::<GenesisState>(&json).expect("parses"), genesis);
    }

    #[test]
    fn module_account_is_required() {
        let (keeper, _, _) = setup();
        let mut fresh = Context::default();
        let err = keeper.init_genesis(&mut fresh, &GenesisState::default()).expect_err("no module account");
        assert!(matches!(err, Erc20Error::MissingModuleAccount(_)));
    }
}
