use crate::{
    error::KeeperError,
    evm::{EvmAccount, EvmParams},
};
use alloy_primitives::{Address, Bytes, U256};
use ev_common::module_address;
use ev_context::Context;
use ev_primitives::{Account, Authorization, Coin, Coins};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Account registry.
pub trait AccountKeeper: Send + Sync + Debug {
    /// Loads an account.
    fn get_account(&self, ctx: &Context, address: Address) -> Option<Account>;

    /// Creates and stores a new account with the next account number.
    fn new_account_with_address(&self, ctx: &mut Context, address: Address) -> Result<Account, KeeperError>;

    /// Stores an account.
    fn set_account(&self, ctx: &mut Context, account: Account) -> Result<(), KeeperError>;

    /// Address of the named module account.
    fn get_module_address(&self, name: &str) -> Address {
        module_address(name)
    }

    /// Loads the named module account.
    fn get_module_account(&self, ctx: &Context, name: &str) -> Option<Account> {
        self.get_account(ctx, module_address(name)).filter(|account| account.is_module_account())
    }
}

/// Native coin ledger.
pub trait BankKeeper: Send + Sync + Debug {
    /// Balance of one denomination.
    fn get_balance(&self, ctx: &Context, address: Address, denom: &str) -> Coin;

    /// All balances of an account.
    fn get_all_balances(&self, ctx: &Context, address: Address) -> Coins;

    /// Transfers between accounts.
    fn send_coins(&self, ctx: &mut Context, from: Address, to: Address, amount: &Coins) -> Result<(), KeeperError>;

    /// Transfers from an account into a module account.
    fn send_coins_from_account_to_module(
        &self,
        ctx: &mut Context,
        from: Address,
        module: &str,
        amount: &Coins,
    ) -> Result<(), KeeperError>;

    /// Transfers out of a module account. Fails for blocked recipients.
    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut Context,
        module: &str,
        to: Address,
        amount: &Coins,
    ) -> Result<(), KeeperError>;

    /// Mints coins into a module account.
    fn mint_coins(&self, ctx: &mut Context, module: &str, amount: &Coins) -> Result<(), KeeperError>;

    /// Burns coins held by a module account.
    fn burn_coins(&self, ctx: &mut Context, module: &str, amount: &Coins) -> Result<(), KeeperError>;

    /// Returns true when `address` may not receive funds.
    fn is_blocked_address(&self, address: Address) -> bool;
}

/// A bonded stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Delegator account.
    pub delegator: Address,
    /// Validator operator.
    pub validator: Address,
    /// Delegated shares.
    pub shares: U256,
}

/// Staking ledger.
pub trait StakingKeeper: Send + Sync + Debug {
    /// Denomination that can be bonded.
    fn bond_denom(&self, ctx: &Context) -> String;

    /// Delegations of `delegator`, ordered by validator.
    fn delegator_delegations(&self, ctx: &Context, delegator: Address) -> Vec<Delegation>;
}

/// Rewards ledger.
pub trait DistributionKeeper: Send + Sync + Debug {
    /// Pays out the rewards accrued by one delegation to the delegator and returns them.
    fn withdraw_delegation_rewards(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
    ) -> Result<Coins, KeeperError>;
}

/// Authorization grants.
pub trait AuthzKeeper: Send + Sync + Debug {
    /// Returns the unexpired authorization `granter` gave `grantee` for `msg_type_url`.
    fn get_authorization(
        &self,
        ctx: &Context,
        grantee: Address,
        granter: Address,
        msg_type_url: &str,
    ) -> Option<Authorization>;
}

/// EVM state and execution.
pub trait EvmKeeper: Send + Sync + Debug {
    /// EIP-155 chain id.
    fn chain_id(&self) -> u64;

    /// Module parameters.
    fn params(&self, ctx: &Context) -> EvmParams;

    /// Current base fee, `None` when London rules are not active or the fee market is off.
    fn base_fee(&self, ctx: &Context) -> Option<U256>;

    /// EVM view of an account, `None` when the account does not exist.
    fn get_account(&self, ctx: &Context, address: Address) -> Option<EvmAccount>;

    /// Returns true when `from` can move `value`.
    fn can_transfer(&self, ctx: &Context, from: Address, value: U256) -> bool;

    /// Clears the gas-used counter accumulated over the messages of one transaction.
    fn reset_transient_gas_used(&self, ctx: &mut Context);

    /// Executes a call. With `commit == false` the call's state changes are discarded.
    fn call_evm(
        &self,
        ctx: &mut Context,
        from: Address,
        contract: Address,
        data: Bytes,
        commit: bool,
    ) -> Result<Bytes, KeeperError>;
}

/// Fee market.
pub trait FeeMarketKeeper: Send + Sync + Debug {
    /// Returns true when the base fee mechanism is active.
    fn base_fee_enabled(&self, ctx: &Context) -> bool;

    /// Adds `gas` to the block's transient gas-wanted counter and returns the new total.
    fn add_transient_gas_wanted(&self, ctx: &mut Context, gas: u64) -> Result<u64, KeeperError>;

    /// Block gas wanted so far.
    fn transient_gas_wanted(&self, ctx: &Context) -> u64;
}
