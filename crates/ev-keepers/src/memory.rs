//! In-memory keepers for tests.
//!
//! Every keeper here is a cheap handle; the state lives in the [`Context`] store under a
//! per-module key prefix, so branching and discarding a context also rolls these ledgers back.

use crate::{
    error::KeeperError,
    evm::{EvmAccount, EvmParams, EMPTY_CODE_HASH},
    traits::{
        AccountKeeper, AuthzKeeper, BankKeeper, Delegation, DistributionKeeper, EvmKeeper,
        FeeMarketKeeper, StakingKeeper,
    },
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolInterface, SolValue};
use ev_common::{module_address, ERC20_MODULE_NAME};
use ev_context::Context;
use ev_primitives::{
    contracts::IERC20MinterBurnerDecimals::IERC20MinterBurnerDecimalsCalls as Erc20Call, Account,
    Authorization, Coin, Coins, Grant,
};
use std::{collections::HashSet, sync::Arc};

const NEXT_ACCOUNT_NUMBER_KEY: &str = "auth/next_account_number";
const TRANSIENT_GAS_WANTED_KEY: &str = "feemarket/transient/gas_wanted";
const TRANSIENT_GAS_USED_KEY: &str = "evm/transient/gas_used";

fn account_key(address: Address) -> String {
    format!("auth/acc/{address}")
}

fn balance_prefix(address: Address) -> String {
    format!("bank/bal/{address}/")
}

fn balance_key(address: Address, denom: &str) -> String {
    format!("{}{denom}", balance_prefix(address))
}

fn supply_key(denom: &str) -> String {
    format!("bank/supply/{denom}")
}

fn delegation_prefix(delegator: Address) -> String {
    format!("staking/del/{delegator}/")
}

fn delegation_key(delegator: Address, validator: Address) -> String {
    format!("{}{validator}", delegation_prefix(delegator))
}

fn rewards_key(delegator: Address, validator: Address) -> String {
    format!("distr/rewards/{delegator}/{validator}")
}

fn grant_key(granter: Address, grantee: Address, msg_type_url: &str) -> String {
    format!("authz/grant/{granter}/{grantee}/{msg_type_url}")
}

fn code_hash_key(address: Address) -> String {
    format!("evm/code_hash/{address}")
}

fn token_marker_key(contract: Address) -> String {
    format!("evm/erc20/{contract}")
}

fn token_balance_key(contract: Address, holder: Address) -> String {
    format!("evm/erc20/{contract}/bal/{holder}")
}

fn token_supply_key(contract: Address) -> String {
    format!("evm/erc20/{contract}/supply")
}

fn read_u256(ctx: &Context, key: &str) -> U256 {
    ctx.get_json(key.as_bytes()).ok().flatten().unwrap_or_default()
}

fn write_u256(ctx: &mut Context, key: String, value: U256) -> Result<(), KeeperError> {
    if value.is_zero() {
        ctx.delete(key.as_bytes());
        Ok(())
    } else {
        Ok(ctx.set_json(key, &value)?)
    }
}

/// Account registry storing JSON accounts.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountKeeper;

impl MemoryAccountKeeper {
    /// Creates the account of the named module if it does not exist yet.
    pub fn create_module_account(&self, ctx: &mut Context, name: &str) -> Result<Account, KeeperError> {
        if let Some(existing) = self.get_module_account(ctx, name) {
            return Ok(existing);
        }
        let number = self.next_account_number(ctx)?;
        let account = Account::module(name, number);
        self.set_account(ctx, account.clone())?;
        Ok(account)
    }

    fn next_account_number(&self, ctx: &mut Context) -> Result<u64, KeeperError> {
        let number: u64 = ctx.get_json(NEXT_ACCOUNT_NUMBER_KEY.as_bytes())?.unwrap_or_default();
        ctx.set_json(NEXT_ACCOUNT_NUMBER_KEY, &(number + 1))?;
        Ok(number)
    }
}

impl AccountKeeper for MemoryAccountKeeper {
    fn get_account(&self, ctx: &Context, address: Address) -> Option<Account> {
        ctx.get_json(account_key(address).as_bytes()).ok().flatten()
    }

    fn new_account_with_address(&self, ctx: &mut Context, address: Address) -> Result<Account, KeeperError> {
        let account = Account::new(address, self.next_account_number(ctx)?);
        self.set_account(ctx, account.clone())?;
        Ok(account)
    }

    fn set_account(&self, ctx: &mut Context, account: Account) -> Result<(), KeeperError> {
        Ok(ctx.set_json(account_key(account.address), &account)?)
    }
}

/// Bank ledger storing one entry per (address, denom).
#[derive(Debug, Clone, Default)]
pub struct MemoryBankKeeper {
    blocked: Arc<HashSet<Address>>,
}

impl MemoryBankKeeper {
    /// Bank refusing transfers into `blocked` from modules.
    pub fn with_blocked(blocked: impl IntoIterator<Item = Address>) -> Self {
        Self { blocked: Arc::new(blocked.into_iter().collect()) }
    }

    /// Credits `amount` to `address` out of thin air, increasing supply.
    pub fn fund(&self, ctx: &mut Context, address: Address, amount: &Coins) -> Result<(), KeeperError> {
        self.add_supply(ctx, amount)?;
        self.add(ctx, address, amount)
    }

    /// Total supply of `denom`.
    pub fn supply(&self, ctx: &Context, denom: &str) -> U256 {
        read_u256(ctx, &supply_key(denom))
    }

    fn add(&self, ctx: &mut Context, address: Address, amount: &Coins) -> Result<(), KeeperError> {
        for coin in amount {
            let key = balance_key(address, &coin.denom);
            let balance = read_u256(ctx, &key)
                .checked_add(coin.amount)
                .ok_or_else(|| KeeperError::Overflow(format!("balance of {}", coin.denom)))?;
            write_u256(ctx, key, balance)?;
        }
        Ok(())
    }

    fn sub(&self, ctx: &mut Context, address: Address, amount: &Coins) -> Result<(), KeeperError> {
        for coin in amount {
            let key = balance_key(address, &coin.denom);
            let balance = read_u256(ctx, &key);
            let remaining = balance.checked_sub(coin.amount).ok_or_else(|| {
                KeeperError::InsufficientFunds(format!(
                    "spendable balance {balance}{denom} is smaller than {coin}",
                    denom = coin.denom
                ))
            })?;
            write_u256(ctx, key, remaining)?;
        }
        Ok(())
    }

    fn add_supply(&self, ctx: &mut Context, amount: &Coins) -> Result<(), KeeperError> {
        for coin in amount {
            let key = supply_key(&coin.denom);
            let supply = read_u256(ctx, &key)
                .checked_add(coin.amount)
                .ok_or_else(|| KeeperError::Overflow(format!("supply of {}", coin.denom)))?;
            write_u256(ctx, key, supply)?;
        }
        Ok(())
    }

    fn sub_supply(&self, ctx: &mut Context, amount: &Coins) -> Result<(), KeeperError> {
        for coin in amount {
            let key = supply_key(&coin.denom);
            let supply = read_u256(ctx, &key).saturating_sub(coin.amount);
            write_u256(ctx, key, supply)?;
        }
        Ok(())
    }
}

impl BankKeeper for MemoryBankKeeper {
    fn get_balance(&self, ctx: &Context, address: Address, denom: &str) -> Coin {
        Coin::new(denom, read_u256(ctx, &balance_key(address, denom)))
    }

    fn get_all_balances(&self, ctx: &Context, address: Address) -> Coins {
        let prefix = balance_prefix(address);
        let coins = ctx.prefix_entries(prefix.as_bytes()).into_iter().filter_map(|(key, value)| {
            let denom = String::from_utf8(key[prefix.len()..].to_vec()).ok()?;
            let amount: U256 = serde_json::from_slice(&value).ok()?;
            Some(Coin::new(denom, amount))
        });
        Coins::new(coins).unwrap_or_default()
    }

    fn send_coins(&self, ctx: &mut Context, from: Address, to: Address, amount: &Coins) -> Result<(), KeeperError> {
        self.sub(ctx, from, amount)?;
        self.add(ctx, to, amount)
    }

    fn send_coins_from_account_to_module(
        &self,
        ctx: &mut Context,
        from: Address,
        module: &str,
        amount: &Coins,
    ) -> Result<(), KeeperError> {
        self.send_coins(ctx, from, module_address(module), amount)
    }

    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut Context,
        module: &str,
        to: Address,
        amount: &Coins,
    ) -> Result<(), KeeperError> {
        if self.is_blocked_address(to) {
            return Err(KeeperError::BlockedAddress(to));
        }
        self.send_coins(ctx, module_address(module), to, amount)
    }

    fn mint_coins(&self, ctx: &mut Context, module: &str, amount: &Coins) -> Result<(), KeeperError> {
        self.fund(ctx, module_address(module), amount)
    }

    fn burn_coins(&self, ctx: &mut Context, module: &str, amount: &Coins) -> Result<(), KeeperError> {
        self.sub(ctx, module_address(module), amount)?;
        self.sub_supply(ctx, amount)
    }

    fn is_blocked_address(&self, address: Address) -> bool {
        self.blocked.contains(&address)
    }
}

/// Staking ledger holding plain delegation records.
#[derive(Debug, Clone)]
pub struct MemoryStakingKeeper {
    bond_denom: String,
}

impl MemoryStakingKeeper {
    /// Staking ledger bonding `bond_denom`.
    pub fn new(bond_denom: impl Into<String>) -> Self {
        Self { bond_denom: bond_denom.into() }
    }

    /// Records a delegation.
    pub fn delegate(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
        shares: U256,
    ) -> Result<(), KeeperError> {
        let delegation = Delegation { delegator, validator, shares };
        Ok(ctx.set_json(delegation_key(delegator, validator), &delegation)?)
    }
}

impl Default for MemoryStakingKeeper {
    fn default() -> Self {
        Self::new(EvmParams::default().evm_denom)
    }
}

impl StakingKeeper for MemoryStakingKeeper {
    fn bond_denom(&self, _ctx: &Context) -> String {
        self.bond_denom.clone()
    }

    fn delegator_delegations(&self, ctx: &Context, delegator: Address) -> Vec<Delegation> {
        ctx.prefix_entries(delegation_prefix(delegator).as_bytes())
            .into_iter()
            .filter_map(|(_, value)| serde_json::from_slice(&value).ok())
            .collect()
    }
}

/// Rewards ledger paying out through the bank.
#[derive(Debug, Clone, Default)]
pub struct MemoryDistributionKeeper {
    bank: MemoryBankKeeper,
}

impl MemoryDistributionKeeper {
    /// Distribution ledger paying rewards through `bank`.
    pub const fn new(bank: MemoryBankKeeper) -> Self {
        Self { bank }
    }

    /// Sets the outstanding rewards of a delegation.
    pub fn set_rewards(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
        rewards: &Coins,
    ) -> Result<(), KeeperError> {
        Ok(ctx.set_json(rewards_key(delegator, validator), rewards)?)
    }

    /// Outstanding rewards of a delegation.
    pub fn rewards(&self, ctx: &Context, delegator: Address, validator: Address) -> Coins {
        ctx.get_json(rewards_key(delegator, validator).as_bytes()).ok().flatten().unwrap_or_default()
    }
}

impl DistributionKeeper for MemoryDistributionKeeper {
    fn withdraw_delegation_rewards(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: Address,
    ) -> Result<Coins, KeeperError> {
        if !ctx.has(delegation_key(delegator, validator).as_bytes()) {
            return Err(KeeperError::NoDelegation { delegator, validator });
        }
        let rewards = self.rewards(ctx, delegator, validator);
        ctx.delete(rewards_key(delegator, validator).as_bytes());
        if !rewards.is_empty() {
            self.bank.mint_coins(ctx, "distribution", &rewards)?;
            self.bank.send_coins_from_module_to_account(ctx, "distribution", delegator, &rewards)?;
        }
        Ok(rewards)
    }
}

/// Authorization store.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthzKeeper;

impl MemoryAuthzKeeper {
    /// Stores a grant from `granter` to `grantee`.
    pub fn save_grant(
        &self,
        ctx: &mut Context,
        granter: Address,
        grantee: Address,
        grant: &Grant,
    ) -> Result<(), KeeperError> {
        let key = grant_key(granter, grantee, grant.authorization.msg_type_url());
        Ok(ctx.set_json(key, grant)?)
    }

    /// Stores a grant under an explicit message type, regardless of the authorization kind.
    pub fn save_grant_for(
        &self,
        ctx: &mut Context,
        granter: Address,
        grantee: Address,
        msg_type_url: &str,
        grant: &Grant,
    ) -> Result<(), KeeperError> {
        Ok(ctx.set_json(grant_key(granter, grantee, msg_type_url), grant)?)
    }
}

impl AuthzKeeper for MemoryAuthzKeeper {
    fn get_authorization(
        &self,
        ctx: &Context,
        grantee: Address,
        granter: Address,
        msg_type_url: &str,
    ) -> Option<Authorization> {
        let grant: Grant = ctx.get_json(grant_key(granter, grantee, msg_type_url).as_bytes()).ok().flatten()?;
        (!grant.is_expired(ctx.block_time())).then_some(grant.authorization)
    }
}

/// Fee market with a fixed on/off switch.
#[derive(Debug, Clone)]
pub struct MemoryFeeMarketKeeper {
    base_fee_enabled: bool,
}

impl MemoryFeeMarketKeeper {
    /// Fee market with the base fee switched on or off.
    pub const fn new(base_fee_enabled: bool) -> Self {
        Self { base_fee_enabled }
    }
}

impl Default for MemoryFeeMarketKeeper {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FeeMarketKeeper for MemoryFeeMarketKeeper {
    fn base_fee_enabled(&self, _ctx: &Context) -> bool {
        self.base_fee_enabled
    }

    fn add_transient_gas_wanted(&self, ctx: &mut Context, gas: u64) -> Result<u64, KeeperError> {
        let total = self
            .transient_gas_wanted(ctx)
            .checked_add(gas)
            .ok_or_else(|| KeeperError::Overflow("block gas wanted".to_string()))?;
        ctx.set_json(TRANSIENT_GAS_WANTED_KEY, &total)?;
        Ok(total)
    }

    fn transient_gas_wanted(&self, ctx: &Context) -> u64 {
        ctx.get_json(TRANSIENT_GAS_WANTED_KEY.as_bytes()).ok().flatten().unwrap_or_default()
    }
}

/// EVM keeper whose only contracts are ERC20 tokens executed natively.
///
/// Tokens accept `mint` and `burnCoins` from the erc20 module account only. A token marked
/// faulty reports success for `mint`, `burnCoins` and `transfer` without moving balances.
#[derive(Debug, Clone)]
pub struct MemoryEvmKeeper {
    accounts: MemoryAccountKeeper,
    bank: MemoryBankKeeper,
    params: EvmParams,
    chain_id: u64,
    base_fee: Option<U256>,
    faulty_tokens: Arc<HashSet<Address>>,
}

impl MemoryEvmKeeper {
    /// EVM keeper reading balances from `bank`, with default parameters and a 1 gwei base fee.
    pub fn new(accounts: MemoryAccountKeeper, bank: MemoryBankKeeper) -> Self {
        Self {
            accounts,
            bank,
            params: EvmParams::default(),
            chain_id: 9000,
            base_fee: Some(U256::from(1_000_000_000u64)),
            faulty_tokens: Arc::default(),
        }
    }

    /// Overrides the parameters.
    pub fn with_params(mut self, params: EvmParams) -> Self {
        self.params = params;
        self
    }

    /// Overrides the base fee.
    pub const fn with_base_fee(mut self, base_fee: Option<U256>) -> Self {
        self.base_fee = base_fee;
        self
    }

    /// Marks a token as misbehaving.
    pub fn with_faulty_token(mut self, token: Address) -> Self {
        Arc::make_mut(&mut self.faulty_tokens).insert(token);
        self
    }

    /// Stores code at `address`, turning it into a contract account.
    pub fn set_code(&self, ctx: &mut Context, address: Address, code: &[u8]) -> Result<(), KeeperError> {
        Ok(ctx.set_json(code_hash_key(address), &keccak256(code))?)
    }

    /// Deploys an ERC20 token at `contract`.
    pub fn deploy_erc20(&self, ctx: &mut Context, contract: Address) -> Result<(), KeeperError> {
        self.set_code(ctx, contract, contract.as_slice())?;
        Ok(ctx.set_json(token_marker_key(contract), &true)?)
    }

    /// Token balance of `holder`.
    pub fn token_balance(&self, ctx: &Context, contract: Address, holder: Address) -> U256 {
        read_u256(ctx, &token_balance_key(contract, holder))
    }

    /// Credits tokens directly, increasing supply.
    pub fn mint_tokens(
        &self,
        ctx: &mut Context,
        contract: Address,
        holder: Address,
        amount: U256,
    ) -> Result<(), KeeperError> {
        let supply = read_u256(ctx, &token_supply_key(contract)).saturating_add(amount);
        write_u256(ctx, token_supply_key(contract), supply)?;
        let balance = self.token_balance(ctx, contract, holder).saturating_add(amount);
        write_u256(ctx, token_balance_key(contract, holder), balance)
    }

    fn burn_tokens(&self, ctx: &mut Context, contract: Address, holder: Address, amount: U256) -> Result<(), KeeperError> {
        let balance = self.token_balance(ctx, contract, holder);
        let remaining = balance
            .checked_sub(amount)
            .ok_or_else(|| KeeperError::EvmCall("execution reverted: ERC20: burn amount exceeds balance".into()))?;
        write_u256(ctx, token_balance_key(contract, holder), remaining)?;
        let supply = read_u256(ctx, &token_supply_key(contract)).saturating_sub(amount);
        write_u256(ctx, token_supply_key(contract), supply)
    }

    fn move_tokens(
        &self,
        ctx: &mut Context,
        contract: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), KeeperError> {
        let balance = self.token_balance(ctx, contract, from);
        let remaining = balance.checked_sub(amount).ok_or_else(|| {
            KeeperError::EvmCall("execution reverted: ERC20: transfer amount exceeds balance".into())
        })?;
        write_u256(ctx, token_balance_key(contract, from), remaining)?;
        let credited = self.token_balance(ctx, contract, to).saturating_add(amount);
        write_u256(ctx, token_balance_key(contract, to), credited)
    }

    fn execute(&self, ctx: &mut Context, from: Address, contract: Address, data: &[u8]) -> Result<Bytes, KeeperError> {
        if !ctx.has(token_marker_key(contract).as_bytes()) {
            return Err(KeeperError::EvmCall(format!("no contract deployed at {contract}")));
        }
        let call = Erc20Call::abi_decode(data).map_err(|err| KeeperError::EvmCall(err.to_string()))?;
        let faulty = self.faulty_tokens.contains(&contract);
        let minter = module_address(ERC20_MODULE_NAME);

        let output = match call {
            Erc20Call::balanceOf(call) => self.token_balance(ctx, contract, call.account).abi_encode(),
            Erc20Call::totalSupply(_) => read_u256(ctx, &token_supply_key(contract)).abi_encode(),
            Erc20Call::decimals(_) => U256::from(18u8).abi_encode(),
            Erc20Call::transfer(call) => {
                if !faulty {
                    self.move_tokens(ctx, contract, from, call.to, call.amount)?;
                }
                true.abi_encode()
            }
            Erc20Call::transferFrom(call) => {
                self.move_tokens(ctx, contract, call.from, call.to, call.amount)?;
                true.abi_encode()
            }
            Erc20Call::mint(call) => {
                if from != minter {
                    return Err(KeeperError::EvmCall("execution reverted: caller is not the minter".into()));
                }
                if !faulty {
                    self.mint_tokens(ctx, contract, call.to, call.amount)?;
                }
                Vec::new()
            }
            Erc20Call::burnCoins(call) => {
                if from != minter {
                    return Err(KeeperError::EvmCall("execution reverted: caller is not the burner".into()));
                }
                if !faulty {
                    self.burn_tokens(ctx, contract, call.from, call.amount)?;
                }
                Vec::new()
            }
        };
        Ok(output.into())
    }
}

impl EvmKeeper for MemoryEvmKeeper {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn params(&self, _ctx: &Context) -> EvmParams {
        self.params.clone()
    }

    fn base_fee(&self, ctx: &Context) -> Option<U256> {
        self.params.chain_config.is_london(ctx.block_height()).then_some(self.base_fee).flatten()
    }

    fn get_account(&self, ctx: &Context, address: Address) -> Option<EvmAccount> {
        let account = self.accounts.get_account(ctx, address)?;
        let code_hash: B256 = ctx.get_json(code_hash_key(address).as_bytes()).ok().flatten().unwrap_or(EMPTY_CODE_HASH);
        Some(EvmAccount {
            nonce: account.sequence,
            balance: self.bank.get_balance(ctx, address, &self.params.evm_denom).amount,
            code_hash,
        })
    }

    fn can_transfer(&self, ctx: &Context, from: Address, value: U256) -> bool {
        self.bank.get_balance(ctx, from, &self.params.evm_denom).amount >= value
    }

    fn reset_transient_gas_used(&self, ctx: &mut Context) {
        ctx.delete(TRANSIENT_GAS_USED_KEY.as_bytes());
    }

    fn call_evm(
        &self,
        ctx: &mut Context,
        from: Address,
        contract: Address,
        data: Bytes,
        commit: bool,
    ) -> Result<Bytes, KeeperError> {
        tracing::trace!(target: "ev_keepers::memory", %from, %contract, commit, "executing token call");
        if commit {
            ctx.with_cache(|cache| self.execute(cache, from, contract, &data))
        } else {
            let mut scratch = ctx.branch();
            self.execute(&mut scratch, from, contract, &data)
        }
    }
}
