//! Common test utilities and fixtures for the cross-crate scenarios.
//!
//! [`TestChain`] wires the in-memory ledgers into an erc20 keeper, the default admission
//! chain and the ICS-20 middleware, the same way a node assembles the real modules.

use std::sync::Arc;

use alloy_consensus::TxLegacy;
use alloy_primitives::{address, Address, TxKind, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use eyre::Result;

use ev_ante::{AnteHandler, HandlerOptions};
use ev_common::{address_to_bech32, module_address, ERC20_MODULE_NAME, FEE_COLLECTOR_NAME};
use ev_context::Context;
use ev_erc20::{ibc::MockTransferApp, Erc20IbcMiddleware, GenesisState, Keeper};
use ev_keepers::{
    memory::{
        MemoryAccountKeeper, MemoryAuthzKeeper, MemoryBankKeeper, MemoryDistributionKeeper,
        MemoryEvmKeeper, MemoryFeeMarketKeeper, MemoryStakingKeeper,
    },
    AccountKeeper, BankKeeper,
};
use ev_primitives::{Coin, Coins, EthTxData, FungibleTokenPacketData, MsgEthereumTx, Packet, TokenPair, Tx};

/// Chain id signed into test transactions.
pub const TEST_CHAIN_ID: u64 = 9000;
/// Gas and fee denomination.
pub const TEST_DENOM: &str = "aevmos";
/// One gwei in the smallest unit.
pub const GWEI: u128 = 1_000_000_000;
/// ERC20 contract deployed at genesis.
pub const TEST_TOKEN: Address = address!("0x80b5a32E4F032B2a058b4F29EC95EEfEEB87aDcd");
/// Validator receiving test delegations.
pub const TEST_VALIDATOR: Address = address!("0x00000000000000000000000000000000000000a1");
/// Recipient of test transfers.
pub const TEST_TO_ADDRESS: Address = address!("0x944fDcD1c868E3cC566C78023CcB38A32cDA836E");

/// Installs a test-writer subscriber honoring `RUST_LOG`. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `amount` of [`TEST_DENOM`].
pub fn aevmos(amount: u128) -> Result<Coins> {
    Ok(Coins::from_coin(Coin::new(TEST_DENOM, U256::from(amount)))?)
}

/// Deterministic signer derived from `seed`.
pub fn test_signer(seed: u8) -> Result<PrivateKeySigner> {
    Ok(PrivateKeySigner::from_bytes(&B256::repeat_byte(seed))?)
}

/// Legacy transfer body.
pub fn legacy_transfer(nonce: u64, to: Address, value: u64, gas_limit: u64, gas_price: u128) -> EthTxData {
    EthTxData::Legacy(TxLegacy {
        chain_id: Some(TEST_CHAIN_ID),
        nonce,
        gas_price,
        gas_limit,
        to: TxKind::Call(to),
        value: U256::from(value),
        ..Default::default()
    })
}

/// Signs `data` and wraps it in a single-message transaction. The sender is left for
/// recovery.
pub fn signed_tx(signer: &PrivateKeySigner, data: EthTxData) -> Result<Tx> {
    let signature = signer.sign_hash_sync(&data.signature_hash())?;
    Ok(Tx::from_eth(MsgEthereumTx::new(data).with_signature(signature)))
}

/// ICS-20 packet sent from `osmo` over `transfer/channel-0` and received on
/// `transfer/channel-1`.
pub fn transfer_packet(denom: &str, amount: u64, sender: Address, receiver: Address) -> Result<Packet> {
    let data = FungibleTokenPacketData {
        denom: denom.to_string(),
        amount: amount.to_string(),
        sender: address_to_bech32("osmo", sender)?,
        receiver: address_to_bech32("evmos", receiver)?,
        memo: String::new(),
    };
    Ok(Packet {
        sequence: 1,
        source_port: "transfer".into(),
        source_channel: "channel-0".into(),
        destination_port: "transfer".into(),
        destination_channel: "channel-1".into(),
        data: data.to_bytes()?,
    })
}

/// In-memory chain: every ledger, the erc20 keeper and the default admission chain.
#[derive(Debug)]
pub struct TestChain {
    /// Account ledger.
    pub accounts: Arc<MemoryAccountKeeper>,
    /// Bank ledger.
    pub bank: Arc<MemoryBankKeeper>,
    /// EVM state.
    pub evm: Arc<MemoryEvmKeeper>,
    /// Delegations.
    pub staking: Arc<MemoryStakingKeeper>,
    /// Staking rewards.
    pub distribution: Arc<MemoryDistributionKeeper>,
    /// Authorization grants.
    pub authz: Arc<MemoryAuthzKeeper>,
    /// Fee market.
    pub fee_market: Arc<MemoryFeeMarketKeeper>,
    /// Conversion engine.
    pub erc20: Arc<Keeper>,
    /// Admission chain built from the keepers above.
    pub ante: AnteHandler,
}

impl TestChain {
    /// Builds the chain with the stock keeper configuration.
    pub fn new() -> Result<Self> {
        Self::with_evm(|evm| evm)
    }

    /// Builds the chain, letting `evm` adjust the EVM keeper first.
    pub fn with_evm(evm: impl FnOnce(MemoryEvmKeeper) -> MemoryEvmKeeper) -> Result<Self> {
        let accounts = MemoryAccountKeeper;
        let bank = MemoryBankKeeper::with_blocked([module_address(FEE_COLLECTOR_NAME)]);
        let evm = Arc::new(evm(MemoryEvmKeeper::new(accounts.clone(), bank.clone())));
        let staking = Arc::new(MemoryStakingKeeper::new(TEST_DENOM));
        let distribution = Arc::new(MemoryDistributionKeeper::new(bank.clone()));
        let authz = Arc::new(MemoryAuthzKeeper);
        let fee_market = Arc::new(MemoryFeeMarketKeeper::default());
        let accounts = Arc::new(accounts);
        let bank = Arc::new(bank);
        let erc20 = Arc::new(Keeper::new(accounts.clone(), bank.clone(), evm.clone(), staking.clone()));

        let ante = HandlerOptions {
            account_keeper: Some(accounts.clone()),
            bank_keeper: Some(bank.clone()),
            erc20_keeper: Some(erc20.clone()),
            distribution_keeper: Some(distribution.clone()),
            staking_keeper: Some(staking.clone()),
            evm_keeper: Some(evm.clone()),
            fee_market_keeper: Some(fee_market.clone()),
            authz_keeper: Some(authz.clone()),
            max_tx_gas_wanted: 0,
        }
        .new_ante_handler()?;

        Ok(Self { accounts, bank, evm, staking, distribution, authz, fee_market, erc20, ante })
    }

    /// Genesis state: module accounts, [`TEST_TOKEN`] deployed and `pairs` registered.
    pub fn genesis(&self, pairs: Vec<TokenPair>) -> Result<Context> {
        let mut ctx = Context::default();
        self.accounts.create_module_account(&mut ctx, ERC20_MODULE_NAME)?;
        self.accounts.create_module_account(&mut ctx, FEE_COLLECTOR_NAME)?;
        self.evm.deploy_erc20(&mut ctx, TEST_TOKEN)?;
        self.erc20.init_genesis(&mut ctx, &GenesisState { token_pairs: pairs, ..Default::default() })?;
        Ok(ctx)
    }

    /// Creates the account of `address` and credits it with `amount` of [`TEST_DENOM`].
    pub fn open_account(&self, ctx: &mut Context, address: Address, amount: u128) -> Result<()> {
        self.accounts.new_account_with_address(ctx, address)?;
        if amount > 0 {
            self.bank.fund(ctx, address, &aevmos(amount)?)?;
        }
        Ok(())
    }

    /// Balance of `address` in [`TEST_DENOM`].
    pub fn balance(&self, ctx: &Context, address: Address) -> U256 {
        self.bank.get_balance(ctx, address, TEST_DENOM).amount
    }

    /// Sequence of `address`, zero for unknown accounts.
    pub fn sequence(&self, ctx: &Context, address: Address) -> u64 {
        self.accounts.get_account(ctx, address).map_or(0, |account| account.sequence)
    }

    /// Runs the admission chain on a branch and commits it on acceptance.
    pub fn admit(&self, ctx: &mut Context, tx: &Tx) -> Result<()> {
        let branch = self.ante.check(ctx, tx, false)?;
        ctx.commit(branch)?;
        Ok(())
    }

    /// ICS-20 middleware over a transfer application crediting through the bank ledger.
    pub fn transfer_stack(&self) -> Erc20IbcMiddleware<MockTransferApp> {
        Erc20IbcMiddleware::new(MockTransferApp::new(self.bank.as_ref().clone()), self.erc20.as_ref().clone())
    }
}
