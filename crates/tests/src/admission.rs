use alloy_primitives::U256;
use alloy_signer::SignerSync;
use eyre::Result;

use ev_ante::AnteError;
use ev_common::{module_address, ERC20_MODULE_NAME, FEE_COLLECTOR_NAME, MSG_ETHEREUM_TX_TYPE_URL};
use ev_primitives::{Authorization, GenericAuthorization, Grant, MsgEthereumTx, Owner, TokenPair, Tx};

use crate::common::{
    aevmos, init_test_tracing, legacy_transfer, signed_tx, test_signer, TestChain, GWEI, TEST_DENOM,
    TEST_TOKEN, TEST_TO_ADDRESS, TEST_VALIDATOR,
};

const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

#[test]
fn test_signed_transfer_is_admitted_once() -> Result<()> {
    init_test_tracing();
    let chain = TestChain::new()?;
    let signer = test_signer(0x11)?;
    let sender = signer.address();
    let mut ctx = chain.genesis(vec![])?.with_is_check_tx(true);
    chain.open_account(&mut ctx, sender, ONE_TOKEN)?;

    let tx = signed_tx(&signer, legacy_transfer(0, TEST_TO_ADDRESS, 1_000, 21_000, 2 * GWEI))?;
    chain.admit(&mut ctx, &tx)?;

    let fee = U256::from(21_000 * 2 * GWEI);
    assert_eq!(chain.sequence(&ctx, sender), 1);
    assert_eq!(chain.balance(&ctx, sender), U256::from(ONE_TOKEN) - fee);
    assert_eq!(chain.balance(&ctx, module_address(FEE_COLLECTOR_NAME)), fee);

    let replay = chain.ante.check(&ctx, &tx, false).expect_err("nonce already used");
    assert_eq!(replay, AnteError::InvalidSequence { got: 0, expected: 1 });
    assert_eq!(chain.sequence(&ctx, sender), 1);
    Ok(())
}

#[test]
fn test_block_gas_limit_is_checked_before_any_charge() -> Result<()> {
    init_test_tracing();
    let chain = TestChain::new()?;
    let signer = test_signer(0x12)?;
    let sender = signer.address();
    let mut ctx = chain.genesis(vec![])?.with_is_check_tx(true).with_consensus_max_gas(Some(30_000));
    chain.open_account(&mut ctx, sender, ONE_TOKEN)?;

    let tx = signed_tx(&signer, legacy_transfer(0, TEST_TO_ADDRESS, 0, 50_000, 2 * GWEI))?;
    let err = chain.ante.handle(&mut ctx, &tx, false).expect_err("exceeds block gas");

    assert!(matches!(err, AnteError::OutOfGas(_)), "{err}");
    assert_eq!(chain.balance(&ctx, sender), U256::from(ONE_TOKEN));
    assert!(chain.balance(&ctx, module_address(FEE_COLLECTOR_NAME)).is_zero());
    assert_eq!(chain.sequence(&ctx, sender), 0);
    Ok(())
}

#[test]
fn test_staking_rewards_pay_for_an_empty_account() -> Result<()> {
    init_test_tracing();
    let chain = TestChain::new()?;
    let signer = test_signer(0x13)?;
    let sender = signer.address();
    let rewards = 10u128.pow(16);
    let mut ctx = chain.genesis(vec![])?;
    chain.open_account(&mut ctx, sender, 0)?;
    chain.staking.delegate(&mut ctx, sender, TEST_VALIDATOR, U256::from(1))?;
    chain.distribution.set_rewards(&mut ctx, sender, TEST_VALIDATOR, &aevmos(rewards)?)?;

    // 50_000 gas at 200 gwei is exactly the outstanding reward
    let tx = signed_tx(&signer, legacy_transfer(0, TEST_TO_ADDRESS, 0, 50_000, 200 * GWEI))?;
    chain.admit(&mut ctx, &tx)?;

    assert!(chain.distribution.rewards(&ctx, sender, TEST_VALIDATOR).is_empty());
    assert!(chain.balance(&ctx, sender).is_zero());
    assert_eq!(chain.balance(&ctx, module_address(FEE_COLLECTOR_NAME)), U256::from(rewards));
    assert_eq!(chain.sequence(&ctx, sender), 1);
    Ok(())
}

#[test]
fn test_erc20_balance_pays_fees_through_the_chain() -> Result<()> {
    init_test_tracing();
    let chain = TestChain::new()?;
    let signer = test_signer(0x14)?;
    let sender = signer.address();
    let fee = 21_000 * 2 * GWEI;
    let mut ctx = chain.genesis(vec![TokenPair::new(TEST_TOKEN, TEST_DENOM, Owner::Module)])?;
    chain.open_account(&mut ctx, sender, 0)?;
    chain.bank.fund(&mut ctx, module_address(ERC20_MODULE_NAME), &aevmos(fee)?)?;
    chain.evm.mint_tokens(&mut ctx, TEST_TOKEN, sender, U256::from(fee))?;

    let tx = signed_tx(&signer, legacy_transfer(0, TEST_TO_ADDRESS, 0, 21_000, 2 * GWEI))?;
    chain.admit(&mut ctx, &tx)?;

    assert!(chain.evm.token_balance(&ctx, TEST_TOKEN, sender).is_zero());
    assert!(chain.balance(&ctx, sender).is_zero());
    assert!(chain.balance(&ctx, module_address(ERC20_MODULE_NAME)).is_zero());
    assert_eq!(chain.balance(&ctx, module_address(FEE_COLLECTOR_NAME)), U256::from(fee));
    assert_eq!(chain.sequence(&ctx, sender), 1);
    Ok(())
}

#[test]
fn test_unfunded_fee_leaves_tokens_and_sequence() -> Result<()> {
    init_test_tracing();
    let chain = TestChain::new()?;
    let signer = test_signer(0x15)?;
    let sender = signer.address();
    let fee = 21_000 * 2 * GWEI;
    let mut ctx = chain.genesis(vec![TokenPair::new(TEST_TOKEN, TEST_DENOM, Owner::Module)])?;
    chain.open_account(&mut ctx, sender, 0)?;
    chain.bank.fund(&mut ctx, module_address(ERC20_MODULE_NAME), &aevmos(fee)?)?;
    chain.evm.mint_tokens(&mut ctx, TEST_TOKEN, sender, U256::from(fee - 1))?;

    let tx = signed_tx(&signer, legacy_transfer(0, TEST_TO_ADDRESS, 0, 21_000, 2 * GWEI))?;
    assert!(chain.admit(&mut ctx, &tx).is_err());

    assert_eq!(chain.evm.token_balance(&ctx, TEST_TOKEN, sender), U256::from(fee - 1));
    assert!(chain.balance(&ctx, module_address(FEE_COLLECTOR_NAME)).is_zero());
    assert_eq!(chain.sequence(&ctx, sender), 0);
    Ok(())
}

#[test]
fn test_on_behalf_execution_needs_a_live_grant() -> Result<()> {
    init_test_tracing();
    let chain = TestChain::new()?;
    let grantee = test_signer(0x16)?;
    let granter = test_signer(0x17)?.address();
    let mut ctx = chain.genesis(vec![])?.with_is_check_tx(true).with_block_time(1_000);
    chain.open_account(&mut ctx, grantee.address(), ONE_TOKEN)?;

    let data = legacy_transfer(0, TEST_TO_ADDRESS, 0, 21_000, 2 * GWEI);
    let signature = grantee.sign_hash_sync(&data.signature_hash())?;
    let tx = Tx::from_eth(MsgEthereumTx::new(data).with_signature(signature).with_on_behalf(granter));

    let err = chain.ante.check(&ctx, &tx, false).expect_err("no grant");
    assert!(matches!(err, AnteError::Unauthorized(_)), "{err}");

    let expired = Grant {
        authorization: Authorization::Generic(GenericAuthorization::new(MSG_ETHEREUM_TX_TYPE_URL)),
        expiration: Some(999),
    };
    chain.authz.save_grant(&mut ctx, granter, grantee.address(), &expired)?;
    let err = chain.ante.check(&ctx, &tx, false).expect_err("expired grant");
    assert!(matches!(err, AnteError::Unauthorized(_)), "{err}");
    assert_eq!(chain.sequence(&ctx, grantee.address()), 0);
    assert_eq!(chain.balance(&ctx, grantee.address()), U256::from(ONE_TOKEN));

    chain.authz.save_grant(&mut ctx, granter, grantee.address(), &Grant { expiration: None, ..expired })?;
    chain.admit(&mut ctx, &tx)?;
    assert_eq!(chain.sequence(&ctx, grantee.address()), 1);
    Ok(())
}
