use alloy_primitives::{address, Address, U256};
use eyre::Result;

use ev_context::Context;
use ev_erc20::IbcModule;
use ev_keepers::BankKeeper;
use ev_primitives::{ibc::received_coin, Acknowledgement, Coin, Coins, Owner, TokenPair};

use crate::common::{init_test_tracing, transfer_packet, TestChain, TEST_TOKEN};

const SENDER: Address = address!("0x00000000000000000000000000000000000a11ce");
const RECEIVER: Address = address!("0x0000000000000000000000000000000000000b0b");
const RELAYER: Address = Address::ZERO;

fn voucher() -> String {
    received_coin("transfer", "channel-0", "transfer", "channel-1", "uatom", U256::ZERO).denom
}

fn voucher_balance(chain: &TestChain, ctx: &Context, holder: Address) -> U256 {
    chain.bank.get_balance(ctx, holder, &voucher()).amount
}

#[test]
fn test_received_voucher_is_held_only_as_erc20() -> Result<()> {
    init_test_tracing();
    let chain = TestChain::new()?;
    let mut ctx = chain.genesis(vec![TokenPair::new(TEST_TOKEN, voucher(), Owner::Module)])?;
    // coins that arrived while the pair was not yet registered
    chain.bank.fund(&mut ctx, RECEIVER, &Coins::from_coin(Coin::new(voucher(), U256::from(5)))?)?;

    let packet = transfer_packet("uatom", 10, SENDER, RECEIVER)?;
    let ack = chain.transfer_stack().on_recv_packet(&mut ctx, &packet, RELAYER);

    assert!(ack.is_success(), "{ack:?}");
    assert!(voucher_balance(&chain, &ctx, RECEIVER).is_zero());
    assert_eq!(chain.evm.token_balance(&ctx, TEST_TOKEN, RECEIVER), U256::from(15));

    chain.erc20.try_convert_erc20_sdk(&mut ctx, RECEIVER, RECEIVER, &voucher(), U256::from(15))?;
    assert_eq!(voucher_balance(&chain, &ctx, RECEIVER), U256::from(15));
    assert!(chain.evm.token_balance(&ctx, TEST_TOKEN, RECEIVER).is_zero());
    Ok(())
}

#[test]
fn test_unregistered_denom_yields_error_ack() -> Result<()> {
    init_test_tracing();
    let chain = TestChain::new()?;
    let mut ctx = chain.genesis(vec![])?;

    let packet = transfer_packet("uatom", 10, SENDER, RECEIVER)?;
    let ack = chain.transfer_stack().on_recv_packet(&mut ctx, &packet, RELAYER);

    match ack {
        Acknowledgement::Error(reason) => assert!(reason.contains("token pair not found"), "{reason}"),
        other => eyre::bail!("expected an error acknowledgement, got {other:?}"),
    }
    assert!(voucher_balance(&chain, &ctx, RECEIVER).is_zero());
    assert!(chain.evm.token_balance(&ctx, TEST_TOKEN, RECEIVER).is_zero());
    Ok(())
}

#[test]
fn test_disabled_pair_keeps_received_coins() -> Result<()> {
    init_test_tracing();
    let chain = TestChain::new()?;
    let mut ctx = chain.genesis(vec![TokenPair::new(TEST_TOKEN, voucher(), Owner::Module)])?;
    let pair = chain.erc20.toggle_conversion(&mut ctx, &voucher())?;
    assert!(!pair.enabled);

    let packet = transfer_packet("uatom", 10, SENDER, RECEIVER)?;
    let ack = chain.transfer_stack().on_recv_packet(&mut ctx, &packet, RELAYER);

    assert!(ack.is_success(), "{ack:?}");
    assert_eq!(voucher_balance(&chain, &ctx, RECEIVER), U256::from(10));
    assert!(chain.evm.token_balance(&ctx, TEST_TOKEN, RECEIVER).is_zero());
    Ok(())
}
