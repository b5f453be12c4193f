//! Fee payment helpers shared by the gas consumption stage.

use crate::{error::AnteError, interfaces::Erc20Keeper};
use alloy_primitives::Address;
use ev_common::FEE_COLLECTOR_NAME;
use ev_context::Context;
use ev_keepers::{BankKeeper, DistributionKeeper, StakingKeeper};
use ev_primitives::{Coin, Coins};

/// Withdraws staking rewards of `address` when its bond denomination balance does not cover
/// the bond denomination part of `amount`.
pub fn claim_staking_rewards_if_necessary(
    ctx: &mut Context,
    bank: &dyn BankKeeper,
    distribution: &dyn DistributionKeeper,
    staking: &dyn StakingKeeper,
    address: Address,
    amount: &Coins,
) -> Result<(), AnteError> {
    let staking_denom = staking.bond_denom(ctx);
    let required = amount.amount_of(&staking_denom);
    if required.is_zero() {
        return Ok(());
    }

    let balance = bank.get_balance(ctx, address, &staking_denom).amount;
    if balance >= required {
        return Ok(());
    }

    claim_sufficient_staking_rewards(ctx, staking, distribution, address, Coin::new(staking_denom, required - balance))
}

/// Withdraws rewards delegation by delegation until `amount` is covered. Nothing is written
/// unless the withdrawn rewards reach `amount`.
pub fn claim_sufficient_staking_rewards(
    ctx: &mut Context,
    staking: &dyn StakingKeeper,
    distribution: &dyn DistributionKeeper,
    address: Address,
    amount: Coin,
) -> Result<(), AnteError> {
    ctx.with_cache(|ctx| {
        let mut rewards = Coins::empty();
        for delegation in staking.delegator_delegations(ctx, address) {
            let reward = distribution.withdraw_delegation_rewards(ctx, address, delegation.validator)?;
            rewards = rewards.checked_add(&reward)?;
            if rewards.amount_of(&amount.denom) >= amount.amount {
                break;
            }
        }

        if rewards.amount_of(&amount.denom) < amount.amount {
            return Err(AnteError::InsufficientFee(
                "insufficient staking rewards to cover transaction fees".to_string(),
            ));
        }
        tracing::debug!(target: "ev_ante::fees", %address, %rewards, "claimed staking rewards for fees");
        Ok(())
    })
}

/// Moves `fees` from `address` to the fee collector.
///
/// When the bank balance falls short, each fee coin is first converted in full from the
/// account's ERC20 balance of the same pair; the conversions and the payment are written
/// together or not at all.
pub fn deduct_fees(
    ctx: &mut Context,
    bank: &dyn BankKeeper,
    erc20: &dyn Erc20Keeper,
    address: Address,
    fees: &Coins,
) -> Result<(), AnteError> {
    let balances = bank.get_all_balances(ctx, address);
    if fees.is_all_lte(&balances) {
        bank.send_coins_from_account_to_module(ctx, address, FEE_COLLECTOR_NAME, fees)?;
        return Ok(());
    }

    ctx.with_cache(|ctx| {
        for fee in fees {
            erc20
                .try_convert_erc20_sdk(ctx, address, address, &fee.denom, fee.amount)
                .map_err(|source| AnteError::FeeConversion { denom: fee.denom.clone(), source })?;
        }
        bank.send_coins_from_account_to_module(ctx, address, FEE_COLLECTOR_NAME, fees)?;
        tracing::debug!(target: "ev_ante::fees", %address, %fees, "paid fees from erc20 balance");
        Ok(())
    })
}
