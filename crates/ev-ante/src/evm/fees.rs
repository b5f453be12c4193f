//! Intrinsic gas, fee verification and mempool priority.

use crate::error::AnteError;
use alloy_primitives::U256;
use ev_common::DEFAULT_PRIORITY_REDUCTION;
use ev_primitives::{Coin, Coins, EthTxData};

const TX_GAS: u64 = 21_000;
const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
const TX_DATA_ZERO_GAS: u64 = 4;
const TX_DATA_NON_ZERO_GAS_FRONTIER: u64 = 68;
const TX_DATA_NON_ZERO_GAS_EIP2028: u64 = 16;
const TX_ACCESS_LIST_ADDRESS_GAS: u64 = 2_400;
const TX_ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1_900;

/// Gas charged before any execution: base cost, calldata and access list.
pub fn intrinsic_gas(tx: &EthTxData, homestead: bool, istanbul: bool) -> u64 {
    let mut gas = if tx.is_create() && homestead { TX_GAS_CONTRACT_CREATION } else { TX_GAS };

    let data = tx.input();
    if !data.is_empty() {
        let non_zero = data.iter().filter(|byte| **byte != 0).count() as u64;
        let zero = data.len() as u64 - non_zero;
        let non_zero_gas = if istanbul { TX_DATA_NON_ZERO_GAS_EIP2028 } else { TX_DATA_NON_ZERO_GAS_FRONTIER };
        gas = gas
            .saturating_add(non_zero.saturating_mul(non_zero_gas))
            .saturating_add(zero.saturating_mul(TX_DATA_ZERO_GAS));
    }

    if let Some(access_list) = tx.access_list() {
        let addresses = access_list.0.len() as u64;
        let keys: u64 = access_list.0.iter().map(|item| item.storage_keys.len() as u64).sum();
        gas = gas
            .saturating_add(addresses.saturating_mul(TX_ACCESS_LIST_ADDRESS_GAS))
            .saturating_add(keys.saturating_mul(TX_ACCESS_LIST_STORAGE_KEY_GAS));
    }
    gas
}

/// Checks the gas limit and fee cap and returns the fee to charge in `denom`. A zero fee
/// yields an empty set of coins.
///
/// The intrinsic gas floor is only enforced in check mode.
pub fn verify_fee(
    tx: &EthTxData,
    denom: &str,
    base_fee: Option<U256>,
    homestead: bool,
    istanbul: bool,
    is_check_tx: bool,
) -> Result<Coins, AnteError> {
    let gas_limit = tx.gas_limit();
    let intrinsic = intrinsic_gas(tx, homestead, istanbul);
    if is_check_tx && gas_limit < intrinsic {
        return Err(AnteError::OutOfGas(format!(
            "gas limit too low: {gas_limit} (gas limit) < {intrinsic} (intrinsic gas)"
        )));
    }

    if let Some(base_fee) = base_fee {
        let fee_cap = U256::from(tx.gas_fee_cap());
        if fee_cap < base_fee {
            return Err(AnteError::InsufficientFee(format!(
                "the tx gasfeecap is lower than the tx baseFee: {fee_cap} (gasfeecap), {base_fee} (basefee)"
            )));
        }
    }

    let fee = tx.effective_fee(base_fee);
    Ok(Coins::from_coin(Coin::new(denom, fee))?)
}

/// Mempool priority: the tip per gas above the base fee, in units of
/// [`DEFAULT_PRIORITY_REDUCTION`], saturating at `i64::MAX`.
pub fn tx_priority(tx: &EthTxData, base_fee: Option<U256>) -> i64 {
    let mut tip = tx.effective_gas_price(base_fee);
    if let Some(base_fee) = base_fee {
        tip = tip.saturating_sub(base_fee);
    }
    let priority = tip / U256::from(DEFAULT_PRIORITY_REDUCTION);
    i64::try_from(priority).unwrap_or(i64::MAX)
}
