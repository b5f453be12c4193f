use super::{eth_msg, fees};
use crate::{
    error::AnteError,
    handler::{AnteDecorator, Next},
    interfaces::Erc20Keeper,
    utils::{claim_staking_rewards_if_necessary, deduct_fees},
};
use alloy_primitives::{Address, U256};
use ev_common::ErrorKind;
use ev_context::{Context, Event, GasMeter};
use ev_keepers::{AccountKeeper, BankKeeper, DistributionKeeper, EvmKeeper, StakingKeeper};
use ev_primitives::{Coins, Tx};
use std::{collections::BTreeSet, sync::Arc};

/// Event emitted once fees have been paid.
pub const EVENT_TYPE_TX: &str = "tx";
/// Attribute holding the fees paid by the transaction.
pub const ATTRIBUTE_KEY_FEE: &str = "fee";

/// Checks in check mode that each sender is an externally owned account able to cover the
/// transaction cost. Unknown senders get a fresh account.
#[derive(Debug, Clone)]
pub struct EthAccountVerificationDecorator {
    account_keeper: Arc<dyn AccountKeeper>,
    evm_keeper: Arc<dyn EvmKeeper>,
}

impl EthAccountVerificationDecorator {
    /// Stage backed by the given ledgers.
    pub fn new(account_keeper: Arc<dyn AccountKeeper>, evm_keeper: Arc<dyn EvmKeeper>) -> Self {
        Self { account_keeper, evm_keeper }
    }
}

impl AnteDecorator for EthAccountVerificationDecorator {
    fn ante_handle(&self, ctx: &mut Context, tx: &Tx, simulate: bool, next: Next<'_>) -> Result<(), AnteError> {
        if !ctx.is_check_tx() {
            return next.run(ctx, tx, simulate);
        }

        for msg in &tx.msgs {
            let eth = eth_msg(msg)?;
            let from = eth.sender().map_err(|err| AnteError::InvalidAddress(err.to_string()))?;

            let balance = match self.evm_keeper.get_account(ctx, from) {
                Some(account) if account.is_contract() => {
                    return Err(AnteError::InvalidType(format!(
                        "the sender is not EOA: address {from}, codeHash <{}>",
                        account.code_hash
                    )));
                }
                Some(account) => account.balance,
                None => {
                    self.account_keeper.new_account_with_address(ctx, from)?;
                    U256::ZERO
                }
            };

            let cost = eth.data.cost();
            if balance < cost {
                return Err(AnteError::InsufficientFunds(format!(
                    "sender balance < tx cost ({balance} < {cost})"
                )));
            }
        }

        next.run(ctx, tx, simulate)
    }
}

/// Checks the fee cap against the base fee and that each sender can move the value it sends.
#[derive(Debug, Clone)]
pub struct CanTransferDecorator {
    evm_keeper: Arc<dyn EvmKeeper>,
}

impl CanTransferDecorator {
    /// Stage backed by `evm_keeper`.
    pub fn new(evm_keeper: Arc<dyn EvmKeeper>) -> Self {
        Self { evm_keeper }
    }
}

impl AnteDecorator for CanTransferDecorator {
    fn ante_handle(&self, ctx: &mut Context, tx: &Tx, simulate: bool, next: Next<'_>) -> Result<(), AnteError> {
        let params = self.evm_keeper.params(ctx);
        let london = params.chain_config.is_london(ctx.block_height());
        let base_fee = self.evm_keeper.base_fee(ctx);

        for msg in &tx.msgs {
            let eth = eth_msg(msg)?;
            let from = eth.sender().map_err(|err| AnteError::InvalidAddress(err.to_string()))?;
            let message = eth.as_message(from, base_fee);

            if london {
                let Some(base_fee) = base_fee else {
                    return Err(AnteError::Logic(
                        "base fee is supported but evm block context value is nil".to_string(),
                    ));
                };
                if message.gas_fee_cap < base_fee {
                    return Err(AnteError::InsufficientFee(format!(
                        "max fee per gas less than block base fee ({} < {base_fee})",
                        message.gas_fee_cap
                    )));
                }
            }

            if message.value > U256::ZERO && !self.evm_keeper.can_transfer(ctx, from, message.value) {
                return Err(AnteError::InsufficientFunds(format!(
                    "failed to transfer {} from {from} using the EVM block context transfer function",
                    message.value
                )));
            }
        }

        next.run(ctx, tx, simulate)
    }
}

/// Charges the fees of every message, sets the transaction priority and replaces the gas
/// meter with one recording the total gas wanted.
#[derive(Debug, Clone)]
pub struct EthGasConsumeDecorator {
    bank_keeper: Arc<dyn BankKeeper>,
    distribution_keeper: Arc<dyn DistributionKeeper>,
    evm_keeper: Arc<dyn EvmKeeper>,
    staking_keeper: Arc<dyn StakingKeeper>,
    erc20_keeper: Arc<dyn Erc20Keeper>,
    max_tx_gas_wanted: u64,
}

impl EthGasConsumeDecorator {
    /// Stage charging fees through the given ledgers. In check mode the gas wanted of each
    /// message is capped at `max_tx_gas_wanted` unless it is zero.
    pub fn new(
        bank_keeper: Arc<dyn BankKeeper>,
        distribution_keeper: Arc<dyn DistributionKeeper>,
        evm_keeper: Arc<dyn EvmKeeper>,
        staking_keeper: Arc<dyn StakingKeeper>,
        erc20_keeper: Arc<dyn Erc20Keeper>,
        max_tx_gas_wanted: u64,
    ) -> Self {
        Self { bank_keeper, distribution_keeper, evm_keeper, staking_keeper, erc20_keeper, max_tx_gas_wanted }
    }

    fn gas_wanted(&self, ctx: &Context, tx: &Tx) -> Result<u64, AnteError> {
        let mut total = 0u64;
        for msg in &tx.msgs {
            let mut gas = eth_msg(msg)?.data.gas_limit();
            if ctx.is_check_tx() && self.max_tx_gas_wanted != 0 {
                gas = gas.min(self.max_tx_gas_wanted);
            }
            total = total.saturating_add(gas);
        }
        Ok(total)
    }

    /// Claims rewards when the balance is short, then deducts `fees`, falling back to the
    /// sender's ERC20 balance. A rewards shortfall is only reported when the fallback cannot
    /// pay either.
    fn pay(&self, ctx: &mut Context, from: Address, fees: &Coins) -> Result<(), AnteError> {
        let shortfall = match claim_staking_rewards_if_necessary(
            ctx,
            self.bank_keeper.as_ref(),
            self.distribution_keeper.as_ref(),
            self.staking_keeper.as_ref(),
            from,
            fees,
        ) {
            Ok(()) => None,
            Err(err @ AnteError::InsufficientFee(_)) => Some(err),
            Err(err) => return Err(err),
        };

        deduct_fees(ctx, self.bank_keeper.as_ref(), self.erc20_keeper.as_ref(), from, fees).map_err(|err| {
            match shortfall {
                Some(shortfall) if err.kind() == ErrorKind::RejectedTransaction => shortfall,
                _ => err,
            }
        })
    }
}

impl AnteDecorator for EthGasConsumeDecorator {
    fn ante_handle(&self, ctx: &mut Context, tx: &Tx, simulate: bool, next: Next<'_>) -> Result<(), AnteError> {
        if ctx.is_recheck_tx() {
            ctx.set_gas_meter(GasMeter::infinite_with_limit(0));
            return next.run(ctx, tx, simulate);
        }

        let gas_wanted = self.gas_wanted(ctx, tx)?;
        let block_gas_limit = ctx.block_gas_limit();
        if gas_wanted > block_gas_limit {
            return Err(AnteError::OutOfGas(format!(
                "tx gas ({gas_wanted}) exceeds block gas limit ({block_gas_limit})"
            )));
        }

        let params = self.evm_keeper.params(ctx);
        let height = ctx.block_height();
        let homestead = params.chain_config.is_homestead(height);
        let istanbul = params.chain_config.is_istanbul(height);
        let base_fee = self.evm_keeper.base_fee(ctx);

        let mut paid = Coins::empty();
        let mut min_priority = i64::MAX;
        for msg in &tx.msgs {
            let eth = eth_msg(msg)?;
            let from = eth.sender().map_err(|err| AnteError::InvalidAddress(err.to_string()))?;

            let fees =
                fees::verify_fee(&eth.data, &params.evm_denom, base_fee, homestead, istanbul, ctx.is_check_tx())?;
            if !fees.is_empty() {
                self.pay(ctx, from, &fees)?;
                paid = paid.checked_add(&fees)?;
            }

            min_priority = min_priority.min(fees::tx_priority(&eth.data, base_fee));
        }

        if !paid.is_empty() {
            ctx.emit_event(Event::new(EVENT_TYPE_TX).attr(ATTRIBUTE_KEY_FEE, &paid));
        }
        tracing::trace!(target: "ev_ante::gas", gas_wanted, priority = min_priority, fees = %paid, "charged fees");

        ctx.set_priority(min_priority);
        ctx.set_gas_meter(GasMeter::infinite_with_limit(gas_wanted));
        next.run(ctx, tx, simulate)
    }
}

/// Checks every message nonce against the sender sequence, then increments the sequence of
/// each distinct sender once.
#[derive(Debug, Clone)]
pub struct EthIncrementSenderSequenceDecorator {
    account_keeper: Arc<dyn AccountKeeper>,
}

impl EthIncrementSenderSequenceDecorator {
    /// Stage backed by `account_keeper`.
    pub fn new(account_keeper: Arc<dyn AccountKeeper>) -> Self {
        Self { account_keeper }
    }
}

impl AnteDecorator for EthIncrementSenderSequenceDecorator {
    fn ante_handle(&self, ctx: &mut Context, tx: &Tx, simulate: bool, next: Next<'_>) -> Result<(), AnteError> {
        let mut signers = BTreeSet::<Address>::new();
        for msg in &tx.msgs {
            let eth = eth_msg(msg)?;
            let from = eth.sender().map_err(|err| AnteError::InvalidAddress(err.to_string()))?;
            let account = self.account_keeper.get_account(ctx, from).ok_or(AnteError::UnknownAddress(from))?;

            let nonce = eth.data.nonce();
            if nonce != account.sequence {
                return Err(AnteError::InvalidSequence { got: nonce, expected: account.sequence });
            }
            signers.insert(from);
        }

        for signer in signers {
            let mut account = self.account_keeper.get_account(ctx, signer).ok_or(AnteError::UnknownAddress(signer))?;
            account.sequence = account
                .sequence
                .checked_add(1)
                .ok_or_else(|| AnteError::Logic(format!("sequence overflow for account {signer}")))?;
            self.account_keeper.set_account(ctx, account)?;
        }

        next.run(ctx, tx, simulate)
    }
}
