//! Keeper capabilities that only the admission pipeline needs.

use alloy_primitives::{Address, U256};
use ev_context::Context;
use ev_erc20::Erc20Error;
use std::fmt::Debug;

/// Conversion of ERC20 balances into native coins, used to pay fees.
pub trait Erc20Keeper: Send + Sync + Debug {
    /// See [`ev_erc20::Keeper::try_convert_erc20_sdk`].
    fn try_convert_erc20_sdk(
        &self,
        ctx: &mut Context,
        sender: Address,
        receiver: Address,
        token: &str,
        amount: U256,
    ) -> Result<(), Erc20Error>;
}

impl Erc20Keeper for ev_erc20::Keeper {
    fn try_convert_erc20_sdk(
        &self,
        ctx: &mut Context,
        sender: Address,
        receiver: Address,
        token: &str,
        amount: U256,
    ) -> Result<(), Erc20Error> {
        Self::try_convert_erc20_sdk(self, ctx, sender, receiver, token, amount)
    }
}
