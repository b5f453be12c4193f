use crate::{error::Erc20Error, keeper::Keeper};
use alloy_primitives::U256;
use ev_context::Context;
use serde::{Deserialize, Serialize};

const PARAMS_KEY: &str = "erc20/params";

/// Ten whole tokens of an 18 decimal denomination.
pub const DEFAULT_REGISTRATION_FEE: U256 = U256::from_limbs([10_000_000_000_000_000_000, 0, 0, 0]);

/// Module parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Master switch for every conversion path.
    pub enable_erc20: bool,
    /// Whether EVM hooks may trigger conversions.
    pub enable_evm_hook: bool,
    /// Fee charged for registering a coin or a contract.
    pub registration_fee: U256,
}

impl Default for Params {
    fn default() -> Self {
        Self { enable_erc20: true, enable_evm_hook: true, registration_fee: DEFAULT_REGISTRATION_FEE }
    }
}

impl Keeper {
    /// Stored parameters, or the defaults when none were set. A stored record that does not
    /// decode is an error.
    pub fn params(&self, ctx: &Context) -> Result<Params, Erc20Error> {
        Ok(ctx.get_json(PARAMS_KEY.as_bytes())?.unwrap_or_default())
    }

    /// Replaces the parameters.
    pub fn set_params(&self, ctx: &mut Context, params: &Params) -> Result<(), Erc20Error> {
        ctx.set_json(PARAMS_KEY, params)?;
        Ok(())
    }

    /// Whether the module logic is enabled.
    pub fn is_erc20_enabled(&self, ctx: &Context) -> Result<bool, Erc20Error> {
        Ok(self.params(ctx)?.enable_erc20)
    }
}
