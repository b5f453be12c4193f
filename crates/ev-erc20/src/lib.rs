//! ERC20 module.
//!
//! Keeps ERC20 balances and native bank balances consistent for every registered
//! [`TokenPair`](ev_primitives::TokenPair). The [`Keeper`] owns the pair store and the module
//! parameters, performs conversions in both directions and implements the ICS-20 callbacks that
//! turn received vouchers into ERC20 tokens. [`Erc20IbcMiddleware`] wires those callbacks around a
//! transfer application.

mod conversions;
mod error;
mod genesis;
pub mod ibc;
mod keeper;
mod params;
mod token_pairs;

pub use error::Erc20Error;
pub use genesis::GenesisState;
pub use ibc::{Erc20IbcMiddleware, IbcModule};
pub use keeper::Keeper;
pub use params::{Params, DEFAULT_REGISTRATION_FEE};

/// Event emitted when ERC20 tokens are converted into coins.
pub const EVENT_TYPE_CONVERT_ERC20: &str = "convert_erc20";
/// Event emitted when coins are converted into ERC20 tokens.
pub const EVENT_TYPE_CONVERT_COIN: &str = "convert_coin";
/// Event emitted when a token pair is registered.
pub const EVENT_TYPE_REGISTER_PAIR: &str = "register_token_pair";
/// Event emitted when conversions of a pair are switched on or off.
pub const EVENT_TYPE_TOGGLE_CONVERSION: &str = "toggle_token_conversion";

/// Attribute naming the account debited by a conversion.
pub const ATTRIBUTE_KEY_SENDER: &str = "sender";
/// Attribute naming the account credited by a conversion.
pub const ATTRIBUTE_KEY_RECEIVER: &str = "receiver";
/// Attribute carrying the converted amount.
pub const ATTRIBUTE_KEY_AMOUNT: &str = "amount";
/// Attribute carrying the coin denomination of the pair.
pub const ATTRIBUTE_KEY_COSMOS_COIN: &str = "cosmos_coin";
/// Attribute carrying the contract address of the pair.
pub const ATTRIBUTE_KEY_ERC20_TOKEN: &str = "erc20_token";
