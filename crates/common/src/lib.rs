//! Common utilities and constants shared by the ev-cosmos crates.

pub mod address;
pub mod config;
pub mod constants;
pub mod error;

pub use address::{
    address_from_bech32, address_to_bech32, decode_bech32, encode_bech32, module_address,
    Bech32Error,
};
pub use config::Bech32Config;
pub use constants::*;
pub use error::ErrorKind;
