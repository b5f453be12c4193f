//! Bech32 prefix configuration.

use crate::constants::{BECH32_PREFIX_ENV, DEFAULT_BECH32_PREFIX};
use bech32::Hrp;
use serde::{Deserialize, Serialize};

/// Human readable prefixes used for the different address kinds of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bech32Config {
    /// Prefix of account addresses.
    pub account_addr_prefix: String,
    /// Prefix of validator operator addresses.
    pub validator_addr_prefix: String,
    /// Prefix of consensus node addresses.
    pub consensus_addr_prefix: String,
    /// Prefix of account public keys.
    pub account_pub_prefix: String,
    /// Prefix of validator operator public keys.
    pub validator_pub_prefix: String,
    /// Prefix of consensus node public keys.
    pub consensus_pub_prefix: String,
}

impl Bech32Config {
    /// Derives every prefix from the main account prefix, following the SDK naming
    /// scheme (`valoper`, `valcons`, `pub` suffixes).
    pub fn from_main_prefix(main: &str) -> Self {
        Self {
            account_addr_prefix: main.to_string(),
            validator_addr_prefix: format!("{main}valoper"),
            consensus_addr_prefix: format!("{main}valcons"),
            account_pub_prefix: format!("{main}pub"),
            validator_pub_prefix: format!("{main}valoperpub"),
            consensus_pub_prefix: format!("{main}valconspub"),
        }
    }

    /// Loads the configuration from `EV_BECH32_PREFIX`, falling back to the default
    /// prefix when the variable is unset.
    pub fn from_env() -> eyre::Result<Self> {
        let main = match std::env::var(BECH32_PREFIX_ENV) {
            Ok(raw) if raw.trim().is_empty() => {
                eyre::bail!("environment variable {BECH32_PREFIX_ENV} is empty")
            }
            Ok(raw) => raw.trim().to_string(),
            Err(_) => DEFAULT_BECH32_PREFIX.to_string(),
        };
        let config = Self::from_main_prefix(&main);
        config.validate()?;
        Ok(config)
    }

    /// Checks that every prefix is a valid bech32 human readable part.
    pub fn validate(&self) -> eyre::Result<()> {
        for prefix in [
            &self.account_addr_prefix,
            &self.validator_addr_prefix,
            &self.consensus_addr_prefix,
            &self.account_pub_prefix,
            &self.validator_pub_prefix,
            &self.consensus_pub_prefix,
        ] {
            Hrp::parse(prefix).map_err(|err| eyre::eyre!("invalid bech32 prefix {prefix:?}: {err}"))?;
        }
        Ok(())
    }
}

impl Default for Bech32Config {
    fn default() -> Self {
        Self::from_main_prefix(DEFAULT_BECH32_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_sdk_prefixes() {
        let config = Bech32Config::from_main_prefix("evmos");
        assert_eq!(config.account_addr_prefix, "evmos");
        assert_eq!(config.validator_addr_prefix, "evmosvaloper");
        assert_eq!(config.consensus_addr_prefix, "evmosvalcons");
        assert_eq!(config.account_pub_prefix, "evmospub");
        assert_eq!(config.validator_pub_prefix, "evmosvaloperpub");
        assert_eq!(config.consensus_pub_prefix, "evmosvalconspub");
        config.validate().expect("valid prefixes");
    }

    #[test]
    fn default_uses_cosmos_prefix() {
        assert_eq!(Bech32Config::default().account_addr_prefix, "cosmos");
    }

    #[test]
    fn rejects_invalid_prefix() {
        let mut config = Bech32Config::default();
        config.validator_addr_prefix = "bad prefix".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let config = Bech32Config::from_main_prefix("ev");
        let json = serde_json::to_string(&config).expect("serialize");
        let back: Bech32Config = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
