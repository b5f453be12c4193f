//! Module names and chain-wide constants.

/// Name of the ERC20 conversion module. Its account escrows converted coins.
pub const ERC20_MODULE_NAME: &str = "erc20";

/// Name of the module account collecting transaction fees.
pub const FEE_COLLECTOR_NAME: &str = "fee_collector";

/// Name of the EVM module.
pub const EVM_MODULE_NAME: &str = "evm";

/// Name of the ICS-20 transfer module.
pub const TRANSFER_MODULE_NAME: &str = "transfer";

/// Type URL of an Ethereum transaction wrapped in a cosmos message.
pub const MSG_ETHEREUM_TX_TYPE_URL: &str = "/ethermint.evm.v1.MsgEthereumTx";

/// Scale applied to the effective tip when deriving transaction priority (1 gwei).
pub const DEFAULT_PRIORITY_REDUCTION: u64 = 1_000_000_000;

/// Bech32 prefix used when no override is configured.
pub const DEFAULT_BECH32_PREFIX: &str = "cosmos";

/// Environment variable overriding the main bech32 prefix.
pub const BECH32_PREFIX_ENV: &str = "EV_BECH32_PREFIX";
