use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

/// `keccak256` of empty code.
pub const EMPTY_CODE_HASH: B256 = alloy_primitives::KECCAK256_EMPTY;

/// EVM view of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvmAccount {
    /// Account nonce.
    pub nonce: u64,
    /// Balance in the EVM denomination.
    pub balance: U256,
    /// Hash of the deployed code, [`EMPTY_CODE_HASH`] for EOAs.
    pub code_hash: B256,
}

impl EvmAccount {
    /// Returns true when code is deployed at the account.
    pub fn is_contract(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }
}

/// Fork activation heights. `None` means the fork is not scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Homestead activation height.
    pub homestead_block: Option<u64>,
    /// Istanbul activation height.
    pub istanbul_block: Option<u64>,
    /// London activation height.
    pub london_block: Option<u64>,
}

impl ChainConfig {
    fn active(fork: Option<u64>, height: i64) -> bool {
        fork.is_some_and(|block| height >= 0 && block <= height as u64)
    }

    /// Homestead rules apply at `height`.
    pub fn is_homestead(&self, height: i64) -> bool {
        Self::active(self.homestead_block, height)
    }

    /// Istanbul rules apply at `height`.
    pub fn is_istanbul(&self, height: i64) -> bool {
        Self::active(self.istanbul_block, height)
    }

    /// London rules apply at `height`.
    pub fn is_london(&self, height: i64) -> bool {
        Self::active(self.london_block, height)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { homestead_block: Some(0), istanbul_block: Some(0), london_block: Some(0) }
    }
}

/// EVM module parameters consumed by the admission pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmParams {
    /// Denomination used for gas and value transfers.
    pub evm_denom: String,
    /// Fork schedule.
    pub chain_config: ChainConfig,
}

impl Default for EvmParams {
    fn default() -> Self {
        Self { evm_denom: "aevmos".to_string(), chain_config: ChainConfig::default() }
    }
}
