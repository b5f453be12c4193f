//! Bech32 encoding and decoding for contracts.

use crate::{
    address::BECH32_PRECOMPILE_ADDRESS,
    dispatch::{ExecutorEnv, MethodExecutor},
    error::PrecompileCallError,
    registry::PrecompiledContract,
};
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolCall, SolValue};
use ev_common::{decode_bech32, encode_bech32, Bech32Config};
use std::sync::Arc;

sol! {
    /// Interface of the bech32 system contract.
    interface IBech32 {
        function bech32EncodeAddress(string prefix, address addr) external view returns (string, bool);
        function bech32Encode32BytesAddress(string prefix, bytes32 addr) external view returns (string, bool);
        function bech32EncodeBytes(string prefix, bytes buffer) external view returns (string, bool);
        function bech32Decode(string bech32) external view returns (string, bytes, bool);
        function bech32AccountAddrPrefix() external view returns (string);
        function bech32ValidatorAddrPrefix() external view returns (string);
        function bech32ConsensusAddrPrefix() external view returns (string);
        function bech32AccountPubPrefix() external view returns (string);
        function bech32ValidatorPubPrefix() external view returns (string);
        function bech32ConsensusPubPrefix() external view returns (string);
    }
}

/// Name of the bech32 contract.
pub const BECH32_CONTRACT_NAME: &str = "Bech32";

/// Largest buffer `bech32EncodeBytes` accepts.
pub const MAX_BECH32_ENCODE_BUFFER_SIZE: usize = 256;

const ENCODE_ADDRESS_GAS: u64 = 30_000;
const ENCODE_32_BYTES_GAS: u64 = 60_000;
const ENCODE_BYTES_GAS: u64 = 200_000;
const DECODE_GAS: u64 = 200_000;
const PREFIX_GAS: u64 = 5_000;

/// Read-only contract converting between raw bytes and bech32 strings.
#[derive(Debug, Clone)]
pub struct Bech32Precompile {
    address: Address,
    config: Arc<Bech32Config>,
}

impl Bech32Precompile {
    /// Contract at [`BECH32_PRECOMPILE_ADDRESS`] answering prefix queries from `config`.
    pub fn new(config: Bech32Config) -> Self {
        Self { address: BECH32_PRECOMPILE_ADDRESS, config: Arc::new(config) }
    }

    /// Moves the contract to `address`.
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }
}

impl PrecompiledContract for Bech32Precompile {
    fn name(&self) -> &'static str {
        BECH32_CONTRACT_NAME
    }

    fn address(&self) -> Address {
        self.address
    }

    fn method_executors(&self) -> Vec<Arc<dyn MethodExecutor>> {
        let prefix = |kind| Arc::new(PrefixGetter { kind, config: self.config.clone() }) as Arc<dyn MethodExecutor>;
        vec![
            Arc::new(EncodeAddress),
            Arc::new(Encode32BytesAddress),
            Arc::new(EncodeBytes),
            Arc::new(Decode),
            prefix(PrefixKind::AccountAddr),
            prefix(PrefixKind::ValidatorAddr),
            prefix(PrefixKind::ConsensusAddr),
            prefix(PrefixKind::AccountPub),
            prefix(PrefixKind::ValidatorPub),
            prefix(PrefixKind::ConsensusPub),
        ]
    }
}

/// `(string, bool)`, empty and false when encoding failed.
fn encoded(result: Option<String>) -> Bytes {
    let ok = result.is_some();
    (result.unwrap_or_default(), ok).abi_encode_params().into()
}

#[derive(Debug)]
struct EncodeAddress;

impl MethodExecutor for EncodeAddress {
    fn selector(&self) -> [u8; 4] {
        IBech32::bech32EncodeAddressCall::SELECTOR
    }

    fn required_gas(&self) -> u64 {
        ENCODE_ADDRESS_GAS
    }

    fn read_only(&self) -> bool {
        true
    }

    fn execute(&self, input: &[u8], _env: &mut ExecutorEnv<'_>) -> Result<Bytes, PrecompileCallError> {
        let call = IBech32::bech32EncodeAddressCall::abi_decode(input)?;
        Ok(encoded(encode_bech32(&call.prefix, call.addr.as_slice()).ok()))
    }
}

#[derive(Debug)]
struct Encode32BytesAddress;

impl MethodExecutor for Encode32BytesAddress {
    fn selector(&self) -> [u8; 4] {
        IBech32::bech32Encode32BytesAddressCall::SELECTOR
    }

    fn required_gas(&self) -> u64 {
        ENCODE_32_BYTES_GAS
    }

    fn read_only(&self) -> bool {
        true
    }

    fn execute(&self, input: &[u8], _env: &mut ExecutorEnv<'_>) -> Result<Bytes, PrecompileCallError> {
        let call = IBech32::bech32Encode32BytesAddressCall::abi_decode(input)?;
        Ok(encoded(encode_bech32(&call.prefix, call.addr.as_slice()).ok()))
    }
}

#[derive(Debug)]
struct EncodeBytes;

impl MethodExecutor for EncodeBytes {
    fn selector(&self) -> [u8; 4] {
        IBech32::bech32EncodeBytesCall::SELECTOR
    }

    fn required_gas(&self) -> u64 {
        ENCODE_BYTES_GAS
    }

    fn read_only(&self) -> bool {
        true
    }

    fn execute(&self, input: &[u8], _env: &mut ExecutorEnv<'_>) -> Result<Bytes, PrecompileCallError> {
        let call = IBech32::bech32EncodeBytesCall::abi_decode(input)?;
        if call.buffer.len() > MAX_BECH32_ENCODE_BUFFER_SIZE {
            return Ok(encoded(None));
        }
        Ok(encoded(encode_bech32(&call.prefix, &call.buffer).ok()))
    }
}

#[derive(Debug)]
struct Decode;

impl MethodExecutor for Decode {
    fn selector(&self) -> [u8; 4] {
        IBech32::bech32DecodeCall::SELECTOR
    }

    fn required_gas(&self) -> u64 {
        DECODE_GAS
    }

    fn read_only(&self) -> bool {
        true
    }

    fn execute(&self, input: &[u8], _env: &mut ExecutorEnv<'_>) -> Result<Bytes, PrecompileCallError> {
        let call = IBech32::bech32DecodeCall::abi_decode(input)?;
        let (prefix, data, ok) = match decode_bech32(&call.bech32) {
            Ok((prefix, data)) => (prefix, Bytes::from(data), true),
            Err(_) => (String::new(), Bytes::new(), false),
        };
        Ok((prefix, data, ok).abi_encode_params().into())
    }
}

#[derive(Debug, Clone, Copy)]
enum PrefixKind {
    AccountAddr,
    ValidatorAddr,
    ConsensusAddr,
    AccountPub,
    ValidatorPub,
    ConsensusPub,
}

#[derive(Debug)]
struct PrefixGetter {
    kind: PrefixKind,
    config: Arc<Bech32Config>,
}

impl MethodExecutor for PrefixGetter {
    fn selector(&self) -> [u8; 4] {
        match self.kind {
            PrefixKind::AccountAddr => IBech32::bech32AccountAddrPrefixCall::SELECTOR,
            PrefixKind::ValidatorAddr => IBech32::bech32ValidatorAddrPrefixCall::SELECTOR,
            PrefixKind::ConsensusAddr => IBech32::bech32ConsensusAddrPrefixCall::SELECTOR,
            PrefixKind::AccountPub => IBech32::bech32AccountPubPrefixCall::SELECTOR,
            PrefixKind::ValidatorPub => IBech32::bech32ValidatorPubPrefixCall::SELECTOR,
            PrefixKind::ConsensusPub => IBech32::bech32ConsensusPubPrefixCall::SELECTOR,
        }
    }

    fn required_gas(&self) -> u64 {
        PREFIX_GAS
    }

    fn read_only(&self) -> bool {
        true
    }

    fn execute(&self, _input: &[u8], _env: &mut ExecutorEnv<'_>) -> Result<Bytes, PrecompileCallError> {
        let prefix = match self.kind {
            PrefixKind::AccountAddr => &self.config.account_addr_prefix,
            PrefixKind::ValidatorAddr => &self.config.validator_addr_prefix,
            PrefixKind::ConsensusAddr => &self.config.consensus_addr_prefix,
            PrefixKind::AccountPub => &self.config.account_pub_prefix,
            PrefixKind::ValidatorPub => &self.config.validator_pub_prefix,
            PrefixKind::ConsensusPub => &self.config.consensus_pub_prefix,
        };
        Ok((prefix.clone(),).abi_encode_params().into())
    }
}
