use alloy_evm::{
    precompiles::{Precompile, PrecompileInput, PrecompilesMap},
    EvmInternals,
};
use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use eyre::{OptionExt, Result};
use revm::{
    context::{
        journal::{Journal, JournalInner},
        BlockEnv, CfgEnv, TxEnv,
    },
    database::{CacheDB, EmptyDB},
    precompile::Precompiles,
    primitives::hardfork::SpecId,
};

use ev_common::{address_to_bech32, Bech32Config};
use ev_context::Context;
use ev_precompiles::{address::BECH32_PRECOMPILE_ADDRESS, install_precompiles, IBech32, PrecompileRegistry};

use crate::common::init_test_tracing;

const CALLER: Address = address!("0x00000000000000000000000000000000000a11ce");

/// Precompile map of a Prague chain carrying the default system contracts.
fn chain_precompiles(prefix: &str) -> Result<PrecompilesMap> {
    let registry = PrecompileRegistry::with_defaults(Bech32Config::from_main_prefix(prefix))?;
    let mut precompiles = PrecompilesMap::from_static(Precompiles::prague());
    install_precompiles(&mut precompiles, &registry, 0, &Context::default());
    Ok(precompiles)
}

fn call(precompiles: &PrecompilesMap, data: &[u8]) -> Result<Bytes> {
    let precompile = precompiles.get(&BECH32_PRECOMPILE_ADDRESS).ok_or_eyre("bech32 precompile installed")?;
    let mut journal: Journal<CacheDB<EmptyDB>> = Journal::new_with_inner(CacheDB::default(), JournalInner::new());
    journal.inner.set_spec_id(SpecId::PRAGUE);
    let block_env = BlockEnv::default();
    let cfg_env: CfgEnv = CfgEnv::default();
    let tx_env = TxEnv::default();
    let input = PrecompileInput {
        data,
        gas: 1_000_000,
        caller: CALLER,
        value: U256::ZERO,
        target_address: BECH32_PRECOMPILE_ADDRESS,
        bytecode_address: BECH32_PRECOMPILE_ADDRESS,
        is_static: false,
        internals: EvmInternals::new(&mut journal, &block_env, &cfg_env, &tx_env),
    };
    let output = precompile.call(input).map_err(|err| eyre::eyre!("precompile call failed: {err}"))?;
    Ok(output.bytes)
}

#[test]
fn test_bech32_round_trip_through_installed_precompile() -> Result<()> {
    init_test_tracing();
    let precompiles = chain_precompiles("evmos")?;
    let addresses = [
        CALLER,
        Address::ZERO,
        Address::repeat_byte(0xff),
        address!("0x944fDcD1c868E3cC566C78023CcB38A32cDA836E"),
    ];

    for prefix in ["cosmos", "evmos", "osmo", "evmosvaloper"] {
        for addr in addresses {
            let data = IBech32::bech32EncodeAddressCall { prefix: prefix.into(), addr }.abi_encode();
            let (encoded, ok) = <(String, bool)>::abi_decode_params(&call(&precompiles, &data)?)?;
            assert!(ok, "{prefix} {addr}");
            assert_eq!(encoded, address_to_bech32(prefix, addr)?);

            let data = IBech32::bech32DecodeCall { bech32: encoded }.abi_encode();
            let (hrp, bytes, ok) = <(String, Bytes, bool)>::abi_decode_params(&call(&precompiles, &data)?)?;
            assert!(ok);
            assert_eq!(hrp, prefix);
            assert_eq!(bytes.as_ref(), addr.as_slice());
        }
    }
    Ok(())
}

#[test]
fn test_oversized_buffer_fails_softly() -> Result<()> {
    init_test_tracing();
    let precompiles = chain_precompiles("evmos")?;

    let data = IBech32::bech32EncodeBytesCall { prefix: "cosmos".into(), buffer: vec![7u8; 300].into() }.abi_encode();
    let (encoded, ok) = <(String, bool)>::abi_decode_params(&call(&precompiles, &data)?)?;
    assert!(!ok);
    assert!(encoded.is_empty());
    Ok(())
}

#[test]
fn test_prefixes_follow_chain_configuration() -> Result<()> {
    init_test_tracing();
    let precompiles = chain_precompiles("evmos")?;

    let cases: [(Vec<u8>, &str); 3] = [
        (IBech32::bech32AccountAddrPrefixCall {}.abi_encode(), "evmos"),
        (IBech32::bech32ValidatorAddrPrefixCall {}.abi_encode(), "evmosvaloper"),
        (IBech32::bech32ConsensusPubPrefixCall {}.abi_encode(), "evmosvalconspub"),
    ];
    for (data, expected) in cases {
        let (prefix,) = <(String,)>::abi_decode_params(&call(&precompiles, &data)?)?;
        assert_eq!(prefix, expected);
    }
    Ok(())
}
