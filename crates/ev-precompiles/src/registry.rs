//! Construct-then-freeze registry of system contracts.

use crate::{
    address::{AddressGenerator, BECH32_ADDRESS_NONCE},
    bech32::Bech32Precompile,
    dispatch::{CallOutput, MethodExecutor, PrecompiledMethod},
    error::{PrecompileCallError, RegistryError},
};
use alloy_primitives::Address;
use ev_common::Bech32Config;
use ev_context::Context;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    sync::Arc,
};

/// A system contract living at a fixed address.
pub trait PrecompiledContract: Send + Sync + Debug {
    /// Human readable name.
    fn name(&self) -> &'static str;

    /// Fixed address.
    fn address(&self) -> Address;

    /// Every method the contract exposes.
    fn method_executors(&self) -> Vec<Arc<dyn MethodExecutor>>;
}

/// A registered contract with its methods indexed by selector.
#[derive(Debug)]
pub struct RegisteredContract {
    contract: Arc<dyn PrecompiledContract>,
    enabled_at: u64,
    methods: HashMap<[u8; 4], PrecompiledMethod>,
}

impl RegisteredContract {
    fn new(contract: Arc<dyn PrecompiledContract>, enabled_at: u64) -> Result<Self, RegistryError> {
        let mut methods = HashMap::new();
        for executor in contract.method_executors() {
            let selector = executor.selector();
            if !executor.read_only() {
                return Err(RegistryError::WritableMethod {
                    contract: contract.name().to_string(),
                    selector: hex::encode(selector),
                });
            }
            if methods.insert(selector, PrecompiledMethod::new(executor)).is_some() {
                return Err(RegistryError::DuplicateSelector {
                    contract: contract.name().to_string(),
                    selector: hex::encode(selector),
                });
            }
        }
        Ok(Self { contract, enabled_at, methods })
    }

    /// Contract name.
    pub fn name(&self) -> &'static str {
        self.contract.name()
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// First protocol version the contract is active at.
    pub const fn enabled_at(&self) -> u64 {
        self.enabled_at
    }

    /// Method registered for `selector`.
    pub fn method(&self, selector: [u8; 4]) -> Option<&PrecompiledMethod> {
        self.methods.get(&selector)
    }

    /// Routes a call by selector and charges the method's fixed gas.
    pub fn call(
        &self,
        ctx: &Context,
        caller: Address,
        input: &[u8],
        gas_limit: u64,
    ) -> Result<CallOutput, PrecompileCallError> {
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(PrecompileCallError::ShortInput(input.len()))?;
        let method =
            self.method(selector).ok_or_else(|| PrecompileCallError::UnknownSelector(hex::encode(selector)))?;

        let required = method.required_gas();
        if gas_limit < required {
            return Err(PrecompileCallError::OutOfGas { required, available: gas_limit });
        }

        let bytes = method.execute(ctx, caller, self.address(), input)?;
        tracing::trace!(
            target: "ev_precompiles",
            contract = self.name(),
            selector = %hex::encode(selector),
            gas_used = required,
            "precompile call"
        );
        Ok(CallOutput { gas_used: required, bytes })
    }
}

/// Collects contracts during start-up.
#[derive(Debug, Default)]
pub struct PrecompileRegistryBuilder {
    contracts: BTreeMap<Address, Arc<RegisteredContract>>,
}

impl PrecompileRegistryBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `contract`, active from protocol version `enabled_at`.
    pub fn register(
        mut self,
        contract: Arc<dyn PrecompiledContract>,
        enabled_at: u64,
    ) -> Result<Self, RegistryError> {
        let address = contract.address();
        if self.contracts.contains_key(&address) {
            return Err(RegistryError::DuplicateAddress(address));
        }
        let registered = RegisteredContract::new(contract, enabled_at)?;
        tracing::debug!(target: "ev_precompiles", name = registered.name(), %address, enabled_at, "registered precompile");
        self.contracts.insert(address, Arc::new(registered));
        Ok(self)
    }

    /// Freezes the registry.
    pub fn build(self) -> PrecompileRegistry {
        PrecompileRegistry { contracts: self.contracts }
    }
}

/// Immutable set of system contracts keyed by address.
#[derive(Debug, Clone, Default)]
pub struct PrecompileRegistry {
    contracts: BTreeMap<Address, Arc<RegisteredContract>>,
}

impl PrecompileRegistry {
    /// Starts a new registry.
    pub fn builder() -> PrecompileRegistryBuilder {
        PrecompileRegistryBuilder::new()
    }

    /// Every system contract of the chain, enabled from genesis.
    ///
    /// # Panics
    ///
    /// Panics when two system contracts are given the same address nonce.
    pub fn with_defaults(bech32: Bech32Config) -> Result<Self, RegistryError> {
        let mut addresses = AddressGenerator::new();
        let bech32 = Bech32Precompile::new(bech32).with_address(addresses.generate(BECH32_ADDRESS_NONCE));
        Ok(Self::builder().register(Arc::new(bech32), 0)?.build())
    }

    /// [`Self::with_defaults`] with bech32 prefixes read from the environment.
    pub fn from_env() -> eyre::Result<Self> {
        let bech32 = Bech32Config::from_env()?;
        Ok(Self::with_defaults(bech32)?)
    }

    /// Contract at `address`.
    pub fn get(&self, address: &Address) -> Option<&Arc<RegisteredContract>> {
        self.contracts.get(address)
    }

    /// Contracts enabled at `version`, by ascending address.
    pub fn active_at(&self, version: u64) -> Vec<Arc<RegisteredContract>> {
        self.contracts.values().filter(|contract| contract.enabled_at <= version).cloned().collect()
    }

    /// Number of registered contracts.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{address::precompile_address, dispatch::tests::Echo};
    use alloy_primitives::Bytes;

    #[derive(Debug)]
    struct Dummy {
        address: Address,
        methods: Vec<(u8, bool)>,
    }

    impl PrecompiledContract for Dummy {
        fn name(&self) -> &'static str {
            "Dummy"
        }

        fn address(&self) -> Address {
            self.address
        }

        fn method_executors(&self) -> Vec<Arc<dyn MethodExecutor>> {
            self.methods
                .iter()
                .map(|(tag, read_only)| {
                    Arc::new(Echo { selector: [*tag; 4], gas: 100, read_only: *read_only }) as Arc<dyn MethodExecutor>
                })
                .collect()
        }
    }

    fn dummy(nonce: u8) -> Arc<Dummy> {
        Arc::new(Dummy { address: precompile_address(nonce), methods: vec![(1, true)] })
    }

    #[test]
    fn active_contracts_are_sorted_by_address() {
        let registry = PrecompileRegistry::builder()
            .register(dummy(9), 0)
            .and_then(|b| b.register(dummy(3), 5))
            .and_then(|b| b.register(dummy(5), 2))
            .expect("registers")
            .build();

        let at = |version| registry.active_at(version).iter().map(|c| c.address()).collect::<Vec<_>>();
        assert_eq!(at(0), [precompile_address(9)]);
        assert_eq!(at(2), [precompile_address(5), precompile_address(9)]);
        assert_eq!(at(10), [precompile_address(3), precompile_address(5), precompile_address(9)]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn rejects_duplicates_and_writable_methods() {
        let err = PrecompileRegistry::builder().register(dummy(2), 0).and_then(|b| b.register(dummy(2), 1));
        assert_eq!(err.expect_err("duplicate"), RegistryError::DuplicateAddress(precompile_address(2)));

        let writable = Arc::new(Dummy { address: precompile_address(4), methods: vec![(1, true), (2, false)] });
        assert!(matches!(
            PrecompileRegistry::builder().register(writable, 0),
            Err(RegistryError::WritableMethod { .. })
        ));

        let twice = Arc::new(Dummy { address: precompile_address(4), methods: vec![(1, true), (1, true)] });
        assert!(matches!(
            PrecompileRegistry::builder().register(twice, 0),
            Err(RegistryError::DuplicateSelector { .. })
        ));
    }

    #[test]
    fn defaults_hold_bech32() {
        let registry = PrecompileRegistry::with_defaults(Bech32Config::default()).expect("defaults");
        let active = registry.active_at(0);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name(), "Bech32");
        assert_eq!(active[0].address(), crate::address::BECH32_PRECOMPILE_ADDRESS);
    }

    #[test]
    fn router_errors_are_returned() {
        let registry = PrecompileRegistry::builder().register(dummy(2), 0).expect("registers").build();
        let contract = registry.get(&precompile_address(2)).expect("registered");
        let ctx = Context::default();

        assert_eq!(contract.call(&ctx, Address::ZERO, &[1, 1], 1_000), Err(PrecompileCallError::ShortInput(2)));
        assert_eq!(
            contract.call(&ctx, Address::ZERO, &[7, 7, 7, 7], 1_000),
            Err(PrecompileCallError::UnknownSelector("07070707".into()))
        );
        assert_eq!(
            contract.call(&ctx, Address::ZERO, &[1, 1, 1, 1], 99),
            Err(PrecompileCallError::OutOfGas { required: 100, available: 99 })
        );

        let out = contract.call(&ctx, Address::ZERO, &[1, 1, 1, 1, 0xff], 1_000).expect("routed");
        assert_eq!(out, CallOutput { gas_used: 100, bytes: Bytes::from(vec![1, 1, 1, 1, 0xff]) });
    }
}
