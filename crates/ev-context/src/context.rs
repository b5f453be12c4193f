use crate::{
    events::Event,
    gas::{Gas, GasMeter, KvGasConfig},
    store::KvStore,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors raised by context operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The branch was not opened on the current state of this context.
    #[error("branch is stale: its origin state has been modified since it was opened")]
    StaleBranch,
    /// A stored value could not be (de)serialized.
    #[error("store codec error for key {key}: {reason}")]
    Codec {
        /// Key, decoded lossily as UTF-8.
        key: String,
        /// Serializer message.
        reason: String,
    },
}

/// Block metadata visible to transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHeader {
    /// Cosmos chain id.
    pub chain_id: String,
    /// Block height.
    pub height: i64,
    /// Block time, unix seconds.
    pub time: u64,
}

/// Per-transaction execution context.
#[derive(Debug, Clone)]
pub struct Context {
    store: KvStore,
    gas_meter: GasMeter,
    block_gas_meter: Option<GasMeter>,
    kv_gas_config: KvGasConfig,
    header: BlockHeader,
    consensus_max_gas: Option<i64>,
    is_check_tx: bool,
    is_recheck_tx: bool,
    priority: i64,
    events: Vec<Event>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(BlockHeader::default())
    }
}

impl Context {
    /// Creates a context over an empty store, in deliver mode, with an infinite gas meter and
    /// no consensus gas limit.
    pub fn new(header: BlockHeader) -> Self {
        Self {
            store: KvStore::new(),
            gas_meter: GasMeter::infinite(),
            block_gas_meter: None,
            kv_gas_config: KvGasConfig::default(),
            header,
            consensus_max_gas: Some(-1),
            is_check_tx: false,
            is_recheck_tx: false,
            priority: 0,
            events: Vec::new(),
        }
    }

    /// Replaces the transaction gas meter.
    pub fn with_gas_meter(mut self, meter: GasMeter) -> Self {
        self.gas_meter = meter;
        self
    }

    /// Sets the block gas meter.
    pub fn with_block_gas_meter(mut self, meter: GasMeter) -> Self {
        self.block_gas_meter = Some(meter);
        self
    }

    /// Sets the KV gas schedule.
    pub fn with_kv_gas_config(mut self, config: KvGasConfig) -> Self {
        self.kv_gas_config = config;
        self
    }

    /// Marks the context as a mempool check.
    pub fn with_is_check_tx(mut self, is_check_tx: bool) -> Self {
        self.is_check_tx = is_check_tx;
        self
    }

    /// Marks the context as a mempool re-check. A re-check is also a check.
    pub fn with_is_recheck_tx(mut self, is_recheck_tx: bool) -> Self {
        if is_recheck_tx {
            self.is_check_tx = true;
        }
        self.is_recheck_tx = is_recheck_tx;
        self
    }

    /// Sets the consensus block max gas; `-1` means unlimited, `None` means no parameters.
    pub fn with_consensus_max_gas(mut self, max_gas: Option<i64>) -> Self {
        self.consensus_max_gas = max_gas;
        self
    }

    /// Sets the block height.
    pub fn with_block_height(mut self, height: i64) -> Self {
        self.header.height = height;
        self
    }

    /// Sets the block time.
    pub fn with_block_time(mut self, time: u64) -> Self {
        self.header.time = time;
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Replaces the gas meter in place.
    pub fn set_gas_meter(&mut self, meter: GasMeter) {
        self.gas_meter = meter;
    }

    /// Replaces the KV gas schedule in place.
    pub fn set_kv_gas_config(&mut self, config: KvGasConfig) {
        self.kv_gas_config = config;
    }

    /// Sets the priority in place.
    pub fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }

    /// Transaction gas meter.
    pub const fn gas_meter(&self) -> &GasMeter {
        &self.gas_meter
    }

    /// Block gas meter, if any.
    pub const fn block_gas_meter(&self) -> Option<&GasMeter> {
        self.block_gas_meter.as_ref()
    }

    /// KV gas schedule.
    pub const fn kv_gas_config(&self) -> KvGasConfig {
        self.kv_gas_config
    }

    /// Block header.
    pub const fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Block height.
    pub const fn block_height(&self) -> i64 {
        self.header.height
    }

    /// Block time.
    pub const fn block_time(&self) -> u64 {
        self.header.time
    }

    /// Running in the mempool.
    pub const fn is_check_tx(&self) -> bool {
        self.is_check_tx
    }

    /// Running a mempool re-check.
    pub const fn is_recheck_tx(&self) -> bool {
        self.is_recheck_tx
    }

    /// Transaction priority.
    pub const fn priority(&self) -> i64 {
        self.priority
    }

    /// Events emitted on this context.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Appends an event.
    pub fn emit_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Gas limit of the current block: the block gas meter limit when set, otherwise the
    /// consensus max gas (`-1` meaning unlimited), otherwise zero.
    pub fn block_gas_limit(&self) -> Gas {
        if let Some(limit) = self.block_gas_meter.as_ref().map(GasMeter::limit).filter(|l| *l != 0) {
            return limit;
        }
        match self.consensus_max_gas {
            Some(-1) => Gas::MAX,
            Some(max) if max > 0 => max as Gas,
            _ => 0,
        }
    }

    /// Runs `f` with a different KV gas schedule, restoring the previous one afterwards.
    pub fn with_kv_gas_scope<T>(&mut self, config: KvGasConfig, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.kv_gas_config, config);
        let out = f(self);
        self.kv_gas_config = previous;
        out
    }

    /// Reads a value, charging read gas.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let config = self.kv_gas_config;
        self.gas_meter.consume_gas(config.read_cost_flat, "ReadFlat");
        let value = self.store.get(key);
        let len = key.len() + value.as_ref().map_or(0, Vec::len);
        self.gas_meter.consume_gas(config.read_cost_per_byte.saturating_mul(len as Gas), "ReadPerByte");
        value
    }

    /// Checks existence, charging has gas.
    pub fn has(&self, key: &[u8]) -> bool {
        self.gas_meter.consume_gas(self.kv_gas_config.has_cost, "Has");
        self.store.has(key)
    }

    /// Writes a value, charging write gas.
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: Vec<u8>) {
        let key = key.into();
        let config = self.kv_gas_config;
        self.gas_meter.consume_gas(config.write_cost_flat, "WriteFlat");
        let len = (key.len() + value.len()) as Gas;
        self.gas_meter.consume_gas(config.write_cost_per_byte.saturating_mul(len), "WritePerByte");
        self.store.set(key, value);
    }

    /// Deletes a value, charging delete gas.
    pub fn delete(&mut self, key: &[u8]) {
        self.gas_meter.consume_gas(self.kv_gas_config.delete_cost, "Delete");
        self.store.delete(key);
    }

    /// Entries under `prefix` in key order, charging iteration gas per entry.
    pub fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let config = self.kv_gas_config;
        let entries = self.store.prefix_entries(prefix);
        for (key, value) in &entries {
            self.gas_meter.consume_gas(config.iter_next_cost_flat, "IterNextFlat");
            let len = (key.len() + value.len()) as Gas;
            self.gas_meter.consume_gas(config.read_cost_per_byte.saturating_mul(len), "ValuePerByte");
        }
        entries
    }

    /// Reads and decodes a JSON value.
    pub fn get_json<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, ContextError> {
        self.get(key)
            .map(|raw| serde_json::from_slice(&raw).map_err(|err| codec_error(key, err)))
            .transpose()
    }

    /// Reads and decodes every JSON value under `prefix`, in key order. Fails on the first
    /// value that does not decode.
    pub fn prefix_json<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<T>, ContextError> {
        self.prefix_entries(prefix)
            .into_iter()
            .map(|(key, raw)| serde_json::from_slice(&raw).map_err(|err| codec_error(&key, err)))
            .collect()
    }

    /// Encodes and writes a JSON value.
    pub fn set_json<T: Serialize>(&mut self, key: impl Into<Vec<u8>>, value: &T) -> Result<(), ContextError> {
        let key = key.into();
        let raw = serde_json::to_vec(value).map_err(|err| codec_error(&key, err))?;
        self.set(key, raw);
        Ok(())
    }

    /// Opens a disposable branch sharing the gas meter. Writes stay in the branch until it is
    /// passed to [`Context::commit`]; dropping it discards them.
    pub fn branch(&self) -> Self {
        Self { store: self.store.branch(), events: Vec::new(), ..self.clone() }
    }

    /// Merges a branch opened with [`Context::branch`] into this context.
    pub fn commit(&mut self, branch: Self) -> Result<(), ContextError> {
        if !self.store.is_current_origin_of(&branch.store) {
            tracing::warn!(target: "ev_context", "refusing to commit stale branch");
            return Err(ContextError::StaleBranch);
        }
        self.absorb(branch);
        Ok(())
    }

    /// Runs `f` on a branch, merging it on `Ok` and discarding it on `Err`.
    pub fn with_cache<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let mut branch = self.branch();
        let out = f(&mut branch)?;
        self.absorb(branch);
        Ok(out)
    }

    fn absorb(&mut self, branch: Self) {
        let Self { store, events, .. } = branch;
        self.store.absorb(store);
        self.events.extend(events);
    }
}

fn codec_error(key: &[u8], err: serde_json::Error) -> ContextError {
    let key = String::from_utf8_lossy(key).into_owned();
    ContextError::Codec { key, reason: err.to_string() }
}
