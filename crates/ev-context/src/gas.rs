//! Gas meters and KV gas schedules.

use parking_lot::Mutex;
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// Amount of gas.
pub type Gas = u64;

/// Gas charged by KV store accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KvGasConfig {
    /// Flat cost of an existence check.
    pub has_cost: Gas,
    /// Flat cost of a delete.
    pub delete_cost: Gas,
    /// Flat cost of a read.
    pub read_cost_flat: Gas,
    /// Cost per key and value byte read.
    pub read_cost_per_byte: Gas,
    /// Flat cost of a write.
    pub write_cost_flat: Gas,
    /// Cost per key and value byte written.
    pub write_cost_per_byte: Gas,
    /// Flat cost of advancing an iterator.
    pub iter_next_cost_flat: Gas,
}

impl KvGasConfig {
    /// Schedule charging nothing, used where gas must match Ethereum accounting.
    pub const fn zero() -> Self {
        Self {
            has_cost: 0,
            delete_cost: 0,
            read_cost_flat: 0,
            read_cost_per_byte: 0,
            write_cost_flat: 0,
            write_cost_per_byte: 0,
            iter_next_cost_flat: 0,
        }
    }
}

impl Default for KvGasConfig {
    fn default() -> Self {
        Self {
            has_cost: 1000,
            delete_cost: 1000,
            read_cost_flat: 1000,
            read_cost_per_byte: 3,
            write_cost_flat: 2000,
            write_cost_per_byte: 30,
            iter_next_cost_flat: 30,
        }
    }
}

/// Panic payload raised when a meter is exhausted.
///
/// Meters never return this as an error: exhaustion aborts the whole transaction and is only
/// recovered at the block execution boundary with [`recover_out_of_gas`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfGas {
    /// What was being charged.
    pub descriptor: String,
    /// Meter limit.
    pub limit: Gas,
    /// Gas consumed including the failing charge, saturated on overflow.
    pub consumed: Gas,
}

impl fmt::Display for OutOfGas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "out of gas in location: {}; gasWanted: {}, gasUsed: {}",
            self.descriptor, self.limit, self.consumed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeterKind {
    Basic,
    Infinite,
}

#[derive(Debug)]
struct MeterState {
    kind: MeterKind,
    limit: Gas,
    consumed: Gas,
}

/// Shared handle to a gas meter. Clones observe and charge the same counter.
#[derive(Clone)]
pub struct GasMeter {
    inner: Arc<Mutex<MeterState>>,
}

impl GasMeter {
    fn with_state(kind: MeterKind, limit: Gas) -> Self {
        Self { inner: Arc::new(Mutex::new(MeterState { kind, limit, consumed: 0 })) }
    }

    /// Meter that aborts once more than `limit` gas is consumed.
    pub fn new(limit: Gas) -> Self {
        Self::with_state(MeterKind::Basic, limit)
    }

    /// Meter without limit.
    pub fn infinite() -> Self {
        Self::with_state(MeterKind::Infinite, 0)
    }

    /// Meter that records `limit` but never aborts on it.
    pub fn infinite_with_limit(limit: Gas) -> Self {
        Self::with_state(MeterKind::Infinite, limit)
    }

    /// Configured limit; zero for a plain infinite meter.
    pub fn limit(&self) -> Gas {
        self.inner.lock().limit
    }

    /// Gas consumed so far.
    pub fn consumed(&self) -> Gas {
        self.inner.lock().consumed
    }

    /// Gas left before the limit, zero once past it.
    pub fn remaining(&self) -> Gas {
        let state = self.inner.lock();
        state.limit.saturating_sub(state.consumed)
    }

    /// Returns true when the meter never aborts.
    pub fn is_infinite(&self) -> bool {
        self.inner.lock().kind == MeterKind::Infinite
    }

    /// Charges `amount`.
    ///
    /// # Panics
    ///
    /// Panics with an [`OutOfGas`] payload when a basic meter goes past its limit or when the
    /// counter overflows.
    pub fn consume_gas(&self, amount: Gas, descriptor: &str) {
        let exhausted = {
            let mut state = self.inner.lock();
            match state.consumed.checked_add(amount) {
                Some(consumed) => {
                    state.consumed = consumed;
                    state.kind == MeterKind::Basic && consumed > state.limit
                }
                None => {
                    state.consumed = Gas::MAX;
                    true
                }
            }
            .then(|| OutOfGas {
                descriptor: descriptor.to_string(),
                limit: state.limit,
                consumed: state.consumed,
            })
        };
        if let Some(out_of_gas) = exhausted {
            panic::panic_any(out_of_gas);
        }
    }

    /// Returns `amount` to the meter.
    pub fn refund_gas(&self, amount: Gas) {
        let mut state = self.inner.lock();
        state.consumed = state.consumed.saturating_sub(amount);
    }
}

impl fmt::Debug for GasMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("GasMeter")
            .field("kind", &state.kind)
            .field("limit", &state.limit)
            .field("consumed", &state.consumed)
            .finish()
    }
}

/// Runs `f`, converting an [`OutOfGas`] abort into an error. Any other panic keeps unwinding.
pub fn recover_out_of_gas<T>(f: impl FnOnce() -> T) -> Result<T, OutOfGas> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<OutOfGas>() {
            Ok(out_of_gas) => Err(*out_of_gas),
            Err(other) => panic::resume_unwind(other),
        },
    }
}
