//! Method executors and selector routing.

use crate::error::PrecompileCallError;
use alloy_primitives::{Address, Bytes};
use ev_context::Context;
use std::{fmt::Debug, sync::Arc};

/// Everything an executor may look at while handling a call.
#[derive(Debug)]
pub struct ExecutorEnv<'a> {
    /// Disposable snapshot of the chain state. Writes are dropped after the call.
    pub ctx: &'a mut Context,
    /// Account calling the contract.
    pub caller: Address,
    /// Address of the contract being called.
    pub contract: Address,
}

/// One method of a precompiled contract.
pub trait MethodExecutor: Send + Sync + Debug {
    /// The 4-byte selector routed to this method.
    fn selector(&self) -> [u8; 4];

    /// Fixed gas charged per call.
    fn required_gas(&self) -> u64;

    /// Returns true when the method never writes state.
    fn read_only(&self) -> bool;

    /// Handles a call. `input` includes the selector.
    fn execute(&self, input: &[u8], env: &mut ExecutorEnv<'_>) -> Result<Bytes, PrecompileCallError>;
}

/// Wraps an executor with the checks every call goes through.
#[derive(Debug, Clone)]
pub struct PrecompiledMethod {
    executor: Arc<dyn MethodExecutor>,
}

impl PrecompiledMethod {
    /// Wraps `executor`.
    pub const fn new(executor: Arc<dyn MethodExecutor>) -> Self {
        Self { executor }
    }

    /// Selector of the wrapped method.
    pub fn selector(&self) -> [u8; 4] {
        self.executor.selector()
    }

    /// Fixed gas of the wrapped method.
    pub fn required_gas(&self) -> u64 {
        self.executor.required_gas()
    }

    /// Whether the wrapped method is read-only.
    pub fn read_only(&self) -> bool {
        self.executor.read_only()
    }

    /// Runs the method on a branch of `ctx`, which is discarded afterwards.
    ///
    /// # Panics
    ///
    /// Panics when `input` is shorter than a selector or does not start with this method's
    /// selector. Routing guarantees neither happens.
    pub fn execute(
        &self,
        ctx: &Context,
        caller: Address,
        contract: Address,
        input: &[u8],
    ) -> Result<Bytes, PrecompileCallError> {
        let expected = self.executor.selector();
        match input.get(..4) {
            None => panic!("invalid call input, minimum 4 bytes required"),
            Some(selector) if selector != expected.as_slice() => panic!(
                "mis-match signature, expected {}, got {}",
                hex::encode(expected),
                hex::encode(selector)
            ),
            Some(_) => {}
        }

        let mut snapshot = ctx.branch();
        let mut env = ExecutorEnv { ctx: &mut snapshot, caller, contract };
        self.executor.execute(input, &mut env)
    }
}

/// Output of a routed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutput {
    /// Gas charged.
    pub gas_used: u64,
    /// ABI encoded return data.
    pub bytes: Bytes,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes a marker into the snapshot and echoes the input.
    #[derive(Debug)]
    pub(crate) struct Echo {
        pub(crate) selector: [u8; 4],
        pub(crate) gas: u64,
        pub(crate) read_only: bool,
    }

    impl MethodExecutor for Echo {
        fn selector(&self) -> [u8; 4] {
            self.selector
        }

        fn required_gas(&self) -> u64 {
            self.gas
        }

        fn read_only(&self) -> bool {
            self.read_only
        }

        fn execute(&self, input: &[u8], env: &mut ExecutorEnv<'_>) -> Result<Bytes, PrecompileCallError> {
            env.ctx.set(b"echo".to_vec(), input.to_vec());
            Ok(Bytes::copy_from_slice(input))
        }
    }

    fn method() -> PrecompiledMethod {
        PrecompiledMethod::new(Arc::new(Echo { selector: [1, 2, 3, 4], gas: 10, read_only: true }))
    }

    #[test]
    fn executes_on_a_discarded_snapshot() {
        let ctx = Context::default();
        let out = method().execute(&ctx, Address::ZERO, Address::ZERO, &[1, 2, 3, 4, 9]).expect("executes");
        assert_eq!(out, Bytes::from(vec![1, 2, 3, 4, 9]));
        assert!(!ctx.has(b"echo"));
    }

    #[test]
    #[should_panic(expected = "invalid call input, minimum 4 bytes required")]
    fn short_input_panics() {
        let _ = method().execute(&Context::default(), Address::ZERO, Address::ZERO, &[1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "mis-match signature, expected 01020304, got 01020305")]
    fn wrong_selector_panics() {
        let _ = method().execute(&Context::default(), Address::ZERO, Address::ZERO, &[1, 2, 3, 5]);
    }
}
