use crate::error::AnteError;
use ev_context::Context;
use ev_primitives::Tx;
use std::{fmt::Debug, sync::Arc};

/// One stage of the admission pipeline.
///
/// A stage either returns an error without calling `next`, or hands the transaction on by
/// consuming `next` exactly once.
pub trait AnteDecorator: Send + Sync + Debug {
    /// Checks `tx`, possibly mutating `ctx`, then continues with `next`.
    fn ante_handle(&self, ctx: &mut Context, tx: &Tx, simulate: bool, next: Next<'_>) -> Result<(), AnteError>;
}

/// The stages after the current one.
#[derive(Debug)]
pub struct Next<'a> {
    remaining: &'a [Arc<dyn AnteDecorator>],
}

impl<'a> Next<'a> {
    /// Continuation over `remaining`.
    pub const fn new(remaining: &'a [Arc<dyn AnteDecorator>]) -> Self {
        Self { remaining }
    }

    /// Continuation that accepts immediately.
    pub const fn terminal() -> Self {
        Self { remaining: &[] }
    }

    /// Runs the remaining stages.
    pub fn run(self, ctx: &mut Context, tx: &Tx, simulate: bool) -> Result<(), AnteError> {
        match self.remaining.split_first() {
            Some((stage, rest)) => stage.ante_handle(ctx, tx, simulate, Next::new(rest)),
            None => Ok(()),
        }
    }
}

/// An ordered chain of [`AnteDecorator`]s.
#[derive(Debug, Clone, Default)]
pub struct AnteHandler {
    decorators: Vec<Arc<dyn AnteDecorator>>,
}

impl AnteHandler {
    /// Chain running `decorators` in order.
    pub const fn new(decorators: Vec<Arc<dyn AnteDecorator>>) -> Self {
        Self { decorators }
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    /// Returns true when the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Runs the chain directly on `ctx`. On error, `ctx` may hold partial writes.
    pub fn handle(&self, ctx: &mut Context, tx: &Tx, simulate: bool) -> Result<(), AnteError> {
        Next::new(&self.decorators).run(ctx, tx, simulate).inspect_err(|err| {
            tracing::warn!(target: "ev_ante", %err, kind = %err.kind(), "transaction rejected");
        })
    }

    /// Runs the chain on a branch of `ctx` and returns the branch on acceptance. The caller
    /// commits it with [`Context::commit`]; a rejected attempt leaves `ctx` untouched.
    pub fn check(&self, ctx: &Context, tx: &Tx, simulate: bool) -> Result<Context, AnteError> {
        let mut branch = ctx.branch();
        self.handle(&mut branch, tx, simulate)?;
        Ok(branch)
    }
}
