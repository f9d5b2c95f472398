//! Deferred resolution of module implementation requests.

use tracing::debug;

use crate::context::Context;
use crate::module::ModuleId;

/// Request to implement a module, returned by a store operation that accepted
/// an identity of a not yet implemented module.
#[must_use = "the module stays unimplemented unless the request reaches a resolver"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingImplement(pub ModuleId);

/// Work list of modules to implement once the current operation completes.
#[derive(Debug, Default)]
pub struct Unres {
    pending: Vec<ModuleId>,
}

impl Unres {
    /// Creates an empty work list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a request. Repeated requests for one module are kept once.
    pub fn push(&mut self, request: PendingImplement) {
        if !self.pending.contains(&request.0) {
            self.pending.push(request.0);
        }
    }

    /// Modules waiting to be implemented, in request order.
    pub fn pending(&self) -> &[ModuleId] {
        &self.pending
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every queued request.
    pub fn revert(&mut self) {
        self.pending.clear();
    }

    /// Implements every queued module and returns how many changed state.
    pub fn resolve(&mut self, ctx: &mut Context) -> usize {
        let mut implemented = 0;
        for module in self.pending.drain(..) {
            if ctx.set_implemented(module) {
                debug!(
                    module = %ctx.module(module).map(|m| m.display_name()).unwrap_or_default(),
                    "module implemented by deferred resolution"
                );
                implemented += 1;
            }
        }
        implemented
    }
}
