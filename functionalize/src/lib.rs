//! Automatic functionalization of mutating tensor operations.
//!
//! Some operations declare in-place semantics: they write through one or
//! more of their arguments. A graph compiler that assumes no destructive
//! updates cannot consume such calls directly. This crate rewrites an
//! eligible mutating call into an equivalent pure call: clone what would be
//! mutated, run the real operation on the clones, then propagate the new
//! values back onto the original arguments *and every live tensor that
//! shares storage with them*, so all observable effects survive the rewrite.
//!
//! # Module Organization
//!
//! - [`value`] - Runtime value union flowing through calls
//! - [`registry`] - Operator registry (signatures plus opaque kernels)
//! - [`mode`] - Interpretation-mode stack with scoped guards
//! - [`trace`] - Recorded graph the trace mode emits into
//! - [`alias`] - Bystander-alias grouping against the tensor arena
//! - [`dispatch`] - The multi-mode `auto_functionalized` operation
//! - [`rewrite`] - The call-site entry point `do_auto_functionalize`
//!
//! The eligibility predicate lives in `funcify_schema`; the tensor
//! environment (arena, scatter primitives) in `funcify_tensor`.

pub mod alias;
pub mod dispatch;
pub mod error;
pub mod mode;
pub mod registry;
pub mod rewrite;
pub mod trace;
pub mod value;

#[cfg(test)]
mod test;

pub use dispatch::{auto_functionalized, auto_functionalized_with, DispatchContext, ALL_ALIASED_PARAM, RESERVED_PARAMS};
pub use error::{Error, Result};
pub use mode::{Mode, ModeStack};
pub use registry::{ExecKind, Op, OpDef, Registry};
pub use rewrite::{can_rewrite, do_auto_functionalize};
pub use trace::{NodeId, ProxyInput, TraceGraph, TraceNode};
pub use value::{Kwargs, ProxyValue, Value};
