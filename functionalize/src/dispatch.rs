//! The multi-mode `auto_functionalized` operation.
//!
//! `auto_functionalized(op, **kwargs)` runs a functional version of an
//! eligible mutating operation: it clones the arguments the schema marks as
//! written, runs `op` against the clones, synthesizes post-call values for
//! every bystander alias, and returns
//!
//! ```text
//! logical outputs ++ mutated arguments (signature order) ++ bystander aliases
//! ```
//!
//! All four interpretation modes honor that layout; none reorders or drops
//! an entry. The bystander aliases ride in under the reserved
//! `_all_aliased` keyword, which is why argument names colliding with the
//! reserved set draw a warning at the call site.

use funcify_schema::mutable_arg_names;
use funcify_tensor::Tensor;
use snafu::{ensure, ResultExt};

use crate::error::{self, Result};
use crate::mode::{Mode, ModeStack};
use crate::registry::{ExecKind, Op, Registry};
use crate::rewrite::can_rewrite;
use crate::trace::{ProxyInput, TraceGraph};
use crate::value::{Kwargs, ProxyValue, Value};

/// Reserved keyword carrying the bystander-alias tensors.
pub const ALL_ALIASED_PARAM: &str = "_all_aliased";

/// Names an operation's own arguments must avoid. `self`/`self_` are
/// reserved because receiver parsing makes them ambiguous.
pub const RESERVED_PARAMS: &[&str] = &["_mutable_op", "_only_clone_these_tensors", ALL_ALIASED_PARAM, "self", "self_"];

/// Everything one dispatch runs against: the operator registry, the
/// interpretation-mode stack, and the graph that trace mode records into.
pub struct DispatchContext<'r> {
    registry: &'r Registry,
    modes: ModeStack,
    graph: std::cell::RefCell<TraceGraph>,
}

impl<'r> DispatchContext<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry, modes: ModeStack::new(), graph: std::cell::RefCell::new(TraceGraph::new()) }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    pub fn modes(&self) -> &ModeStack {
        &self.modes
    }

    /// Read access to the recorded graph.
    pub fn trace_graph(&self) -> std::cell::Ref<'_, TraceGraph> {
        self.graph.borrow()
    }
}

/// Dispatch one `auto_functionalized` application under the active mode.
pub fn auto_functionalized(ctx: &DispatchContext, op: &Op, kwargs: Kwargs) -> Result<Vec<Value>> {
    auto_functionalized_with(ctx, op, kwargs, None)
}

/// Like [`auto_functionalized`], with an explicit clone bypass: arguments
/// *not* named in `only_clone` are passed to the kernel verbatim (the caller
/// pre-cloned them) and skipped during alias scatter replay, since an
/// in-place mutation is one the alias has already observed.
pub fn auto_functionalized_with(
    ctx: &DispatchContext,
    op: &Op,
    kwargs: Kwargs,
    only_clone: Option<&[&str]>,
) -> Result<Vec<Value>> {
    ensure!(can_rewrite(op), error::IneligibleOperationSnafu { op: op.signature.name.clone() });

    let mode = ctx.modes().current();
    tracing::debug!(op = %op.signature.name, ?mode, "auto_functionalized dispatch");
    match mode {
        Mode::Functionalize => auto_functionalized_func(ctx, op, kwargs, only_clone),
        Mode::Trace => auto_functionalized_proxy(ctx, op, kwargs, only_clone),
        Mode::Abstract => auto_functionalized_dense(ctx, op, kwargs, only_clone, ExecKind::Abstract),
        Mode::Concrete => auto_functionalized_dense(ctx, op, kwargs, only_clone, ExecKind::Concrete),
    }
}

/// Pull the bystander-alias list out of the reserved keyword slot.
fn take_all_aliased(kwargs: &mut Kwargs) -> Result<Vec<Tensor>> {
    match kwargs.remove(ALL_ALIASED_PARAM) {
        Some(Value::TensorList(ts)) => Ok(ts),
        Some(Value::None) | None => Ok(Vec::new()),
        Some(other) => error::InvalidReservedParameterSnafu {
            name: ALL_ALIASED_PARAM,
            description: other.summary(),
        }
        .fail(),
    }
}

/// Concrete and abstract execution share one control flow; only the kernel
/// strategy differs.
fn auto_functionalized_dense(
    ctx: &DispatchContext,
    op: &Op,
    mut kwargs: Kwargs,
    only_clone: Option<&[&str]>,
    kind: ExecKind,
) -> Result<Vec<Value>> {
    let all_aliased = take_all_aliased(&mut kwargs)?;
    let mutable_names = mutable_arg_names(&op.signature);

    let bypassed = |name: &str| only_clone.is_some_and(|names| !names.contains(&name));

    // Clone each mutated argument (unless bypassed) and substitute the
    // clone into the kernel's keyword map. The clones are also the
    // mutated-argument outputs: the kernel writes through their storage, so
    // the handles collected here observe the post-call values.
    let mut new_kwargs = kwargs.clone();
    let mut mutated_out = Vec::with_capacity(mutable_names.len());
    for &name in &mutable_names {
        let bound = kwargs.get(name).cloned().ok_or_else(|| error::Error::MissingArgument {
            op: op.signature.name.clone(),
            name: name.to_string(),
        })?;
        let substituted = if bypassed(name) {
            bound
        } else {
            match bound {
                Value::None => Value::None,
                Value::Tensor(t) => Value::Tensor(t.clone_preserve_strides()),
                Value::TensorList(ts) => {
                    Value::TensorList(ts.iter().map(Tensor::clone_preserve_strides).collect())
                }
                other => {
                    return error::UnsupportedMutatedArgumentSnafu {
                        name: name.to_string(),
                        description: other.summary(),
                    }
                    .fail()
                }
            }
        };
        new_kwargs.insert(name.to_string(), substituted.clone());
        mutated_out.push(substituted);
    }

    let mut result = ctx.registry().invoke(op, &new_kwargs, kind)?;

    // Each bystander alias must see the effects of every mutation to its
    // storage: replay the post-call values into its world with strided
    // scatter, in signature order. Bypassed arguments were mutated in
    // place, so the alias has already observed those; arguments in other
    // storage groups never touched the alias at all.
    let mut alias_out = Vec::with_capacity(all_aliased.len());
    for alias in &all_aliased {
        let mut observed = alias.clone();
        for &name in &mutable_names {
            if bypassed(name) {
                continue;
            }
            match (kwargs.get(name), new_kwargs.get(name)) {
                (Some(Value::Tensor(orig)), Some(Value::Tensor(src))) => {
                    if alias.same_storage(orig) {
                        observed = observed.as_strided_scatter(src).context(error::TensorSnafu)?;
                    }
                }
                (Some(Value::TensorList(origs)), Some(Value::TensorList(srcs))) => {
                    for (orig, src) in origs.iter().zip(srcs) {
                        if alias.same_storage(orig) {
                            observed = observed.as_strided_scatter(src).context(error::TensorSnafu)?;
                        }
                    }
                }
                (Some(Value::None), _) | (None, _) => {}
                // Unreachable: the substitution loop above rejected
                // anything else.
                (Some(other), _) => {
                    return error::UnsupportedMutatedArgumentSnafu {
                        name: name.to_string(),
                        description: other.summary(),
                    }
                    .fail()
                }
            }
        }
        alias_out.push(Value::Tensor(observed));
    }

    result.extend(mutated_out);
    result.extend(alias_out);
    Ok(result)
}

/// Trace-recording: discover output structure with a suspended trace, then
/// record a single node and hand back proxy handles.
fn auto_functionalized_proxy(
    ctx: &DispatchContext,
    op: &Op,
    kwargs: Kwargs,
    only_clone: Option<&[&str]>,
) -> Result<Vec<Value>> {
    let inner_kwargs: Kwargs = kwargs.iter().map(|(k, v)| (k.clone(), v.clone().unwrap_proxy())).collect();
    let discovered = {
        let _suspended = ctx.modes().suspend_top();
        auto_functionalized_with(ctx, op, inner_kwargs, only_clone)?
    };

    let inputs = kwargs
        .iter()
        .map(|(name, value)| {
            let input = match value {
                Value::Proxy(p) => ProxyInput::Output { node: p.node, index: p.index },
                other => ProxyInput::Lifted(other.summary()),
            };
            (name.clone(), input)
        })
        .collect();
    let node = ctx.graph.borrow_mut().record(op.signature.name.clone(), inputs, discovered.len());
    tracing::debug!(op = %op.signature.name, node = node.0, outputs = discovered.len(), "recorded trace node");

    // Absent markers and scalars are not tensor trees; they pass through
    // unwrapped, keeping their positional slots.
    Ok(discovered
        .into_iter()
        .enumerate()
        .map(|(index, underlying)| match underlying {
            Value::Tensor(_) | Value::TensorList(_) | Value::Tuple(_) => {
                Value::Proxy(Box::new(ProxyValue { node, index, underlying }))
            }
            passthrough => passthrough,
        })
        .collect())
}

/// Nested functionalization: strip one functional layer from every keyword
/// value, redispatch beneath this layer, and restore the layer on the
/// results.
fn auto_functionalized_func(
    ctx: &DispatchContext,
    op: &Op,
    kwargs: Kwargs,
    only_clone: Option<&[&str]>,
) -> Result<Vec<Value>> {
    let unwrapped: Kwargs = kwargs.into_iter().map(|(k, v)| (k, v.unwrap_functional())).collect();
    let result = {
        let _suspended = ctx.modes().suspend_top();
        auto_functionalized_with(ctx, op, unwrapped, only_clone)?
    };
    Ok(result.into_iter().map(Value::wrap_functional).collect())
}
