//! The call-site rewriter: one eligible mutating call in, one pure call out.
//!
//! `do_auto_functionalize` is the sole entry point integration code needs.
//! It normalizes the call's arguments against the schema, computes the
//! bystander-alias group from the live-tensor arena, dispatches the
//! `auto_functionalized` operation beneath the current functionalization
//! layer, writes the resulting values back onto the original identities
//! (arguments and bystanders alike), and returns the call's logical output
//! as if the operation never had side effects.

use funcify_schema::mutable_arg_names;
use funcify_tensor::{Tensor, TensorArena};
use snafu::{ensure, ResultExt};

use crate::alias::bystander_aliases;
use crate::dispatch::{auto_functionalized, DispatchContext, ALL_ALIASED_PARAM, RESERVED_PARAMS};
use crate::error::{self, Result};
use crate::mode::Mode;
use crate::registry::Op;
use crate::value::{Kwargs, Value};

/// Whether an operation is eligible for the automatic rewrite.
///
/// A `false` answer is not an error: the caller falls back to a
/// hand-written functionalization rule.
pub fn can_rewrite(op: &Op) -> bool {
    funcify_schema::can_auto_functionalize(&op.signature)
}

/// Bind positional and keyword arguments to signature names, filling
/// omitted arguments from their declared defaults.
fn normalize_arguments(op: &Op, args: &[Value], kwargs: &Kwargs) -> Result<Kwargs> {
    let mut normalized = Kwargs::new();
    for (idx, arg) in op.signature.arguments.iter().enumerate() {
        let value = if let Some(value) = kwargs.get(&arg.name) {
            value.clone()
        } else if idx < args.len() {
            args[idx].clone()
        } else if let Some(default) = arg.default {
            Value::from(default)
        } else {
            return error::MissingArgumentSnafu { op: op.signature.name.clone(), name: arg.name.clone() }
                .fail();
        };
        normalized.insert(arg.name.clone(), value);
    }
    Ok(normalized)
}

/// Write one dispatcher output back onto the identity of its original value.
pub(crate) fn write_back_one(env: &mut TensorArena, name: &str, original: &Value, output: Value) -> Result<()> {
    fn single(env: &mut TensorArena, name: &str, original: &Tensor, new: Tensor) -> Result<()> {
        ensure!(new.same_metadata(original), error::WritebackMetadataMismatchSnafu { name });
        match original.ident() {
            Some(id) => env.write_back(id, new).context(error::TensorSnafu),
            None => {
                // A functional intermediate was mutated; there is no
                // environment identity to update.
                tracing::debug!(argument = name, "writeback target has no arena identity, skipping");
                Ok(())
            }
        }
    }

    match (original, output) {
        // Absent marker: the argument was optional and unset.
        (_, Value::None) => Ok(()),
        (Value::Tensor(orig), Value::Tensor(new)) => single(env, name, orig, new),
        (Value::TensorList(origs), Value::TensorList(news)) => {
            ensure!(
                origs.len() == news.len(),
                error::WritebackLengthMismatchSnafu { expected: origs.len(), got: news.len() }
            );
            for (orig, new) in origs.iter().zip(news) {
                single(env, name, orig, new)?;
            }
            Ok(())
        }
        (_, other) => error::UnsupportedMutatedOutputSnafu { description: other.summary() }.fail(),
    }
}

/// Collapse the logical-output prefix per the signature's declared return
/// arity.
fn collapse_logical(op: &Op, logical: &[Value]) -> Result<Value> {
    let returns = &op.signature.returns;
    if returns.is_empty() || op.signature.returns_unit() {
        ensure!(logical.len() == 1, error::ReturnArityMismatchSnafu { expected: 1usize, got: logical.len() });
        ensure!(logical[0].is_none(), error::NonUnitPlaceholderSnafu { description: logical[0].summary() });
        Ok(Value::None)
    } else if returns.len() == 1 {
        ensure!(logical.len() == 1, error::ReturnArityMismatchSnafu { expected: 1usize, got: logical.len() });
        Ok(logical[0].clone())
    } else {
        ensure!(
            logical.len() == returns.len(),
            error::ReturnArityMismatchSnafu { expected: returns.len(), got: logical.len() }
        );
        Ok(Value::Tuple(logical.to_vec()))
    }
}

/// Functionalize one occurrence of an eligible mutating call.
///
/// Returns the operation's logical (non-mutating) output, re-wrapped for
/// the calling functionalization layer. Every mutated argument and every
/// bystander alias in `env` holds its functional post-call value afterward.
pub fn do_auto_functionalize(
    ctx: &DispatchContext,
    env: &mut TensorArena,
    op: &Op,
    args: &[Value],
    kwargs: &Kwargs,
) -> Result<Value> {
    let normalized = normalize_arguments(op, args, kwargs)?;

    for name in normalized.keys() {
        if RESERVED_PARAMS.contains(&name.as_str()) {
            tracing::warn!(
                op = %op.signature.name,
                argument = %name,
                "argument name collides with a reserved dispatcher parameter and may parse ambiguously"
            );
        }
    }

    let unwrapped: Kwargs =
        normalized.into_iter().map(|(k, v)| (k, v.unwrap_functional())).collect();

    let mutable_names = mutable_arg_names(&op.signature);
    let alias_group = bystander_aliases(env, &op.signature, &unwrapped)?;
    let alias_originals: Vec<Tensor> = alias_group
        .iter()
        .map(|&id| env.tensor_for_identity(id).map(Tensor::clone))
        .collect::<funcify_tensor::Result<_>>()
        .context(error::TensorSnafu)?;
    tracing::debug!(
        op = %op.signature.name,
        mutated = mutable_names.len(),
        bystanders = alias_group.len(),
        "rewriting mutating call"
    );

    // Dispatch beneath the current functionalization layer so this rewrite
    // does not recursively re-trigger itself.
    let mut call_kwargs = unwrapped.clone();
    call_kwargs.insert(ALL_ALIASED_PARAM.to_string(), Value::TensorList(alias_originals.clone()));
    let outputs = {
        let _redispatch = ctx.modes().suspend_if(Mode::Functionalize);
        auto_functionalized(ctx, op, call_kwargs)?
    };

    // Split the flat result: logical prefix, then mutated arguments, then
    // bystander aliases.
    let n_suffix = mutable_names.len() + alias_originals.len();
    ensure!(
        outputs.len() >= n_suffix,
        error::TruncatedDispatchResultSnafu { expected: n_suffix, got: outputs.len() }
    );
    let (logical, mutated_and_aliases) = outputs.split_at(outputs.len() - n_suffix);

    let logical_output = collapse_logical(op, logical)?;

    // Writeback, in the same fixed order the dispatcher produced.
    let originals: Vec<(&str, Value)> = mutable_names
        .iter()
        .map(|&name| (name, unwrapped.get(name).cloned().unwrap_or(Value::None)))
        .chain(alias_originals.iter().map(|t| (ALL_ALIASED_PARAM, Value::Tensor(t.clone()))))
        .collect();
    debug_assert_eq!(originals.len(), mutated_and_aliases.len());
    for ((name, original), output) in originals.into_iter().zip(mutated_and_aliases) {
        let output = output.clone().unwrap_functional().unwrap_proxy();
        write_back_one(env, name, &original, output)?;
    }

    Ok(logical_output.wrap_functional())
}
