//! Bystander-alias grouping.
//!
//! A mutated argument's write is observable through every live tensor that
//! views the same storage. Arguments themselves are handled directly by the
//! dispatcher; this module finds the *bystanders* — tensors aliasing a
//! mutated argument without being mutated arguments of the call — so their
//! post-call values can be synthesized by scatter replay.

use std::collections::HashSet;

use funcify_schema::{mutable_arg_names, OpSignature};
use funcify_tensor::{Tensor, TensorArena, TensorId};
use snafu::ResultExt;

use crate::error::{self, Result};
use crate::value::{Kwargs, Value};

fn mutated_tensors<'k>(sig: &OpSignature, kwargs: &'k Kwargs) -> Vec<&'k Tensor> {
    let mut tensors = Vec::new();
    for name in mutable_arg_names(sig) {
        match kwargs.get(name) {
            Some(Value::Tensor(t)) => tensors.push(t),
            Some(Value::TensorList(ts)) => tensors.extend(ts.iter()),
            // An absent optional argument contributes no aliases and must
            // not be dereferenced.
            Some(Value::None) | None => {}
            Some(_) => {}
        }
    }
    tensors
}

/// Compute the bystander-alias group for one call: every live identity that
/// shares storage with a mutated argument, minus the mutated arguments
/// themselves, deduplicated, in first-seen order.
///
/// Unregistered tensors (functional intermediates with no arena identity)
/// have no known aliases and contribute nothing.
pub fn bystander_aliases(env: &TensorArena, sig: &OpSignature, kwargs: &Kwargs) -> Result<Vec<TensorId>> {
    let tensors = mutated_tensors(sig, kwargs);

    // Every identity that is itself a mutated argument is handled directly,
    // never as a bystander.
    let mutated_ids: HashSet<TensorId> = tensors.iter().filter_map(|t| t.ident()).collect();

    let mut seen = HashSet::new();
    let mut group = Vec::new();
    for tensor in tensors {
        let Some(id) = tensor.ident() else { continue };
        let storage = env.storage_identity(id).context(error::TensorSnafu)?;
        for &member in env.live_tensors_for_storage(storage).context(error::TensorSnafu)? {
            // Remove the argument's own identity from its alias set first;
            // its absence here would be a design bug, not a runtime case.
            if member == id {
                continue;
            }
            if !mutated_ids.contains(&member) && seen.insert(member) {
                group.push(member);
            }
        }
    }
    Ok(group)
}
