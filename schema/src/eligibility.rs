//! Static eligibility check for the auto-functionalization rewrite.
//!
//! The check is a pure predicate over a declared signature: it never touches
//! tensors, and calling it twice on the same signature yields the same
//! answer. Ineligibility is an answer, not an error; the caller decides
//! whether to fall back to a hand-written rule.

use crate::signature::{Namespace, OpSignature, TypeKind};

/// Decide whether an operation's mutation semantics can be rewritten into a
/// pure-functional call.
///
/// Rejects when:
/// - the operation is a builtin (builtins may mutate metadata in ways the
///   write flags cannot express),
/// - the signature declares no mutation at all,
/// - any written argument is not a tensor, optional tensor, or tensor list,
/// - any declared return aliases an input or is not a plain tensor — unless
///   the sole declared return is `Unit`, which is always accepted since such
///   an operation communicates purely through mutation,
/// - a hand-written functionalization rule is already registered.
pub fn can_auto_functionalize(sig: &OpSignature) -> bool {
    if sig.namespace == Namespace::Builtin {
        return false;
    }
    if !sig.is_mutable() {
        return false;
    }

    for arg in &sig.arguments {
        if !arg.is_write {
            continue;
        }
        match arg.kind {
            TypeKind::Tensor | TypeKind::OptionalTensor | TypeKind::TensorList => {}
            // Not yet supported: other written types, e.g. Tensor?[] or
            // Tensor[]?. Rejected, never guessed at.
            TypeKind::Unit | TypeKind::Other => return false,
        }
    }

    if !sig.returns_unit() {
        for ret in &sig.returns {
            if ret.aliases_input || ret.kind != TypeKind::Tensor {
                return false;
            }
        }
    }

    if sig.manual_functionalization {
        return false;
    }
    true
}

/// The written-argument names of a signature, in signature order.
///
/// Pure and total; meaningful for any signature, eligible or not.
pub fn mutable_arg_names(sig: &OpSignature) -> Vec<&str> {
    sig.arguments.iter().filter(|a| a.is_write).map(|a| a.name.as_str()).collect()
}
