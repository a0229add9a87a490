//! Shared fixtures: a small library of mutating operations and tensor
//! environment builders.

use funcify_schema::{DefaultValue, OpSignature, TypeKind};
use funcify_tensor::{DType, Tensor, TensorArena, TensorId};

use crate::error::{self, Result};
use crate::registry::{OpDef, Registry};
use crate::value::{Kwargs, Value};

pub fn tensor_arg<'k>(kwargs: &'k Kwargs, name: &str) -> Result<&'k Tensor> {
    match kwargs.get(name) {
        Some(Value::Tensor(t)) => Ok(t),
        other => error::UnsupportedMutatedArgumentSnafu {
            name,
            description: other.map_or_else(|| "missing".to_string(), |v| v.summary()),
        }
        .fail(),
    }
}

pub fn float_arg(kwargs: &Kwargs, name: &str) -> f64 {
    match kwargs.get(name) {
        Some(Value::Float(f)) => *f,
        _ => 0.0,
    }
}

fn map_in_place(t: &Tensor, f: impl Fn(f64) -> f64) -> Result<()> {
    for idx in t.indices() {
        let v = t.load(&idx).map_err(|source| error::Error::Tensor { source })?;
        t.store(&idx, f(v)).map_err(|source| error::Error::Tensor { source })?;
    }
    Ok(())
}

/// A registry with one of everything the rewrite supports:
///
/// - `sin_(x!: tensor) -> ()` — pure mutation, no returns
/// - `fill_(x!: tensor?, value: float = 0.0) -> ()` — optional mutated arg
/// - `scale2_(a!: tensor, b!: tensor) -> ()` — two mutated args (a*2, b*3)
/// - `scale_list_(xs!: tensor[], c: float) -> ()` — element-wise list mutation
/// - `accumulate(acc!: tensor, x: tensor) -> tensor` — mutation plus a fresh
///   (non-aliasing) logical output holding the post-accumulation sum
/// - `bounds_(x!: tensor) -> (tensor, tensor)` — two logical outputs
pub fn library() -> Registry {
    let mut registry = Registry::new();

    registry.register(OpDef {
        signature: OpSignature::new("mylib", "sin_").mut_arg("x", TypeKind::Tensor).ret(TypeKind::Unit),
        kernel: Some(Box::new(|kwargs| {
            map_in_place(tensor_arg(kwargs, "x")?, f64::sin)?;
            Ok(vec![])
        })),
        fake: None,
    });

    registry.register(OpDef {
        signature: OpSignature::new("mylib", "fill_")
            .mut_arg("x", TypeKind::OptionalTensor)
            .with_default(DefaultValue::None)
            .arg("value", TypeKind::Other)
            .with_default(DefaultValue::Float(0.0))
            .ret(TypeKind::Unit),
        kernel: Some(Box::new(|kwargs| {
            if let Some(Value::Tensor(t)) = kwargs.get("x") {
                let value = float_arg(kwargs, "value");
                map_in_place(t, |_| value)?;
            }
            Ok(vec![])
        })),
        fake: None,
    });

    registry.register(OpDef {
        signature: OpSignature::new("mylib", "scale2_")
            .mut_arg("a", TypeKind::Tensor)
            .mut_arg("b", TypeKind::Tensor)
            .ret(TypeKind::Unit),
        kernel: Some(Box::new(|kwargs| {
            map_in_place(tensor_arg(kwargs, "a")?, |v| v * 2.0)?;
            map_in_place(tensor_arg(kwargs, "b")?, |v| v * 3.0)?;
            Ok(vec![])
        })),
        fake: None,
    });

    registry.register(OpDef {
        signature: OpSignature::new("mylib", "scale_list_")
            .mut_arg("xs", TypeKind::TensorList)
            .arg("c", TypeKind::Other)
            .with_default(DefaultValue::Float(1.0))
            .ret(TypeKind::Unit),
        kernel: Some(Box::new(|kwargs| {
            let c = float_arg(kwargs, "c");
            if let Some(Value::TensorList(ts)) = kwargs.get("xs") {
                for t in ts {
                    map_in_place(t, |v| v * c)?;
                }
            }
            Ok(vec![])
        })),
        fake: None,
    });

    registry.register(OpDef {
        signature: OpSignature::new("mylib", "accumulate")
            .mut_arg("acc", TypeKind::Tensor)
            .arg("x", TypeKind::Tensor)
            .ret(TypeKind::Tensor),
        kernel: Some(Box::new(|kwargs| {
            let acc = tensor_arg(kwargs, "acc")?;
            let x = tensor_arg(kwargs, "x")?;
            let mut sum = 0.0;
            for idx in acc.indices() {
                let v = acc.load(&idx).map_err(|source| error::Error::Tensor { source })?
                    + x.load(&idx).map_err(|source| error::Error::Tensor { source })?;
                acc.store(&idx, v).map_err(|source| error::Error::Tensor { source })?;
                sum += v;
            }
            let out = Tensor::from_f64_slice(DType::Float64, smallvec::smallvec![], &[sum])
                .map_err(|source| error::Error::Tensor { source })?;
            Ok(vec![Value::Tensor(out)])
        })),
        fake: Some(Box::new(|_| Ok(vec![Value::Tensor(Tensor::meta(DType::Float64, smallvec::smallvec![]))]))),
    });

    registry.register(OpDef {
        signature: OpSignature::new("mylib", "bounds_")
            .mut_arg("x", TypeKind::Tensor)
            .ret(TypeKind::Tensor)
            .ret(TypeKind::Tensor),
        kernel: Some(Box::new(|kwargs| {
            let x = tensor_arg(kwargs, "x")?;
            map_in_place(x, |v| v.abs())?;
            let values = x.to_vec().map_err(|source| error::Error::Tensor { source })?;
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let wrap = |v: f64| -> Result<Value> {
                Ok(Value::Tensor(
                    Tensor::from_f64_slice(DType::Float64, smallvec::smallvec![], &[v])
                        .map_err(|source| error::Error::Tensor { source })?,
                ))
            };
            Ok(vec![wrap(min)?, wrap(max)?])
        })),
        fake: Some(Box::new(|_| {
            let meta = || Value::Tensor(Tensor::meta(DType::Float64, smallvec::smallvec![]));
            Ok(vec![meta(), meta()])
        })),
    });

    registry
}

/// Arena holding a 4-element base tensor, a length-2 view into its middle
/// (`offset 1`), and an unrelated tensor in separate storage.
///
/// Returns `(arena, base, view, unrelated)`.
pub fn aliased_env() -> (TensorArena, TensorId, TensorId, TensorId) {
    let mut arena = TensorArena::new();
    let (sid, base) = arena
        .register_dense(DType::Float64, smallvec::smallvec![4], &[1.0, 2.0, 3.0, 4.0])
        .expect("register base");
    let view = arena
        .register_view(sid, DType::Float64, smallvec::smallvec![2], smallvec::smallvec![1], 1)
        .expect("register view");
    let (_, unrelated) = arena
        .register_dense(DType::Float64, smallvec::smallvec![2], &[10.0, 20.0])
        .expect("register unrelated");
    (arena, base, view, unrelated)
}

pub fn tensor_value(arena: &TensorArena, id: TensorId) -> Value {
    Value::Tensor(arena.tensor_for_identity(id).expect("registered identity").clone())
}

pub fn values_of(arena: &TensorArena, id: TensorId) -> Vec<f64> {
    arena.tensor_for_identity(id).expect("registered identity").to_vec().expect("dense tensor")
}
