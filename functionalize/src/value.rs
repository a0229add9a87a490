//! The runtime value union flowing through rewritten calls.

use std::collections::BTreeMap;

use funcify_schema::DefaultValue;
use funcify_tensor::Tensor;

use crate::trace::NodeId;

/// Keyword map bound to a call. `BTreeMap` so iteration order, and with it
/// trace-node input recording, is deterministic.
pub type Kwargs = BTreeMap<String, Value>;

/// A trace-level handle: which recorded node output this value stands for,
/// plus the underlying (concrete or abstract) value discovered for it.
#[derive(Debug, Clone)]
pub struct ProxyValue {
    pub node: NodeId,
    pub index: usize,
    pub underlying: Value,
}

/// One value bound to an argument or produced by a call.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent marker: an unset optional argument, or the placeholder
    /// output of an operation that returns nothing.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Tensor(Tensor),
    TensorList(Vec<Tensor>),
    /// Multiple logical outputs, passed through as-is.
    Tuple(Vec<Value>),
    /// A functional-wrapper layer; the nested-functionalization mode strips
    /// exactly one layer on the way down and restores it on the way up.
    Functional(Box<Value>),
    /// A trace-level handle, not a real value.
    Proxy(Box<ProxyValue>),
}

impl From<DefaultValue> for Value {
    fn from(default: DefaultValue) -> Self {
        match default {
            DefaultValue::None => Value::None,
            DefaultValue::Bool(b) => Value::Bool(b),
            DefaultValue::Int(i) => Value::Int(i),
            DefaultValue::Float(f) => Value::Float(f),
        }
    }
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// Strip one functional-wrapper layer, recursing through tuples.
    pub fn unwrap_functional(self) -> Value {
        match self {
            Value::Functional(inner) => *inner,
            Value::Tuple(vs) => Value::Tuple(vs.into_iter().map(Value::unwrap_functional).collect()),
            other => other,
        }
    }

    /// Wrap tensor-shaped values (including trace proxies standing for
    /// tensors) into one functional layer, recursing through tuples.
    /// Non-tensor values pass through unchanged.
    pub fn wrap_functional(self) -> Value {
        match self {
            Value::Tensor(_) | Value::TensorList(_) | Value::Proxy(_) => Value::Functional(Box::new(self)),
            Value::Tuple(vs) => Value::Tuple(vs.into_iter().map(Value::wrap_functional).collect()),
            other => other,
        }
    }

    /// Strip a proxy handle down to its discovered underlying value,
    /// recursing through tuples.
    pub fn unwrap_proxy(self) -> Value {
        match self {
            Value::Proxy(p) => p.underlying,
            Value::Tuple(vs) => Value::Tuple(vs.into_iter().map(Value::unwrap_proxy).collect()),
            other => other,
        }
    }

    /// One-line description for diagnostics and lifted trace inputs.
    pub fn summary(&self) -> String {
        match self {
            Value::None => "none".into(),
            Value::Bool(b) => format!("bool {b}"),
            Value::Int(i) => format!("int {i}"),
            Value::Float(f) => format!("float {f}"),
            Value::Tensor(t) => format!("tensor {:?}{:?}", t.dtype(), t.shape()),
            Value::TensorList(ts) => format!("tensor list of {}", ts.len()),
            Value::Tuple(vs) => format!("tuple of {}", vs.len()),
            Value::Functional(inner) => format!("functional({})", inner.summary()),
            Value::Proxy(p) => format!("proxy #{}.{}", p.node.0, p.index),
        }
    }
}
