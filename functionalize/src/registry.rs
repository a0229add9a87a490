//! Operator registry: declared signatures plus opaque kernels.
//!
//! The registry is an external collaborator from the rewrite's point of
//! view; it is modelled here so the pass can be exercised end to end. A
//! kernel receives the bound keyword map and returns the operation's logical
//! outputs, mutating its written arguments through their shared storage.

use std::collections::HashMap;
use std::rc::Rc;

use funcify_schema::OpSignature;
use snafu::ensure;

use crate::error::{self, Result};
use crate::value::{Kwargs, Value};

/// Which execution strategy a kernel invocation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecKind {
    /// Real compute on dense tensors.
    Concrete,
    /// Shape/dtype-only compute on meta tensors.
    Abstract,
}

/// An opaque "do the work" callable.
pub type Kernel = Box<dyn Fn(&Kwargs) -> Result<Vec<Value>>>;

/// One registered operation.
pub struct OpDef {
    pub signature: OpSignature,
    /// Concrete kernel; mutates written arguments in place.
    pub kernel: Option<Kernel>,
    /// Abstract kernel producing meta outputs. Operations that return
    /// nothing need none: their abstract result is trivially absent.
    pub fake: Option<Kernel>,
}

pub type Op = Rc<OpDef>;

#[derive(Default)]
pub struct Registry {
    ops: HashMap<String, Op>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under its signature name.
    pub fn register(&mut self, def: OpDef) -> Op {
        let op: Op = Rc::new(def);
        self.ops.insert(op.signature.name.clone(), op.clone());
        op
    }

    pub fn lookup(&self, name: &str) -> Result<Op> {
        self.ops.get(name).cloned().ok_or_else(|| error::Error::UnknownOperation { op: name.to_string() })
    }

    pub fn lookup_signature(&self, name: &str) -> Result<OpSignature> {
        Ok(self.lookup(name)?.signature.clone())
    }

    /// Run an operation's kernel for the given execution strategy.
    ///
    /// Returns one value per declared logical output; an operation that
    /// returns nothing yields the single absent placeholder. Abstract
    /// invocation of a unit-returning operation needs no registered kernel.
    pub fn invoke(&self, op: &Op, kwargs: &Kwargs, kind: ExecKind) -> Result<Vec<Value>> {
        let name = &op.signature.name;
        tracing::trace!(op = %name, ?kind, "kernel invocation");

        let mut out = match kind {
            ExecKind::Concrete => {
                let kernel =
                    op.kernel.as_ref().ok_or_else(|| error::Error::MissingKernel { op: name.clone() })?;
                kernel(kwargs)?
            }
            ExecKind::Abstract => match &op.fake {
                Some(fake) => fake(kwargs)?,
                None => {
                    ensure!(
                        op.signature.returns_unit() || op.signature.returns.is_empty(),
                        error::MissingAbstractKernelSnafu { op: name.clone() }
                    );
                    vec![Value::None]
                }
            },
        };

        if (op.signature.returns_unit() || op.signature.returns.is_empty()) && out.is_empty() {
            out.push(Value::None);
        }
        Ok(out)
    }
}
