//! Declarative operation signatures.
//!
//! A signature describes an operation's arguments and returns well enough for
//! the functionalization pass to decide, without running anything, which
//! arguments the operation writes to and whether the whole call can be
//! rewritten into a pure form.

/// Value-type tag for a signature element.
///
/// Closed set: anything an operation declares that is not one of the three
/// supported tensor shapes is `Other` and gets rejected explicitly by the
/// eligibility check rather than falling through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A plain tensor.
    Tensor,
    /// An optional tensor; may be bound to the absent marker at a call.
    OptionalTensor,
    /// A list of tensors, mutated element-wise.
    TensorList,
    /// The "no value" marker. Only meaningful as a return descriptor: an
    /// operation whose sole declared return is `Unit` communicates purely
    /// through mutation.
    Unit,
    /// Any other declared type (scalars, optional lists of tensors, ...).
    Other,
}

/// Declared default for an optional argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// One argument descriptor.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub name: String,
    pub kind: TypeKind,
    /// Whether the operation writes through this argument.
    pub is_write: bool,
    /// Declared default, substituted when a call leaves the argument unbound.
    pub default: Option<DefaultValue>,
}

/// One return descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ReturnSpec {
    pub kind: TypeKind,
    /// Whether the returned value aliases one of the inputs.
    pub aliases_input: bool,
}

/// Namespace an operation is registered under.
///
/// Builtins may perform environment-controlled metadata mutation that is not
/// expressible through the write flags above, so they are never eligible for
/// the automatic rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespace {
    Builtin,
    Library(String),
}

/// An operation's declared signature. Immutable; owned by the operator
/// registry.
#[derive(Debug, Clone)]
pub struct OpSignature {
    pub name: String,
    pub namespace: Namespace,
    pub arguments: Vec<ArgumentSpec>,
    pub returns: Vec<ReturnSpec>,
    /// A hand-written functionalization rule is already registered for this
    /// operation; the automatic rewrite must not apply on top of it.
    pub manual_functionalization: bool,
}

impl OpSignature {
    /// Start a signature for a library operation with no arguments or returns.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Namespace::Library(namespace.into()),
            arguments: Vec::new(),
            returns: Vec::new(),
            manual_functionalization: false,
        }
    }

    /// Start a signature for a builtin operation.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self { namespace: Namespace::Builtin, ..Self::new("", name) }
    }

    /// Append a read-only argument.
    pub fn arg(mut self, name: impl Into<String>, kind: TypeKind) -> Self {
        self.arguments.push(ArgumentSpec { name: name.into(), kind, is_write: false, default: None });
        self
    }

    /// Append a written (mutated) argument.
    pub fn mut_arg(mut self, name: impl Into<String>, kind: TypeKind) -> Self {
        self.arguments.push(ArgumentSpec { name: name.into(), kind, is_write: true, default: None });
        self
    }

    /// Set the declared default of the most recently appended argument.
    ///
    /// # Panics
    ///
    /// Panics if no argument has been appended yet (signature construction
    /// bug, not a runtime condition).
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.arguments.last_mut().expect("with_default before any argument").default = Some(default);
        self
    }

    /// Append a non-aliasing return descriptor.
    pub fn ret(mut self, kind: TypeKind) -> Self {
        self.returns.push(ReturnSpec { kind, aliases_input: false });
        self
    }

    /// Append a return descriptor that aliases an input.
    pub fn ret_aliasing(mut self, kind: TypeKind) -> Self {
        self.returns.push(ReturnSpec { kind, aliases_input: true });
        self
    }

    /// Mark the signature as having a hand-written functionalization rule.
    pub fn with_manual_functionalization(mut self) -> Self {
        self.manual_functionalization = true;
        self
    }

    /// Look up an argument descriptor by name.
    pub fn argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Whether any argument is declared written-to.
    pub fn is_mutable(&self) -> bool {
        self.arguments.iter().any(|a| a.is_write)
    }

    /// Whether the signature declares exactly one `Unit` return, i.e. the
    /// operation communicates purely through mutation.
    pub fn returns_unit(&self) -> bool {
        matches!(self.returns.as_slice(), [ReturnSpec { kind: TypeKind::Unit, .. }])
    }
}
