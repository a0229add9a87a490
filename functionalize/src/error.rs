use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("tensor environment error"))]
    Tensor { source: funcify_tensor::Error },

    /// The dispatcher was invoked on an operation the eligibility check
    /// rejects. Callers are expected to consult `can_rewrite` first and fall
    /// back to a hand-written rule.
    #[snafu(display("operation '{op}' is not eligible for auto-functionalization"))]
    IneligibleOperation { op: String },

    #[snafu(display("no operation named '{op}' is registered"))]
    UnknownOperation { op: String },

    #[snafu(display("operation '{op}' has no concrete kernel"))]
    MissingKernel { op: String },

    #[snafu(display("operation '{op}' returns values but has no abstract (shape-only) kernel"))]
    MissingAbstractKernel { op: String },

    #[snafu(display("argument '{name}' of '{op}' is unbound and declares no default"))]
    MissingArgument { op: String, name: String },

    #[snafu(display("reserved parameter '{name}' is bound to an unexpected value: {description}"))]
    InvalidReservedParameter { name: String, description: String },

    #[snafu(display("mutated argument '{name}' is bound to an unsupported value: {description}"))]
    UnsupportedMutatedArgument { name: String, description: String },

    /// A mutated-output slot held something other than a tensor, a tensor
    /// list, or the absent marker. Fatal: either the operation disagrees
    /// with its schema or the alias computation is wrong.
    #[snafu(display("unsupported value in a mutated-output slot: {description}"))]
    UnsupportedMutatedOutput { description: String },

    #[snafu(display("writeback length mismatch: original holds {expected} tensors, output holds {got}"))]
    WritebackLengthMismatch { expected: usize, got: usize },

    #[snafu(display("writeback for '{name}' would change shape, strides, offset, or dtype"))]
    WritebackMetadataMismatch { name: String },

    #[snafu(display(
        "dispatcher returned {got} values, fewer than the {expected} mutated-argument and alias slots"
    ))]
    TruncatedDispatchResult { expected: usize, got: usize },

    #[snafu(display("logical output arity mismatch: signature declares {expected} returns, got {got}"))]
    ReturnArityMismatch { expected: usize, got: usize },

    #[snafu(display("operation declares no returns but its placeholder slot held {description}"))]
    NonUnitPlaceholder { description: String },
}
