use snafu::Snafu;

use crate::arena::{StorageId, TensorId};
use crate::dtype::DType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("dtype mismatch: expected {expected:?}, got {got:?}"))]
    DTypeMismatch { expected: DType, got: DType },

    #[snafu(display("index {index:?} is out of bounds for shape {shape:?}"))]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },

    #[snafu(display("meta tensor carries no data"))]
    MetaTensorData,

    #[snafu(display("cannot mix meta and dense tensors in one data operation"))]
    MixedMetaAndDense,

    #[snafu(display(
        "scatter source spans element {element} but the destination storage holds only {storage_len} elements"
    ))]
    ScatterOutOfBounds { element: usize, storage_len: usize },

    #[snafu(display("view spans element {element} but the storage holds only {storage_len} elements"))]
    ViewOutOfBounds { element: usize, storage_len: usize },

    #[snafu(display("storage length {len} bytes is not a multiple of element size {elem_size}"))]
    RaggedStorage { len: usize, elem_size: usize },

    #[snafu(display("element count mismatch: shape wants {expected} elements, got {got}"))]
    ElementCountMismatch { expected: usize, got: usize },

    #[snafu(display("no tensor is registered under identity {id:?}"))]
    UnknownTensor { id: TensorId },

    #[snafu(display("no storage is registered under identity {id:?}"))]
    UnknownStorage { id: StorageId },
}
