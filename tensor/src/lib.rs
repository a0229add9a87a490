//! Tensor handles and the storage arena for the funcify compiler.
//!
//! This crate is the execution environment the functionalization pass runs
//! against: strided tensor views over shared byte buffers, meta (shape/dtype
//! only) tensors for abstract interpretation, the `clone_preserve_strides`
//! and `as_strided_scatter` primitives, and an explicit arena that maps
//! stable integer identities to live tensors and groups them by storage.
//!
//! Everything here is single-threaded by design: buffers are
//! `Rc<RefCell<Vec<u8>>>` and the arena is a plain struct passed by
//! reference. The functionalization pass runs once per call site during
//! program construction, not at steady-state execution.

pub mod arena;
pub mod dtype;
pub mod error;
pub mod tensor;


pub use arena::{StorageId, TensorArena, TensorId};
pub use dtype::DType;
pub use error::{Error, Result};
pub use tensor::{contiguous_strides, MetaToken, Shape, Storage, Strides, Tensor, TensorData};
