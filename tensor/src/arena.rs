//! Explicit arena of live tensors, grouped by storage identity.
//!
//! The alias-propagation step of the functionalization pass needs to answer
//! "which live tensors view the same buffer as this mutated argument?". The
//! arena answers it through stable integer identities instead of object
//! addresses: each registered view gets a [`TensorId`], each buffer a
//! [`StorageId`], and membership is a plain table kept in first-registered
//! order so downstream positional result vectors are deterministic.
//!
//! The functionalization pass never changes storage grouping: writeback
//! replaces the tensor *value* at an existing identity and leaves the
//! identity tables alone.

use std::collections::HashMap;
use std::rc::Rc;

use crate::dtype::DType;
use crate::error::{self, Result};
use crate::tensor::{MetaToken, Shape, Storage, Strides, Tensor};

/// Stable identity of one registered tensor view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(pub u64);

/// Stable identity of one storage group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageId(pub u64);

enum StorageEntry {
    /// Real shared buffer.
    Dense(Storage),
    /// Abstract storage group: views are meta tensors sharing one token, so
    /// grouping still holds without bytes.
    Meta(MetaToken),
}

/// The live-tensor environment one rewrite runs against.
#[derive(Default)]
pub struct TensorArena {
    next_storage: u64,
    next_tensor: u64,
    storages: HashMap<StorageId, StorageEntry>,
    tensors: HashMap<TensorId, Tensor>,
    storage_of: HashMap<TensorId, StorageId>,
    /// Members per storage group, first-registered order.
    members: HashMap<StorageId, Vec<TensorId>>,
}

impl TensorArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_storage(&mut self, entry: StorageEntry) -> StorageId {
        let id = StorageId(self.next_storage);
        self.next_storage += 1;
        self.storages.insert(id, entry);
        self.members.insert(id, Vec::new());
        id
    }

    /// Allocate a dense storage group holding `values` encoded as `dtype`.
    pub fn alloc_dense(&mut self, dtype: DType, values: &[f64]) -> StorageId {
        let elem = dtype.size_bytes();
        let mut bytes = vec![0u8; values.len() * elem];
        for (i, &v) in values.iter().enumerate() {
            dtype.encode(v, &mut bytes[i * elem..(i + 1) * elem]);
        }
        self.fresh_storage(StorageEntry::Dense(Storage::new(bytes.into())))
    }

    /// Allocate an abstract (meta) storage group.
    pub fn alloc_meta(&mut self) -> StorageId {
        self.fresh_storage(StorageEntry::Meta(Rc::new(())))
    }

    /// Register a view of `storage` and return its identity.
    pub fn register_view(
        &mut self,
        storage: StorageId,
        dtype: DType,
        shape: Shape,
        strides: Strides,
        offset: usize,
    ) -> Result<TensorId> {
        let entry = self.storages.get(&storage).ok_or(error::Error::UnknownStorage { id: storage })?;
        let mut tensor = match entry {
            StorageEntry::Dense(buf) => Tensor::view_of(buf, dtype, shape, strides, offset)?,
            StorageEntry::Meta(token) => Tensor::meta_view_of(token, dtype, shape, strides, offset),
        };

        let id = TensorId(self.next_tensor);
        self.next_tensor += 1;
        tensor.set_ident(id);

        self.tensors.insert(id, tensor);
        self.storage_of.insert(id, storage);
        self.members.entry(storage).or_default().push(id);
        Ok(id)
    }

    /// Allocate storage for a contiguous dense tensor and register the
    /// canonical full view in one step.
    pub fn register_dense(
        &mut self,
        dtype: DType,
        shape: Shape,
        values: &[f64],
    ) -> Result<(StorageId, TensorId)> {
        let expected: usize = shape.iter().product();
        snafu::ensure!(
            values.len() == expected,
            error::ElementCountMismatchSnafu { expected, got: values.len() }
        );
        let storage = self.alloc_dense(dtype, values);
        let strides = crate::tensor::contiguous_strides(&shape);
        let tensor = self.register_view(storage, dtype, shape, strides, 0)?;
        Ok((storage, tensor))
    }

    /// Storage identity of a registered tensor.
    pub fn storage_identity(&self, id: TensorId) -> Result<StorageId> {
        self.storage_of.get(&id).copied().ok_or(error::Error::UnknownTensor { id })
    }

    /// All live tensor identities viewing a storage group, in stable
    /// first-registered order.
    pub fn live_tensors_for_storage(&self, id: StorageId) -> Result<&[TensorId]> {
        self.members.get(&id).map(Vec::as_slice).ok_or(error::Error::UnknownStorage { id })
    }

    /// Handle for a registered identity.
    pub fn tensor_for_identity(&self, id: TensorId) -> Result<&Tensor> {
        self.tensors.get(&id).ok_or(error::Error::UnknownTensor { id })
    }

    /// Replace the tensor value at an existing identity.
    ///
    /// The identity keeps its storage-group membership; only the value a
    /// consumer sees under `id` changes. This is the writeback primitive of
    /// the rewrite: after it, `id` denotes the functional post-call value.
    pub fn write_back(&mut self, id: TensorId, mut value: Tensor) -> Result<()> {
        snafu::ensure!(self.tensors.contains_key(&id), error::UnknownTensorSnafu { id });
        value.set_ident(id);
        tracing::trace!(tensor = id.0, "writeback onto existing identity");
        self.tensors.insert(id, value);
        Ok(())
    }

    /// Number of registered tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}
