//! Strided tensor views over shared storage.
//!
//! A [`Tensor`] is a view: dtype plus (shape, strides, offset) into a byte
//! buffer shared by every view of the same storage. Mutating kernels write
//! through a view; every other view of that buffer observes the write. The
//! functionalization pass exists precisely to reproduce that observation
//! without the shared mutation, using [`Tensor::clone_preserve_strides`] and
//! [`Tensor::as_strided_scatter`].

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;
use snafu::ensure;

use crate::arena::TensorId;
use crate::dtype::DType;
use crate::error::{self, Error, Result};

pub type Shape = SmallVec<[usize; 4]>;
pub type Strides = SmallVec<[isize; 4]>;

/// Shared byte buffer backing one storage group of views.
pub type Storage = Rc<RefCell<Vec<u8>>>;

/// Identity token shared by every meta view of one abstract storage group.
/// Carries no data; only pointer identity matters.
pub type MetaToken = Rc<()>;

/// Row-major strides for a contiguous layout of `shape`, in elements.
pub fn contiguous_strides(shape: &[usize]) -> Strides {
    let mut strides: Strides = SmallVec::with_capacity(shape.len());
    let mut acc = 1isize;
    for &dim in shape.iter().rev() {
        strides.push(acc);
        acc *= dim as isize;
    }
    strides.reverse();
    strides
}

/// Backing data of a view.
#[derive(Clone)]
pub enum TensorData {
    /// Real bytes, shared with every other view of the same storage.
    Dense(Storage),
    /// Abstract tensor: metadata only, used by shape/dtype-only execution.
    /// The token keeps storage identity meaningful without any bytes.
    Meta(MetaToken),
}

/// A strided tensor view.
#[derive(Clone)]
pub struct Tensor {
    dtype: DType,
    shape: Shape,
    strides: Strides,
    offset: usize,
    data: TensorData,
    /// Arena identity, present once the view is registered with a
    /// [`TensorArena`](crate::arena::TensorArena). Functional intermediates
    /// produced by the rewrite carry no identity.
    ident: Option<TensorId>,
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .field("meta", &self.is_meta())
            .field("ident", &self.ident)
            .finish()
    }
}

impl Tensor {
    /// Contiguous dense tensor from scalar values.
    pub fn from_f64_slice(dtype: DType, shape: Shape, values: &[f64]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        ensure!(values.len() == expected, error::ElementCountMismatchSnafu { expected, got: values.len() });

        let elem = dtype.size_bytes();
        let mut bytes = vec![0u8; expected * elem];
        for (i, &v) in values.iter().enumerate() {
            dtype.encode(v, &mut bytes[i * elem..(i + 1) * elem]);
        }
        let strides = contiguous_strides(&shape);
        Ok(Self {
            dtype,
            shape,
            strides,
            offset: 0,
            data: TensorData::Dense(Rc::new(RefCell::new(bytes))),
            ident: None,
        })
    }

    /// Contiguous dense tensor of zeros.
    pub fn zeros(dtype: DType, shape: Shape) -> Self {
        let numel: usize = shape.iter().product();
        let strides = contiguous_strides(&shape);
        Self {
            dtype,
            shape,
            strides,
            offset: 0,
            data: TensorData::Dense(Rc::new(RefCell::new(vec![0u8; numel * dtype.size_bytes()]))),
            ident: None,
        }
    }

    /// Meta tensor with a contiguous layout, in a fresh storage group.
    pub fn meta(dtype: DType, shape: Shape) -> Self {
        let strides = contiguous_strides(&shape);
        Self { dtype, shape, strides, offset: 0, data: TensorData::Meta(Rc::new(())), ident: None }
    }

    /// Meta tensor with an explicit layout, in a fresh storage group.
    pub fn meta_strided(dtype: DType, shape: Shape, strides: Strides, offset: usize) -> Self {
        Self { dtype, shape, strides, offset, data: TensorData::Meta(Rc::new(())), ident: None }
    }

    /// Meta view belonging to an existing abstract storage group.
    pub fn meta_view_of(token: &MetaToken, dtype: DType, shape: Shape, strides: Strides, offset: usize) -> Self {
        Self { dtype, shape, strides, offset, data: TensorData::Meta(token.clone()), ident: None }
    }

    /// View into an existing storage buffer, bounds-checked against it.
    pub fn view_of(
        storage: &Storage,
        dtype: DType,
        shape: Shape,
        strides: Strides,
        offset: usize,
    ) -> Result<Self> {
        let len = storage.borrow().len();
        let elem = dtype.size_bytes();
        ensure!(len % elem == 0, error::RaggedStorageSnafu { len, elem_size: elem });
        let storage_len = len / elem;

        if shape.iter().product::<usize>() != 0 {
            let mut lo = offset as isize;
            let mut hi = offset as isize;
            for (&dim, &stride) in shape.iter().zip(&strides) {
                let reach = (dim as isize - 1) * stride;
                lo += reach.min(0);
                hi += reach.max(0);
            }
            ensure!(
                lo >= 0 && (hi as usize) < storage_len,
                error::ViewOutOfBoundsSnafu { element: hi.max(0) as usize, storage_len }
            );
        }

        Ok(Self { dtype, shape, strides, offset, data: TensorData::Dense(storage.clone()), ident: None })
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.data, TensorData::Meta(_))
    }

    /// Backing storage, if dense.
    pub fn storage(&self) -> Option<&Storage> {
        match &self.data {
            TensorData::Dense(s) => Some(s),
            TensorData::Meta(_) => None,
        }
    }

    pub fn ident(&self) -> Option<TensorId> {
        self.ident
    }

    pub(crate) fn set_ident(&mut self, id: TensorId) {
        self.ident = Some(id);
    }

    /// Whether two views share one storage buffer. Meta views compare their
    /// group token, so abstract execution distinguishes storage groups the
    /// same way dense execution does.
    pub fn same_storage(&self, other: &Tensor) -> bool {
        match (&self.data, &other.data) {
            (TensorData::Dense(a), TensorData::Dense(b)) => Rc::ptr_eq(a, b),
            (TensorData::Meta(a), TensorData::Meta(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether two views agree on shape, strides, offset, and dtype.
    ///
    /// Writeback requires this to hold between an original value and its
    /// functional replacement.
    pub fn same_metadata(&self, other: &Tensor) -> bool {
        self.dtype == other.dtype
            && self.shape == other.shape
            && self.strides == other.strides
            && self.offset == other.offset
    }

    /// Storage element index addressed by a logical index.
    fn element_index(&self, index: &[usize]) -> Result<usize> {
        ensure!(
            index.len() == self.shape.len() && index.iter().zip(&self.shape).all(|(i, d)| i < d),
            error::IndexOutOfBoundsSnafu { index: index.to_vec(), shape: self.shape.to_vec() }
        );
        let mut elem = self.offset as isize;
        for (&i, &stride) in index.iter().zip(&self.strides) {
            elem += i as isize * stride;
        }
        debug_assert!(elem >= 0, "bounds-checked view addressed a negative element");
        Ok(elem as usize)
    }

    /// Read one element as `f64`.
    pub fn load(&self, index: &[usize]) -> Result<f64> {
        let TensorData::Dense(storage) = &self.data else {
            return Err(Error::MetaTensorData);
        };
        let elem = self.element_index(index)?;
        let size = self.dtype.size_bytes();
        let bytes = storage.borrow();
        Ok(self.dtype.decode(&bytes[elem * size..(elem + 1) * size]))
    }

    /// Write one element. Every view sharing this storage observes the write.
    pub fn store(&self, index: &[usize], value: f64) -> Result<()> {
        let TensorData::Dense(storage) = &self.data else {
            return Err(Error::MetaTensorData);
        };
        let elem = self.element_index(index)?;
        let size = self.dtype.size_bytes();
        let mut bytes = storage.borrow_mut();
        self.dtype.encode(value, &mut bytes[elem * size..(elem + 1) * size]);
        Ok(())
    }

    /// Iterate logical indices in row-major order.
    pub fn indices(&self) -> NdIndices {
        NdIndices::new(&self.shape)
    }

    /// All elements in row-major logical order.
    pub fn to_vec(&self) -> Result<Vec<f64>> {
        self.indices().map(|idx| self.load(&idx)).collect()
    }

    /// Copy of this view backed by a private copy of the whole storage,
    /// keeping shape, strides, and offset.
    ///
    /// Meta tensors detach into a fresh storage group, like the dense path.
    /// The copy carries no arena identity.
    pub fn clone_preserve_strides(&self) -> Tensor {
        let data = match &self.data {
            TensorData::Dense(storage) => {
                TensorData::Dense(Rc::new(RefCell::new(storage.borrow().clone())))
            }
            TensorData::Meta(_) => TensorData::Meta(Rc::new(())),
        };
        Tensor {
            dtype: self.dtype,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
            data,
            ident: None,
        }
    }

    /// Copy of `self` whose storage has the region described by `src`'s
    /// (shape, strides, offset) replaced with `src`'s values.
    ///
    /// This reproduces, functionally, what this view would have observed had
    /// `src`'s values been written destructively into shared storage. Meta
    /// tensors only check metadata compatibility.
    pub fn as_strided_scatter(&self, src: &Tensor) -> Result<Tensor> {
        ensure!(
            src.dtype == self.dtype,
            error::DTypeMismatchSnafu { expected: self.dtype, got: src.dtype }
        );

        let (dst_storage, src_is_dense) = (self.storage(), !src.is_meta());
        match (dst_storage, src_is_dense) {
            (Some(storage), true) => {
                let new_bytes = Rc::new(RefCell::new(storage.borrow().clone()));
                let size = self.dtype.size_bytes();
                let storage_len = new_bytes.borrow().len() / size;

                for idx in src.indices() {
                    let elem = src.element_index(&idx)?;
                    ensure!(elem < storage_len, error::ScatterOutOfBoundsSnafu { element: elem, storage_len });
                    let value = src.load(&idx)?;
                    let mut bytes = new_bytes.borrow_mut();
                    self.dtype.encode(value, &mut bytes[elem * size..(elem + 1) * size]);
                }

                Ok(Tensor {
                    dtype: self.dtype,
                    shape: self.shape.clone(),
                    strides: self.strides.clone(),
                    offset: self.offset,
                    data: TensorData::Dense(new_bytes),
                    ident: None,
                })
            }
            (None, false) => Ok(Tensor {
                dtype: self.dtype,
                shape: self.shape.clone(),
                strides: self.strides.clone(),
                offset: self.offset,
                data: TensorData::Meta(Rc::new(())),
                ident: None,
            }),
            _ => Err(Error::MixedMetaAndDense),
        }
    }
}

/// Row-major iterator over the logical indices of a shape.
pub struct NdIndices {
    shape: Shape,
    next: Option<Shape>,
}

impl NdIndices {
    fn new(shape: &[usize]) -> Self {
        let next = if shape.iter().product::<usize>() == 0 {
            None
        } else {
            Some(shape.iter().map(|_| 0).collect())
        };
        Self { shape: shape.iter().copied().collect(), next }
    }
}

impl Iterator for NdIndices {
    type Item = Shape;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.clone()?;

        // Advance like an odometer, last dimension fastest.
        let mut next = current.clone();
        let mut done = true;
        for axis in (0..self.shape.len()).rev() {
            next[axis] += 1;
            if next[axis] < self.shape[axis] {
                done = false;
                break;
            }
            next[axis] = 0;
        }
        // Rank-0 shapes yield exactly one (empty) index.
        self.next = if done || self.shape.is_empty() { None } else { Some(next) };
        Some(current)
    }
}
