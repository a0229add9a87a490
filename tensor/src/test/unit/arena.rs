use smallvec::smallvec;

use crate::{DType, Error, Tensor, TensorArena};

#[test]
fn registration_groups_views_by_storage() {
    let mut arena = TensorArena::new();
    let (sid, base) = arena.register_dense(DType::Float64, smallvec![4], &[0.0, 1.0, 2.0, 3.0]).unwrap();
    let view = arena.register_view(sid, DType::Float64, smallvec![2], smallvec![1], 2).unwrap();

    let (other_sid, other) = arena.register_dense(DType::Float64, smallvec![2], &[9.0, 9.0]).unwrap();

    assert_eq!(arena.storage_identity(base).unwrap(), sid);
    assert_eq!(arena.storage_identity(view).unwrap(), sid);
    assert_eq!(arena.live_tensors_for_storage(sid).unwrap(), &[base, view]);
    assert_eq!(arena.live_tensors_for_storage(other_sid).unwrap(), &[other]);
}

#[test]
fn registered_views_share_the_buffer() {
    let mut arena = TensorArena::new();
    let (sid, base) = arena.register_dense(DType::Float32, smallvec![4], &[0.0, 1.0, 2.0, 3.0]).unwrap();
    let view = arena.register_view(sid, DType::Float32, smallvec![2], smallvec![1], 1).unwrap();

    arena.tensor_for_identity(base).unwrap().store(&[2], 20.0).unwrap();
    assert_eq!(arena.tensor_for_identity(view).unwrap().to_vec().unwrap(), vec![1.0, 20.0]);
}

#[test]
fn write_back_replaces_value_but_keeps_identity_and_grouping() {
    let mut arena = TensorArena::new();
    let (sid, base) = arena.register_dense(DType::Float64, smallvec![2], &[1.0, 2.0]).unwrap();

    let replacement = Tensor::from_f64_slice(DType::Float64, smallvec![2], &[5.0, 6.0]).unwrap();
    arena.write_back(base, replacement).unwrap();

    let seen = arena.tensor_for_identity(base).unwrap();
    assert_eq!(seen.to_vec().unwrap(), vec![5.0, 6.0]);
    assert_eq!(seen.ident(), Some(base));
    // Storage grouping is untouched by writeback.
    assert_eq!(arena.storage_identity(base).unwrap(), sid);
    assert_eq!(arena.live_tensors_for_storage(sid).unwrap(), &[base]);
}

#[test]
fn meta_storage_produces_meta_views() {
    let mut arena = TensorArena::new();
    let sid = arena.alloc_meta();
    let id = arena.register_view(sid, DType::Float32, smallvec![2, 2], smallvec![2, 1], 0).unwrap();
    assert!(arena.tensor_for_identity(id).unwrap().is_meta());
}

#[test]
fn meta_views_share_storage_only_within_their_group() {
    let mut arena = TensorArena::new();
    let sid = arena.alloc_meta();
    let a = arena.register_view(sid, DType::Float64, smallvec![4], smallvec![1], 0).unwrap();
    let b = arena.register_view(sid, DType::Float64, smallvec![2], smallvec![1], 1).unwrap();
    let other = arena.alloc_meta();
    let c = arena.register_view(other, DType::Float32, smallvec![2], smallvec![1], 0).unwrap();

    let a = arena.tensor_for_identity(a).unwrap();
    let b = arena.tensor_for_identity(b).unwrap();
    let c = arena.tensor_for_identity(c).unwrap();
    assert!(a.same_storage(b));
    assert!(!a.same_storage(c));
    // Copies detach into a fresh group, like the dense path.
    assert!(!a.clone_preserve_strides().same_storage(a));
    // Independently constructed meta tensors never share a group.
    let lone = Tensor::meta(DType::Float64, smallvec![2]);
    assert!(!lone.same_storage(&Tensor::meta(DType::Float64, smallvec![2])));
}

#[test]
fn unknown_identities_are_reported() {
    let mut arena = TensorArena::new();
    arena.register_dense(DType::Float32, smallvec![1], &[0.0]).unwrap();

    let missing = crate::TensorId(999);
    assert!(matches!(arena.tensor_for_identity(missing), Err(Error::UnknownTensor { .. })));
    assert!(matches!(arena.storage_identity(missing), Err(Error::UnknownTensor { .. })));
    assert!(matches!(arena.live_tensors_for_storage(crate::StorageId(999)), Err(Error::UnknownStorage { .. })));
}
