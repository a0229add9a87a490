use funcify_tensor::DType;
use smallvec::smallvec;

use crate::alias::bystander_aliases;
use crate::test::helpers::{aliased_env, library, tensor_value};
use crate::value::{Kwargs, Value};

#[test]
fn view_of_mutated_storage_is_a_bystander() {
    let registry = library();
    let sig = registry.lookup_signature("sin_").unwrap();
    let (arena, base, view, _) = aliased_env();

    let mut kwargs = Kwargs::new();
    kwargs.insert("x".into(), tensor_value(&arena, base));

    let group = bystander_aliases(&arena, &sig, &kwargs).unwrap();
    assert_eq!(group, vec![view]);

    // And symmetrically: mutating the view makes the base a bystander.
    let mut kwargs = Kwargs::new();
    kwargs.insert("x".into(), tensor_value(&arena, view));
    assert_eq!(bystander_aliases(&arena, &sig, &kwargs).unwrap(), vec![base]);
}

#[test]
fn unrelated_storage_contributes_nothing() {
    let registry = library();
    let sig = registry.lookup_signature("sin_").unwrap();
    let (arena, _, _, unrelated) = aliased_env();

    let mut kwargs = Kwargs::new();
    kwargs.insert("x".into(), tensor_value(&arena, unrelated));
    assert!(bystander_aliases(&arena, &sig, &kwargs).unwrap().is_empty());
}

#[test]
fn mutated_arguments_are_never_bystanders() {
    // base and view share storage and are *both* mutated arguments; the
    // group must not contain either, even though each aliases the other.
    let registry = library();
    let sig = registry.lookup_signature("scale2_").unwrap();
    let (arena, base, view, _) = aliased_env();

    let mut kwargs = Kwargs::new();
    kwargs.insert("a".into(), tensor_value(&arena, base));
    kwargs.insert("b".into(), tensor_value(&arena, view));
    assert!(bystander_aliases(&arena, &sig, &kwargs).unwrap().is_empty());
}

#[test]
fn absent_optional_argument_is_not_dereferenced() {
    let registry = library();
    let sig = registry.lookup_signature("fill_").unwrap();
    let (arena, _, _, _) = aliased_env();

    let mut kwargs = Kwargs::new();
    kwargs.insert("x".into(), Value::None);
    kwargs.insert("value".into(), Value::Float(1.0));
    assert!(bystander_aliases(&arena, &sig, &kwargs).unwrap().is_empty());
}

#[test]
fn list_elements_contribute_their_aliases() {
    let registry = library();
    let sig = registry.lookup_signature("scale_list_").unwrap();
    let (arena, base, view, unrelated) = aliased_env();

    let list = Value::TensorList(vec![
        arena.tensor_for_identity(base).unwrap().clone(),
        arena.tensor_for_identity(unrelated).unwrap().clone(),
    ]);
    let mut kwargs = Kwargs::new();
    kwargs.insert("xs".into(), list);
    kwargs.insert("c".into(), Value::Float(2.0));

    assert_eq!(bystander_aliases(&arena, &sig, &kwargs).unwrap(), vec![view]);
}

#[test]
fn group_is_deduplicated_and_first_seen_ordered() {
    let registry = library();
    let sig = registry.lookup_signature("scale2_").unwrap();

    let mut arena = funcify_tensor::TensorArena::new();
    let (sid_a, a) = arena.register_dense(DType::Float64, smallvec![4], &[0.0; 4]).unwrap();
    let (sid_b, b) = arena.register_dense(DType::Float64, smallvec![4], &[0.0; 4]).unwrap();
    // Two extra views of a's storage and one of b's.
    let a_view1 = arena.register_view(sid_a, DType::Float64, smallvec![2], smallvec![1], 0).unwrap();
    let a_view2 = arena.register_view(sid_a, DType::Float64, smallvec![2], smallvec![1], 2).unwrap();
    let b_view = arena.register_view(sid_b, DType::Float64, smallvec![4], smallvec![1], 0).unwrap();

    let mut kwargs = Kwargs::new();
    kwargs.insert("a".into(), tensor_value(&arena, a));
    kwargs.insert("b".into(), tensor_value(&arena, b));

    // a's bystanders first (signature order), each in registration order.
    let group = bystander_aliases(&arena, &sig, &kwargs).unwrap();
    assert_eq!(group, vec![a_view1, a_view2, b_view]);
}

#[test]
fn unregistered_intermediates_have_no_aliases() {
    let registry = library();
    let sig = registry.lookup_signature("sin_").unwrap();
    let (arena, _, _, _) = aliased_env();

    let detached = funcify_tensor::Tensor::from_f64_slice(DType::Float64, smallvec![2], &[1.0, 2.0]).unwrap();
    let mut kwargs = Kwargs::new();
    kwargs.insert("x".into(), Value::Tensor(detached));
    assert!(bystander_aliases(&arena, &sig, &kwargs).unwrap().is_empty());
}
