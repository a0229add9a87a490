//! Operation signatures for the funcify compiler.
//!
//! This crate defines the declarative signature format consumed by the
//! auto-functionalization pass and the static eligibility check over it.
//!
//! # Module Organization
//!
//! - [`signature`] - Signature data model (argument/return descriptors, type kinds)
//! - [`eligibility`] - `can_auto_functionalize` predicate and mutable-argument extraction

pub mod eligibility;
pub mod signature;


pub use eligibility::{can_auto_functionalize, mutable_arg_names};
pub use signature::{ArgumentSpec, DefaultValue, Namespace, OpSignature, ReturnSpec, TypeKind};
