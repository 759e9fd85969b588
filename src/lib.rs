//! Shape templates for untyped JSON.
//!
//! Compile a compact template description into an immutable node tree, then
//! use it two ways: [`check`]/[`is_type`] decide whether a
//! `serde_json::Value` conforms, and [`merge`] folds an untrusted update
//! into a trusted value, keeping only the parts that type-check and handing
//! the original back wherever nothing changed.
//!
//! The engine itself does no I/O and holds no state. A compiled
//! [`TemplateNode`] is read-only and can back any number of concurrent
//! check/merge calls.

pub mod check;
pub mod cli;
pub mod kind;
pub mod merge;
pub mod template;

#[cfg(test)]
mod combo;

pub use check::{CheckOptions, Mismatch, check, is_type};
pub use kind::{ScalarKind, ShapeKind};
pub use merge::{MergeError, MergeOptions, merge};
pub use template::{ElementArg, TemplateArg, TemplateError, TemplateNode, UnionMember};
