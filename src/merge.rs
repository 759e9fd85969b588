//! Merging: fold an untrusted update into a trusted value.
//!
//! `merge` produces a value that takes every conforming field/element from
//! `incoming` and falls back to `current` everywhere else. Wherever nothing
//! under a node actually changed the *original* `current` is handed back
//! (`Cow::Borrowed`), so callers can cheaply detect no-op updates. `current`
//! is never mutated; failures leave it logically intact.

use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::kind::{ShapeKind, kind_list};
use crate::template::TemplateNode;

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Skip record keys the template does not declare (instead of failing).
    pub ignore_extra: bool,
    /// Keep the current value where the incoming one has the wrong kind
    /// (instead of failing).
    pub ignore_type: bool,
}

/// Why a merge was refused. Paths are `$`-rooted, as in [`crate::Mismatch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// The incoming value, or one of its elements, has a kind the template
    /// does not accept at that position. Recoverable via `ignore_type`.
    #[error("{path}: kind `{found}` is not accepted here (expected one of {expected})")]
    TypeMismatch {
        path: String,
        found: ShapeKind,
        expected: String,
    },
    /// A non-optional key is absent from the incoming record while the
    /// current value has no record to source it from.
    #[error("{path}: missing required key `{key}`")]
    MissingKey { path: String, key: String },
    /// The incoming record carries a key the template does not declare.
    /// Recoverable via `ignore_extra`.
    #[error("{path}: key `{key}` is not declared in the template")]
    UnknownField { path: String, key: String },
    /// Arrays of records can be checked but not merged.
    #[error("{path}: arrays of records cannot be merged")]
    Unsupported { path: String },
}

/// Merge `incoming` into `current` under `node`.
///
/// Returns `Cow::Borrowed(current)` when the result is `current` itself
/// (nothing changed), and an owned value otherwise.
pub fn merge<'a>(
    node: &TemplateNode,
    current: &'a Value,
    incoming: &'a Value,
    opts: &MergeOptions,
) -> Result<Cow<'a, Value>, MergeError> {
    let merged = merge_at(node, Some(current), incoming, opts, "$")?;
    Ok(merged.unwrap_or(Cow::Borrowed(current)))
}

/// One recursion step. `current` is `None` where the trusted side has no
/// value at this position (an absent record key); a `None` result means the
/// position stays absent (only reachable through `ignore_type`).
fn merge_at<'a>(
    node: &TemplateNode,
    current: Option<&'a Value>,
    incoming: &'a Value,
    opts: &MergeOptions,
    path: &str,
) -> Result<Option<Cow<'a, Value>>, MergeError> {
    // Identity fast path, before anything else is inspected.
    if let Some(cur) = current {
        if cur == incoming {
            return Ok(Some(Cow::Borrowed(cur)));
        }
    }

    let found = ShapeKind::of(incoming);
    if !node.accepts(found) {
        if opts.ignore_type {
            return Ok(current.map(Cow::Borrowed));
        }
        return Err(MergeError::TypeMismatch {
            path: path.to_owned(),
            found,
            expected: kind_list(node.kinds()),
        });
    }

    match found {
        ShapeKind::Array => merge_array(node, current, incoming, opts, path),
        ShapeKind::Object => merge_object(node, current, incoming, opts, path),
        // Scalars replace the current value wholesale.
        _ => Ok(Some(Cow::Borrowed(incoming))),
    }
}

fn merge_array<'a>(
    node: &TemplateNode,
    current: Option<&'a Value>,
    incoming: &'a Value,
    opts: &MergeOptions,
    path: &str,
) -> Result<Option<Cow<'a, Value>>, MergeError> {
    let Some(contents) = node.contents() else {
        unreachable!("array kind without element shapes");
    };
    if contents.element().is_some() {
        return Err(MergeError::Unsupported { path: path.to_owned() });
    }
    let Value::Array(items) = incoming else {
        unreachable!();
    };

    // The fast path above already returned for an unchanged array, so the
    // incoming one replaces current in full once every element checks out.
    for (i, item) in items.iter().enumerate() {
        let item_kind = ShapeKind::of(item);
        if !contents.accepts(item_kind) {
            if opts.ignore_type {
                return Ok(current.map(Cow::Borrowed));
            }
            return Err(MergeError::TypeMismatch {
                path: format!("{path}[{i}]"),
                found: item_kind,
                expected: kind_list(contents.kinds()),
            });
        }
    }

    Ok(Some(Cow::Owned(incoming.clone())))
}

fn merge_object<'a>(
    node: &TemplateNode,
    current: Option<&'a Value>,
    incoming: &'a Value,
    opts: &MergeOptions,
    path: &str,
) -> Result<Option<Cow<'a, Value>>, MergeError> {
    let Some(children) = node.children() else {
        unreachable!("object kind without field templates");
    };
    let Value::Object(update) = incoming else {
        unreachable!();
    };

    let base = current.and_then(Value::as_object);

    // With no record on the trusted side there is nothing to fill missing
    // keys from, so every non-optional key has to arrive in the update.
    if base.is_none() {
        for (key, child) in children {
            if child.is_optional() {
                continue;
            }
            if !update.contains_key(key) {
                return Err(MergeError::MissingKey {
                    path: path.to_owned(),
                    key: key.clone(),
                });
            }
        }
    }

    let mut rebuilt: Option<Map<String, Value>> = None;

    for (key, field) in update {
        let Some(child) = children.get(key) else {
            if opts.ignore_extra {
                continue;
            }
            return Err(MergeError::UnknownField {
                path: path.to_owned(),
                key: key.clone(),
            });
        };

        let base_field = base.and_then(|m| m.get(key));
        let child_path = format!("{path}.{key}");
        let Some(merged) = merge_at(child, base_field, field, opts, &child_path)? else {
            // type-ignored update of a key the current value never had
            continue;
        };

        let changed = match base_field {
            Some(existing) => *merged != *existing,
            None => true,
        };
        if changed {
            rebuilt
                .get_or_insert_with(|| base.cloned().unwrap_or_default())
                .insert(key.clone(), merged.into_owned());
        }
    }

    match rebuilt {
        Some(map) => Ok(Some(Cow::Owned(Value::Object(map)))),
        None => Ok(current.map(Cow::Borrowed)),
    }
}

// --------------------------------- Tests ---------------------------------- //
