//! Conformance checking: does a value have the shape a template declares?
//!
//! `check` walks template and value in lock-step, depth-first, and stops at
//! the first mismatch; `is_type` is the boolean view of the same walk. Both
//! are read-only over both inputs and never fail for value-shape reasons in
//! any other way than through their return value.

use serde_json::Value;
use thiserror::Error;

use crate::kind::{ShapeKind, kind_list};
use crate::template::TemplateNode;

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Tolerate record keys the template does not declare.
    pub ignore_extra: bool,
}

/// The first point where a value disagreed with the template.
///
/// Paths are `$`-rooted: `$.points[2].x`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("{path}: kind `{found}` is not accepted here (expected one of {expected})")]
    Kind {
        path: String,
        found: ShapeKind,
        expected: String,
    },
    #[error("{path}: missing required key `{key}`")]
    MissingKey { path: String, key: String },
    #[error("{path}: key `{key}` is not declared in the template")]
    UndeclaredKey { path: String, key: String },
}

/// Check `value` against `node`, reporting the first mismatch found.
pub fn check(node: &TemplateNode, value: &Value, opts: &CheckOptions) -> Result<(), Mismatch> {
    check_at(node, value, opts, "$")
}

/// Boolean view of [`check`].
pub fn is_type(node: &TemplateNode, value: &Value, opts: &CheckOptions) -> bool {
    check(node, value, opts).is_ok()
}

fn check_at(
    node: &TemplateNode,
    value: &Value,
    opts: &CheckOptions,
    path: &str,
) -> Result<(), Mismatch> {
    let found = ShapeKind::of(value);
    if !node.accepts(found) {
        return Err(Mismatch::Kind {
            path: path.to_owned(),
            found,
            expected: kind_list(node.kinds()),
        });
    }

    match found {
        ShapeKind::Array => {
            let Some(contents) = node.contents() else {
                unreachable!("array kind without element shapes");
            };
            let Value::Array(items) = value else {
                unreachable!();
            };

            for (i, item) in items.iter().enumerate() {
                let item_kind = ShapeKind::of(item);

                if item_kind == ShapeKind::Object {
                    if let Some(element) = contents.element() {
                        check_at(element, item, opts, &format!("{path}[{i}]"))?;
                        continue;
                    }
                }

                if !contents.accepts(item_kind) {
                    return Err(Mismatch::Kind {
                        path: format!("{path}[{i}]"),
                        found: item_kind,
                        expected: kind_list(contents.kinds()),
                    });
                }
            }
            Ok(())
        }

        ShapeKind::Object => {
            let Some(children) = node.children() else {
                unreachable!("object kind without field templates");
            };
            let Value::Object(map) = value else {
                unreachable!();
            };

            for (key, child) in children {
                if child.is_optional() {
                    continue;
                }
                if !map.contains_key(key) {
                    return Err(Mismatch::MissingKey {
                        path: path.to_owned(),
                        key: key.clone(),
                    });
                }
            }

            for (key, field) in map {
                let Some(child) = children.get(key) else {
                    if opts.ignore_extra {
                        continue;
                    }
                    return Err(Mismatch::UndeclaredKey {
                        path: path.to_owned(),
                        key: key.clone(),
                    });
                };
                check_at(child, field, opts, &format!("{path}.{key}"))?;
            }
            Ok(())
        }

        // Scalar kinds have no deeper structure.
        _ => Ok(()),
    }
}

// --------------------------------- Tests ---------------------------------- //
