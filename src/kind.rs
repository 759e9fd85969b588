//! The closed set of runtime shape kinds, and value classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kinds a template can accept for leaf positions.
///
/// `Undefined` means "the key may be absent": JSON has no `undefined` value,
/// so a present value never classifies as it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Boolean,
    Number,
    String,
    Null,
    Undefined,
}

/// Every kind a runtime value can have, container kinds included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Array,
    Object,
    Boolean,
    Number,
    String,
    Null,
    Undefined,
}

impl ShapeKind {
    /// Classify a runtime value. `serde_json::Value` is a closed set, so
    /// every value classifies; absence is handled by the record walkers.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Null => Self::Null,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Object => "object",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Null => "null",
            Self::Undefined => "undefined",
        }
    }
}

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        ShapeKind::from(self).as_str()
    }
}

impl From<ScalarKind> for ShapeKind {
    fn from(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Boolean => Self::Boolean,
            ScalarKind::Number => Self::Number,
            ScalarKind::String => Self::String,
            ScalarKind::Null => Self::Null,
            ScalarKind::Undefined => Self::Undefined,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a kind set the way diagnostics quote it: `[boolean, number]`.
pub(crate) fn kind_list<K: fmt::Display>(kinds: &[K]) -> String {
    use fmt::Write;

    let mut out = String::from("[");
    for (i, kind) in kinds.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{kind}");
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classification_is_total() {
        assert_eq!(ShapeKind::of(&json!([1])), ShapeKind::Array);
        assert_eq!(ShapeKind::of(&json!({"a": 1})), ShapeKind::Object);
        assert_eq!(ShapeKind::of(&json!(true)), ShapeKind::Boolean);
        assert_eq!(ShapeKind::of(&json!(1.5)), ShapeKind::Number);
        assert_eq!(ShapeKind::of(&json!("x")), ShapeKind::String);
        assert_eq!(ShapeKind::of(&json!(null)), ShapeKind::Null);
    }

    #[test]
    fn scalar_tags_parse_from_json() {
        for (tag, kind) in [
            ("boolean", ScalarKind::Boolean),
            ("number", ScalarKind::Number),
            ("string", ScalarKind::String),
            ("null", ScalarKind::Null),
            ("undefined", ScalarKind::Undefined),
        ] {
            let parsed: ScalarKind = serde_json::from_value(json!(tag)).unwrap();
            assert_eq!(parsed, kind);
            assert_eq!(kind.as_str(), tag);
        }
        assert!(serde_json::from_value::<ScalarKind>(json!("float")).is_err());
    }

    #[test]
    fn kind_lists_render_bracketed() {
        assert_eq!(kind_list::<ShapeKind>(&[]), "[]");
        assert_eq!(
            kind_list(&[ShapeKind::Array, ShapeKind::Null]),
            "[array, null]"
        );
    }
}
