//! Template descriptions and the compiler that turns them into node trees.
//!
//! A description is a small algebraic type mirroring the compact literal
//! syntax: a bare kind tag, a union of members (scalar tags plus at most one
//! array shape or one object shape), or a keyed map of field descriptions.
//! `#[serde(untagged)]` lets the same literals be written as JSON:
//!
//! - `"number"`
//! - `["string", "undefined"]`
//! - `[["number"]]` and `[["number"], "null"]`
//! - `{"x": "number"}`
//! - `[[{"x": "number"}]]` (array of records)
//!
//! Compiling produces an immutable [`TemplateNode`] tree; the checker and
//! merger only ever read it, so one compiled template can serve any number
//! of calls (or threads) without coordination.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kind::{ScalarKind, ShapeKind};

// ------------------------------ Description ------------------------------ //

/// A template description, as written by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateArg {
    Scalar(ScalarKind),
    Union(Vec<UnionMember>),
    Object(IndexMap<String, TemplateArg>),
}

/// One member of a union description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnionMember {
    Scalar(ScalarKind),
    Array(Vec<ElementArg>),
    Object(IndexMap<String, TemplateArg>),
}

/// One accepted element shape inside an array description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementArg {
    Scalar(ScalarKind),
    Object(IndexMap<String, TemplateArg>),
}

// ------------------------------- Rejections ------------------------------- //

/// A malformed template description. Always fatal at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("empty union")]
    EmptyUnion,
    #[error("empty array shape")]
    EmptyArray,
    #[error("duplicate kind `{0}` in union")]
    DuplicateKind(ScalarKind),
    #[error("duplicate element kind `{0}` in array shape")]
    DuplicateElementKind(ScalarKind),
    #[error("a union may contain no more than one array shape")]
    MultipleArrays,
    #[error("a union may contain no more than one object shape")]
    MultipleObjects,
    #[error("a union may not contain both an array shape and an object shape")]
    ArrayAndObject,
    #[error("an array shape may contain no more than one object element shape")]
    MultipleElementObjects,
}

// ----------------------------- Compiled tree ------------------------------ //

/// One node of a compiled template.
///
/// Invariants, enforced by [`TemplateNode::compile`] and relied on by the
/// walkers: `kinds` is non-empty and duplicate-free, `children` is present
/// exactly when `kinds` contains `object`, `contents` exactly when it
/// contains `array`, and the two container kinds never appear together.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateNode {
    kinds: Vec<ShapeKind>,
    children: Option<IndexMap<String, TemplateNode>>,
    contents: Option<ArrayContents>,
}

/// Accepted element shapes for an array-kind node.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayContents {
    kinds: Vec<ScalarKind>,
    element: Option<Box<TemplateNode>>,
}

impl TemplateNode {
    /// Compile a description into a node tree.
    ///
    /// Deterministic and side-effect free: equal descriptions compile to
    /// equal trees, field order included.
    pub fn compile(arg: &TemplateArg) -> Result<Self, TemplateError> {
        let node = Self::compile_node(arg)?;
        tracing::debug!(kinds = ?node.kinds, "compiled template");
        Ok(node)
    }

    fn compile_node(arg: &TemplateArg) -> Result<Self, TemplateError> {
        match arg {
            TemplateArg::Scalar(kind) => Ok(Self {
                kinds: vec![(*kind).into()],
                children: None,
                contents: None,
            }),
            TemplateArg::Union(members) => {
                if members.is_empty() {
                    return Err(TemplateError::EmptyUnion);
                }

                let mut kinds = Vec::with_capacity(members.len());
                let mut children = None;
                let mut contents = None;
                let mut seen = Vec::new();

                for member in members {
                    match member {
                        UnionMember::Scalar(kind) => {
                            if seen.contains(kind) {
                                return Err(TemplateError::DuplicateKind(*kind));
                            }
                            seen.push(*kind);
                            kinds.push((*kind).into());
                        }
                        UnionMember::Array(elements) => {
                            if contents.is_some() {
                                return Err(TemplateError::MultipleArrays);
                            }
                            if children.is_some() {
                                return Err(TemplateError::ArrayAndObject);
                            }
                            contents = Some(Self::compile_contents(elements)?);
                            kinds.push(ShapeKind::Array);
                        }
                        UnionMember::Object(fields) => {
                            if children.is_some() {
                                return Err(TemplateError::MultipleObjects);
                            }
                            if contents.is_some() {
                                return Err(TemplateError::ArrayAndObject);
                            }
                            children = Some(Self::compile_fields(fields)?);
                            kinds.push(ShapeKind::Object);
                        }
                    }
                }

                Ok(Self { kinds, children, contents })
            }
            TemplateArg::Object(fields) => Ok(Self {
                kinds: vec![ShapeKind::Object],
                children: Some(Self::compile_fields(fields)?),
                contents: None,
            }),
        }
    }

    fn compile_fields(
        fields: &IndexMap<String, TemplateArg>,
    ) -> Result<IndexMap<String, TemplateNode>, TemplateError> {
        let mut out = IndexMap::with_capacity(fields.len());
        for (name, child) in fields {
            out.insert(name.clone(), Self::compile_node(child)?);
        }
        Ok(out)
    }

    fn compile_contents(elements: &[ElementArg]) -> Result<ArrayContents, TemplateError> {
        if elements.is_empty() {
            return Err(TemplateError::EmptyArray);
        }

        let mut kinds = Vec::new();
        let mut element = None;

        for elem in elements {
            match elem {
                ElementArg::Scalar(kind) => {
                    if kinds.contains(kind) {
                        return Err(TemplateError::DuplicateElementKind(*kind));
                    }
                    kinds.push(*kind);
                }
                ElementArg::Object(fields) => {
                    if element.is_some() {
                        return Err(TemplateError::MultipleElementObjects);
                    }
                    element = Some(Box::new(TemplateNode {
                        kinds: vec![ShapeKind::Object],
                        children: Some(Self::compile_fields(fields)?),
                        contents: None,
                    }));
                }
            }
        }

        Ok(ArrayContents { kinds, element })
    }

    /// The kinds this node accepts, in declaration order.
    pub fn kinds(&self) -> &[ShapeKind] {
        &self.kinds
    }

    pub fn accepts(&self, kind: ShapeKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Field templates, when `object` is among the accepted kinds.
    pub fn children(&self) -> Option<&IndexMap<String, TemplateNode>> {
        self.children.as_ref()
    }

    /// Element shapes, when `array` is among the accepted kinds.
    pub fn contents(&self) -> Option<&ArrayContents> {
        self.contents.as_ref()
    }

    /// An `undefined`-accepting field may be missing from a record entirely.
    pub(crate) fn is_optional(&self) -> bool {
        self.kinds.contains(&ShapeKind::Undefined)
    }
}

impl ArrayContents {
    /// Scalar kinds accepted for elements, in declaration order.
    pub fn kinds(&self) -> &[ScalarKind] {
        &self.kinds
    }

    pub fn accepts(&self, kind: ShapeKind) -> bool {
        self.kinds.iter().any(|k| ShapeKind::from(*k) == kind)
    }

    /// The object element shape, when this is an array of records.
    pub fn element(&self) -> Option<&TemplateNode> {
        self.element.as_deref()
    }
}

// --------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const SCALAR_TAGS: [(&str, ScalarKind); 5] = [
        ("boolean", ScalarKind::Boolean),
        ("number", ScalarKind::Number),
        ("string", ScalarKind::String),
        ("null", ScalarKind::Null),
        ("undefined", ScalarKind::Undefined),
    ];

    fn arg(description: Value) -> TemplateArg {
        serde_json::from_value(description).expect("description parses")
    }

    fn compile(description: Value) -> Result<TemplateNode, TemplateError> {
        TemplateNode::compile(&arg(description))
    }

    #[test]
    fn single_scalar_tags_compile_to_single_kind_nodes() {
        for (tag, kind) in SCALAR_TAGS {
            let node = compile(json!(tag)).unwrap();
            assert_eq!(node.kinds(), &[ShapeKind::from(kind)]);
            assert!(node.children().is_none());
            assert!(node.contents().is_none());
        }
    }

    #[test]
    fn unknown_scalar_tag_fails_to_parse() {
        assert!(serde_json::from_value::<TemplateArg>(json!("float")).is_err());
        assert!(serde_json::from_value::<TemplateArg>(json!(["number", "int"])).is_err());
    }

    #[test]
    fn union_keeps_declaration_order() {
        let node = compile(json!(["string", "null", "boolean"])).unwrap();
        assert_eq!(
            node.kinds(),
            &[ShapeKind::String, ShapeKind::Null, ShapeKind::Boolean]
        );
    }

    #[test]
    fn empty_union_is_rejected() {
        assert_eq!(compile(json!([])), Err(TemplateError::EmptyUnion));
    }

    #[test]
    fn duplicate_scalar_in_union_is_rejected() {
        assert_eq!(
            compile(json!(["number", "number"])),
            Err(TemplateError::DuplicateKind(ScalarKind::Number))
        );
        assert_eq!(
            compile(json!(["string", "number", "string"])),
            Err(TemplateError::DuplicateKind(ScalarKind::String))
        );
    }

    #[test]
    fn array_of_scalar_union() {
        let node = compile(json!([["number", "string"]])).unwrap();
        assert_eq!(node.kinds(), &[ShapeKind::Array]);
        let contents = node.contents().unwrap();
        assert_eq!(contents.kinds(), &[ScalarKind::Number, ScalarKind::String]);
        assert!(contents.element().is_none());
    }

    #[test]
    fn empty_array_shape_is_rejected() {
        assert_eq!(compile(json!([[]])), Err(TemplateError::EmptyArray));
    }

    #[test]
    fn duplicate_element_kind_is_rejected() {
        assert_eq!(
            compile(json!([["number", "number"]])),
            Err(TemplateError::DuplicateElementKind(ScalarKind::Number))
        );
    }

    #[test]
    fn a_union_admits_one_array_and_one_object_at_most() {
        assert_eq!(
            compile(json!([["number"], ["string"]])),
            Err(TemplateError::MultipleArrays)
        );
        assert_eq!(
            compile(json!([{"x": "number"}, {"y": "number"}])),
            Err(TemplateError::MultipleObjects)
        );
        assert_eq!(
            compile(json!([["number"], {"x": "number"}])),
            Err(TemplateError::ArrayAndObject)
        );
        assert_eq!(
            compile(json!([{"x": "number"}, ["number"]])),
            Err(TemplateError::ArrayAndObject)
        );
    }

    #[test]
    fn empty_object_compiles_to_fieldless_record() {
        let node = compile(json!({})).unwrap();
        assert_eq!(node.kinds(), &[ShapeKind::Object]);
        assert!(node.children().unwrap().is_empty());
    }

    #[test]
    fn object_fields_compile_recursively() {
        let node = compile(json!({
            "x": "number",
            "y": ["string", "undefined"],
            "inner": {"flag": "boolean"},
        }))
        .unwrap();

        let fields = node.children().unwrap();
        assert_eq!(fields["x"].kinds(), &[ShapeKind::Number]);
        assert_eq!(
            fields["y"].kinds(),
            &[ShapeKind::String, ShapeKind::Undefined]
        );
        assert!(fields["y"].is_optional());
        let inner = fields["inner"].children().unwrap();
        assert_eq!(inner["flag"].kinds(), &[ShapeKind::Boolean]);
    }

    #[test]
    fn array_of_records() {
        let node = compile(json!([[{"x": "number", "y": "number"}]])).unwrap();
        assert_eq!(node.kinds(), &[ShapeKind::Array]);
        let contents = node.contents().unwrap();
        assert!(contents.kinds().is_empty());
        let element = contents.element().unwrap();
        assert_eq!(element.kinds(), &[ShapeKind::Object]);
        assert_eq!(
            element.children().unwrap()["x"].kinds(),
            &[ShapeKind::Number]
        );
    }

    #[test]
    fn record_elements_may_mix_with_scalar_elements() {
        let node = compile(json!([[{"x": "number"}, "null"]])).unwrap();
        let contents = node.contents().unwrap();
        assert_eq!(contents.kinds(), &[ScalarKind::Null]);
        assert!(contents.element().is_some());
        assert!(contents.accepts(ShapeKind::Null));
        assert!(!contents.accepts(ShapeKind::Number));
    }

    #[test]
    fn two_record_element_shapes_are_rejected() {
        assert_eq!(
            compile(json!([[{"x": "number"}, {"y": "number"}]])),
            Err(TemplateError::MultipleElementObjects)
        );
    }

    #[test]
    fn mixed_union_of_array_and_scalars() {
        let node = compile(json!([["number"], "string", "null"])).unwrap();
        assert_eq!(
            node.kinds(),
            &[ShapeKind::Array, ShapeKind::String, ShapeKind::Null]
        );
        assert!(node.contents().is_some());
        assert!(node.children().is_none());
    }

    #[test]
    fn mixed_union_of_object_and_scalars() {
        let node = compile(json!([{"x": "number"}, "null"])).unwrap();
        assert_eq!(node.kinds(), &[ShapeKind::Object, ShapeKind::Null]);
        assert!(node.children().is_some());
    }

    #[test]
    fn compiling_twice_yields_equal_trees() {
        let description = json!({
            "points": [[{"x": "number", "y": "number"}]],
            "label": ["string", "undefined"],
        });
        assert_eq!(compile(description.clone()), compile(description));
    }
}
