//! The annotation expression AST.
//!
//! Expressions live in their own arena so that a labeled expression can be
//! referenced from several places without shared ownership.
use super::element::ElementId;
use super::types::TypeRef;
use serde::{Deserialize, Serialize};

/// A stable handle to an expression in an `EdmModel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ExprId(pub u32);

impl ExprId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

/// The literal payload of a primitive constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Binary(Vec<u8>),
    Boolean(bool),
    /// Seconds since the epoch; only the kind matters for type checking.
    DateTime(i64),
    DateTimeOffset(i64),
    Decimal(String),
    Floating(f64),
    Guid([u8; 16]),
    Integer(i64),
    String(String),
    Time(i64),
}

/// The function applied by a function-application expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionRef {
    Resolved(ElementId),
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyConstructor {
    pub name: String,
    pub value: ExprId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A primitive literal, optionally carrying an explicitly declared type.
    Constant { value: ConstantValue, declared_type: Option<TypeRef> },
    Null,
    Path(Vec<String>),
    FunctionApplication { function: FunctionRef, arguments: Vec<ExprId> },
    If { test: ExprId, if_true: ExprId, if_false: ExprId },
    IsType { operand: ExprId, type_ref: TypeRef },
    AssertType { operand: ExprId, type_ref: TypeRef },
    Record { declared_type: Option<TypeRef>, properties: Vec<PropertyConstructor> },
    Collection { declared_type: Option<TypeRef>, elements: Vec<ExprId> },
    Labeled { name: String, element: ExprId },
    LabeledReference(ExprId),
    EntitySetReference(ElementId),
    EnumMemberReference(ElementId),
    ParameterReference(ElementId),
    ValueTermReference(ElementId),
}

impl Expression {
    pub fn constant(value: ConstantValue) -> Self {
        Expression::Constant { value, declared_type: None }
    }

    pub fn typed_constant(value: ConstantValue, declared_type: TypeRef) -> Self {
        Expression::Constant { value, declared_type: Some(declared_type) }
    }

    pub fn path(segments: &[&str]) -> Self {
        Expression::Path(segments.iter().map(|s| s.to_string()).collect())
    }

    /// Direct sub-expressions, in declaration order.
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            Expression::FunctionApplication { arguments, .. } => arguments.clone(),
            Expression::If { test, if_true, if_false } => vec![*test, *if_true, *if_false],
            Expression::IsType { operand, .. } | Expression::AssertType { operand, .. } => vec![*operand],
            Expression::Record { properties, .. } => properties.iter().map(|p| p.value).collect(),
            Expression::Collection { elements, .. } => elements.clone(),
            Expression::Labeled { element, .. } => vec![*element],
            Expression::LabeledReference(target) => vec![*target],
            _ => Vec::new(),
        }
    }

    /// Type references carried directly by the node.
    pub fn type_refs(&self) -> Vec<&TypeRef> {
        match self {
            Expression::Constant { declared_type: Some(t), .. }
            | Expression::Record { declared_type: Some(t), .. }
            | Expression::Collection { declared_type: Some(t), .. } => vec![t],
            Expression::IsType { type_ref, .. } | Expression::AssertType { type_ref, .. } => vec![type_ref],
            _ => Vec::new(),
        }
    }
}
