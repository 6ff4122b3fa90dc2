//! Primitive promotion and the expression type checker.
//!
//! The checker decides whether an annotation expression may be assigned to an
//! expected type without evaluating it. Primitive literals are checked against
//! ranges and lengths, composite expressions recursively.

pub use self::checker::{ExpressionTypeChecker, TypeCheckResult};
pub use self::promotion::promotes_to;

use crate::model::{EdmModel, ElementId, ExprId, TypeRef};

// --- MODULE DECLARATIONS ---
mod checker;
mod promotion;

/// Asserts an expression against a type with no path context and
/// promotion-compatible matching.
pub fn assert_type(model: &EdmModel, expression: ExprId, expected: &TypeRef) -> TypeCheckResult {
    ExpressionTypeChecker::new(model).assert_type(expression, expected)
}

/// Asserts an expression against a type, resolving paths against `context`.
pub fn assert_type_in(
    model: &EdmModel,
    expression: ExprId,
    expected: &TypeRef,
    context: Option<ElementId>,
    match_exactly: bool,
) -> TypeCheckResult {
    ExpressionTypeChecker::new(model).assert_type_in(expression, expected, context, match_exactly)
}
