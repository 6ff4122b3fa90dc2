//! Decides whether an annotation expression satisfies an expected type.
use super::promotion::promotes_to;
use crate::model::{
    ConstantValue, EdmModel, ElementId, ExprId, Expression, FunctionRef, Location, PrimitiveKind,
    PropertyConstructor, TypeDef, TypeKind, TypeRef,
};
use crate::validation::{EdmError, ErrorKind};
use std::collections::HashSet;

/// All errors discovered by one assertion, or success.
pub type TypeCheckResult = Result<(), Vec<EdmError>>;

fn fail(location: Option<Location>, code: ErrorKind, message: String) -> TypeCheckResult {
    Err(vec![EdmError::new(location, code, message)])
}

fn collect(errors: Vec<EdmError>) -> TypeCheckResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks expressions against types. Only compatibility is assessed; nothing is evaluated.
pub struct ExpressionTypeChecker<'a> {
    model: &'a EdmModel,
}

impl<'a> ExpressionTypeChecker<'a> {
    pub fn new(model: &'a EdmModel) -> Self {
        Self { model }
    }

    /// Asserts `expression` against `expected` with no structural context and
    /// promotion-compatible matching.
    pub fn assert_type(&self, expression: ExprId, expected: &TypeRef) -> TypeCheckResult {
        self.assert_type_in(expression, expected, None, false)
    }

    /// Asserts `expression` against `expected`.
    ///
    /// `context` is the structured type paths are resolved against. With
    /// `match_exactly` a declared type must be equivalent to the expected one
    /// instead of merely promotable or derived.
    pub fn assert_type_in(
        &self,
        expression: ExprId,
        expected: &TypeRef,
        context: Option<ElementId>,
        match_exactly: bool,
    ) -> TypeCheckResult {
        let mut active = HashSet::new();
        self.check(expression, expected, context, match_exactly, &mut active)
    }

    fn check(
        &self,
        expr_id: ExprId,
        expected: &TypeRef,
        context: Option<ElementId>,
        match_exactly: bool,
        active: &mut HashSet<ExprId>,
    ) -> TypeCheckResult {
        // Without a target kind there is nothing to disprove.
        if self.model.type_kind(&expected.definition) == TypeKind::None {
            return Ok(());
        }
        let Some(expression) = self.model.expression(expr_id) else {
            return Ok(());
        };
        let location = self.model.expression_location(expr_id).cloned();

        match expression {
            Expression::Constant { declared_type: Some(declared), .. } => {
                self.type_ref_match(declared, expected, location, match_exactly)
            }
            Expression::Constant { value, declared_type: None } => self.assert_primitive(value, expected, location),
            Expression::Null => {
                if expected.nullable {
                    Ok(())
                } else {
                    fail(
                        location,
                        ErrorKind::NullCannotBeAssertedToBeANonNullableType,
                        "Null value cannot have a non-nullable type.".to_string(),
                    )
                }
            }
            Expression::Path(segments) => self.assert_path(segments, expected, context, match_exactly, location),
            Expression::FunctionApplication { function, .. } => match function {
                FunctionRef::Resolved(id) => match self.model.signature(*id).and_then(|s| s.return_type.as_ref()) {
                    Some(return_type) => self.type_ref_match(return_type, expected, location, match_exactly),
                    None => Ok(()),
                },
                // Reported by the unresolved-function rule.
                FunctionRef::Unresolved(_) => Ok(()),
            },
            Expression::If { if_true, if_false, .. } => {
                let true_branch = self.check(*if_true, expected, context, match_exactly, active);
                let false_branch = self.check(*if_false, expected, context, match_exactly, active);
                let mut errors = Vec::new();
                for branch in [true_branch, false_branch] {
                    if let Err(e) = branch {
                        errors.extend(e);
                    }
                }
                collect(errors)
            }
            Expression::IsType { .. } => self.type_ref_match(
                &TypeRef::primitive(PrimitiveKind::Boolean, false),
                expected,
                location,
                match_exactly,
            ),
            Expression::Record { declared_type: Some(declared), .. }
            | Expression::Collection { declared_type: Some(declared), .. } => {
                self.type_ref_match(declared, expected, location, match_exactly)
            }
            Expression::Record { declared_type: None, properties } => {
                self.assert_record(properties, expected, context, location, active)
            }
            Expression::Collection { declared_type: None, elements } => {
                self.assert_collection(elements, expected, context, match_exactly, location, active)
            }
            Expression::Labeled { element, .. } => self.check(*element, expected, context, match_exactly, active),
            Expression::AssertType { type_ref, .. } => self.type_ref_match(type_ref, expected, location, match_exactly),
            Expression::LabeledReference(target) => {
                if !active.insert(*target) {
                    return Ok(());
                }
                // FIXME: unlike `Labeled`, this drops the caller's context and
                // exactness and re-checks with the defaults. Kept for compatibility
                // until the intended behavior is confirmed.
                let result = self.check(*target, expected, None, false, active);
                active.remove(target);
                result
            }
            Expression::EntitySetReference(_)
            | Expression::EnumMemberReference(_)
            | Expression::ParameterReference(_)
            | Expression::ValueTermReference(_) => fail(
                location,
                ErrorKind::ExpressionNotValidForTheAssertedType,
                "The type of the expression is incompatible with the asserted type.".to_string(),
            ),
        }
    }

    /// Checks the contents of a record or collection expression against its own
    /// declared type. Other expressions pass.
    pub fn assert_contents(&self, expression: ExprId, declared: &TypeRef) -> TypeCheckResult {
        let location = self.model.expression_location(expression).cloned();
        let mut active = HashSet::new();
        match self.model.expression(expression) {
            Some(Expression::Record { properties, .. }) => {
                self.assert_record(properties, declared, None, location, &mut active)
            }
            Some(Expression::Collection { elements, .. }) => {
                self.assert_collection(elements, declared, None, false, location, &mut active)
            }
            _ => Ok(()),
        }
    }

    fn assert_collection(
        &self,
        elements: &[ExprId],
        expected: &TypeRef,
        context: Option<ElementId>,
        match_exactly: bool,
        location: Option<Location>,
        active: &mut HashSet<ExprId>,
    ) -> TypeCheckResult {
        let Some(element_type) = expected.element_type() else {
            return fail(
                location,
                ErrorKind::CollectionExpressionNotValidForNonCollectionType,
                "A collection expression is incompatible with a non-collection type.".to_string(),
            );
        };
        let mut errors = Vec::new();
        for element in elements {
            if let Err(e) = self.check(*element, element_type, context, match_exactly, active) {
                errors.extend(e);
            }
        }
        collect(errors)
    }

    /// Literal checks for untyped constants. Never promotes.
    fn assert_primitive(&self, value: &ConstantValue, expected: &TypeRef, location: Option<Location>) -> TypeCheckResult {
        let Some(kind) = expected.primitive_kind() else {
            return fail(
                location,
                ErrorKind::PrimitiveConstantExpressionNotValidForNonPrimitiveType,
                "A primitive expression is incompatible with a non-primitive type.".to_string(),
            );
        };
        let kind_mismatch = |location: Option<Location>| {
            fail(
                location,
                ErrorKind::ExpressionPrimitiveKindNotValidForAssertedType,
                format!("The primitive expression is not compatible with the asserted type '{}'.", kind),
            )
        };
        let max_length = expected.facets.max_length.filter(|m| *m >= 0).map(|m| m as usize);

        match value {
            ConstantValue::Integer(v) => match kind.integer_range() {
                Some((min, max)) if *v < min || *v > max => fail(
                    location,
                    ErrorKind::IntegerConstantValueOutOfRange,
                    format!("The value '{}' is outside the range of '{}'.", v, kind),
                ),
                Some(_) => Ok(()),
                None => kind_mismatch(location),
            },
            ConstantValue::String(s) => {
                if kind != PrimitiveKind::String {
                    return kind_mismatch(location);
                }
                match max_length {
                    Some(max) if s.chars().count() > max => fail(
                        location,
                        ErrorKind::StringConstantLengthOutOfRange,
                        format!("The string length {} exceeds the maximum length {}.", s.chars().count(), max),
                    ),
                    _ => Ok(()),
                }
            }
            ConstantValue::Binary(bytes) => {
                if kind != PrimitiveKind::Binary {
                    return kind_mismatch(location);
                }
                match max_length {
                    Some(max) if bytes.len() > max => fail(
                        location,
                        ErrorKind::BinaryConstantLengthOutOfRange,
                        format!("The binary length {} exceeds the maximum length {}.", bytes.len(), max),
                    ),
                    _ => Ok(()),
                }
            }
            ConstantValue::Floating(_) if kind.is_floating() => Ok(()),
            ConstantValue::Boolean(_) if kind == PrimitiveKind::Boolean => Ok(()),
            ConstantValue::DateTime(_) if kind == PrimitiveKind::DateTime => Ok(()),
            ConstantValue::DateTimeOffset(_) if kind == PrimitiveKind::DateTimeOffset => Ok(()),
            ConstantValue::Decimal(_) if kind == PrimitiveKind::Decimal => Ok(()),
            ConstantValue::Guid(_) if kind == PrimitiveKind::Guid => Ok(()),
            ConstantValue::Time(_) if kind == PrimitiveKind::Time => Ok(()),
            _ => kind_mismatch(location),
        }
    }

    fn assert_path(
        &self,
        segments: &[String],
        expected: &TypeRef,
        context: Option<ElementId>,
        match_exactly: bool,
        location: Option<Location>,
    ) -> TypeCheckResult {
        let Some(context) = context.filter(|id| self.model.structure(*id).is_some()) else {
            return Ok(());
        };
        let mut result = TypeDef::Schema(context);
        for segment in segments {
            let Some(structured) = self.model.structured_definition(&result) else {
                return fail(
                    location,
                    ErrorKind::PathIsNotValidForTheGivenContext,
                    format!("The path segment '{}' is not valid for the given context.", segment),
                );
            };
            match self.model.find_property(structured, segment).and_then(|p| self.model.property(p)) {
                Some((_, type_ref, _)) => result = type_ref.definition.clone(),
                // Possibly a dynamic property of an open type: nothing can be proven.
                None => return Ok(()),
            }
        }
        self.type_match(&result, &expected.definition, location, match_exactly)
    }

    fn assert_record(
        &self,
        properties: &[PropertyConstructor],
        expected: &TypeRef,
        context: Option<ElementId>,
        location: Option<Location>,
        active: &mut HashSet<ExprId>,
    ) -> TypeCheckResult {
        let Some(structured) = self.model.structured_definition(&expected.definition) else {
            return fail(
                location,
                ErrorKind::RecordExpressionNotValidForNonStructuredType,
                "A record expression is incompatible with a non-structured type.".to_string(),
            );
        };

        let mut errors = Vec::new();
        let mut found = HashSet::new();
        for property in self.model.properties(structured) {
            let Some((name, type_ref, _)) = self.model.property(property) else {
                continue;
            };
            match properties.iter().find(|p| p.name == name) {
                None => errors.push(EdmError::new(
                    location.clone(),
                    ErrorKind::RecordExpressionMissingRequiredProperty,
                    format!("The record expression does not have the property '{}'.", name),
                )),
                Some(constructor) => {
                    if let Err(nested) = self.check(constructor.value, type_ref, context, false, active) {
                        errors.extend(nested);
                    }
                    found.insert(name);
                }
            }
        }

        if !self.model.is_open(structured) {
            for constructor in properties.iter().filter(|p| !found.contains(p.name.as_str())) {
                errors.push(EdmError::new(
                    location.clone(),
                    ErrorKind::RecordExpressionHasExtraProperties,
                    format!("The type of the record expression is not open and does not contain a property named '{}'.", constructor.name),
                ));
            }
        }
        collect(errors)
    }

    /// Compares a declared type reference with an expected one.
    pub fn type_ref_match(
        &self,
        actual: &TypeRef,
        expected: &TypeRef,
        location: Option<Location>,
        match_exactly: bool,
    ) -> TypeCheckResult {
        if !expected.nullable && actual.nullable {
            return fail(
                location,
                ErrorKind::CannotAssertNullableTypeAsNonNullableType,
                format!(
                    "Cannot assert the nullable type '{}' as a non-nullable type.",
                    self.model.type_name(&actual.definition)
                ),
            );
        }
        // A bad type was already reported where it was declared.
        if actual.is_bad() {
            return Ok(());
        }
        self.type_match(&actual.definition, &expected.definition, location, match_exactly)
    }

    /// Compares two definitions: equivalence when exact, otherwise promotion
    /// for primitives and nominal inheritance for everything else.
    pub fn type_match(
        &self,
        actual: &TypeDef,
        expected: &TypeDef,
        location: Option<Location>,
        match_exactly: bool,
    ) -> TypeCheckResult {
        if match_exactly {
            if self.model.is_equivalent(actual, expected) {
                return Ok(());
            }
            return fail(
                location,
                ErrorKind::ExpressionNotValidForTheAssertedType,
                "The type of the expression is incompatible with the asserted type.".to_string(),
            );
        }

        if self.model.type_kind(actual) == TypeKind::None {
            return Ok(());
        }

        if let (TypeDef::Primitive(from), TypeDef::Primitive(to)) = (actual, expected) {
            if !promotes_to(*from, *to) {
                return fail(
                    location,
                    ErrorKind::ExpressionPrimitiveKindNotValidForAssertedType,
                    format!("Cannot promote the primitive type '{}' to the specified primitive type '{}'.", from, to),
                );
            }
        } else if !self.model.is_or_inherits_from(actual, expected) {
            return fail(
                location,
                ErrorKind::ExpressionNotValidForTheAssertedType,
                format!(
                    "The type '{}' is incompatible with the asserted type '{}'.",
                    self.model.type_name(actual),
                    self.model.type_name(expected)
                ),
            );
        }
        Ok(())
    }
}
