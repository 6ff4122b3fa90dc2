//! Rules over individual type references.
use crate::model::{BadTypeReason, PrimitiveKind, TypeDef, TypeRef};
use crate::validation::context::{Owner, ValidationContext};
use crate::validation::error::ErrorKind;
use crate::validation::rule::{Check, ValidationRule};

pub static MUST_BE_RESOLVED: ValidationRule =
    ValidationRule::structural("TypeReferenceInaccessibleSchemaType", Check::TypeReference(must_be_resolved));

pub static PRIMITIVE_KIND_MUST_NOT_BE_NONE: ValidationRule =
    ValidationRule::structural("PrimitiveTypeMustNotHaveKindOfNone", Check::TypeReference(primitive_kind_must_not_be_none));

/// Stream type references arrived in 3.0.
pub static STREAM_NOT_SUPPORTED_BEFORE_V3: ValidationRule =
    ValidationRule::semantic("StreamTypeReferencesNotSupportedBeforeV3", Check::TypeReference(stream_not_supported_before_v3));

/// Geography and geometry type references arrived in 3.0.
pub static SPATIAL_NOT_SUPPORTED_BEFORE_V3: ValidationRule =
    ValidationRule::semantic("SpatialTypeReferencesNotSupportedBeforeV3", Check::TypeReference(spatial_not_supported_before_v3));

pub static DECIMAL_PRECISION_AND_SCALE: ValidationRule =
    ValidationRule::semantic("DecimalTypeReferencePrecisionAndScaleOutOfRange", Check::TypeReference(decimal_precision_and_scale));

pub static TEMPORAL_PRECISION: ValidationRule =
    ValidationRule::semantic("TemporalTypeReferencePrecisionOutOfRange", Check::TypeReference(temporal_precision));

pub static MAX_LENGTH: ValidationRule =
    ValidationRule::semantic("BinaryAndStringTypeReferenceMaxLengthOutOfRange", Check::TypeReference(max_length));

fn must_be_resolved(ctx: &mut ValidationContext<'_>, owner: Owner, type_ref: &TypeRef) {
    if let TypeDef::Bad(bad) = &type_ref.definition {
        let (code, problem) = match bad.reason {
            BadTypeReason::Unresolved => (ErrorKind::BadUnresolvedType, "could not be found"),
            BadTypeReason::Ambiguous => (ErrorKind::BadAmbiguousType, "is ambiguous"),
        };
        let location = ctx.location_of_owner(owner);
        ctx.add_error(location, code, format!("The type '{}' {}.", bad.name, problem));
    }
}

fn primitive_kind_must_not_be_none(ctx: &mut ValidationContext<'_>, owner: Owner, type_ref: &TypeRef) {
    if type_ref.primitive_kind() == Some(PrimitiveKind::None) {
        let location = ctx.location_of_owner(owner);
        ctx.add_error(location, ErrorKind::PrimitiveTypeMustNotHaveKindOfNone, "A primitive type reference has no kind.");
    }
}

fn stream_not_supported_before_v3(ctx: &mut ValidationContext<'_>, owner: Owner, type_ref: &TypeRef) {
    if type_ref.primitive_kind() == Some(PrimitiveKind::Stream) {
        let location = ctx.location_of_owner(owner);
        ctx.add_error(
            location,
            ErrorKind::StreamTypeReferencesNotSupportedBeforeV3,
            "Stream type references are not supported before version 3.0.",
        );
    }
}

fn spatial_not_supported_before_v3(ctx: &mut ValidationContext<'_>, owner: Owner, type_ref: &TypeRef) {
    if let Some(kind) = type_ref.primitive_kind().filter(|k| k.is_spatial()) {
        let location = ctx.location_of_owner(owner);
        ctx.add_error(
            location,
            ErrorKind::SpatialTypeReferencesNotSupportedBeforeV3,
            format!("The spatial type '{}' is not supported before version 3.0.", kind),
        );
    }
}

fn decimal_precision_and_scale(ctx: &mut ValidationContext<'_>, owner: Owner, type_ref: &TypeRef) {
    if type_ref.primitive_kind() != Some(PrimitiveKind::Decimal) {
        return;
    }
    let precision = type_ref.facets.precision;
    let location = ctx.location_of_owner(owner);
    if let Some(p) = precision.filter(|p| *p < 0) {
        ctx.add_error(location.clone(), ErrorKind::PrecisionOutOfRange, format!("The precision {} is out of range.", p));
    }
    if let Some(scale) = type_ref.facets.scale {
        let above_precision = precision.is_some_and(|p| p >= 0 && scale > p);
        if scale < 0 || above_precision {
            ctx.add_error(location, ErrorKind::ScaleOutOfRange, format!("The scale {} is out of range.", scale));
        }
    }
}

fn temporal_precision(ctx: &mut ValidationContext<'_>, owner: Owner, type_ref: &TypeRef) {
    let temporal = type_ref.primitive_kind().is_some_and(PrimitiveKind::is_temporal);
    if let Some(p) = type_ref.facets.precision.filter(|p| temporal && *p < 0) {
        let location = ctx.location_of_owner(owner);
        ctx.add_error(location, ErrorKind::PrecisionOutOfRange, format!("The precision {} is out of range.", p));
    }
}

fn max_length(ctx: &mut ValidationContext<'_>, owner: Owner, type_ref: &TypeRef) {
    let sized = matches!(type_ref.primitive_kind(), Some(PrimitiveKind::Binary | PrimitiveKind::String));
    if let Some(max) = type_ref.facets.max_length.filter(|m| sized && *m < 0) {
        let location = ctx.location_of_owner(owner);
        ctx.add_error(location, ErrorKind::MaxLengthOutOfRange, format!("The maximum length {} is out of range.", max));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdmModel;
    use rstest::rstest;

    fn codes(rule: fn(&mut ValidationContext<'_>, Owner, &TypeRef), type_ref: TypeRef) -> Vec<ErrorKind> {
        let model = EdmModel::new();
        let mut ctx = ValidationContext::new(&model);
        rule(&mut ctx, Owner::Element(crate::model::ElementId(0)), &type_ref);
        ctx.take_errors().into_iter().map(|e| e.code).collect()
    }

    #[rstest]
    #[case(TypeRef::primitive(PrimitiveKind::Decimal, false).with_precision(10).with_scale(2), vec![])]
    #[case(TypeRef::primitive(PrimitiveKind::Decimal, false).with_precision(2).with_scale(4), vec![ErrorKind::ScaleOutOfRange])]
    #[case(TypeRef::primitive(PrimitiveKind::Decimal, false).with_precision(-1), vec![ErrorKind::PrecisionOutOfRange])]
    #[case(TypeRef::primitive(PrimitiveKind::Decimal, false).with_scale(-3), vec![ErrorKind::ScaleOutOfRange])]
    fn test_decimal_facets(#[case] type_ref: TypeRef, #[case] expected: Vec<ErrorKind>) {
        assert_eq!(codes(decimal_precision_and_scale, type_ref), expected);
    }

    #[rstest]
    #[case(TypeRef::unresolved("NS.Missing", true), vec![ErrorKind::BadUnresolvedType])]
    #[case(TypeRef::ambiguous("NS.Twice", true), vec![ErrorKind::BadAmbiguousType])]
    #[case(TypeRef::primitive(PrimitiveKind::Int32, true), vec![])]
    fn test_resolution(#[case] type_ref: TypeRef, #[case] expected: Vec<ErrorKind>) {
        assert_eq!(codes(must_be_resolved, type_ref), expected);
    }

    #[test]
    fn test_negative_max_length() {
        let string = TypeRef::primitive(PrimitiveKind::String, true).with_max_length(-5);
        assert_eq!(codes(max_length, string), vec![ErrorKind::MaxLengthOutOfRange]);
        let int = TypeRef::primitive(PrimitiveKind::Int32, true).with_max_length(-5);
        assert!(codes(max_length, int).is_empty());
    }

    #[test]
    fn test_spatial_and_stream_gates() {
        let point = TypeRef::primitive(PrimitiveKind::GeographyPoint, true);
        assert_eq!(codes(spatial_not_supported_before_v3, point), vec![ErrorKind::SpatialTypeReferencesNotSupportedBeforeV3]);
        let stream = TypeRef::primitive(PrimitiveKind::Stream, false);
        assert_eq!(codes(stream_not_supported_before_v3, stream), vec![ErrorKind::StreamTypeReferencesNotSupportedBeforeV3]);
    }
}
