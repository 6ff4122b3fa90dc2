//! Type references and the primitive kind enumeration.
use super::element::ElementId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of EDM primitive kinds.
///
/// The discriminants are dense (`0..PrimitiveKind::COUNT`) so tables keyed by
/// kind can be plain arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum PrimitiveKind {
    None = 0,
    Binary,
    Boolean,
    Byte,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    String,
    Stream,
    Time,
    Geography,
    GeographyPoint,
    GeographyLineString,
    GeographyPolygon,
    GeographyCollection,
    GeographyMultiPolygon,
    GeographyMultiLineString,
    GeographyMultiPoint,
    Geometry,
    GeometryPoint,
    GeometryLineString,
    GeometryPolygon,
    GeometryCollection,
    GeometryMultiPolygon,
    GeometryMultiLineString,
    GeometryMultiPoint,
}

impl PrimitiveKind {
    pub const COUNT: usize = 33;

    pub const ALL: [PrimitiveKind; Self::COUNT] = [
        Self::None,
        Self::Binary,
        Self::Boolean,
        Self::Byte,
        Self::DateTime,
        Self::DateTimeOffset,
        Self::Decimal,
        Self::Double,
        Self::Guid,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::SByte,
        Self::Single,
        Self::String,
        Self::Stream,
        Self::Time,
        Self::Geography,
        Self::GeographyPoint,
        Self::GeographyLineString,
        Self::GeographyPolygon,
        Self::GeographyCollection,
        Self::GeographyMultiPolygon,
        Self::GeographyMultiLineString,
        Self::GeographyMultiPoint,
        Self::Geometry,
        Self::GeometryPoint,
        Self::GeometryLineString,
        Self::GeometryPolygon,
        Self::GeometryCollection,
        Self::GeometryMultiPolygon,
        Self::GeometryMultiLineString,
        Self::GeometryMultiPoint,
    ];

    #[inline(always)]
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn is_integral(self) -> bool {
        matches!(self, Self::Byte | Self::SByte | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, Self::Single | Self::Double)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, Self::DateTime | Self::DateTimeOffset | Self::Time)
    }

    pub fn is_geography(self) -> bool {
        (Self::Geography.ordinal()..=Self::GeographyMultiPoint.ordinal()).contains(&self.ordinal())
    }

    pub fn is_geometry(self) -> bool {
        (Self::Geometry.ordinal()..=Self::GeometryMultiPoint.ordinal()).contains(&self.ordinal())
    }

    pub fn is_spatial(self) -> bool {
        self.is_geography() || self.is_geometry()
    }

    /// Inclusive value range of an integral kind.
    pub fn integer_range(self) -> Option<(i64, i64)> {
        match self {
            Self::Byte => Some((u8::MIN as i64, u8::MAX as i64)),
            Self::SByte => Some((i8::MIN as i64, i8::MAX as i64)),
            Self::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edm.{:?}", self)
    }
}

/// Why a type name could not be bound to a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadTypeReason {
    Unresolved,
    Ambiguous,
}

/// A type name that failed to resolve while the model was built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BadType {
    pub name: String,
    pub reason: BadTypeReason,
}

/// The definition a type reference points at.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    /// A kind-less definition. Nothing can be proven against it.
    None,
    Primitive(PrimitiveKind),
    Collection(Box<TypeRef>),
    /// An entity, complex, enum or row type living in the model arena.
    Schema(ElementId),
    EntityReference(ElementId),
    Bad(BadType),
}

impl TypeDef {
    pub fn is_bad(&self) -> bool {
        matches!(self, TypeDef::Bad(_))
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            TypeDef::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn schema_id(&self) -> Option<ElementId> {
        match self {
            TypeDef::Schema(id) => Some(*id),
            _ => None,
        }
    }
}

/// Length, precision and spatial facets of a type reference.
///
/// Values are signed so that out-of-range declarations coming from a loose
/// source document remain representable and can be reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub max_length: Option<i32>,
    pub is_unbounded: bool,
    pub fixed_length: Option<bool>,
    pub unicode: Option<bool>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub srid: Option<i32>,
}

/// A use of a type: a definition plus nullability and facets.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub definition: TypeDef,
    pub nullable: bool,
    pub facets: Facets,
}

impl TypeRef {
    pub fn new(definition: TypeDef, nullable: bool) -> Self {
        Self { definition, nullable, facets: Facets::default() }
    }

    pub fn primitive(kind: PrimitiveKind, nullable: bool) -> Self {
        Self::new(TypeDef::Primitive(kind), nullable)
    }

    pub fn schema(id: ElementId, nullable: bool) -> Self {
        Self::new(TypeDef::Schema(id), nullable)
    }

    pub fn entity_reference(id: ElementId, nullable: bool) -> Self {
        Self::new(TypeDef::EntityReference(id), nullable)
    }

    /// Collections are never nullable themselves; their elements may be.
    pub fn collection(element: TypeRef) -> Self {
        Self::new(TypeDef::Collection(Box::new(element)), false)
    }

    pub fn unresolved(name: impl Into<String>, nullable: bool) -> Self {
        Self::new(
            TypeDef::Bad(BadType { name: name.into(), reason: BadTypeReason::Unresolved }),
            nullable,
        )
    }

    pub fn ambiguous(name: impl Into<String>, nullable: bool) -> Self {
        Self::new(
            TypeDef::Bad(BadType { name: name.into(), reason: BadTypeReason::Ambiguous }),
            nullable,
        )
    }

    pub fn none() -> Self {
        Self::new(TypeDef::None, true)
    }

    pub fn with_max_length(mut self, max_length: i32) -> Self {
        self.facets.max_length = Some(max_length);
        self
    }

    pub fn with_precision(mut self, precision: i32) -> Self {
        self.facets.precision = Some(precision);
        self
    }

    pub fn with_scale(mut self, scale: i32) -> Self {
        self.facets.scale = Some(scale);
        self
    }

    pub fn is_bad(&self) -> bool {
        self.definition.is_bad()
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        self.definition.primitive_kind()
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.definition, TypeDef::Collection(_))
    }

    pub fn element_type(&self) -> Option<&TypeRef> {
        match &self.definition {
            TypeDef::Collection(element) => Some(element),
            _ => None,
        }
    }
}

/// Broad classification of a type definition, resolved against a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    None,
    Primitive,
    Entity,
    Complex,
    Row,
    Enum,
    Collection,
    EntityReference,
}

impl TypeKind {
    pub fn is_structured(self) -> bool {
        matches!(self, TypeKind::Entity | TypeKind::Complex | TypeKind::Row)
    }
}

/// Cardinality of one end of a navigation relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    ZeroOrOne,
    One,
    Many,
}
