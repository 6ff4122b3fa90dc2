//! The primitive promotion relation.
//!
//! A narrower primitive may stand in where a wider one is expected. The
//! relation is reflexive plus the explicit edges below and nothing else: it is
//! not transitively closed.
use crate::model::PrimitiveKind;
use crate::model::PrimitiveKind::{
    Byte, Double, Geography, GeographyCollection, GeographyLineString, GeographyMultiLineString, GeographyMultiPoint,
    GeographyMultiPolygon, GeographyPoint, GeographyPolygon, Geometry, GeometryCollection, GeometryLineString,
    GeometryMultiLineString, GeometryMultiPoint, GeometryMultiPolygon, GeometryPoint, GeometryPolygon, Int16, Int32,
    Int64, SByte, Single,
};

const N: usize = PrimitiveKind::COUNT;

const EDGES: &[(PrimitiveKind, PrimitiveKind)] = &[
    (Byte, Int16),
    (Byte, Int32),
    (Byte, Int64),
    (SByte, Int16),
    (SByte, Int32),
    (SByte, Int64),
    (Int16, Int32),
    (Int16, Int64),
    (Int32, Int64),
    (Single, Double),
    (GeographyPoint, Geography),
    (GeographyLineString, Geography),
    (GeographyPolygon, Geography),
    (GeographyMultiPoint, Geography),
    (GeographyMultiLineString, Geography),
    (GeographyMultiPolygon, Geography),
    (GeographyCollection, Geography),
    (GeometryPoint, Geometry),
    (GeometryLineString, Geometry),
    (GeometryPolygon, Geometry),
    (GeometryMultiPoint, Geometry),
    (GeometryMultiLineString, Geometry),
    (GeometryMultiPolygon, Geometry),
    (GeometryCollection, Geometry),
];

const fn build_table() -> [[bool; N]; N] {
    let mut table = [[false; N]; N];
    let mut i = 0;
    while i < N {
        table[i][i] = true;
        i += 1;
    }
    let mut e = 0;
    while e < EDGES.len() {
        let (from, to) = EDGES[e];
        table[from as usize][to as usize] = true;
        e += 1;
    }
    table
}

/// Dense `from × to` matrix, computed at compile time.
static PROMOTIONS: [[bool; N]; N] = build_table();

/// Whether a value of kind `from` may be used where `to` is expected.
#[inline]
pub fn promotes_to(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    PROMOTIONS[from.ordinal()][to.ordinal()]
}
