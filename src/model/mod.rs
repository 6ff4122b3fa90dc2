//! Defines the read-only model graph consumed by the validator.
pub mod element;
mod equivalence;
pub mod expression;
pub mod registry;
pub mod topology;
pub mod types;
pub mod version;

// Re-export key types for convenient access
pub use element::*;
pub use expression::{ConstantValue, ExprId, Expression, FunctionRef, PropertyConstructor};
pub use registry::EdmModel;
pub use types::{BadType, BadTypeReason, Facets, Multiplicity, PrimitiveKind, TypeDef, TypeKind, TypeRef};
pub use version::EdmVersion;
