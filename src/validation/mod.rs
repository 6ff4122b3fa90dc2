//! Semantic validation of EDM models.
pub mod context;
pub mod error;
pub mod rule;
pub mod rule_set;
pub mod validator;

pub mod rules {
    pub mod annotations;
    pub mod container;
    pub mod expressions;
    pub mod functions;
    pub mod model;
    pub mod naming;
    pub mod properties;
    pub mod type_refs;
    pub mod types;
}

pub use context::{Owner, ValidationContext};
pub use error::{EdmError, ErrorCategory, ErrorKind};
pub use rule::{Capability, Check, NodeKind, Phase, ValidationRule};
pub use rule_set::RuleSet;
pub use validator::{Diagnostics, Validation};
