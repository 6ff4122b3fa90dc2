//! Caller-facing settings and the eager, serializable form of a validation.
use crate::error::ConfigError;
use crate::model::{EdmModel, EdmVersion};
use crate::validation::{EdmError, RuleSet, Validation};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a model should be validated.
///
/// ```json
/// { "version": "2.0", "max_errors": 100 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSettings {
    /// Overrides the model's own version when set.
    pub version: Option<EdmVersion>,
    /// Stops collecting after this many diagnostics.
    pub max_errors: Option<usize>,
}

impl ValidationSettings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The settings version, else the model's, else the latest.
    pub fn resolve_version(&self, model: &EdmModel) -> EdmVersion {
        self.version.or(model.version()).unwrap_or(EdmVersion::LATEST)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub version: EdmVersion,
    pub is_valid: bool,
    pub errors: Vec<EdmError>,
}

impl ValidationReport {
    pub fn run(model: &EdmModel, settings: &ValidationSettings) -> Self {
        let version = settings.resolve_version(model);
        let validation = Validation::new(model, RuleSet::for_version(version));
        let limit = settings.max_errors.unwrap_or(usize::MAX);
        let errors: Vec<EdmError> = validation.errors().take(limit).collect();
        let is_valid = if limit == 0 { validation.is_valid() } else { errors.is_empty() };
        debug!(%version, is_valid, errors = errors.len(), "validation report built");
        Self { version, is_valid, errors }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization(e.to_string()))
    }
}

/// Validates independent models in parallel. Reports keep the input order.
pub fn validate_batch(models: &[EdmModel], settings: &ValidationSettings) -> Vec<ValidationReport> {
    debug!(models = models.len(), "validating batch");
    models.par_iter().map(|model| ValidationReport::run(model, settings)).collect()
}
