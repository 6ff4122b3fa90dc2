//! EDM schema versions.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdmVersion {
    #[serde(rename = "1.0")]
    V1,
    #[serde(rename = "1.1")]
    V1_1,
    #[serde(rename = "1.2")]
    V1_2,
    #[serde(rename = "2.0")]
    V2,
    #[serde(rename = "3.0")]
    V3,
}

impl EdmVersion {
    pub const LATEST: EdmVersion = EdmVersion::V3;

    pub const ALL: [EdmVersion; 5] =
        [EdmVersion::V1, EdmVersion::V1_1, EdmVersion::V1_2, EdmVersion::V2, EdmVersion::V3];

    pub fn as_str(self) -> &'static str {
        match self {
            EdmVersion::V1 => "1.0",
            EdmVersion::V1_1 => "1.1",
            EdmVersion::V1_2 => "1.2",
            EdmVersion::V2 => "2.0",
            EdmVersion::V3 => "3.0",
        }
    }
}

impl Default for EdmVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for EdmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdmVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdmVersion::ALL
            .into_iter()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownVersion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0", EdmVersion::V1)]
    #[case("1.2", EdmVersion::V1_2)]
    #[case(" 3.0 ", EdmVersion::V3)]
    fn test_parse_known_versions(#[case] input: &str, #[case] expected: EdmVersion) {
        assert_eq!(input.parse::<EdmVersion>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let err = "4.0".parse::<EdmVersion>().unwrap_err();
        assert!(err.to_string().contains("4.0"));
    }

    #[test]
    fn test_versions_are_ordered() {
        assert!(EdmVersion::V1 < EdmVersion::V1_1);
        assert!(EdmVersion::V2 < EdmVersion::LATEST);
    }
}
