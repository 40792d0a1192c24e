mod record;

pub use record::{Eligibility, EligibilityRule, ALL_STATES};

use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum SchemeCatalogError {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidRule { index: usize, reason: String },
}

impl std::fmt::Display for SchemeCatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemeCatalogError::Io(err) => write!(f, "failed to read scheme catalog: {}", err),
            SchemeCatalogError::Json(err) => write!(f, "invalid scheme catalog JSON: {}", err),
            SchemeCatalogError::InvalidRule { index, reason } => {
                write!(f, "scheme #{} is invalid: {}", index, reason)
            }
        }
    }
}

impl std::error::Error for SchemeCatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchemeCatalogError::Io(err) => Some(err),
            SchemeCatalogError::Json(err) => Some(err),
            SchemeCatalogError::InvalidRule { .. } => None,
        }
    }
}

impl From<std::io::Error> for SchemeCatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SchemeCatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Reads scheme records from the JSON array format produced for seeding the rule store.
pub struct SchemeCatalogImporter;

impl SchemeCatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<EligibilityRule>, SchemeCatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<EligibilityRule>, SchemeCatalogError> {
        let rules: Vec<EligibilityRule> = serde_json::from_reader(reader)?;
        validate(&rules)?;
        Ok(rules)
    }

    pub fn from_json(raw: &str) -> Result<Vec<EligibilityRule>, SchemeCatalogError> {
        let rules: Vec<EligibilityRule> = serde_json::from_str(raw)?;
        validate(&rules)?;
        Ok(rules)
    }
}

fn validate(rules: &[EligibilityRule]) -> Result<(), SchemeCatalogError> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.scheme_name.trim().is_empty() {
            return Err(SchemeCatalogError::InvalidRule {
                index,
                reason: "schemeName is empty".to_string(),
            });
        }

        if let (Some(min), Some(max)) = (rule.eligibility.age_min, rule.eligibility.age_max) {
            if min > max {
                return Err(SchemeCatalogError::InvalidRule {
                    index,
                    reason: format!("age_min {min} exceeds age_max {max}"),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn imports_rules_from_reader() {
        let raw = r#"[
            {"schemeName": "Atal Pension Yojana", "eligibility": {"state": "All", "age_min": 18, "age_max": 40}},
            {"schemeName": "Karnataka Gruha Jyothi", "eligibility": {"state": "Karnataka"}}
        ]"#;

        let rules = SchemeCatalogImporter::from_reader(Cursor::new(raw)).expect("catalog imports");

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].eligibility.age_max, Some(40));
        assert_eq!(rules[1].eligibility.state.as_deref(), Some("Karnataka"));
    }

    #[test]
    fn rejects_inverted_age_window() {
        let raw = r#"[{"schemeName": "Broken", "eligibility": {"age_min": 60, "age_max": 18}}]"#;

        match SchemeCatalogImporter::from_json(raw) {
            Err(SchemeCatalogError::InvalidRule { index, reason }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("age_min"));
            }
            other => panic!("expected invalid rule, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unnamed_scheme() {
        let raw = r#"[{"schemeName": "  "}]"#;

        assert!(matches!(
            SchemeCatalogImporter::from_json(raw),
            Err(SchemeCatalogError::InvalidRule { index: 0, .. })
        ));
    }

    #[test]
    fn surfaces_json_errors() {
        let err = SchemeCatalogImporter::from_json("{not json").expect_err("invalid json");
        assert!(matches!(err, SchemeCatalogError::Json(_)));
        assert!(err.to_string().contains("invalid scheme catalog JSON"));
    }
}
