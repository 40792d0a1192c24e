use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel stored in `eligibility.state` for schemes available in every state.
pub const ALL_STATES: &str = "All";

/// Scheme record as stored by the rule source. This crate only reads these records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRule {
    pub scheme_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ministry: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub scheme_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub eligibility: Eligibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_link: Option<String>,
}

impl EligibilityRule {
    pub fn name(&self) -> &str {
        &self.scheme_name
    }

    pub fn link(&self) -> Option<&str> {
        self.application_link.as_deref()
    }
}

/// Flat eligibility criteria. A missing field never restricts a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub category: Vec<String>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub occupation: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disability: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Eligibility {
    pub fn has_age_bounds(&self) -> bool {
        self.age_min.is_some() || self.age_max.is_some()
    }
}

// Seed files store single-valued lists as plain strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Missing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
        OneOrMany::Missing(()) => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_seed_shape() {
        let rule: EligibilityRule = serde_json::from_value(json!({
            "schemeName": "PM Awas Yojana (Urban)",
            "description": "Housing for all in urban areas.",
            "type": "Central",
            "eligibility": {
                "state": "All",
                "category": "EWS",
                "area": "Urban",
                "age_min": 18
            },
            "applicationLink": "https://pmaymis.gov.in"
        }))
        .expect("rule parses");

        assert_eq!(rule.name(), "PM Awas Yojana (Urban)");
        assert_eq!(rule.scheme_type.as_deref(), Some("Central"));
        assert_eq!(rule.eligibility.category, vec!["EWS".to_string()]);
        assert_eq!(rule.eligibility.age_min, Some(18));
        assert!(rule.eligibility.occupation.is_empty());
        assert!(rule.eligibility.has_age_bounds());
        assert_eq!(rule.link(), Some("https://pmaymis.gov.in"));
    }

    #[test]
    fn null_lists_are_empty() {
        let rule: EligibilityRule = serde_json::from_value(json!({
            "schemeName": "Stand-Up India",
            "eligibility": { "occupation": null, "gender": "Female" }
        }))
        .expect("rule parses");

        assert!(rule.eligibility.occupation.is_empty());
        assert_eq!(rule.eligibility.gender.as_deref(), Some("Female"));
        assert!(!rule.eligibility.has_age_bounds());
    }
}
