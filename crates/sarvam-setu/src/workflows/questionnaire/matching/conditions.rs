use serde::Serialize;

use super::super::domain::{AnswerValue, Answers};
use crate::workflows::schemes::{EligibilityRule, ALL_STATES};

/// Answer keys that map onto eligibility fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EligibilityField {
    State,
    Area,
    Category,
    Gender,
    Occupation,
    Disability,
    Age,
}

impl EligibilityField {
    pub(crate) fn from_key(key: &str) -> Option<Self> {
        match key {
            "state" => Some(Self::State),
            "area" => Some(Self::Area),
            "category" => Some(Self::Category),
            "gender" => Some(Self::Gender),
            "occupation" => Some(Self::Occupation),
            "disability" => Some(Self::Disability),
            "age" => Some(Self::Age),
            _ => None,
        }
    }
}

/// One per-dimension condition of the disjunctive query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum MatchClause {
    /// Rule state equals the answer or is the national sentinel. The eligibility state wins over
    /// the record's top-level state when both are set.
    State(String),
    Area(String),
    /// Answer is one of the rule's categories.
    Category(String),
    Gender(String),
    /// Answer is one of the rule's occupations.
    Occupation(String),
    /// Rule targets persons with disability.
    Disability,
    /// Age lies inside the rule's declared window.
    Age(f64),
}

impl MatchClause {
    pub fn matches(&self, rule: &EligibilityRule) -> bool {
        let criteria = &rule.eligibility;
        match self {
            MatchClause::State(state) => matches!(
                criteria.state.as_deref().or(rule.state.as_deref()),
                Some(value) if value == state || value == ALL_STATES
            ),
            MatchClause::Area(area) => criteria.area.as_deref() == Some(area.as_str()),
            MatchClause::Category(category) => criteria.category.iter().any(|c| c == category),
            MatchClause::Gender(gender) => criteria.gender.as_deref() == Some(gender.as_str()),
            MatchClause::Occupation(occupation) => {
                criteria.occupation.iter().any(|o| o == occupation)
            }
            MatchClause::Disability => criteria.disability == Some(true),
            MatchClause::Age(age) => {
                // A rule with no window at all is not selected through the age clause.
                criteria.has_age_bounds()
                    && criteria.age_min.map_or(true, |min| *age >= f64::from(min))
                    && criteria.age_max.map_or(true, |max| *age <= f64::from(max))
            }
        }
    }
}

/// OR-combination of clauses plus the result cap handed to the rule source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleQuery {
    clauses: Vec<MatchClause>,
    limit: usize,
}

impl RuleQuery {
    pub(crate) fn new(clauses: Vec<MatchClause>, limit: usize) -> Self {
        Self { clauses, limit }
    }

    pub fn clauses(&self) -> &[MatchClause] {
        &self.clauses
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// A rule matches when any clause holds.
    pub fn matches(&self, rule: &EligibilityRule) -> bool {
        self.clauses.iter().any(|clause| clause.matches(rule))
    }
}

pub(crate) fn build_clauses(answers: &Answers) -> Vec<MatchClause> {
    answers
        .iter()
        .filter_map(|(key, value)| {
            let field = EligibilityField::from_key(key)?;
            clause_for(field, value)
        })
        .collect()
}

fn clause_for(field: EligibilityField, value: &AnswerValue) -> Option<MatchClause> {
    match (field, value) {
        (EligibilityField::Disability, AnswerValue::Boolean(true)) => Some(MatchClause::Disability),
        (EligibilityField::Disability, _) => None,
        (EligibilityField::Age, AnswerValue::Number(age)) => Some(MatchClause::Age(*age)),
        (EligibilityField::Age, _) => None,
        (field, AnswerValue::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            let text = text.to_string();
            Some(match field {
                EligibilityField::State => MatchClause::State(text),
                EligibilityField::Area => MatchClause::Area(text),
                EligibilityField::Category => MatchClause::Category(text),
                EligibilityField::Gender => MatchClause::Gender(text),
                EligibilityField::Occupation => MatchClause::Occupation(text),
                EligibilityField::Disability | EligibilityField::Age => return None,
            })
        }
        (_, AnswerValue::Number(_) | AnswerValue::Boolean(_)) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::schemes::Eligibility;

    fn rule(eligibility: Eligibility) -> EligibilityRule {
        EligibilityRule {
            scheme_name: "Test scheme".to_string(),
            eligibility,
            ..EligibilityRule::default()
        }
    }

    fn text(value: &str) -> AnswerValue {
        AnswerValue::Text(value.to_string())
    }

    #[test]
    fn national_rules_match_any_state() {
        let national = rule(Eligibility {
            state: Some("All".to_string()),
            ..Eligibility::default()
        });
        let karnataka = rule(Eligibility {
            state: Some("Karnataka".to_string()),
            ..Eligibility::default()
        });

        let from_bengal = MatchClause::State("West Bengal".to_string());
        let from_karnataka = MatchClause::State("Karnataka".to_string());

        assert!(from_bengal.matches(&national));
        assert!(from_karnataka.matches(&national));
        assert!(from_karnataka.matches(&karnataka));
        assert!(!from_bengal.matches(&karnataka));
    }

    #[test]
    fn top_level_state_applies_when_criteria_omit_it() {
        let national = EligibilityRule {
            state: Some("All".to_string()),
            ..rule(Eligibility::default())
        };
        let bengal = EligibilityRule {
            state: Some("West Bengal".to_string()),
            ..rule(Eligibility::default())
        };
        let narrowed = EligibilityRule {
            state: Some("All".to_string()),
            ..rule(Eligibility {
                state: Some("Maharashtra".to_string()),
                ..Eligibility::default()
            })
        };

        let from_karnataka = MatchClause::State("Karnataka".to_string());

        assert!(from_karnataka.matches(&national));
        assert!(!from_karnataka.matches(&bengal));
        assert!(MatchClause::State("West Bengal".to_string()).matches(&bengal));
        assert!(!from_karnataka.matches(&narrowed));
    }

    #[test]
    fn age_window_is_inclusive() {
        let adults = rule(Eligibility {
            age_min: Some(18),
            age_max: Some(60),
            ..Eligibility::default()
        });

        assert!(MatchClause::Age(18.0).matches(&adults));
        assert!(MatchClause::Age(60.0).matches(&adults));
        assert!(!MatchClause::Age(17.0).matches(&adults));
        assert!(!MatchClause::Age(61.0).matches(&adults));
    }

    #[test]
    fn open_ended_age_window() {
        let adults = rule(Eligibility {
            age_min: Some(18),
            ..Eligibility::default()
        });
        let unbounded = rule(Eligibility::default());

        assert!(MatchClause::Age(200.0).matches(&adults));
        assert!(!MatchClause::Age(25.0).matches(&unbounded));
    }

    #[test]
    fn absent_fields_do_not_satisfy_clauses() {
        let bare = rule(Eligibility::default());

        assert!(!MatchClause::Area("Urban".to_string()).matches(&bare));
        assert!(!MatchClause::Category("OBC".to_string()).matches(&bare));
        assert!(!MatchClause::Disability.matches(&bare));
    }

    #[test]
    fn set_membership_for_category_and_occupation() {
        let farmers = rule(Eligibility {
            category: vec!["SC".to_string(), "ST".to_string()],
            occupation: vec!["Farmer".to_string()],
            ..Eligibility::default()
        });

        assert!(MatchClause::Category("ST".to_string()).matches(&farmers));
        assert!(MatchClause::Occupation("Farmer".to_string()).matches(&farmers));
        assert!(!MatchClause::Occupation("Student".to_string()).matches(&farmers));
    }

    #[test]
    fn builds_one_clause_per_collected_dimension() {
        let mut answers = Answers::new();
        answers.insert("state".to_string(), text("Karnataka"));
        answers.insert("area".to_string(), text("Urban"));
        answers.insert("age".to_string(), AnswerValue::Number(25.0));
        answers.insert("disability".to_string(), AnswerValue::Boolean(false));
        answers.insert("nickname".to_string(), text("Ravi"));

        let clauses = build_clauses(&answers);

        assert_eq!(
            clauses,
            vec![
                MatchClause::Age(25.0),
                MatchClause::Area("Urban".to_string()),
                MatchClause::State("Karnataka".to_string()),
            ]
        );
    }

    #[test]
    fn affirmative_disability_adds_clause() {
        let mut answers = Answers::new();
        answers.insert("disability".to_string(), AnswerValue::Boolean(true));

        assert_eq!(build_clauses(&answers), vec![MatchClause::Disability]);
    }

    #[test]
    fn mistyped_answers_are_skipped() {
        let mut answers = Answers::new();
        answers.insert("age".to_string(), text("twenty"));
        answers.insert("state".to_string(), AnswerValue::Number(3.0));
        answers.insert("gender".to_string(), text("  "));

        assert!(build_clauses(&answers).is_empty());
    }
}
