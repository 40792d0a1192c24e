mod conditions;
mod config;

pub use conditions::{MatchClause, RuleQuery};
pub use config::MatcherConfig;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::domain::Answers;
use crate::workflows::schemes::EligibilityRule;

/// Read-only rule store. Implementations must honor every clause kind and the query limit.
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn find_rules(&self, query: &RuleQuery) -> Result<Vec<EligibilityRule>, RuleSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RuleSourceError {
    #[error("rule source unavailable: {0}")]
    Unavailable(String),
    #[error("rule query rejected: {0}")]
    Query(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("no answer can be turned into an eligibility condition")]
    InsufficientInput,
    #[error(transparent)]
    Source(#[from] RuleSourceError),
    #[error("rule lookup timed out after {0:?}")]
    TimedOut(Duration),
}

impl MatchError {
    /// Collaborator failures may succeed when the user starts over; missing input will not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, MatchError::InsufficientInput)
    }
}

/// Terminal outcome of a completed questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum MatchReport {
    Matches(Vec<EligibilityRule>),
    NoMatch,
    InsufficientInput,
    Unavailable(String),
}

impl MatchReport {
    pub fn from_result(result: Result<Vec<EligibilityRule>, MatchError>) -> Self {
        match result {
            Ok(rules) if rules.is_empty() => MatchReport::NoMatch,
            Ok(rules) => MatchReport::Matches(rules),
            Err(MatchError::InsufficientInput) => MatchReport::InsufficientInput,
            Err(err) => MatchReport::Unavailable(err.to_string()),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            MatchReport::Matches(_) => "matches",
            MatchReport::NoMatch => "no_match",
            MatchReport::InsufficientInput => "insufficient_input",
            MatchReport::Unavailable(_) => "unavailable",
        }
    }
}

/// Turns a completed answer set into a bounded, capped rule lookup.
///
/// Clauses are OR-ed: a scheme is suggested when any answered dimension fits it. Ordering among
/// matches is whatever order the rule source returns them in.
pub struct EligibilityMatcher<R> {
    source: Arc<R>,
    config: MatcherConfig,
}

impl<R> EligibilityMatcher<R>
where
    R: RuleSource + 'static,
{
    pub fn new(source: Arc<R>, config: MatcherConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn build_query(&self, answers: &Answers) -> Result<RuleQuery, MatchError> {
        let clauses = conditions::build_clauses(answers);
        if clauses.is_empty() {
            return Err(MatchError::InsufficientInput);
        }

        Ok(RuleQuery::new(clauses, self.config.result_limit))
    }

    pub async fn find_matches(&self, answers: &Answers) -> Result<Vec<EligibilityRule>, MatchError> {
        let query = self.build_query(answers)?;
        debug!(clauses = query.clauses().len(), limit = query.limit(), "querying rule source");

        let lookup = self.source.find_rules(&query);
        let mut rules = tokio::time::timeout(self.config.query_timeout, lookup)
            .await
            .map_err(|_| MatchError::TimedOut(self.config.query_timeout))??;

        rules.truncate(self.config.result_limit);
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_classify_results() {
        assert_eq!(MatchReport::from_result(Ok(Vec::new())), MatchReport::NoMatch);
        assert_eq!(
            MatchReport::from_result(Err(MatchError::InsufficientInput)),
            MatchReport::InsufficientInput
        );
        let timed_out = MatchReport::from_result(Err(MatchError::TimedOut(Duration::from_secs(5))));
        assert_eq!(timed_out.label(), "unavailable");
    }

    #[test]
    fn only_collaborator_failures_are_retryable() {
        assert!(!MatchError::InsufficientInput.is_retryable());
        assert!(MatchError::TimedOut(Duration::from_millis(10)).is_retryable());
        assert!(MatchError::from(RuleSourceError::Unavailable("down".to_string())).is_retryable());
    }
}
