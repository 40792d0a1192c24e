use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Result cap and lookup deadline applied to every eligibility query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherConfig {
    pub result_limit: usize,
    pub query_timeout: Duration,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            result_limit: 10,
            query_timeout: Duration::from_secs(5),
        }
    }
}
