use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::workflows::questionnaire::catalog::{ChoiceLayout, QuestionCatalog};
use crate::workflows::questionnaire::domain::{EventId, MessageId, UserId};
use crate::workflows::questionnaire::gateway::{ChatGateway, GatewayError, OutboundAction};
use crate::workflows::questionnaire::matching::{
    EligibilityMatcher, MatcherConfig, RuleQuery, RuleSource, RuleSourceError,
};
use crate::workflows::questionnaire::store::InMemorySessionStore;
use crate::workflows::questionnaire::{EventOutcome, QuestionnaireEngine};
use crate::workflows::schemes::{Eligibility, EligibilityRule};

pub(super) type TestEngine<R> = QuestionnaireEngine<InMemorySessionStore, RecordingGateway, R>;

/// Answers for the standard catalog, in order. Index 5 is the typed age question.
pub(super) const STANDARD_ANSWERS: [&str; 7] = [
    "Karnataka", "Urban", "OBC", "Female", "Farmer", "25", "No",
];
pub(super) const AGE_CURSOR: usize = 5;

#[derive(Default)]
pub(super) struct RecordingGateway {
    actions: Mutex<Vec<OutboundAction>>,
}

impl RecordingGateway {
    pub(super) fn actions(&self) -> Vec<OutboundAction> {
        self.actions.lock().expect("gateway mutex poisoned").clone()
    }

    pub(super) fn texts(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                OutboundAction::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(super) fn prompts(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                OutboundAction::Prompt { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(super) fn clear(&self) {
        self.actions.lock().expect("gateway mutex poisoned").clear();
    }

    fn push(&self, action: OutboundAction) {
        self.actions
            .lock()
            .expect("gateway mutex poisoned")
            .push(action);
    }
}

impl ChatGateway for RecordingGateway {
    fn send_prompt(
        &self,
        user: &UserId,
        text: &str,
        layout: Option<&ChoiceLayout>,
    ) -> Result<(), GatewayError> {
        self.push(OutboundAction::Prompt {
            user_id: user.clone(),
            text: text.to_string(),
            layout: layout.cloned(),
        });
        Ok(())
    }

    fn send_text(&self, user: &UserId, text: &str) -> Result<(), GatewayError> {
        self.push(OutboundAction::Text {
            user_id: user.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn acknowledge(&self, event: &EventId, notice: Option<&str>) -> Result<(), GatewayError> {
        self.push(OutboundAction::Acknowledge {
            event_id: event.clone(),
            notice: notice.map(str::to_string),
        });
        Ok(())
    }

    fn retract_message(&self, user: &UserId, message: &MessageId) -> Result<(), GatewayError> {
        self.push(OutboundAction::Retract {
            user_id: user.clone(),
            message_id: message.clone(),
        });
        Ok(())
    }
}

pub(super) struct OfflineGateway;

impl ChatGateway for OfflineGateway {
    fn send_prompt(
        &self,
        _user: &UserId,
        _text: &str,
        _layout: Option<&ChoiceLayout>,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Transport("offline".to_string()))
    }

    fn send_text(&self, _user: &UserId, _text: &str) -> Result<(), GatewayError> {
        Err(GatewayError::Transport("offline".to_string()))
    }

    fn acknowledge(&self, _event: &EventId, _notice: Option<&str>) -> Result<(), GatewayError> {
        Err(GatewayError::Transport("offline".to_string()))
    }

    fn retract_message(&self, _user: &UserId, _message: &MessageId) -> Result<(), GatewayError> {
        Err(GatewayError::Transport("offline".to_string()))
    }
}

/// Evaluates queries over a fixed rule list in insertion order.
#[derive(Default)]
pub(super) struct MemoryRuleSource {
    pub(super) rules: Vec<EligibilityRule>,
    pub(super) queries: Mutex<Vec<RuleQuery>>,
}

impl MemoryRuleSource {
    pub(super) fn new(rules: Vec<EligibilityRule>) -> Self {
        Self {
            rules,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn queries(&self) -> Vec<RuleQuery> {
        self.queries.lock().expect("query mutex poisoned").clone()
    }
}

#[async_trait]
impl RuleSource for MemoryRuleSource {
    async fn find_rules(&self, query: &RuleQuery) -> Result<Vec<EligibilityRule>, RuleSourceError> {
        self.queries
            .lock()
            .expect("query mutex poisoned")
            .push(query.clone());
        Ok(self
            .rules
            .iter()
            .filter(|rule| query.matches(rule))
            .take(query.limit())
            .cloned()
            .collect())
    }
}

/// Ignores the query and returns every rule, limit included.
pub(super) struct UnfilteredRuleSource(pub(super) Vec<EligibilityRule>);

#[async_trait]
impl RuleSource for UnfilteredRuleSource {
    async fn find_rules(&self, _query: &RuleQuery) -> Result<Vec<EligibilityRule>, RuleSourceError> {
        Ok(self.0.clone())
    }
}

pub(super) struct UnavailableRuleSource;

#[async_trait]
impl RuleSource for UnavailableRuleSource {
    async fn find_rules(&self, _query: &RuleQuery) -> Result<Vec<EligibilityRule>, RuleSourceError> {
        Err(RuleSourceError::Unavailable("connection refused".to_string()))
    }
}

pub(super) struct StalledRuleSource;

#[async_trait]
impl RuleSource for StalledRuleSource {
    async fn find_rules(&self, _query: &RuleQuery) -> Result<Vec<EligibilityRule>, RuleSourceError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

pub(super) fn rule(name: &str, eligibility: Eligibility) -> EligibilityRule {
    EligibilityRule {
        scheme_name: name.to_string(),
        description: format!("{name} description"),
        application_link: Some(format!("https://schemes.example/{}", name.replace(' ', "-"))),
        eligibility,
        ..EligibilityRule::default()
    }
}

pub(super) fn national_youth_rule() -> EligibilityRule {
    rule(
        "National Youth Scheme",
        Eligibility {
            state: Some("All".to_string()),
            age_min: Some(18),
            age_max: Some(35),
            ..Eligibility::default()
        },
    )
}

pub(super) fn maharashtra_rule() -> EligibilityRule {
    rule(
        "Maharashtra Scheme",
        Eligibility {
            state: Some("Maharashtra".to_string()),
            ..Eligibility::default()
        },
    )
}

pub(super) fn matcher_config() -> MatcherConfig {
    MatcherConfig {
        result_limit: 10,
        query_timeout: Duration::from_millis(200),
    }
}

pub(super) fn user(id: &str) -> UserId {
    UserId::from(id)
}

pub(super) fn build_engine<R: RuleSource + 'static>(
    source: Arc<R>,
) -> (
    TestEngine<R>,
    Arc<InMemorySessionStore>,
    Arc<RecordingGateway>,
) {
    let store = Arc::new(InMemorySessionStore::default());
    let gateway = Arc::new(RecordingGateway::default());
    let engine = QuestionnaireEngine::new(
        Arc::new(QuestionCatalog::standard()),
        store.clone(),
        gateway.clone(),
        EligibilityMatcher::new(source, matcher_config()),
    );
    (engine, store, gateway)
}

/// Answer the first `count` standard questions through the matching chat route.
pub(super) async fn answer_standard<R: RuleSource + 'static>(
    engine: &TestEngine<R>,
    user: &UserId,
    count: usize,
) -> EventOutcome {
    let mut outcome = EventOutcome::Ignored;
    for (index, answer) in STANDARD_ANSWERS.iter().take(count).enumerate() {
        outcome = if index == AGE_CURSOR {
            engine.text_message(user, answer).await
        } else {
            let event = EventId(format!("cb-{index}"));
            engine.choice_selected(user, &event, None, answer).await
        }
        .expect("answer accepted");
    }
    outcome
}
