use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use sarvam_setu::workflows::questionnaire::{
    ChatGateway, ChoiceLayout, EligibilityMatcher, EventId, GatewayError, InMemorySessionStore,
    MatcherConfig, MessageId, OutboundAction, QuestionCatalog, QuestionnaireEngine, RuleQuery,
    RuleSource, RuleSourceError, UserId,
};
use sarvam_setu::workflows::schemes::{EligibilityRule, SchemeCatalogError, SchemeCatalogImporter};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Sample catalog used when no `RULES_PATH` is configured.
const BUNDLED_RULES: &str = include_str!("../data/schemes.json");

pub(crate) type ServiceEngine =
    QuestionnaireEngine<InMemorySessionStore, OutboxGateway, InMemoryRuleSource>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Rule source over a catalog held in memory, evaluated in catalog order.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryRuleSource {
    rules: Arc<Vec<EligibilityRule>>,
}

impl InMemoryRuleSource {
    pub(crate) fn new(rules: Vec<EligibilityRule>) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }
}

#[async_trait]
impl RuleSource for InMemoryRuleSource {
    async fn find_rules(&self, query: &RuleQuery) -> Result<Vec<EligibilityRule>, RuleSourceError> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| query.matches(rule))
            .take(query.limit())
            .cloned()
            .collect())
    }
}

/// Most actions kept per user; older ones are dropped first.
pub(crate) const OUTBOX_CAPACITY: usize = 100;

#[derive(Debug)]
struct UserOutbox {
    actions: VecDeque<OutboundAction>,
    touched: Instant,
}

/// Queues outbound actions per user until a client polls the outbox.
///
/// Each queue is bounded by [`OUTBOX_CAPACITY`] and dropped by [`OutboxGateway::evict_idle`]
/// once nothing has been queued for the idle window.
#[derive(Debug, Default)]
pub(crate) struct OutboxGateway {
    queues: Mutex<HashMap<UserId, UserOutbox>>,
}

impl OutboxGateway {
    fn queues(&self) -> Result<MutexGuard<'_, HashMap<UserId, UserOutbox>>, GatewayError> {
        self.queues
            .lock()
            .map_err(|_| GatewayError::Transport("outbox lock poisoned".to_string()))
    }

    fn enqueue(&self, user: &UserId, action: OutboundAction) -> Result<(), GatewayError> {
        debug!(user_id = %user, text = action.text().unwrap_or_default(), "outbound action queued");
        let mut queues = self.queues()?;
        let outbox = queues.entry(user.clone()).or_insert_with(|| UserOutbox {
            actions: VecDeque::new(),
            touched: Instant::now(),
        });
        if outbox.actions.len() >= OUTBOX_CAPACITY {
            outbox.actions.pop_front();
            warn!(user_id = %user, capacity = OUTBOX_CAPACITY, "outbox full; oldest action dropped");
        }
        outbox.actions.push_back(action);
        outbox.touched = Instant::now();
        Ok(())
    }

    /// Remove and return everything queued for `user`, oldest first.
    pub(crate) fn drain(&self, user: &UserId) -> Result<Vec<OutboundAction>, GatewayError> {
        Ok(self
            .queues()?
            .remove(user)
            .map(|outbox| outbox.actions.into())
            .unwrap_or_default())
    }

    /// Drop queues nobody has added to for `idle_ttl`. Returns how many were dropped.
    pub(crate) fn evict_idle(&self, idle_ttl: Duration) -> Result<usize, GatewayError> {
        let mut queues = self.queues()?;
        let before = queues.len();
        queues.retain(|_, outbox| outbox.touched.elapsed() < idle_ttl);
        Ok(before - queues.len())
    }

    #[cfg(test)]
    fn pending_users(&self) -> usize {
        self.queues().map(|queues| queues.len()).unwrap_or(0)
    }
}

impl ChatGateway for OutboxGateway {
    fn send_prompt(
        &self,
        user: &UserId,
        text: &str,
        layout: Option<&ChoiceLayout>,
    ) -> Result<(), GatewayError> {
        self.enqueue(
            user,
            OutboundAction::Prompt {
                user_id: user.clone(),
                text: text.to_string(),
                layout: layout.cloned(),
            },
        )
    }

    fn send_text(&self, user: &UserId, text: &str) -> Result<(), GatewayError> {
        self.enqueue(
            user,
            OutboundAction::Text {
                user_id: user.clone(),
                text: text.to_string(),
            },
        )
    }

    fn acknowledge(&self, event: &EventId, notice: Option<&str>) -> Result<(), GatewayError> {
        // Polling clients have no pending callback to settle; the notice is only logged.
        debug!(event_id = %event.0, notice = notice.unwrap_or_default(), "choice acknowledged");
        Ok(())
    }

    fn retract_message(&self, user: &UserId, message: &MessageId) -> Result<(), GatewayError> {
        self.enqueue(
            user,
            OutboundAction::Retract {
                user_id: user.clone(),
                message_id: message.clone(),
            },
        )
    }
}

/// Read the rule catalog from `path`, or the bundled sample when no path is given.
pub(crate) fn load_rules(path: Option<&Path>) -> Result<Vec<EligibilityRule>, SchemeCatalogError> {
    let rules = match path {
        Some(path) => {
            info!(path = %path.display(), "loading rule catalog");
            SchemeCatalogImporter::from_path(path)?
        }
        None => {
            info!("RULES_PATH not set; using bundled sample catalog");
            SchemeCatalogImporter::from_json(BUNDLED_RULES)?
        }
    };
    Ok(rules)
}

pub(crate) fn build_engine(
    rules: Vec<EligibilityRule>,
    matcher: MatcherConfig,
    outbox: Arc<OutboxGateway>,
) -> Arc<ServiceEngine> {
    let source = Arc::new(InMemoryRuleSource::new(rules));
    Arc::new(QuestionnaireEngine::new(
        Arc::new(QuestionCatalog::standard()),
        Arc::new(InMemorySessionStore::default()),
        outbox,
        EligibilityMatcher::new(source, matcher),
    ))
}
