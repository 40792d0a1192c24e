use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::catalog::{QuestionCatalog, QuestionDefinition};
use super::domain::{
    Answers, ChatEvent, EventId, MessageId, QuestionnairePhase, Session, SessionProgress, UserId,
};
use super::gateway::{ChatGateway, GatewayError};
use super::matching::{EligibilityMatcher, MatchReport, RuleSource};
use super::presentation::{received_notice, render_report, SEARCHING_MESSAGE, WELCOME_MESSAGE};
use super::store::{SessionStore, SessionStoreError};
use super::validation::{AnswerGuard, ValidationError};

/// Result of processing one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// No session, a command, or an event the current question does not take.
    Ignored,
    Welcomed,
    /// The question at `cursor` was sent.
    Prompted { cursor: usize },
    /// The answer was rejected and the question at `cursor` was sent again.
    Reprompted {
        cursor: usize,
        reason: ValidationError,
    },
    /// The last answer was accepted, matching ran and the session is gone.
    Completed(MatchReport),
}

/// Error raised by the questionnaire engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

/// State machine driving each user through the catalog and into the matcher.
///
/// Events for one user must not be processed concurrently; [`super::EventDispatcher`] provides
/// that ordering. Outbound chat failures are logged and never undo a transition.
pub struct QuestionnaireEngine<S, G, R> {
    catalog: Arc<QuestionCatalog>,
    sessions: Arc<S>,
    gateway: Arc<G>,
    matcher: EligibilityMatcher<R>,
    guard: AnswerGuard,
}

impl<S, G, R> QuestionnaireEngine<S, G, R>
where
    S: SessionStore + 'static,
    G: ChatGateway + 'static,
    R: RuleSource + 'static,
{
    pub fn new(
        catalog: Arc<QuestionCatalog>,
        sessions: Arc<S>,
        gateway: Arc<G>,
        matcher: EligibilityMatcher<R>,
    ) -> Self {
        Self {
            catalog,
            sessions,
            gateway,
            matcher,
            guard: AnswerGuard,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub async fn handle(&self, event: ChatEvent) -> Result<EventOutcome, EngineError> {
        match event {
            ChatEvent::Start { user_id } => Ok(self.start(&user_id)),
            ChatEvent::BeginQuestionnaire { user_id } => self.begin(&user_id),
            ChatEvent::ChoiceSelected {
                user_id,
                event_id,
                message_id,
                value,
            } => {
                self.choice_selected(&user_id, &event_id, message_id.as_ref(), &value)
                    .await
            }
            ChatEvent::TextMessage { user_id, text } => self.text_message(&user_id, &text).await,
        }
    }

    /// Greet the user. Sessions are left untouched.
    pub fn start(&self, user: &UserId) -> EventOutcome {
        self.deliver(user, "welcome", self.gateway.send_text(user, WELCOME_MESSAGE));
        EventOutcome::Welcomed
    }

    /// Start a fresh questionnaire, discarding any unfinished one.
    pub fn begin(&self, user: &UserId) -> Result<EventOutcome, EngineError> {
        match self.sessions.replace(user, Session::new(Utc::now()))? {
            Some(previous) => info!(
                user_id = %user,
                discarded_answers = previous.answers().len(),
                "questionnaire restarted"
            ),
            None => info!(user_id = %user, "questionnaire started"),
        }

        self.prompt(user, 0);
        Ok(EventOutcome::Prompted { cursor: 0 })
    }

    /// Button press. Acknowledged in every case so the client stops waiting.
    pub async fn choice_selected(
        &self,
        user: &UserId,
        event: &EventId,
        message: Option<&MessageId>,
        value: &str,
    ) -> Result<EventOutcome, EngineError> {
        let Some(session) = self.sessions.fetch(user)? else {
            self.deliver(user, "acknowledge", self.gateway.acknowledge(event, None));
            return Ok(EventOutcome::Ignored);
        };

        let takes_choice = self
            .catalog
            .get(session.cursor())
            .map_or(false, |question| !question.is_free_text());
        if !takes_choice {
            debug!(user_id = %user, cursor = session.cursor(), "choice ignored for typed question");
            self.deliver(user, "acknowledge", self.gateway.acknowledge(event, None));
            return Ok(EventOutcome::Ignored);
        }

        let notice = received_notice(value);
        self.deliver(
            user,
            "acknowledge",
            self.gateway.acknowledge(event, Some(&notice)),
        );
        if let Some(message) = message {
            self.deliver(user, "retract", self.gateway.retract_message(user, message));
        }

        self.capture(user, session, value, false).await
    }

    /// Typed message. Only captured while the current question is free text.
    pub async fn text_message(
        &self,
        user: &UserId,
        text: &str,
    ) -> Result<EventOutcome, EngineError> {
        if text.trim_start().starts_with('/') {
            return Ok(EventOutcome::Ignored);
        }

        let Some(session) = self.sessions.fetch(user)? else {
            return Ok(EventOutcome::Ignored);
        };

        let takes_text = self
            .catalog
            .get(session.cursor())
            .map_or(false, QuestionDefinition::is_free_text);
        if !takes_text {
            return Ok(EventOutcome::Ignored);
        }

        self.capture(user, session, text, true).await
    }

    async fn capture(
        &self,
        user: &UserId,
        mut session: Session,
        raw: &str,
        echo: bool,
    ) -> Result<EventOutcome, EngineError> {
        let cursor = session.cursor();
        let Some(question) = self.catalog.get(cursor) else {
            return Ok(EventOutcome::Ignored);
        };

        let value = match self.guard.parse(question, raw) {
            Ok(value) => value,
            Err(reason) => {
                debug!(user_id = %user, question = %question.key, %reason, "answer rejected");
                self.deliver(
                    user,
                    "guidance",
                    self.gateway.send_text(user, reason.guidance()),
                );
                self.prompt(user, cursor);
                return Ok(EventOutcome::Reprompted { cursor, reason });
            }
        };

        if echo {
            self.deliver(
                user,
                "echo",
                self.gateway.send_text(user, &received_notice(raw.trim())),
            );
        }

        session.record(&question.key, value, Utc::now());
        let next = session.cursor();
        debug!(user_id = %user, question = %question.key, cursor = next, "answer recorded");

        if next < self.catalog.len() {
            match self.sessions.update(user, session) {
                Ok(()) => {}
                Err(SessionStoreError::NotFound) => {
                    info!(
                        user_id = %user,
                        question = %question.key,
                        "session expired before answer was stored"
                    );
                    return Ok(EventOutcome::Ignored);
                }
                Err(err) => return Err(err.into()),
            }
            self.prompt(user, next);
            return Ok(EventOutcome::Prompted { cursor: next });
        }

        // Released before the lookup so no lookup outcome can leave it behind.
        self.sessions.remove(user)?;
        let report = self.complete(user, session.into_answers()).await;
        Ok(EventOutcome::Completed(report))
    }

    async fn complete(&self, user: &UserId, answers: Answers) -> MatchReport {
        debug!(
            user_id = %user,
            phase = QuestionnairePhase::AwaitingCompletion.label(),
            answers = answers.len(),
            "running eligibility match"
        );
        self.deliver(
            user,
            "searching",
            self.gateway.send_text(user, SEARCHING_MESSAGE),
        );

        let result = self.matcher.find_matches(&answers).await;
        if let Err(err) = &result {
            if err.is_retryable() {
                warn!(user_id = %user, error = %err, "eligibility lookup failed");
            }
        }

        let report = MatchReport::from_result(result);
        self.deliver(
            user,
            "results",
            self.gateway.send_text(user, &render_report(&report)),
        );
        info!(
            user_id = %user,
            outcome = report.label(),
            phase = QuestionnairePhase::Terminated.label(),
            "questionnaire finished"
        );
        report
    }

    pub fn phase(&self, user: &UserId) -> Result<QuestionnairePhase, EngineError> {
        Ok(self
            .sessions
            .fetch(user)?
            .map_or(QuestionnairePhase::NotStarted, |session| {
                session.phase(self.catalog.len())
            }))
    }

    pub fn progress(&self, user: &UserId) -> Result<Option<SessionProgress>, EngineError> {
        let Some(session) = self.sessions.fetch(user)? else {
            return Ok(None);
        };

        let total = self.catalog.len();
        Ok(Some(SessionProgress {
            user_id: user.clone(),
            phase: session.phase(total).label(),
            cursor: session.cursor(),
            total,
            answered: session.answers().keys().cloned().collect(),
            started_at: session.started_at(),
            last_activity: session.last_activity(),
            next_question: self
                .catalog
                .get(session.cursor())
                .map(|question| question.key.clone()),
        }))
    }

    /// Drop sessions with no activity for `idle_ttl`.
    pub fn evict_idle(&self, idle_ttl: Duration) -> Result<Vec<UserId>, EngineError> {
        let ttl = chrono::Duration::from_std(idle_ttl)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
            return Ok(Vec::new());
        };

        let evicted = self.sessions.evict_idle(cutoff)?;
        if !evicted.is_empty() {
            info!(count = evicted.len(), "evicted idle questionnaire sessions");
        }
        Ok(evicted)
    }

    fn prompt(&self, user: &UserId, cursor: usize) {
        if let Some(question) = self.catalog.get(cursor) {
            self.deliver(
                user,
                "prompt",
                self.gateway
                    .send_prompt(user, &question.prompt, question.layout()),
            );
        }
    }

    fn deliver(&self, user: &UserId, action: &'static str, result: Result<(), GatewayError>) {
        if let Err(err) = result {
            warn!(user_id = %user, action, error = %err, "chat delivery failed");
        }
    }
}
