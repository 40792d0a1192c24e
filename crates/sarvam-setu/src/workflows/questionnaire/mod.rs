//! Eligibility questionnaire: question catalog, per-user session state machine and the
//! eligibility matcher that runs once every question has been answered.

pub mod catalog;
mod dispatcher;
pub mod domain;
mod engine;
pub mod gateway;
pub mod matching;
pub mod presentation;
pub mod router;
pub mod store;
pub(crate) mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{
    AnswerFormat, CatalogError, ChoiceLayout, ChoiceOption, QuestionCatalog, QuestionDefinition,
    QuestionKind,
};
pub use dispatcher::{EventDispatcher, DEFAULT_MAILBOX_IDLE};
pub use domain::{
    AnswerValue, Answers, ChatEvent, EventId, MessageId, QuestionnairePhase, Session,
    SessionProgress, UserId,
};
pub use engine::{EngineError, EventOutcome, QuestionnaireEngine};
pub use gateway::{ChatGateway, GatewayError, OutboundAction};
pub use matching::{
    EligibilityMatcher, MatchClause, MatchError, MatchReport, MatcherConfig, RuleQuery,
    RuleSource, RuleSourceError,
};
pub use router::chat_router;
pub use store::{InMemorySessionStore, SessionStore, SessionStoreError};
pub use validation::{AnswerGuard, ValidationError};
