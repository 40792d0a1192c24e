use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat identity owning a questionnaire session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Transport identifier of an inbound callback that must be acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

/// Transport identifier of a message previously sent to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

/// Parsed, authenticated inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Start {
        user_id: UserId,
    },
    BeginQuestionnaire {
        user_id: UserId,
    },
    ChoiceSelected {
        user_id: UserId,
        event_id: EventId,
        #[serde(default)]
        message_id: Option<MessageId>,
        value: String,
    },
    TextMessage {
        user_id: UserId,
        text: String,
    },
}

impl ChatEvent {
    pub fn user_id(&self) -> &UserId {
        match self {
            ChatEvent::Start { user_id }
            | ChatEvent::BeginQuestionnaire { user_id }
            | ChatEvent::ChoiceSelected { user_id, .. }
            | ChatEvent::TextMessage { user_id, .. } => user_id,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            ChatEvent::Start { .. } => "start",
            ChatEvent::BeginQuestionnaire { .. } => "begin_questionnaire",
            ChatEvent::ChoiceSelected { .. } => "choice_selected",
            ChatEvent::TextMessage { .. } => "text_message",
        }
    }
}

/// Captured answer. Serialized untagged so views show plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(value) => Some(value),
            AnswerValue::Number(_) | AnswerValue::Boolean(_) => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Text(value) => f.write_str(value),
            AnswerValue::Number(value) => write!(f, "{value}"),
            AnswerValue::Boolean(true) => f.write_str("Yes"),
            AnswerValue::Boolean(false) => f.write_str("No"),
        }
    }
}

/// Answers keyed by question key.
pub type Answers = BTreeMap<String, AnswerValue>;

/// Lifecycle of one user's questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum QuestionnairePhase {
    NotStarted,
    InProgress { cursor: usize },
    AwaitingCompletion,
    Terminated,
}

impl QuestionnairePhase {
    pub const fn label(self) -> &'static str {
        match self {
            QuestionnairePhase::NotStarted => "not_started",
            QuestionnairePhase::InProgress { .. } => "in_progress",
            QuestionnairePhase::AwaitingCompletion => "awaiting_completion",
            QuestionnairePhase::Terminated => "terminated",
        }
    }
}

/// Per-user questionnaire progress.
///
/// `answers` only ever holds keys of questions before `cursor`; [`Session::record`] is the
/// single mutation path and advances both together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    cursor: usize,
    answers: Answers,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            cursor: 0,
            answers: Answers::new(),
            started_at: now,
            last_activity: now,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn phase(&self, total: usize) -> QuestionnairePhase {
        if self.cursor >= total {
            QuestionnairePhase::AwaitingCompletion
        } else {
            QuestionnairePhase::InProgress {
                cursor: self.cursor,
            }
        }
    }

    pub(crate) fn record(&mut self, key: &str, value: AnswerValue, now: DateTime<Utc>) {
        self.answers.insert(key.to_string(), value);
        self.cursor += 1;
        self.last_activity = now;
    }

    pub fn into_answers(self) -> Answers {
        self.answers
    }
}

/// Public progress view of a live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    pub user_id: UserId,
    pub phase: &'static str,
    pub cursor: usize,
    pub total: usize,
    pub answered: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<String>,
}
