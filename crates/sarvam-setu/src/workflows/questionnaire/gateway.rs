use serde::{Deserialize, Serialize};

use super::catalog::ChoiceLayout;
use super::domain::{EventId, MessageId, UserId};

/// Outbound chat primitives. Delivery is best-effort; callers only log failures.
pub trait ChatGateway: Send + Sync {
    fn send_prompt(
        &self,
        user: &UserId,
        text: &str,
        layout: Option<&ChoiceLayout>,
    ) -> Result<(), GatewayError>;
    fn send_text(&self, user: &UserId, text: &str) -> Result<(), GatewayError>;
    fn acknowledge(&self, event: &EventId, notice: Option<&str>) -> Result<(), GatewayError>;
    fn retract_message(&self, user: &UserId, message: &MessageId) -> Result<(), GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("chat transport unavailable: {0}")]
    Transport(String),
}

/// Recorded outbound action, for gateways that queue instead of sending directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OutboundAction {
    Prompt {
        user_id: UserId,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        layout: Option<ChoiceLayout>,
    },
    Text {
        user_id: UserId,
        text: String,
    },
    Acknowledge {
        event_id: EventId,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
    },
    Retract {
        user_id: UserId,
        message_id: MessageId,
    },
}

impl OutboundAction {
    /// Recipient of the action; acknowledgements address the event, not a user.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            OutboundAction::Prompt { user_id, .. }
            | OutboundAction::Text { user_id, .. }
            | OutboundAction::Retract { user_id, .. } => Some(user_id),
            OutboundAction::Acknowledge { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            OutboundAction::Prompt { text, .. } | OutboundAction::Text { text, .. } => Some(text),
            OutboundAction::Acknowledge { notice, .. } => notice.as_deref(),
            OutboundAction::Retract { .. } => None,
        }
    }
}
