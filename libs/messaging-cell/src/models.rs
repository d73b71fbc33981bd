// libs/messaging-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Template,
    Interactive,
}

/// A reply headed to a patient over the messaging channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub clinic_id: Uuid,
    pub to_phone: String,
    pub message_type: MessageType,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub message_id: String,
    pub to_phone: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MessagingError {
    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("Message delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Messaging API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}
