// libs/messaging-cell/src/services/messenger.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::models::{CircuitState, MessageReceipt, MessagingError, OutboundMessage};
use crate::services::circuit_breaker::{CircuitBreaker, CircuitBreakerError};

/// The seam to the external messaging API client. The production
/// implementation talks to the Meta Graph API and lives outside this cell.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<MessageReceipt, MessagingError>;
}

/// Routes outbound messages through a circuit breaker so a failing messaging
/// API stops being called for the recovery window instead of blocking every
/// conversation.
pub struct ResilientMessenger {
    sender: Arc<dyn MessageSender>,
    breaker: CircuitBreaker,
}

impl ResilientMessenger {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self::with_breaker(sender, CircuitBreaker::default())
    }

    pub fn with_breaker(sender: Arc<dyn MessageSender>, breaker: CircuitBreaker) -> Self {
        Self { sender, breaker }
    }

    pub async fn send(&self, message: &OutboundMessage) -> Result<MessageReceipt, MessagingError> {
        let result = self.breaker.execute(|| self.sender.send(message)).await;

        match result {
            Ok(receipt) => {
                debug!(
                    "Message {} delivered to {}",
                    receipt.message_id, receipt.to_phone
                );
                Ok(receipt)
            }
            Err(CircuitBreakerError::Open) => Err(MessagingError::CircuitOpen),
            Err(CircuitBreakerError::Inner(err)) => Err(err),
        }
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.breaker.state().await
    }
}
