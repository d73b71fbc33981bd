pub mod circuit_breaker;
pub mod messenger;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError};
pub use messenger::{MessageSender, ResilientMessenger};
