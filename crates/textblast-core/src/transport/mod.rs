//! Message transports
//!
//! Transmission is an external capability: the engine calls a transport, it
//! never implements one. The engine must behave identically whichever
//! backend is plugged in.

use async_trait::async_trait;
use thiserror::Error;

mod http;
mod simulated;

pub use http::HttpGatewayTransport;
pub use simulated::SimulatedTransport;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport unavailable")]
    Unavailable,

    #[error("delivery failed: {0}")]
    Failed(String),
}

/// External capability that attempts delivery of one message
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Whether the transport can currently attempt deliveries
    fn is_available(&self) -> bool {
        true
    }

    /// Attempt delivery of one (recipient, body) pair
    async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError>;
}
