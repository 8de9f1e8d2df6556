//! Simulated transport for environments without real transmission

use super::{MessageTransport, TransportError};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// No-op transport with a configurable random failure rate and latency
pub struct SimulatedTransport {
    failure_rate: f64,
    min_latency: Duration,
    max_latency: Duration,
}

impl SimulatedTransport {
    /// Create a transport with the given failure rate (0.0 to 1.0)
    pub fn new(failure_rate: f64) -> Self {
        Self {
            failure_rate,
            min_latency: Duration::from_millis(100),
            max_latency: Duration::from_millis(500),
        }
    }

    /// Override the simulated latency window
    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.min_latency = min;
        self.max_latency = max;
        self
    }

    /// Transport with no latency, for tests and tight loops
    pub fn instant(failure_rate: f64) -> Self {
        Self::new(failure_rate).with_latency(Duration::ZERO, Duration::ZERO)
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(0.05)
    }
}

#[async_trait]
impl MessageTransport for SimulatedTransport {
    async fn send(&self, phone: &str, _body: &str) -> Result<(), TransportError> {
        // ThreadRng is not Send; roll everything before suspending
        let (latency, failed) = {
            let mut rng = rand::thread_rng();
            let min = self.min_latency.as_millis() as u64;
            let max = self.max_latency.as_millis() as u64;
            let latency = if max > min { rng.gen_range(min..=max) } else { min };
            (
                Duration::from_millis(latency),
                rng.gen::<f64>() < self.failure_rate,
            )
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if failed {
            debug!("simulated delivery failure to {}", phone);
            Err(TransportError::Failed(format!(
                "simulated delivery failure to {}",
                phone
            )))
        } else {
            debug!("simulated delivery to {} ({:?})", phone, latency);
            Ok(())
        }
    }
}
