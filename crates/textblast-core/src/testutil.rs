//! Shared test helpers

use crate::transport::{MessageTransport, TransportError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Transport that records calls and fails configured phone numbers
pub(crate) struct TestTransport {
    fail_phones: HashSet<String>,
    available: bool,
    calls: Mutex<Vec<String>>,
}

impl TestTransport {
    /// Transport that always delivers
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail_phones: HashSet::new(),
            available: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Transport that fails deliveries to the given phone numbers
    pub fn failing(phones: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fail_phones: phones.iter().map(|p| p.to_string()).collect(),
            available: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Transport that reports itself unavailable
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            fail_phones: HashSet::new(),
            available: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Phone numbers attempted, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for TestTransport {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn send(&self, phone: &str, _body: &str) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(phone.to_string());
        if self.fail_phones.contains(phone) {
            Err(TransportError::Failed(format!(
                "transport rejected message to {}",
                phone
            )))
        } else {
            Ok(())
        }
    }
}
