//! Mock implementations for testing.

use async_trait::async_trait;
use delivery::{Acknowledgement, DeliveryStrategy, LeadPayload};
use parking_lot::Mutex;
use std::sync::Arc;
use studio_core::error::DeliveryErrorCode;
use studio_core::{Error, Result};

/// How a [`MockStrategy`] answers each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    Confirm,
    Assume,
    Fail,
}

/// Mock strategy that captures payloads in memory.
///
/// This implements the same `DeliveryStrategy` trait as the real webhook
/// strategies, allowing tests to verify the exact payload that would be
/// posted without any network traffic.
#[derive(Clone)]
pub struct MockStrategy {
    name: &'static str,
    /// All payloads handed to this strategy.
    payloads: Arc<Mutex<Vec<LeadPayload>>>,
    mode: Arc<Mutex<MockMode>>,
}

impl MockStrategy {
    pub fn new(name: &'static str, mode: MockMode) -> Self {
        Self {
            name,
            payloads: Arc::new(Mutex::new(Vec::new())),
            mode: Arc::new(Mutex::new(mode)),
        }
    }

    /// Get all captured payloads.
    pub fn captured(&self) -> Vec<LeadPayload> {
        self.payloads.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        self.payloads.lock().len()
    }

    /// Switch the answer for subsequent attempts.
    pub fn set_mode(&self, mode: MockMode) {
        *self.mode.lock() = mode;
    }
}

#[async_trait]
impl DeliveryStrategy for MockStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, payload: &LeadPayload) -> Result<Acknowledgement> {
        self.payloads.lock().push(payload.clone());
        match *self.mode.lock() {
            MockMode::Confirm => Ok(Acknowledgement::Confirmed),
            MockMode::Assume => Ok(Acknowledgement::Assumed),
            MockMode::Fail => Err(Error::delivery(
                DeliveryErrorCode::AttemptFailed,
                format!("{}: mock failure", self.name),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> LeadPayload {
        LeadPayload {
            full_name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: "11987654321".into(),
            birth_date: "01/02/1995".into(),
            experience_level: "first-time".into(),
            experience_label: "First time dancing".into(),
            submitted_at: "2026-10-19T09:00:00.000Z".into(),
            attribution: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_mock_strategy_captures_payloads() {
        let mock = MockStrategy::new("mock", MockMode::Confirm);
        let ack = mock.attempt(&payload()).await.unwrap();
        assert_eq!(ack, Acknowledgement::Confirmed);
        assert_eq!(mock.captured()[0].full_name, "Ana");
    }

    #[tokio::test]
    async fn test_mock_strategy_failure_mode() {
        let mock = MockStrategy::new("mock", MockMode::Fail);
        assert!(mock.attempt(&payload()).await.is_err());
        mock.set_mode(MockMode::Assume);
        assert_eq!(mock.attempt(&payload()).await.unwrap(), Acknowledgement::Assumed);
        assert_eq!(mock.attempts(), 2);
    }
}
