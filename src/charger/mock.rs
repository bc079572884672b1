//! Mock bus transport for testing
//!
//! This module provides a scripted bus that records every frame sent to it and
//! replays queued responses, so the charger protocol can be tested without
//! hardware.

use crate::charger::frame::BusFrame;
use crate::charger::transport::BusTransport;
use crate::constants::CHARGER_ARBITRATION_ID;
use crate::error::ChargerError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// What the mock hands back on the next `receive`
#[derive(Debug, Clone)]
pub enum MockResponse {
    Frame(BusFrame),
    Error(String),
    Timeout,
}

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<BusFrame>,
    /// Includes failed sends
    send_attempts: usize,
    responses: VecDeque<MockResponse>,
    /// Send index -> error message
    failing_sends: HashMap<usize, String>,
    /// Register code -> error message, consumed on first match
    failing_codes: HashMap<u8, String>,
    fail_all_sends: Option<String>,
    shut_down: bool,
}

/// Mock bus shared between the test and the protocol under test
#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a raw response payload
    pub fn queue_response(&self, data: &[u8]) {
        self.state().responses.push_back(MockResponse::Frame(BusFrame::extended(
            CHARGER_ARBITRATION_ID,
            data.to_vec(),
        )));
    }

    /// Queue a well-formed register reply carrying `raw`
    pub fn queue_register_value(&self, code: u8, raw: u16) {
        let [low, high] = raw.to_le_bytes();
        self.queue_response(&[code, 0x00, low, high]);
    }

    /// Queue a bus error on the next receive
    pub fn queue_receive_error(&self, message: &str) {
        self.state()
            .responses
            .push_back(MockResponse::Error(message.to_string()));
    }

    /// Queue a timeout on the next receive
    pub fn queue_timeout(&self) {
        self.state().responses.push_back(MockResponse::Timeout);
    }

    /// Fail the send attempt with the given zero-based index
    pub fn fail_send_at(&self, index: usize, message: &str) {
        self.state().failing_sends.insert(index, message.to_string());
    }

    /// Fail the next send whose first payload byte is `code`
    pub fn fail_send_for(&self, code: u8, message: &str) {
        self.state().failing_codes.insert(code, message.to_string());
    }

    /// Fail every send from now on
    pub fn fail_all_sends(&self, message: &str) {
        self.state().fail_all_sends = Some(message.to_string());
    }

    /// Frames that reached the bus, in order
    pub fn sent_frames(&self) -> Vec<BusFrame> {
        self.state().sent.clone()
    }

    /// Payloads of the frames that reached the bus, in order
    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.state().sent.iter().map(|f| f.data.clone()).collect()
    }

    pub fn pending_responses(&self) -> usize {
        self.state().responses.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.state().shut_down
    }
}

#[async_trait::async_trait]
impl BusTransport for MockBus {
    async fn send(&mut self, frame: &BusFrame) -> Result<(), ChargerError> {
        let mut state = self.state();
        if let Some(message) = state.fail_all_sends.clone() {
            state.send_attempts += 1;
            return Err(ChargerError::Transport(message));
        }

        let index = state.send_attempts;
        state.send_attempts += 1;
        if let Some(message) = state.failing_sends.remove(&index) {
            return Err(ChargerError::Transport(message));
        }
        if let Some(&code) = frame.data.first() {
            if let Some(message) = state.failing_codes.remove(&code) {
                return Err(ChargerError::Transport(message));
            }
        }

        state.sent.push(frame.clone());
        Ok(())
    }

    async fn receive(&mut self, _timeout: Duration) -> Result<BusFrame, ChargerError> {
        match self.state().responses.pop_front() {
            Some(MockResponse::Frame(frame)) => Ok(frame),
            Some(MockResponse::Error(message)) => Err(ChargerError::Transport(message)),
            Some(MockResponse::Timeout) | None => Err(ChargerError::NoResponse),
        }
    }

    async fn shutdown(&mut self) -> Result<(), ChargerError> {
        self.state().shut_down = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_sent_frames() {
        let mut bus = MockBus::new();
        bus.send(&BusFrame::extended(0xC0103, vec![0xB0, 0x00]))
            .await
            .unwrap();
        assert_eq!(bus.sent_payloads(), vec![vec![0xB0, 0x00]]);
    }

    #[tokio::test]
    async fn test_replays_queued_responses_in_order() {
        let mut bus = MockBus::new();
        bus.queue_register_value(0x60, 5350);
        bus.queue_receive_error("bus off");

        let frame = bus.receive(Duration::from_secs(1)).await.unwrap();
        assert_eq!(frame.data, vec![0x60, 0x00, 0xE6, 0x14]);
        assert!(matches!(
            bus.receive(Duration::from_secs(1)).await,
            Err(ChargerError::Transport(_))
        ));
        assert!(matches!(
            bus.receive(Duration::from_secs(1)).await,
            Err(ChargerError::NoResponse)
        ));
    }

    #[tokio::test]
    async fn test_fail_send_for_code_is_consumed() {
        let mut bus = MockBus::new();
        bus.fail_send_for(0xB1, "tx error");
        let frame = BusFrame::extended(0xC0103, vec![0xB1, 0x00, 0x00, 0x00]);
        assert!(bus.send(&frame).await.is_err());
        assert!(bus.send(&frame).await.is_ok());
        assert_eq!(bus.sent_frames().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_flag() {
        let mut bus = MockBus::new();
        let observer = bus.clone();
        bus.shutdown().await.unwrap();
        assert!(observer.is_shut_down());
    }
}
