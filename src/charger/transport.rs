//! Bus transport abstraction
//!
//! The charger protocol never touches a CAN socket directly. It talks to any
//! `BusTransport`, which lets the same protocol code run against SocketCAN or
//! the scripted `MockBus` used in tests.

use crate::charger::frame::BusFrame;
use crate::error::ChargerError;
use std::time::Duration;

/// Trait for frame-level bus operations
#[async_trait::async_trait]
pub trait BusTransport: Send {
    /// Sends one frame. Errors map to `ChargerError::Transport`.
    async fn send(&mut self, frame: &BusFrame) -> Result<(), ChargerError>;

    /// Waits up to `timeout` for the next frame.
    /// Returns `ChargerError::NoResponse` when nothing arrives in time.
    async fn receive(&mut self, timeout: Duration) -> Result<BusFrame, ChargerError>;

    /// Releases the underlying bus handle.
    async fn shutdown(&mut self) -> Result<(), ChargerError> {
        Ok(())
    }
}
