//! # SocketCAN Transport
//!
//! `BusTransport` backed by a Linux SocketCAN interface (e.g. `can0`). The
//! interface's bitrate is configured outside the process (`ip link set can0 type
//! can bitrate 250000`).

use crate::charger::frame::BusFrame;
use crate::charger::transport::BusTransport;
use crate::error::ChargerError;
use log::debug;
use socketcan::tokio::CanSocket;
use socketcan::{CanFrame, EmbeddedFrame, ExtendedId, Frame, Id, StandardId};
use std::time::Duration;

/// Handle to an open SocketCAN interface. Dropping it closes the socket.
pub struct SocketCanBus {
    socket: Option<CanSocket>,
    interface: String,
}

impl SocketCanBus {
    /// Opens the named CAN interface.
    pub fn open(interface: &str) -> Result<Self, ChargerError> {
        let socket = CanSocket::open(interface).map_err(|e| {
            ChargerError::Transport(format!("failed to open CAN socket on {interface}: {e}"))
        })?;
        debug!("Opened CAN socket on {interface}");
        Ok(SocketCanBus {
            socket: Some(socket),
            interface: interface.to_string(),
        })
    }

    fn socket(&self) -> Result<&CanSocket, ChargerError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ChargerError::Transport(format!("{} is shut down", self.interface)))
    }
}

fn to_can_frame(frame: &BusFrame) -> Result<CanFrame, ChargerError> {
    let id: Id = if frame.extended {
        ExtendedId::new(frame.id)
            .map(Id::Extended)
            .ok_or_else(|| ChargerError::MalformedFrame(format!("invalid extended id 0x{:X}", frame.id)))?
    } else {
        u16::try_from(frame.id)
            .ok()
            .and_then(StandardId::new)
            .map(Id::Standard)
            .ok_or_else(|| ChargerError::MalformedFrame(format!("invalid standard id 0x{:X}", frame.id)))?
    };
    CanFrame::new(id, &frame.data)
        .ok_or_else(|| ChargerError::MalformedFrame(format!("{} data bytes", frame.data.len())))
}

#[async_trait::async_trait]
impl BusTransport for SocketCanBus {
    async fn send(&mut self, frame: &BusFrame) -> Result<(), ChargerError> {
        let can_frame = to_can_frame(frame)?;
        self.socket()?
            .write_frame(can_frame)
            .await
            .map_err(|e| ChargerError::Transport(e.to_string()))
    }

    async fn receive(&mut self, timeout: Duration) -> Result<BusFrame, ChargerError> {
        let frame = tokio::time::timeout(timeout, self.socket()?.read_frame())
            .await
            .map_err(|_| ChargerError::NoResponse)?
            .map_err(|e| ChargerError::Transport(e.to_string()))?;
        Ok(BusFrame {
            id: frame.raw_id(),
            extended: frame.is_extended(),
            data: frame.data().to_vec(),
        })
    }

    async fn shutdown(&mut self) -> Result<(), ChargerError> {
        if self.socket.take().is_some() {
            debug!("Closed CAN socket on {}", self.interface);
        }
        Ok(())
    }
}
