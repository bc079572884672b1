//! The charger module contains the components responsible for the NPB register
//! protocol: the register table, frame encoding, status decoding, the bus
//! transport abstraction, and the protocol itself.

pub mod frame;
pub mod mock;
pub mod protocol;
pub mod register;
#[cfg(feature = "socketcan")]
pub mod socketcan;
pub mod status;
pub mod transport;

pub use frame::{BusFrame, RegisterFrame, RegisterResponse};
pub use mock::MockBus;
pub use protocol::{ChargerProtocol, GuardedWrite, InputAdjustment, KnownSettings, SettingReading};
pub use register::{OutputState, RegisterCode, RegisterInfo, Scale, ScaledValue, REGISTERS};
#[cfg(feature = "socketcan")]
pub use socketcan::SocketCanBus;
pub use status::ChargeStatus;
pub use transport::BusTransport;
