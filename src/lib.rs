//! # npb-charger - A Rust Crate for Mean Well NPB Charger Communication
//!
//! The npb-charger crate implements the CANBus register protocol of Mean Well NPB
//! battery chargers: reading charge-curve settings and live measurements, decoding
//! the charge status word, and safely changing charge set-points.
//!
//! ## Features
//!
//! - Encode register read/write requests and decode the charger's replies
//! - Static register table with per-register scaling
//! - Charge status bit-field decoding
//! - Guarded writes: output off, write, settle, output on, under a single bus lock
//! - Pluggable bus transport, with a SocketCAN implementation behind the `socketcan` feature
//! - Support for logging and error handling
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! npb-charger = { version = "0.1", features = ["socketcan"] }
//! ```
//!
//! ```rust,ignore
//! use npb_charger::{connect, disconnect, ChargerConfig};
//!
//! let charger = connect(&ChargerConfig::default())?;
//! if charger.probe().await {
//!     let settings = charger.read_known_settings().await;
//!     charger.set_absorption_voltage(3.5 * 16.0).await?;
//! }
//! disconnect(charger).await?;
//! ```

pub mod charger;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

pub use crate::config::{ChargerConfig, ChargerLimits, TaperCurrentCheck};
pub use crate::error::{ChargerError, GuardedStep};
pub use crate::logging::{init_logger_with_level, log_info};

// Core protocol types
pub use charger::{
    BusFrame, BusTransport, ChargeStatus, ChargerProtocol, GuardedWrite, InputAdjustment,
    KnownSettings, MockBus, OutputState, RegisterCode, RegisterFrame, Scale, ScaledValue,
    SettingReading,
};

#[cfg(feature = "socketcan")]
pub use charger::SocketCanBus;

/// Opens the configured SocketCAN interface and wraps it in a protocol handle.
///
/// # Arguments
/// * `config` - Interface name, timing and limits
///
/// # Returns
/// * `Ok(ChargerProtocol)` - Handle owning the open socket
/// * `Err(ChargerError)` - Invalid config or the socket could not be opened
#[cfg(feature = "socketcan")]
pub fn connect(config: &ChargerConfig) -> Result<ChargerProtocol<SocketCanBus>, ChargerError> {
    config.validate()?;
    let bus = SocketCanBus::open(&config.interface)?;
    Ok(ChargerProtocol::new(bus, config.clone()))
}

/// Releases the bus held by a protocol handle.
///
/// # Arguments
/// * `charger` - Handle to shut down; consumed
///
/// # Returns
/// * `Ok(())` - Transport released
/// * `Err(ChargerError)` - The transport reported an error while closing
pub async fn disconnect<T: BusTransport>(charger: ChargerProtocol<T>) -> Result<(), ChargerError> {
    charger.shutdown().await
}
