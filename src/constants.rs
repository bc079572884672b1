//! NPB Charger Protocol Constants
//!
//! This module defines constants used by the charger register protocol,
//! taken from the Mean Well NPB CANBus command list.

use std::time::Duration;

/// Extended (29-bit) CAN identifier used for every request to the charger
pub const CHARGER_ARBITRATION_ID: u32 = 0x000C_0103;

/// Largest value an extended CAN identifier can hold
pub const CAN_EXTENDED_ID_MAX: u32 = 0x1FFF_FFFF;

/// Bus bitrate the charger ships with (configured on the interface, not here)
pub const CHARGER_BITRATE: u32 = 250_000;

/// Default SocketCAN interface
pub const DEFAULT_INTERFACE: &str = "can0";

/// Second byte of every request frame
pub const FRAME_RESERVED: u8 = 0x00;

/// Data length of a read request
pub const READ_FRAME_LEN: usize = 2;

/// Data length of a write request
pub const WRITE_FRAME_LEN: usize = 4;

/// Data length of a register read response
pub const RESPONSE_FRAME_LEN: usize = 4;

// ----------------------------------------------------------------------------
// Register codes
// ----------------------------------------------------------------------------

pub const REG_OUTPUT_ENABLE: u8 = 0x00;
pub const REG_READ_VOUT: u8 = 0x60;
pub const REG_READ_IOUT: u8 = 0x61;
pub const REG_AMBIENT_TEMP: u8 = 0x62;
pub const REG_CURVE_CC: u8 = 0xB0;
pub const REG_CURVE_CV: u8 = 0xB1;
pub const REG_CURVE_FV: u8 = 0xB2;
pub const REG_CURVE_TC: u8 = 0xB3;
pub const REG_RESTART_ENABLE: u8 = 0xB4;
pub const REG_CURVE_CC_TIMEOUT: u8 = 0xB5;
pub const REG_CURVE_CV_TIMEOUT: u8 = 0xB6;
pub const REG_CURVE_FV_TIMEOUT: u8 = 0xB7;
pub const REG_CHG_STATUS: u8 = 0xB8;
pub const REG_CHG_RST_VBAT: u8 = 0xB9;

/// Control word written to RESTART_ENABLE before changing the restart voltage.
/// Sets the restart-enable bit on top of the factory curve configuration.
pub const RESTART_ENABLE_WORD: u16 = 0x0884;

/// OUTPUT_ENABLE value that turns the output on
pub const OUTPUT_ON: u16 = 0x0001;

/// OUTPUT_ENABLE value that turns the output off
pub const OUTPUT_OFF: u16 = 0x0000;

// ----------------------------------------------------------------------------
// Limits and timing
// ----------------------------------------------------------------------------

/// Highest charge voltage the protocol will program, in volts
pub const MAX_CHARGE_VOLTAGE: f64 = 56.0;

/// Lowest accepted taper current, in amperes
pub const MIN_TAPER_CURRENT: f64 = 0.5;

/// Highest accepted taper current, in amperes
pub const MAX_TAPER_CURRENT: f64 = 7.5;

/// Multiplier from volts/amperes to the raw register unit (10 mV / 10 mA)
pub const SETPOINT_RAW_PER_UNIT: f64 = 100.0;

/// Delay after a curve write before the output is switched back on.
/// Must exceed the charger's internal debounce window.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// How long to wait for a response frame
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);
