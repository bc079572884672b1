//! # Charger Configuration
//!
//! Runtime settings for the protocol: where the charger lives on the bus, how
//! long to wait for it, and which set-points it is allowed to receive. Loaded
//! from JSON; every field has a default so a partial file is fine.

use crate::constants::*;
use crate::error::ChargerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How the taper-current range check behaves.
///
/// The historical tool tested `value > 7.5 and value < 0.5`, which can never be
/// true, so it accepted every taper current. `Enforced` applies the range it was
/// meant to apply; `Legacy` reproduces the old accept-everything behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaperCurrentCheck {
    #[default]
    Enforced,
    Legacy,
}

/// Set-point limits applied before any guarded write.
///
/// Limits can only narrow the device range (56 V, 0.5..=7.5 A). Values outside it
/// fail `validate()`, and the protocol never applies them even when an unvalidated
/// config is passed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargerLimits {
    /// Voltages above this are clamped, not rejected
    pub max_charge_voltage: f64,
    pub min_taper_current: f64,
    pub max_taper_current: f64,
}

impl Default for ChargerLimits {
    fn default() -> Self {
        ChargerLimits {
            max_charge_voltage: MAX_CHARGE_VOLTAGE,
            min_taper_current: MIN_TAPER_CURRENT,
            max_taper_current: MAX_TAPER_CURRENT,
        }
    }
}

impl ChargerLimits {
    /// Voltage ceiling actually applied, never above `MAX_CHARGE_VOLTAGE`.
    pub fn charge_voltage_ceiling(&self) -> f64 {
        self.max_charge_voltage.min(MAX_CHARGE_VOLTAGE)
    }

    /// Taper-current range actually applied, never wider than the device range.
    pub fn taper_current_range(&self) -> (f64, f64) {
        (
            self.min_taper_current.max(MIN_TAPER_CURRENT),
            self.max_taper_current.min(MAX_TAPER_CURRENT),
        )
    }
}

/// Configuration for a charger connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargerConfig {
    /// SocketCAN interface name
    pub interface: String,
    /// Expected bus bitrate. Informational; the interface is configured externally.
    pub bitrate: u32,
    pub arbitration_id: u32,
    pub receive_timeout_ms: u64,
    /// Wait between the curve write and re-enabling the output, at least 50 ms
    pub settle_delay_ms: u64,
    pub limits: ChargerLimits,
    pub taper_check: TaperCurrentCheck,
}

impl Default for ChargerConfig {
    fn default() -> Self {
        ChargerConfig {
            interface: DEFAULT_INTERFACE.to_string(),
            bitrate: CHARGER_BITRATE,
            arbitration_id: CHARGER_ARBITRATION_ID,
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT.as_millis() as u64,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            limits: ChargerLimits::default(),
            taper_check: TaperCurrentCheck::default(),
        }
    }
}

impl ChargerConfig {
    /// Loads and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ChargerError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, ChargerError> {
        let config: ChargerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Settle delay used by guarded writes. Never shorter than `DEFAULT_SETTLE_DELAY`.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms).max(DEFAULT_SETTLE_DELAY)
    }

    pub fn validate(&self) -> Result<(), ChargerError> {
        if self.interface.is_empty() {
            return Err(ChargerError::Config("interface must not be empty".into()));
        }
        if self.arbitration_id > CAN_EXTENDED_ID_MAX {
            return Err(ChargerError::Config(format!(
                "arbitration id 0x{:X} exceeds 29 bits",
                self.arbitration_id
            )));
        }
        if self.receive_timeout_ms == 0 {
            return Err(ChargerError::Config("receive_timeout_ms must be non-zero".into()));
        }
        if Duration::from_millis(self.settle_delay_ms) < DEFAULT_SETTLE_DELAY {
            return Err(ChargerError::Config(format!(
                "settle_delay_ms {} is below the {} ms minimum",
                self.settle_delay_ms,
                DEFAULT_SETTLE_DELAY.as_millis()
            )));
        }
        let limits = &self.limits;
        if !(limits.max_charge_voltage > 0.0 && limits.max_charge_voltage <= MAX_CHARGE_VOLTAGE) {
            return Err(ChargerError::Config(format!(
                "max_charge_voltage {} must be in (0, {}]",
                limits.max_charge_voltage, MAX_CHARGE_VOLTAGE
            )));
        }
        if !(limits.min_taper_current >= MIN_TAPER_CURRENT
            && limits.min_taper_current <= limits.max_taper_current
            && limits.max_taper_current <= MAX_TAPER_CURRENT)
        {
            return Err(ChargerError::Config(format!(
                "taper current range [{}, {}] is invalid or wider than [{}, {}]",
                limits.min_taper_current, limits.max_taper_current, MIN_TAPER_CURRENT, MAX_TAPER_CURRENT
            )));
        }
        Ok(())
    }
}
