//! # Charge Status Decoding
//!
//! CHARGE_STATUS (0xB8) packs the charge mode into the low byte and fault/timeout
//! flags into the high byte. Bit positions follow the charger firmware.

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Low byte of CHARGE_STATUS.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChargeModeFlags: u8 {
        const FULLY_CHARGED = 0x01;
        const CONSTANT_CURRENT = 0x02;
        const CONSTANT_VOLTAGE = 0x04;
        const FLOAT = 0x08;
        const WAKEUP_FINISHED = 0x40;
    }
}

bitflags! {
    /// High byte of CHARGE_STATUS.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChargeFaultFlags: u8 {
        const TEMP_COMPENSATION = 0x04;
        const BATTERY_DETECT = 0x08;
        const TIMEOUT_CONSTANT_CURRENT = 0x20;
        const TIMEOUT_CONSTANT_VOLTAGE = 0x40;
        const TIMEOUT_FLOAT = 0x80;
    }
}

/// Decoded CHARGE_STATUS register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChargeStatus {
    pub raw: u16,
    pub fully_charged: bool,
    pub constant_current: bool,
    pub constant_voltage: bool,
    pub float_mode: bool,
    pub wakeup_finished: bool,
    pub temp_comp_status: bool,
    pub bat_detect: bool,
    pub timeout_constant_current: bool,
    pub timeout_constant_voltage: bool,
    pub timeout_float: bool,
}

impl ChargeStatus {
    pub fn from_raw(raw: u16) -> Self {
        let [low, high] = raw.to_le_bytes();
        let mode = ChargeModeFlags::from_bits_truncate(low);
        let faults = ChargeFaultFlags::from_bits_truncate(high);

        ChargeStatus {
            raw,
            fully_charged: mode.contains(ChargeModeFlags::FULLY_CHARGED),
            constant_current: mode.contains(ChargeModeFlags::CONSTANT_CURRENT),
            constant_voltage: mode.contains(ChargeModeFlags::CONSTANT_VOLTAGE),
            float_mode: mode.contains(ChargeModeFlags::FLOAT),
            wakeup_finished: mode.contains(ChargeModeFlags::WAKEUP_FINISHED),
            temp_comp_status: faults.contains(ChargeFaultFlags::TEMP_COMPENSATION),
            bat_detect: faults.contains(ChargeFaultFlags::BATTERY_DETECT),
            timeout_constant_current: faults.contains(ChargeFaultFlags::TIMEOUT_CONSTANT_CURRENT),
            timeout_constant_voltage: faults.contains(ChargeFaultFlags::TIMEOUT_CONSTANT_VOLTAGE),
            timeout_float: faults.contains(ChargeFaultFlags::TIMEOUT_FLOAT),
        }
    }

    pub fn mode_flags(&self) -> ChargeModeFlags {
        ChargeModeFlags::from_bits_truncate(self.raw.to_le_bytes()[0])
    }

    pub fn fault_flags(&self) -> ChargeFaultFlags {
        ChargeFaultFlags::from_bits_truncate(self.raw.to_le_bytes()[1])
    }

    /// True if any of the three stage timeouts fired.
    pub fn any_timeout(&self) -> bool {
        self.timeout_constant_current || self.timeout_constant_voltage || self.timeout_float
    }
}

impl From<u16> for ChargeStatus {
    fn from(raw: u16) -> Self {
        ChargeStatus::from_raw(raw)
    }
}
