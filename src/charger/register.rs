//! # Charger Register Table
//!
//! Every register the protocol knows about, its code, its name and how its raw
//! 16-bit value is interpreted. The table is static; anything not listed here
//! cannot be addressed by name.

use crate::constants::*;
use crate::error::ChargerError;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// One-byte register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum RegisterCode {
    CurveCc = REG_CURVE_CC,
    CurveCv = REG_CURVE_CV,
    CurveFv = REG_CURVE_FV,
    CurveTc = REG_CURVE_TC,
    RestartEnable = REG_RESTART_ENABLE,
    CurveCcTimeout = REG_CURVE_CC_TIMEOUT,
    CurveCvTimeout = REG_CURVE_CV_TIMEOUT,
    CurveFvTimeout = REG_CURVE_FV_TIMEOUT,
    ChargeStatus = REG_CHG_STATUS,
    ChgRstVbat = REG_CHG_RST_VBAT,
    OutputEnable = REG_OUTPUT_ENABLE,
    ReadVout = REG_READ_VOUT,
    ReadIout = REG_READ_IOUT,
    AmbientTemp = REG_AMBIENT_TEMP,
}

impl RegisterCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Table entry for this register.
    pub fn info(self) -> &'static RegisterInfo {
        let index = match self {
            RegisterCode::CurveCc => 0,
            RegisterCode::CurveCv => 1,
            RegisterCode::CurveFv => 2,
            RegisterCode::CurveTc => 3,
            RegisterCode::RestartEnable => 4,
            RegisterCode::CurveCcTimeout => 5,
            RegisterCode::CurveCvTimeout => 6,
            RegisterCode::CurveFvTimeout => 7,
            RegisterCode::ChargeStatus => 8,
            RegisterCode::ChgRstVbat => 9,
            RegisterCode::OutputEnable => 10,
            RegisterCode::ReadVout => 11,
            RegisterCode::ReadIout => 12,
            RegisterCode::AmbientTemp => 13,
        };
        &REGISTERS[index]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Looks a register up by its table name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, ChargerError> {
        REGISTERS_BY_NAME
            .get(name.to_ascii_uppercase().as_str())
            .map(|info| info.code)
            .ok_or_else(|| ChargerError::UnknownRegisterName(name.to_string()))
    }
}

impl From<RegisterCode> for u8 {
    fn from(register: RegisterCode) -> Self {
        register.code()
    }
}

impl TryFrom<u8> for RegisterCode {
    type Error = ChargerError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        REGISTERS
            .iter()
            .find(|info| info.code.code() == code)
            .map(|info| info.code)
            .ok_or(ChargerError::UnknownRegister(code))
    }
}

impl fmt::Display for RegisterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.code())
    }
}

/// Fixed decimal factor applied to a raw register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scale {
    /// 0.01 per count (10 mV, 10 mA)
    Hundredths,
    /// 0.1 per count (0.1 °C)
    Tenths,
}

impl Scale {
    pub fn factor(self) -> f64 {
        match self {
            Scale::Hundredths => 0.01,
            Scale::Tenths => 0.1,
        }
    }
}

/// How a register's raw value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// Physical quantity: raw * scale
    Scaled(Scale),
    /// Opaque configuration bits
    ControlWord,
    /// Charge status flags, see `charger::status`
    Bitfield,
    /// Output on/off
    Boolean,
}

#[derive(Debug)]
pub struct RegisterInfo {
    pub code: RegisterCode,
    pub name: &'static str,
    pub kind: RegisterKind,
}

impl RegisterInfo {
    pub fn scale(&self) -> Option<Scale> {
        match self.kind {
            RegisterKind::Scaled(scale) => Some(scale),
            _ => None,
        }
    }
}

/// The complete register table, in report order.
pub static REGISTERS: [RegisterInfo; 14] = [
    RegisterInfo { code: RegisterCode::CurveCc, name: "CURVE_CC", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::CurveCv, name: "CURVE_CV", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::CurveFv, name: "CURVE_FV", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::CurveTc, name: "CURVE_TC", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::RestartEnable, name: "RESTART_ENABLE", kind: RegisterKind::ControlWord },
    RegisterInfo { code: RegisterCode::CurveCcTimeout, name: "CURVE_CC_TIMEOUT", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::CurveCvTimeout, name: "CURVE_CV_TIMEOUT", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::CurveFvTimeout, name: "CURVE_FV_TIMEOUT", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::ChargeStatus, name: "CHARGE_STATUS", kind: RegisterKind::Bitfield },
    RegisterInfo { code: RegisterCode::ChgRstVbat, name: "CHG_RST_VBAT", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::OutputEnable, name: "OUTPUT_ENABLE", kind: RegisterKind::Boolean },
    RegisterInfo { code: RegisterCode::ReadVout, name: "READ_VOUT", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::ReadIout, name: "READ_IOUT", kind: RegisterKind::Scaled(Scale::Hundredths) },
    RegisterInfo { code: RegisterCode::AmbientTemp, name: "AMBIENT_TEMP", kind: RegisterKind::Scaled(Scale::Tenths) },
];

static REGISTERS_BY_NAME: Lazy<HashMap<&'static str, &'static RegisterInfo>> =
    Lazy::new(|| REGISTERS.iter().map(|info| (info.name, info)).collect());

/// Registers reported by `read_known_settings`: every scaled register, in table order.
pub fn known_settings() -> impl Iterator<Item = &'static RegisterInfo> {
    REGISTERS.iter().filter(|info| info.scale().is_some())
}

/// A raw register value paired with its scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScaledValue {
    pub raw: u16,
    pub scale: Scale,
}

impl ScaledValue {
    pub fn new(raw: u16, scale: Scale) -> Self {
        ScaledValue { raw, scale }
    }

    /// Value in physical units (V, A, °C).
    pub fn value(&self) -> f64 {
        f64::from(self.raw) * self.scale.factor()
    }
}

impl fmt::Display for ScaledValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scale {
            Scale::Hundredths => write!(f, "{:.2}", self.value()),
            Scale::Tenths => write!(f, "{:.1}", self.value()),
        }
    }
}

/// Last output command the protocol sent (or read back) for OUTPUT_ENABLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputState {
    Enabled,
    Disabled,
}

impl OutputState {
    /// Raw OUTPUT_ENABLE value for this state.
    pub fn raw(self) -> u16 {
        match self {
            OutputState::Enabled => OUTPUT_ON,
            OutputState::Disabled => OUTPUT_OFF,
        }
    }

    pub fn from_raw(raw: u16) -> Self {
        if raw & OUTPUT_ON != 0 {
            OutputState::Enabled
        } else {
            OutputState::Disabled
        }
    }
}

impl From<bool> for OutputState {
    fn from(enabled: bool) -> Self {
        if enabled {
            OutputState::Enabled
        } else {
            OutputState::Disabled
        }
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputState::Enabled => write!(f, "enabled"),
            OutputState::Disabled => write!(f, "disabled"),
        }
    }
}
