//! # Charger Register Protocol
//!
//! `ChargerProtocol` owns the bus transport and implements the request/response
//! exchange with the charger: register reads and writes, status decoding, and
//! the guarded-write sequence used to change charge-curve set-points.
//!
//! ## Guarded writes
//!
//! Curve registers must only be written while the output is off:
//!
//! 1. (restart voltage only) write the restart-enable word, wait the settle delay
//! 2. switch the output off
//! 3. write the register
//! 4. wait the settle delay
//! 5. switch the output back on
//!
//! The transport lock is held for the whole sequence, so no other request can
//! interleave with it. The first failing step aborts the sequence and is named
//! in the returned `ChargerError::GuardedWrite`; in that case the output may be
//! left off and the caller should retry `set_output(true)`.
//!
//! ## Usage
//! ```rust
//! use npb_charger::{ChargerProtocol, MockBus};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), npb_charger::ChargerError> {
//! let bus = MockBus::new();
//! bus.queue_register_value(0x60, 5350);
//!
//! let charger = ChargerProtocol::with_defaults(bus);
//! assert_eq!(charger.read_register(0x60).await, Some(5350));
//! charger.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use crate::charger::frame::{parse_response, probe_status, BusFrame, RegisterFrame};
use crate::charger::register::{known_settings, OutputState, RegisterCode, ScaledValue};
use crate::charger::status::ChargeStatus;
use crate::charger::transport::BusTransport;
use crate::config::{ChargerConfig, TaperCurrentCheck};
use crate::constants::*;
use crate::error::{ChargerError, GuardedStep};
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

/// Correction applied to a requested set-point before it was written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum InputAdjustment {
    /// The request exceeded the device limit and was lowered to it
    Clamped { requested: f64, applied: f64 },
}

/// Outcome of a completed guarded write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GuardedWrite {
    pub register: RegisterCode,
    pub raw: u16,
    pub adjustment: Option<InputAdjustment>,
    /// Last output command sent; always `Enabled` for a completed sequence
    pub output: OutputState,
}

impl GuardedWrite {
    pub fn was_clamped(&self) -> bool {
        matches!(self.adjustment, Some(InputAdjustment::Clamped { .. }))
    }

    /// Written value in volts or amperes.
    pub fn value(&self) -> f64 {
        f64::from(self.raw) / SETPOINT_RAW_PER_UNIT
    }
}

/// One entry of `read_known_settings`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SettingReading {
    pub name: &'static str,
    pub register: RegisterCode,
    pub value: ScaledValue,
}

/// Scaled register values keyed by register name, in table order.
/// Registers that could not be read are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KnownSettings {
    readings: Vec<SettingReading>,
}

impl KnownSettings {
    /// Scaled value for `name`, if it was read.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.get_scaled(name).map(|v| v.value())
    }

    pub fn get_scaled(&self, name: &str) -> Option<ScaledValue> {
        self.readings
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .map(|r| r.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_scaled(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SettingReading> {
        self.readings.iter()
    }
}

/// Which set-point a guarded write targets.
struct Setpoint {
    register: RegisterCode,
    raw: u16,
    adjustment: Option<InputAdjustment>,
    enable_restart: bool,
}

/// Register protocol for one charger on a shared bus.
pub struct ChargerProtocol<T: BusTransport> {
    bus: Mutex<T>,
    config: ChargerConfig,
}

impl<T: BusTransport> ChargerProtocol<T> {
    /// Takes ownership of an open transport.
    pub fn new(transport: T, config: ChargerConfig) -> Self {
        ChargerProtocol {
            bus: Mutex::new(transport),
            config,
        }
    }

    pub fn with_defaults(transport: T) -> Self {
        Self::new(transport, ChargerConfig::default())
    }

    pub fn config(&self) -> &ChargerConfig {
        &self.config
    }

    /// Releases the transport.
    pub async fn shutdown(self) -> Result<(), ChargerError> {
        let mut bus = self.bus.into_inner();
        bus.shutdown().await
    }

    /// Returns the transport without shutting it down.
    pub fn into_transport(self) -> T {
        self.bus.into_inner()
    }

    async fn send_frame(&self, bus: &mut T, frame: RegisterFrame) -> Result<(), ChargerError> {
        let bus_frame = frame.to_bus_frame(self.config.arbitration_id);
        debug!(
            "TX 0x{:05X} [{}]",
            bus_frame.id,
            hex::encode_upper(&bus_frame.data)
        );
        bus.send(&bus_frame).await
    }

    /// One send followed by one bounded receive.
    async fn request(&self, bus: &mut T, code: u8) -> Result<BusFrame, ChargerError> {
        self.send_frame(bus, RegisterFrame::read(code)).await?;
        let response = bus.receive(self.config.receive_timeout()).await?;
        debug!(
            "RX 0x{:05X} [{}]",
            response.id,
            hex::encode_upper(&response.data)
        );
        Ok(response)
    }

    /// Checks that the charger answers on the bus.
    /// Any failure, including a bus error, yields `false`.
    pub async fn probe(&self) -> bool {
        let mut bus = self.bus.lock().await;
        match self.request(&mut bus, REG_OUTPUT_ENABLE).await {
            Ok(response) => match probe_status(&response.data) {
                Some(_) => true,
                None => {
                    debug!("Probe reply not recognised: [{}]", hex::encode_upper(&response.data));
                    false
                }
            },
            Err(e) => {
                debug!("Probe failed: {e}");
                false
            }
        }
    }

    /// Reads a raw register value, reporting why the read failed.
    pub async fn try_read_register(&self, code: u8) -> Result<u16, ChargerError> {
        let mut bus = self.bus.lock().await;
        let response = self.request(&mut bus, code).await?;
        Ok(parse_response(&response.data)?.raw)
    }

    /// Reads a raw register value. `None` on bus error, timeout or a short reply.
    pub async fn read_register(&self, code: u8) -> Option<u16> {
        match self.try_read_register(code).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!("Reading register 0x{code:02X} failed: {e}");
                None
            }
        }
    }

    /// Reads a register and applies its scale. `None` for unscaled registers.
    pub async fn read_scaled(&self, register: RegisterCode) -> Option<ScaledValue> {
        let scale = register.info().scale()?;
        let raw = self.read_register(register.code()).await?;
        Some(ScaledValue::new(raw, scale))
    }

    /// Writes a raw register value. No reply is awaited.
    pub async fn write_register(&self, code: u8, raw: u16) -> Result<(), ChargerError> {
        let mut bus = self.bus.lock().await;
        self.send_frame(&mut bus, RegisterFrame::write(code, raw))
            .await
    }

    /// Switches the charger output on or off.
    pub async fn set_output(&self, enabled: bool) -> Result<OutputState, ChargerError> {
        let state = OutputState::from(enabled);
        self.write_register(REG_OUTPUT_ENABLE, state.raw()).await?;
        debug!("Output {state}");
        Ok(state)
    }

    /// Live output state as reported by the charger.
    pub async fn read_output_state(&self) -> Option<OutputState> {
        self.read_register(REG_OUTPUT_ENABLE)
            .await
            .map(OutputState::from_raw)
    }

    pub async fn read_status(&self) -> Option<ChargeStatus> {
        self.read_register(REG_CHG_STATUS)
            .await
            .map(ChargeStatus::from_raw)
    }

    /// Reads every scaled register in the table. Failed reads are left out.
    pub async fn read_known_settings(&self) -> KnownSettings {
        let mut readings = Vec::new();
        for info in known_settings() {
            if let Some(value) = self.read_scaled(info.code).await {
                readings.push(SettingReading {
                    name: info.name,
                    register: info.code,
                    value,
                });
            }
        }
        KnownSettings { readings }
    }

    /// Sets the absorption (constant-voltage) charge voltage.
    pub async fn set_absorption_voltage(&self, volts: f64) -> Result<GuardedWrite, ChargerError> {
        let (raw, adjustment) = self.voltage_setpoint("absorption voltage", volts)?;
        self.guarded_write(Setpoint {
            register: RegisterCode::CurveCv,
            raw,
            adjustment,
            enable_restart: false,
        })
        .await
    }

    /// Sets the float charge voltage.
    pub async fn set_float_voltage(&self, volts: f64) -> Result<GuardedWrite, ChargerError> {
        let (raw, adjustment) = self.voltage_setpoint("float voltage", volts)?;
        self.guarded_write(Setpoint {
            register: RegisterCode::CurveFv,
            raw,
            adjustment,
            enable_restart: false,
        })
        .await
    }

    /// Enables charge restart and sets the battery voltage that triggers it.
    pub async fn set_restart_voltage(&self, volts: f64) -> Result<GuardedWrite, ChargerError> {
        let (raw, adjustment) = self.voltage_setpoint("restart voltage", volts)?;
        self.guarded_write(Setpoint {
            register: RegisterCode::ChgRstVbat,
            raw,
            adjustment,
            enable_restart: true,
        })
        .await
    }

    /// Sets the taper current at which the charger leaves constant-voltage mode.
    pub async fn set_taper_current(&self, amps: f64) -> Result<GuardedWrite, ChargerError> {
        let raw = self.taper_setpoint(amps)?;
        self.guarded_write(Setpoint {
            register: RegisterCode::CurveTc,
            raw,
            adjustment: None,
            enable_restart: false,
        })
        .await
    }

    fn voltage_setpoint(
        &self,
        quantity: &'static str,
        volts: f64,
    ) -> Result<(u16, Option<InputAdjustment>), ChargerError> {
        let max = self.config.limits.charge_voltage_ceiling();
        if !volts.is_finite() || volts < 0.0 {
            return Err(ChargerError::OutOfRange {
                quantity,
                value: volts,
                min: 0.0,
                max,
            });
        }
        if volts > max {
            warn!("Won't set {quantity} higher than {max:.2} V, using {max:.2} V instead of {volts} V");
            return Ok((
                to_raw(quantity, max)?,
                Some(InputAdjustment::Clamped {
                    requested: volts,
                    applied: max,
                }),
            ));
        }
        Ok((to_raw(quantity, volts)?, None))
    }

    fn taper_setpoint(&self, amps: f64) -> Result<u16, ChargerError> {
        let (min_taper, max_taper) = self.config.limits.taper_current_range();
        let out_of_range = |min: f64, max: f64| ChargerError::OutOfRange {
            quantity: "taper current",
            value: amps,
            min,
            max,
        };

        match self.config.taper_check {
            TaperCurrentCheck::Enforced => {
                if !(amps >= min_taper && amps <= max_taper) {
                    warn!("Won't set taper current outside [{min_taper}, {max_taper}] A. No change!");
                    return Err(out_of_range(min_taper, max_taper));
                }
            }
            TaperCurrentCheck::Legacy => {
                // Only values that cannot be encoded at all are refused.
                let max_encodable = f64::from(u16::MAX) / SETPOINT_RAW_PER_UNIT;
                if !(amps >= 0.0 && amps <= max_encodable) {
                    return Err(out_of_range(0.0, max_encodable));
                }
            }
        }
        to_raw("taper current", amps)
    }

    async fn guarded_write(&self, setpoint: Setpoint) -> Result<GuardedWrite, ChargerError> {
        let settle = self.config.settle_delay();
        let mut bus = self.bus.lock().await;
        let mut last_output = None;

        if setpoint.enable_restart {
            self.send_frame(
                &mut bus,
                RegisterFrame::write(REG_RESTART_ENABLE, RESTART_ENABLE_WORD),
            )
            .await
            .map_err(|e| step_failed(GuardedStep::EnableRestart, last_output, e))?;
            tokio::time::sleep(settle).await;
        }

        self.send_frame(
            &mut bus,
            RegisterFrame::write(REG_OUTPUT_ENABLE, OutputState::Disabled.raw()),
        )
        .await
        .map_err(|e| step_failed(GuardedStep::DisableOutput, last_output, e))?;
        last_output = Some(OutputState::Disabled);

        self.send_frame(
            &mut bus,
            RegisterFrame::write(setpoint.register.code(), setpoint.raw),
        )
        .await
        .map_err(|e| step_failed(GuardedStep::WriteRegister, last_output, e))?;

        tokio::time::sleep(settle).await;

        self.send_frame(
            &mut bus,
            RegisterFrame::write(REG_OUTPUT_ENABLE, OutputState::Enabled.raw()),
        )
        .await
        .map_err(|e| step_failed(GuardedStep::EnableOutput, last_output, e))?;

        info!(
            "Set {} to {:.2} (raw {})",
            setpoint.register,
            f64::from(setpoint.raw) / SETPOINT_RAW_PER_UNIT,
            setpoint.raw
        );

        Ok(GuardedWrite {
            register: setpoint.register,
            raw: setpoint.raw,
            adjustment: setpoint.adjustment,
            output: OutputState::Enabled,
        })
    }
}

/// Converts volts/amperes to register units, refusing anything a u16 cannot hold.
fn to_raw(quantity: &'static str, value: f64) -> Result<u16, ChargerError> {
    let scaled = (value * SETPOINT_RAW_PER_UNIT).round();
    if !(scaled >= 0.0 && scaled <= f64::from(u16::MAX)) {
        return Err(ChargerError::OutOfRange {
            quantity,
            value,
            min: 0.0,
            max: f64::from(u16::MAX) / SETPOINT_RAW_PER_UNIT,
        });
    }
    Ok(scaled as u16)
}

fn step_failed(
    step: GuardedStep,
    last_output: Option<OutputState>,
    source: ChargerError,
) -> ChargerError {
    error!("Guarded write stopped at '{step}': {source}");
    ChargerError::GuardedWrite {
        step,
        last_output,
        source: Box::new(source),
    }
}
