//! # Charger Error Handling
//!
//! This module defines the ChargerError enum, which represents the different error
//! types that can occur in the npb-charger crate, together with the step names
//! used to report where a guarded write stopped.

use crate::charger::register::OutputState;
use std::fmt;
use thiserror::Error;

/// The individual steps of a guarded write, in the order they are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedStep {
    /// Writing the restart-enable control word (restart voltage only)
    EnableRestart,
    /// Switching the output off
    DisableOutput,
    /// Writing the target register
    WriteRegister,
    /// Switching the output back on
    EnableOutput,
}

impl fmt::Display for GuardedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuardedStep::EnableRestart => "enable restart",
            GuardedStep::DisableOutput => "disable output",
            GuardedStep::WriteRegister => "write register",
            GuardedStep::EnableOutput => "enable output",
        };
        f.write_str(name)
    }
}

/// Represents the different error types that can occur in the charger crate.
#[derive(Debug, Error)]
pub enum ChargerError {
    /// Indicates a send or receive failure on the CAN bus.
    #[error("CAN bus error: {0}")]
    Transport(String),

    /// Indicates that no response frame arrived before the timeout.
    #[error("No response from charger")]
    NoResponse,

    /// Indicates a frame that could not be encoded or decoded.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Indicates a register code outside the known table.
    #[error("Unknown register code: 0x{0:02X}")]
    UnknownRegister(u8),

    /// Indicates a register name outside the known table.
    #[error("Unknown register name: {0}")]
    UnknownRegisterName(String),

    /// Indicates a set-point rejected before anything was sent.
    #[error("{quantity} {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Indicates a guarded write that stopped part-way through.
    /// `last_output` is the last output command that reached the bus, if any.
    #[error("Guarded write failed at step '{step}': {source}")]
    GuardedWrite {
        step: GuardedStep,
        last_output: Option<OutputState>,
        #[source]
        source: Box<ChargerError>,
    },

    /// Indicates an invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Indicates a failure reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Indicates a configuration file that is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChargerError {
    /// Step at which a guarded write stopped, if this is a guarded-write error.
    pub fn failed_step(&self) -> Option<GuardedStep> {
        match self {
            ChargerError::GuardedWrite { step, .. } => Some(*step),
            _ => None,
        }
    }
}
