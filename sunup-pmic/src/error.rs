//! Error types for the bring-up stack.
//!
//! One enum per layer, with thiserror conversions chaining them upward so
//! `?` works from a raw bus transaction all the way out of
//! [`crate::sequence::run_sequence`].
//!
//! "Pins already in RSB mode" is deliberately not here: it is a
//! success-with-note, reported as [`crate::rsb::Takeover::AlreadyOurs`].

use thiserror::Error;

/// Transport-level failures from the RSB controller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The shared PL pins are claimed by s_twi, an incompatible protocol.
    #[error("RSB pins claimed by TWI")]
    Busy,

    /// A transaction completed with a status other than TRANS_OVER.
    #[error("transaction failed, status {status:#04x}")]
    Protocol { status: u32 },

    /// A polled bit never changed within the configured budget.
    #[error("controller stalled waiting for {wait}")]
    Stalled { wait: &'static str },
}

/// Failures establishing the PMIC session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The identity register did not match the AXP803 family. Register
    /// offsets of an unknown chip cannot be trusted, so this is fatal.
    #[error("unknown PMIC type {id:#04x}")]
    UnknownChip { id: u8 },
}

/// Failures during rail sequencing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
