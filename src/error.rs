//! Crate-wide error type.
//!
//! Most conditions in this crate are recovered locally (clamping, best-effort PWM
//! timing, range timeouts reported as invalid measurements). Only setup failures that
//! the caller must act on are surfaced here.

use derive_more::{Display, Error};

/// Errors surfaced by device constructors.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// A background task could not be spawned (its task pool is full).
    #[cfg(not(feature = "host"))]
    #[display("task spawn failed: {_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    /// A value passed to a constructor is outside what the hardware can represent.
    #[display("value out of range")]
    OutOfRange,
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
