//! Device abstractions for pulse timing and PWM actuation on Pico 1 and 2.
//!
//! Covers single-channel encoder timing, DC motors on H-bridges, hobby servos, and
//! ultrasonic time-of-flight ranging.
//!
//! # Glossary
//!
//! Resources available on the Pico 1 and Pico 2:
//!
//! - **PWM ([Pulse Width Modulation](https://en.wikipedia.org/wiki/Pulse-width_modulation)) Slices:** Both  Pico 1 and 2 have 8 slices (& 16 channels). These "slices"
//!   are unrelated Rust slices. GPIO `n` uses slice `(n / 2) % 8`, output A for even pins and B for odd pins.
//! - **Edge capture:** recording a timestamp when a digital input goes low to high (rising) or
//!   high to low (falling).
//! - **Wrap (top):** the value at which a PWM counter resets to zero. A slice has `wrap + 1`
//!   duty levels.
//! - **Critical section:** a short region with interrupts disabled, used here to read a pair
//!   of pulse metrics without tearing.
#![cfg_attr(not(feature = "host"), no_std)]
#![cfg_attr(not(feature = "host"), no_main)]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

// Compile-time check: the ARM core must be selected (unless testing with host feature)
#[cfg(all(not(feature = "arm"), not(feature = "host")))]
compile_error!("Must enable the architecture feature: 'arm'");

// Modules with a pure core are always built; their hardware halves are gated inside.
#[cfg(not(feature = "host"))]
pub mod edge_capture;
mod error;
pub mod motor;
pub mod pulse_metrics;
pub mod pwm_channel;
pub mod rangefinder;
pub mod servo;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};

/// Round a non-negative value to the nearest integer, halves away from zero.
///
/// Negative and NaN inputs give 0; values beyond `u32::MAX` saturate.
#[must_use]
pub(crate) fn round_to_u32(value: f32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // `as` saturates at u32::MAX
    libm::roundf(value) as u32
}
