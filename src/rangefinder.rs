//! A device abstraction for HC-SR04 style ultrasonic rangefinders.
//!
//! A measurement sends a 10 µs trigger pulse, waits for the echo line to rise, and times
//! how long it stays high. The echo time becomes a distance with
//! `round(echo_us * 0.1716)` millimeters (half the round trip at about 343.2 m/s).
//!
//! The timing logic lives in [`EchoTracker`], a state machine driven by
//! [`EchoTracker::poll`]:
//!
//! ```text
//! Idle -> Trigger -> WaitEchoRise -> WaitEchoFall -> Done
//!                         |               |
//!                         +---> Timeout <-+
//! ```
//!
//! The echo must rise within [`ECHO_RISE_TIMEOUT_US`] and fall within
//! [`ECHO_FALL_TIMEOUT_US`], both counted from the end of the trigger pulse. A poll at or
//! past a bound times out whatever the echo level, so a slow poll rate can lose a reading
//! but never stretch the window. A timeout is a
//! [`RangeMeasurement`] with `valid == false`, never an error; try again on the next loop.
//!
//! [`Rangefinder::measure`] blocks for up to 60 ms. For a loop that must keep running,
//! call [`Rangefinder::start`] once and [`Rangefinder::poll`] every tick.
//!
//! # Example
//!
//! ```rust,no_run
//! # #![no_std]
//! # #![no_main]
//! use device_motion::rangefinder::Rangefinder;
//! # #[panic_handler]
//! # fn panic(_info: &core::panic::PanicInfo) -> ! { loop {} }
//!
//! fn example(p: embassy_rp::Peripherals) {
//!     // The echo line must be level-shifted to 3.3 V.
//!     let mut rangefinder = Rangefinder::new(p.PIN_2, p.PIN_3);
//!
//!     let measurement = rangefinder.measure();
//!     match measurement.millimeters() {
//!         Some(mm) => defmt::info!("distance {} mm", mm),
//!         None => defmt::info!("timeout"),
//!     }
//! }
//! ```

use core::task::Poll;

#[cfg(not(feature = "host"))]
use defmt::debug;
#[cfg(not(feature = "host"))]
use embassy_rp::Peri;
#[cfg(not(feature = "host"))]
use embassy_rp::gpio::{Input, Level, Output, Pin, Pull};
#[cfg(not(feature = "host"))]
use embassy_time::{Duration, block_for};

#[cfg(not(feature = "host"))]
use crate::edge_capture::now_us;

/// Longest wait for the echo to rise, from the end of the trigger pulse (µs).
pub const ECHO_RISE_TIMEOUT_US: u32 = 30_000;

/// Longest wait for the echo to fall, from the end of the trigger pulse (µs).
pub const ECHO_FALL_TIMEOUT_US: u32 = 60_000;

/// Low time before the trigger pulse (µs).
pub const TRIGGER_SETTLE_US: u64 = 2;

/// Trigger pulse width (µs).
pub const TRIGGER_PULSE_US: u64 = 10;

/// Millimeters of distance per microsecond of echo.
pub const MM_PER_ECHO_US: f32 = 0.1716;

/// Result of one measurement cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct RangeMeasurement {
    /// Distance in millimeters (0 when not valid).
    pub distance_mm: u32,
    /// Whether an echo was timed; `false` after a timeout.
    pub valid: bool,
}

impl RangeMeasurement {
    /// No echo within the timeouts.
    pub const TIMEOUT: Self = Self {
        distance_mm: 0,
        valid: false,
    };

    /// Distance for an echo that stayed high for `echo_us`.
    #[must_use]
    pub fn from_echo_us(echo_us: u32) -> Self {
        Self {
            distance_mm: crate::round_to_u32(echo_us as f32 * MM_PER_ECHO_US),
            valid: true,
        }
    }

    /// Distance if valid.
    #[must_use]
    pub const fn millimeters(&self) -> Option<u32> {
        if self.valid {
            Some(self.distance_mm)
        } else {
            None
        }
    }
}

/// Where an [`EchoTracker`] is in its measurement cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum EchoPhase {
    /// No measurement started.
    Idle,
    /// Trigger pulse being sent.
    Trigger,
    /// Waiting for the echo line to go high.
    WaitEchoRise,
    /// Echo went high at `rise_us`; waiting for it to go low.
    WaitEchoFall {
        /// Timestamp of the echo rise (µs).
        rise_us: u32,
    },
    /// Echo timed.
    Done(RangeMeasurement),
    /// No echo within the timeouts.
    Timeout,
}

/// Non-blocking echo timing, independent of any hardware.
///
/// Feed it the echo level and a microsecond timestamp with [`poll`](Self::poll). All
/// elapsed times use wrapping subtraction, so a cycle may straddle the counter wrap.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EchoTracker {
    phase: EchoPhase,
    trigger_us: u32,
}

impl EchoTracker {
    /// Idle tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: EchoPhase::Idle,
            trigger_us: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> EchoPhase {
        self.phase
    }

    /// Mark that a trigger pulse is being sent. Abandons any cycle in progress.
    pub const fn begin_trigger(&mut self) {
        self.phase = EchoPhase::Trigger;
    }

    /// Mark that the trigger pulse ended at `trigger_us`; timeouts count from here.
    pub const fn trigger_sent(&mut self, trigger_us: u32) {
        self.trigger_us = trigger_us;
        self.phase = EchoPhase::WaitEchoRise;
    }

    /// Advance with the echo level sampled at `now_us`.
    ///
    /// Returns `Ready` once the cycle has finished (and keeps returning the same result
    /// until the next trigger), `Pending` while waiting or when no cycle was started.
    pub fn poll(&mut self, echo_high: bool, now_us: u32) -> Poll<RangeMeasurement> {
        let elapsed_us = now_us.wrapping_sub(self.trigger_us);
        match self.phase {
            EchoPhase::Idle | EchoPhase::Trigger => Poll::Pending,
            // A level first seen at or past a bound is too late to trust.
            EchoPhase::WaitEchoRise if elapsed_us >= ECHO_RISE_TIMEOUT_US => self.time_out(),
            EchoPhase::WaitEchoFall { .. } if elapsed_us >= ECHO_FALL_TIMEOUT_US => self.time_out(),
            EchoPhase::WaitEchoRise => {
                if echo_high {
                    self.phase = EchoPhase::WaitEchoFall { rise_us: now_us };
                }
                Poll::Pending
            }
            EchoPhase::WaitEchoFall { rise_us } => {
                if echo_high {
                    return Poll::Pending;
                }
                let measurement = RangeMeasurement::from_echo_us(now_us.wrapping_sub(rise_us));
                self.phase = EchoPhase::Done(measurement);
                Poll::Ready(measurement)
            }
            EchoPhase::Done(measurement) => Poll::Ready(measurement),
            EchoPhase::Timeout => Poll::Ready(RangeMeasurement::TIMEOUT),
        }
    }

    fn time_out(&mut self) -> Poll<RangeMeasurement> {
        self.phase = EchoPhase::Timeout;
        Poll::Ready(RangeMeasurement::TIMEOUT)
    }
}

impl Default for EchoTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A device abstraction for an ultrasonic rangefinder on a trigger output and an echo input.
///
/// See the [module documentation](self) for usage.
#[cfg(not(feature = "host"))]
pub struct Rangefinder<'d> {
    trigger: Output<'d>,
    echo: Input<'d>,
    tracker: EchoTracker,
}

#[cfg(not(feature = "host"))]
impl<'d> Rangefinder<'d> {
    /// Trigger on `trigger_pin` (driven low), echo on `echo_pin` (no pull).
    #[must_use]
    pub fn new<T: Pin, E: Pin>(trigger_pin: Peri<'d, T>, echo_pin: Peri<'d, E>) -> Self {
        Self {
            trigger: Output::new(trigger_pin, Level::Low),
            echo: Input::new(echo_pin, Pull::None),
            tracker: EchoTracker::new(),
        }
    }

    /// Run one full measurement, blocking until the echo is timed or a timeout expires.
    ///
    /// Blocks for at most about [`ECHO_FALL_TIMEOUT_US`] after the trigger. Interrupts keep
    /// running meanwhile.
    pub fn measure(&mut self) -> RangeMeasurement {
        self.start();
        loop {
            if let Poll::Ready(measurement) = self.poll() {
                if !measurement.valid {
                    debug!("range timeout");
                }
                return measurement;
            }
            core::hint::spin_loop();
        }
    }

    /// Send the trigger pulse and begin waiting for the echo.
    ///
    /// Blocks only for the 12 µs of the pulse itself.
    pub fn start(&mut self) {
        self.tracker.begin_trigger();
        self.trigger.set_low();
        block_for(Duration::from_micros(TRIGGER_SETTLE_US));
        self.trigger.set_high();
        block_for(Duration::from_micros(TRIGGER_PULSE_US));
        self.trigger.set_low();
        self.tracker.trigger_sent(now_us());
    }

    /// Sample the echo line once. See [`EchoTracker::poll`].
    pub fn poll(&mut self) -> Poll<RangeMeasurement> {
        let echo_high = self.echo.is_high();
        self.tracker.poll(echo_high, now_us())
    }

    /// Current phase of the measurement cycle.
    #[must_use]
    pub const fn phase(&self) -> EchoPhase {
        self.tracker.phase()
    }
}
