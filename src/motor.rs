//! A device abstraction for brushed DC motors on an H-bridge.
//!
//! A motor takes a signed duty in percent: the sign picks the direction and the magnitude
//! the PWM duty. Commands outside `-100.0..=100.0` saturate at the nearest bound.
//!
//! Two bridge wirings are supported:
//!
//! - **PWM pair**: the bridge's forward and reverse inputs are the A and B outputs of one
//!   PWM slice (for example GPIO 8 and 9 on slice 4). Both compare levels are written in one
//!   register update, and one of them is always zero.
//! - **Direction pins**: one PWM output drives the bridge's enable input, and two GPIOs
//!   select forward or reverse. The opposite pin is released before the new one is asserted,
//!   so both are never high together.
//!
//! [`Motor::stop`] sets the duty to zero and leaves the direction pins alone, so the motor
//! coasts.
//!
//! # Example
//!
//! ```rust,no_run
//! # #![no_std]
//! # #![no_main]
//! use device_motion::motor::{Motor, MotorPair};
//! use embassy_rp::pwm::{Config, Pwm};
//! # #[panic_handler]
//! # fn panic(_info: &core::panic::PanicInfo) -> ! { loop {} }
//!
//! fn example(p: embassy_rp::Peripherals) {
//!     let left = Motor::new_pwm_pair(Pwm::new_output_ab(
//!         p.PWM_SLICE4, p.PIN_8, p.PIN_9, Config::default(),
//!     ));
//!     let right = Motor::new_pwm_pair(Pwm::new_output_ab(
//!         p.PWM_SLICE5, p.PIN_10, p.PIN_11, Config::default(),
//!     ));
//!     let mut motors = MotorPair::new(left, right);
//!
//!     motors.set_command(60.0, -60.0); // spin in place
//!     motors.stop();
//! }
//! ```

#[cfg(not(feature = "host"))]
use embassy_rp::gpio::{Level, Output};
#[cfg(not(feature = "host"))]
use embassy_rp::pwm::Pwm;

#[cfg(not(feature = "host"))]
use crate::pwm_channel::{PwmChannel, PwmOutput};

/// PWM frequency for DC motors (Hz), above the audible range.
pub const MOTOR_PWM_FREQUENCY_HZ: f32 = 20_000.0;

/// Largest duty magnitude (%).
pub const MOTOR_DUTY_MAX: f32 = 100.0;

/// Direction of rotation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum Direction {
    /// Positive duty.
    Forward,
    /// Negative duty.
    Reverse,
}

/// One of the two direction inputs of a bridge driven by a pin pair.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum DirectionPin {
    /// Asserted for forward rotation.
    Forward,
    /// Asserted for reverse rotation.
    Reverse,
}

/// A signed duty command, already clamped to `-100.0..=100.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct MotorCommand {
    duty_percent: f32,
}

impl MotorCommand {
    /// No drive.
    pub const STOP: Self = Self { duty_percent: 0.0 };

    /// Clamp `duty_percent` into range. NaN becomes a stop.
    #[must_use]
    pub fn new(duty_percent: f32) -> Self {
        if duty_percent.is_nan() {
            return Self::STOP;
        }
        Self {
            duty_percent: duty_percent.clamp(-MOTOR_DUTY_MAX, MOTOR_DUTY_MAX),
        }
    }

    /// Signed duty in percent.
    #[must_use]
    pub const fn duty_percent(&self) -> f32 {
        self.duty_percent
    }

    /// Duty magnitude in percent (`0.0..=100.0`).
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        self.duty_percent.abs()
    }

    /// Direction implied by the sign, or `None` for a zero command.
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        if self.duty_percent > 0.0 {
            Some(Direction::Forward)
        } else if self.duty_percent < 0.0 {
            Some(Direction::Reverse)
        } else {
            None
        }
    }

    /// Duties for the forward and reverse inputs of a PWM-pair bridge.
    ///
    /// At most one of the two is nonzero.
    #[must_use]
    pub fn bridge_duties(&self) -> (f32, f32) {
        match self.direction() {
            Some(Direction::Forward) => (self.magnitude(), 0.0),
            Some(Direction::Reverse) => (0.0, self.magnitude()),
            None => (0.0, 0.0),
        }
    }

    /// Levels of the forward and reverse direction pins, or `None` to leave them as they are.
    ///
    /// Never `(true, true)`.
    #[must_use]
    pub fn direction_pins(&self) -> Option<(bool, bool)> {
        self.direction().map(|direction| match direction {
            Direction::Forward => (true, false),
            Direction::Reverse => (false, true),
        })
    }

    /// Pin writes that take a direction-pin bridge to this command, in the order to apply
    /// them, or `None` to leave the pins as they are.
    ///
    /// The opposite pin is always released before the active one is asserted, so whatever
    /// the pins held before, no prefix of the sequence leaves both high.
    #[must_use]
    pub fn direction_pin_writes(&self) -> Option<[(DirectionPin, bool); 2]> {
        self.direction().map(|direction| match direction {
            Direction::Forward => [(DirectionPin::Reverse, false), (DirectionPin::Forward, true)],
            Direction::Reverse => [(DirectionPin::Forward, false), (DirectionPin::Reverse, true)],
        })
    }
}

#[cfg(not(feature = "host"))]
enum Bridge<'d> {
    PwmPair(PwmChannel<'d>),
    DirectionPins {
        channel: PwmChannel<'d>,
        output: PwmOutput,
        forward: Output<'d>,
        reverse: Output<'d>,
    },
}

/// A device abstraction for one DC motor. See the [module documentation](self) for usage.
#[cfg(not(feature = "host"))]
pub struct Motor<'d> {
    bridge: Bridge<'d>,
    command: MotorCommand,
}

#[cfg(not(feature = "host"))]
impl<'d> Motor<'d> {
    /// Motor whose bridge inputs are outputs A (forward) and B (reverse) of `pwm`'s slice.
    ///
    /// Create `pwm` with `Pwm::new_output_ab`. The motor starts stopped.
    #[must_use]
    pub fn new_pwm_pair(pwm: Pwm<'d>) -> Self {
        let channel = PwmChannel::new(pwm, MOTOR_PWM_FREQUENCY_HZ);
        Self {
            bridge: Bridge::PwmPair(channel),
            command: MotorCommand::STOP,
        }
    }

    /// Motor with a PWM enable on `output` of `pwm`'s slice and a forward/reverse pin pair.
    ///
    /// Both direction pins are driven low here. The motor starts stopped.
    #[must_use]
    pub fn new_with_direction_pins(
        pwm: Pwm<'d>,
        output: PwmOutput,
        mut forward: Output<'d>,
        mut reverse: Output<'d>,
    ) -> Self {
        forward.set_low();
        reverse.set_low();
        let channel = PwmChannel::new(pwm, MOTOR_PWM_FREQUENCY_HZ);
        Self {
            bridge: Bridge::DirectionPins {
                channel,
                output,
                forward,
                reverse,
            },
            command: MotorCommand::STOP,
        }
    }

    /// Drive at a signed duty in percent, saturating outside `-100.0..=100.0`.
    pub fn set_duty_percent(&mut self, duty_percent: f32) {
        self.apply(MotorCommand::new(duty_percent));
    }

    /// Zero duty without touching the direction pins (coast).
    pub fn stop(&mut self) {
        match &mut self.bridge {
            Bridge::PwmPair(channel) => channel.set_duty_percent_ab(0.0, 0.0),
            Bridge::DirectionPins {
                channel, output, ..
            } => channel.set_duty_percent(*output, 0.0),
        }
        self.command = MotorCommand::STOP;
    }

    /// Last applied command.
    #[must_use]
    pub const fn command(&self) -> MotorCommand {
        self.command
    }

    fn apply(&mut self, command: MotorCommand) {
        match &mut self.bridge {
            Bridge::PwmPair(channel) => {
                let (forward_pct, reverse_pct) = command.bridge_duties();
                channel.set_duty_percent_ab(forward_pct, reverse_pct);
            }
            Bridge::DirectionPins {
                channel,
                output,
                forward,
                reverse,
            } => {
                for (pin, high) in command.direction_pin_writes().into_iter().flatten() {
                    let pin_output = match pin {
                        DirectionPin::Forward => &mut *forward,
                        DirectionPin::Reverse => &mut *reverse,
                    };
                    pin_output.set_level(Level::from(high));
                }
                channel.set_duty_percent(*output, command.magnitude());
            }
        }
        self.command = command;
    }
}

/// Left and right motors of a differential drive.
#[cfg(not(feature = "host"))]
pub struct MotorPair<'d> {
    left: Motor<'d>,
    right: Motor<'d>,
}

#[cfg(not(feature = "host"))]
impl<'d> MotorPair<'d> {
    /// Pair two motors.
    #[must_use]
    pub const fn new(left: Motor<'d>, right: Motor<'d>) -> Self {
        Self { left, right }
    }

    /// Signed duties for both sides; each saturates at `-100.0..=100.0`.
    pub fn set_command(&mut self, left_pct: f32, right_pct: f32) {
        self.left.set_duty_percent(left_pct);
        self.right.set_duty_percent(right_pct);
    }

    /// Coast both motors.
    pub fn stop(&mut self) {
        self.left.stop();
        self.right.stop();
    }

    /// Last applied commands, left then right.
    #[must_use]
    pub const fn command(&self) -> (MotorCommand, MotorCommand) {
        (self.left.command(), self.right.command())
    }

    /// Left motor.
    pub fn left(&mut self) -> &mut Motor<'d> {
        &mut self.left
    }

    /// Right motor.
    pub fn right(&mut self) -> &mut Motor<'d> {
        &mut self.right
    }
}
