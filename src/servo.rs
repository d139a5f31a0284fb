//! A device abstraction for hobby positional servos (SG90 and similar).
//!
//! Angles map linearly to pulse widths around a center:
//! `us = center_us + (degrees / half_range_degrees) * half_span_us`, and the result is then
//! clamped to `min_us..=max_us`. Clamping happens after the mapping, so an angle past the
//! end saturates at the endpoint. With the default calibration, -90° is 500 µs, 0° is
//! 1500 µs, and 90° (or 200°) is 2500 µs.
//!
//! See [`Servo`] for usage.

#[cfg(not(feature = "host"))]
use defmt::info;
#[cfg(not(feature = "host"))]
use embassy_rp::pwm::Pwm;

#[cfg(not(feature = "host"))]
use crate::pwm_channel::{PwmChannel, PwmOutput};
use crate::{Error, Result};

/// Servo frame rate (Hz): one pulse every 20 ms.
pub const SERVO_PWM_FREQUENCY_HZ: f32 = 50.0;

/// Default minimum pulse width for hobby servos (microseconds).
pub const SERVO_MIN_US_DEFAULT: u16 = 500;

/// Default maximum pulse width for hobby servos (microseconds).
pub const SERVO_MAX_US_DEFAULT: u16 = 2_500;

/// Default pulse width at 0° (microseconds).
pub const SERVO_CENTER_US_DEFAULT: u16 = 1_500;

/// Default change in pulse width from center to either end (microseconds).
pub const SERVO_HALF_SPAN_US_DEFAULT: u16 = 1_000;

/// Default angle reached at either end of the half span (degrees).
pub const SERVO_HALF_RANGE_DEGREES_DEFAULT: f32 = 90.0;

/// Mapping from angle to pulse width for one servo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServoCalibration {
    center_us: u16,
    half_span_us: u16,
    half_range_degrees: f32,
    min_us: u16,
    max_us: u16,
}

impl ServoCalibration {
    /// The usual hobby-servo calibration: ±90° over 500..=2500 µs.
    pub const DEFAULT: Self = Self {
        center_us: SERVO_CENTER_US_DEFAULT,
        half_span_us: SERVO_HALF_SPAN_US_DEFAULT,
        half_range_degrees: SERVO_HALF_RANGE_DEGREES_DEFAULT,
        min_us: SERVO_MIN_US_DEFAULT,
        max_us: SERVO_MAX_US_DEFAULT,
    };

    /// A custom calibration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] unless `min_us < max_us`, `center_us` lies between
    /// them, and `half_range_degrees` is finite and positive.
    pub fn new(
        center_us: u16,
        half_span_us: u16,
        half_range_degrees: f32,
        min_us: u16,
        max_us: u16,
    ) -> Result<Self> {
        if min_us >= max_us
            || !(min_us..=max_us).contains(&center_us)
            || !half_range_degrees.is_finite()
            || half_range_degrees <= 0.0
        {
            return Err(Error::OutOfRange);
        }
        Ok(Self {
            center_us,
            half_span_us,
            half_range_degrees,
            min_us,
            max_us,
        })
    }

    /// Pulse width (µs) for `degrees`, mapped and then clamped. NaN gives the center.
    #[must_use]
    pub fn pulse_us(&self, degrees: f32) -> f32 {
        if degrees.is_nan() {
            return f32::from(self.center_us);
        }
        let us = f32::from(self.center_us)
            + (degrees / self.half_range_degrees) * f32::from(self.half_span_us);
        us.clamp(f32::from(self.min_us), f32::from(self.max_us))
    }

    /// Shortest pulse (µs).
    #[must_use]
    pub const fn min_us(&self) -> u16 {
        self.min_us
    }

    /// Longest pulse (µs).
    #[must_use]
    pub const fn max_us(&self) -> u16 {
        self.max_us
    }

    /// Pulse at 0° (µs).
    #[must_use]
    pub const fn center_us(&self) -> u16 {
        self.center_us
    }
}

impl Default for ServoCalibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A device abstraction for a positional servo on one PWM output.
///
/// # Examples
/// ```rust,no_run
/// # #![no_std]
/// # #![no_main]
/// use device_motion::servo::{Servo, ServoCalibration};
/// use embassy_rp::pwm::{Config, Pwm};
/// # use core::panic::PanicInfo;
/// # #[panic_handler]
/// # fn panic(_info: &PanicInfo) -> ! { loop {} }
/// async fn example(p: embassy_rp::Peripherals) {
///     // GPIO 15 is output B of PWM slice 7.
///     let pwm = Pwm::new_output_b(p.PWM_SLICE7, p.PIN_15, Config::default());
///     let mut servo = Servo::new_output_b(pwm, ServoCalibration::default());
///
///     servo.set_angle(45.0);  // 2000 µs
///     servo.set_angle(200.0); // saturates at 2500 µs
///     servo.center();         // 1500 µs
///     servo.disable();        // Let the servo relax
///     servo.enable();         // Resume control signals
/// }
/// ```
#[cfg(not(feature = "host"))]
pub struct Servo<'d> {
    channel: PwmChannel<'d>,
    output: PwmOutput,
    calibration: ServoCalibration,
    pulse_us: f32,
}

#[cfg(not(feature = "host"))]
impl<'d> Servo<'d> {
    /// Create a servo on a PWM output A channel.
    ///
    /// See the [struct-level example](Self) for usage.
    #[must_use]
    pub fn new_output_a(pwm: Pwm<'d>, calibration: ServoCalibration) -> Self {
        Self::init(pwm, PwmOutput::A, calibration)
    }

    /// Create a servo on a PWM output B channel.
    ///
    /// See the [struct-level example](Self) for usage.
    #[must_use]
    pub fn new_output_b(pwm: Pwm<'d>, calibration: ServoCalibration) -> Self {
        Self::init(pwm, PwmOutput::B, calibration)
    }

    fn init(pwm: Pwm<'d>, output: PwmOutput, calibration: ServoCalibration) -> Self {
        let channel = PwmChannel::new(pwm, SERVO_PWM_FREQUENCY_HZ);
        info!(
            "servo {} min={}us center={}us max={}us",
            output,
            calibration.min_us(),
            calibration.center_us(),
            calibration.max_us()
        );
        let mut servo = Self {
            channel,
            output,
            calibration,
            pulse_us: 0.0,
        };
        servo.center();
        servo
    }

    /// Move to 0°.
    ///
    /// See the [struct-level example](Self) for usage.
    pub fn center(&mut self) {
        self.set_angle(0.0);
    }

    /// Move to `degrees`; angles past the calibrated range saturate at its ends.
    ///
    /// See the [struct-level example](Self) for usage.
    pub fn set_angle(&mut self, degrees: f32) {
        let us = self.calibration.pulse_us(degrees);
        self.set_pulse_us(us);
    }

    /// Set the raw pulse width in microseconds, clamped to the calibration.
    pub fn set_pulse_us(&mut self, us: f32) {
        let us = if us.is_nan() {
            f32::from(self.calibration.center_us())
        } else {
            us.clamp(
                f32::from(self.calibration.min_us()),
                f32::from(self.calibration.max_us()),
            )
        };
        self.channel.set_pulse_width_us(self.output, us);
        self.pulse_us = us;
    }

    /// Last commanded pulse width (µs).
    #[must_use]
    pub const fn pulse_us(&self) -> f32 {
        self.pulse_us
    }

    /// Stop sending control signals to the servo.
    ///
    /// This allows the servo to relax and move freely, reducing power consumption
    /// and mechanical stress.
    ///
    /// See the [struct-level example](Self) for usage.
    pub fn disable(&mut self) {
        self.channel.set_level(self.output, 0);
    }

    /// Resume sending control signals to the servo.
    ///
    /// The servo will move back to its last commanded position.
    ///
    /// See the [struct-level example](Self) for usage.
    pub fn enable(&mut self) {
        self.channel.set_pulse_width_us(self.output, self.pulse_us);
    }
}
