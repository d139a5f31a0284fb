//! A device abstraction for one PWM slice at a chosen frequency.
//!
//! [`PwmTiming`] holds the pure timing math: given the system clock and a target
//! frequency it picks a clock divider and a wrap (counter top), and converts a percentage
//! or an absolute pulse width into a compare level. [`PwmChannel`] applies a timing to a
//! hardware slice and drives its A and B outputs.
//!
//! The hardware relation is
//! `frequency_hz = sys_clk_hz / (divider * (wrap + 1))`
//! with an 8.4 fixed-point divider in `1.0..=255 + 15/16` and a 16-bit wrap. Requested
//! frequencies that cannot be hit exactly are quantized to the nearest achievable timing;
//! [`PwmTiming::frequency_hz`] reports what was achieved.
//!
//! # Example
//!
//! ```rust,no_run
//! # #![no_std]
//! # #![no_main]
//! use device_motion::pwm_channel::{PwmChannel, PwmOutput};
//! use embassy_rp::pwm::{Config, Pwm};
//! # #[panic_handler]
//! # fn panic(_info: &core::panic::PanicInfo) -> ! { loop {} }
//!
//! fn example(p: embassy_rp::Peripherals) {
//!     // GPIO 8 and 9 share PWM slice 4 (outputs A and B).
//!     let pwm = Pwm::new_output_ab(p.PWM_SLICE4, p.PIN_8, p.PIN_9, Config::default());
//!     let mut channel = PwmChannel::new(pwm, 20_000.0);
//!
//!     channel.set_duty_percent(PwmOutput::A, 50.0);
//!     channel.set_duty_percent(PwmOutput::B, 0.0);
//! }
//! ```

use fixed::types::U12F4;

#[cfg(not(feature = "host"))]
use defmt::info;
#[cfg(not(feature = "host"))]
use embassy_rp::clocks::clk_sys_freq;
#[cfg(not(feature = "host"))]
use embassy_rp::pwm::{Config, Pwm};

/// System clock of a Pico at its default settings (Hz).
pub const SYS_CLK_HZ_DEFAULT: u32 = 125_000_000;

/// Largest wrap used, so that a 100 % level (`wrap + 1`) still fits the 16-bit compare register.
pub const WRAP_MAX: u16 = 0xFFFE;

// Divider limits in sixteenths (8.4 fixed point).
const DIVIDER_MIN_BITS: u16 = 0x0010; // 1.0
const DIVIDER_MAX_BITS: u16 = 0x0FFF; // 255 + 15/16

const COUNTS_MIN: u32 = 2;
const COUNTS_MAX: u32 = WRAP_MAX as u32 + 1;

/// Divider and wrap for one PWM slice, derived from a target frequency.
///
/// Immutable once built; a new frequency means a new timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmTiming {
    sys_clk_hz: u32,
    divider: U12F4,
    wrap: u16,
}

impl PwmTiming {
    /// Derive both divider and wrap for `frequency_hz`.
    ///
    /// Picks the smallest divider whose wrap fits in [`WRAP_MAX`], which gives the most duty
    /// levels. A non-finite or non-positive frequency gives the lowest achievable frequency.
    #[must_use]
    pub fn for_frequency(sys_clk_hz: u32, frequency_hz: f32) -> Self {
        let Some(ticks) = ticks_per_period(sys_clk_hz, frequency_hz) else {
            return Self::slowest(sys_clk_hz);
        };
        let sixteenths = ticks * 16.0;
        let divider_bits = clamp_divider_bits(ceil_to_u32(sixteenths / f64::from(COUNTS_MAX)));
        let counts = round_f64_to_u32(sixteenths / f64::from(divider_bits))
            .clamp(COUNTS_MIN, COUNTS_MAX);
        Self::from_parts(sys_clk_hz, divider_bits, counts)
    }

    /// Keep `wrap` fixed and derive only the divider for `frequency_hz`.
    ///
    /// When the ideal divider is outside its range it is clamped, so the achieved frequency
    /// may differ from the request (see [`frequency_hz`](Self::frequency_hz)).
    #[must_use]
    pub fn with_wrap(sys_clk_hz: u32, frequency_hz: f32, wrap: u16) -> Self {
        let counts = (u32::from(wrap.min(WRAP_MAX)) + 1).max(COUNTS_MIN);
        let divider_bits = match ticks_per_period(sys_clk_hz, frequency_hz) {
            Some(ticks) => {
                clamp_divider_bits(round_f64_to_u32(ticks * 16.0 / f64::from(counts)))
            }
            None => DIVIDER_MAX_BITS,
        };
        Self::from_parts(sys_clk_hz, divider_bits, counts)
    }

    fn slowest(sys_clk_hz: u32) -> Self {
        Self::from_parts(sys_clk_hz, DIVIDER_MAX_BITS, COUNTS_MAX)
    }

    fn from_parts(sys_clk_hz: u32, divider_bits: u16, counts: u32) -> Self {
        let wrap = u16::try_from(counts.saturating_sub(1)).unwrap_or(WRAP_MAX);
        Self {
            sys_clk_hz,
            divider: U12F4::from_bits(divider_bits),
            wrap,
        }
    }

    /// System clock this timing was derived for (Hz).
    #[must_use]
    pub const fn sys_clk_hz(&self) -> u32 {
        self.sys_clk_hz
    }

    /// Clock divider (8.4 fixed point).
    #[must_use]
    pub const fn divider(&self) -> U12F4 {
        self.divider
    }

    /// Counter top; the slice has `wrap + 1` duty levels.
    #[must_use]
    pub const fn wrap(&self) -> u16 {
        self.wrap
    }

    fn counts(&self) -> u32 {
        u32::from(self.wrap) + 1
    }

    /// Frequency actually produced (Hz).
    #[must_use]
    pub fn frequency_hz(&self) -> f32 {
        let sixteenths_per_period = f64::from(self.divider.to_bits()) * f64::from(self.counts());
        (f64::from(self.sys_clk_hz) * 16.0 / sixteenths_per_period) as f32
    }

    /// Period actually produced (µs).
    #[must_use]
    pub fn period_us(&self) -> f32 {
        let sixteenths_per_period = f64::from(self.divider.to_bits()) * f64::from(self.counts());
        (sixteenths_per_period * 1_000_000.0 / (f64::from(self.sys_clk_hz) * 16.0)) as f32
    }

    /// Compare level for a duty percentage: `round(pct / 100 * (wrap + 1))`.
    ///
    /// `pct` is clamped to `0.0..=100.0` (NaN counts as 0), so the level never exceeds
    /// `wrap + 1`.
    #[must_use]
    pub fn duty_level(&self, pct: f32) -> u16 {
        let pct = if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) };
        self.level_from_fraction(pct / 100.0)
    }

    /// Compare level for an absolute pulse width, independent of percentage duty.
    ///
    /// `us` is clamped to one period (NaN counts as 0).
    #[must_use]
    pub fn pulse_width_level(&self, us: f32) -> u16 {
        let period_us = self.period_us();
        let us = if us.is_nan() { 0.0 } else { us.clamp(0.0, period_us) };
        self.level_from_fraction(us / period_us)
    }

    fn level_from_fraction(&self, fraction: f32) -> u16 {
        let counts = self.counts();
        let level = crate::round_to_u32(fraction * counts as f32).min(counts);
        u16::try_from(level).unwrap_or(u16::MAX)
    }
}

/// Counter ticks per period at divider 1, or `None` for an unusable frequency.
fn ticks_per_period(sys_clk_hz: u32, frequency_hz: f32) -> Option<f64> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }
    Some(f64::from(sys_clk_hz) / f64::from(frequency_hz))
}

fn clamp_divider_bits(bits: u32) -> u16 {
    u16::try_from(bits.clamp(u32::from(DIVIDER_MIN_BITS), u32::from(DIVIDER_MAX_BITS)))
        .unwrap_or(DIVIDER_MAX_BITS)
}

fn ceil_to_u32(value: f64) -> u32 {
    // `as` saturates
    libm::ceil(value) as u32
}

fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    libm::round(value) as u32
}

/// One of the two outputs of a PWM slice.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum PwmOutput {
    /// Output A (even GPIO numbers).
    A,
    /// Output B (odd GPIO numbers).
    B,
}

/// A device abstraction for one PWM slice running at a fixed frequency.
///
/// Outputs start at zero duty. See the [module documentation](self) for usage.
#[cfg(not(feature = "host"))]
pub struct PwmChannel<'d> {
    pwm: Pwm<'d>,
    cfg: Config, // Keep the full config so updates never reset the divider
    timing: PwmTiming,
}

#[cfg(not(feature = "host"))]
impl<'d> PwmChannel<'d> {
    /// Program `pwm` for `frequency_hz` using the live system clock.
    ///
    /// The frequency is best effort; see [`PwmTiming::for_frequency`].
    #[must_use]
    pub fn new(pwm: Pwm<'d>, frequency_hz: f32) -> Self {
        Self::with_timing(pwm, PwmTiming::for_frequency(clk_sys_freq(), frequency_hz))
    }

    /// Program `pwm` with an already derived timing.
    #[must_use]
    pub fn with_timing(mut pwm: Pwm<'d>, timing: PwmTiming) -> Self {
        let mut cfg = Config::default();
        cfg.top = timing.wrap();
        cfg.divider = timing.divider();
        cfg.phase_correct = false;
        cfg.compare_a = 0;
        cfg.compare_b = 0;
        cfg.enable = true;
        pwm.set_config(&cfg);

        info!(
            "pwm clk={}Hz div={}/16 top={} freq={}Hz",
            timing.sys_clk_hz(),
            timing.divider().to_bits(),
            timing.wrap(),
            timing.frequency_hz()
        );

        Self { pwm, cfg, timing }
    }

    /// Timing this slice runs at.
    #[must_use]
    pub const fn timing(&self) -> PwmTiming {
        self.timing
    }

    /// Set one output's duty in percent (clamped to `0.0..=100.0`).
    pub fn set_duty_percent(&mut self, output: PwmOutput, pct: f32) {
        let level = self.timing.duty_level(pct);
        self.set_level(output, level);
    }

    /// Set both outputs' duties in a single register update.
    pub fn set_duty_percent_ab(&mut self, a_pct: f32, b_pct: f32) {
        self.cfg.compare_a = self.timing.duty_level(a_pct);
        self.cfg.compare_b = self.timing.duty_level(b_pct);
        self.pwm.set_config(&self.cfg);
    }

    /// Set one output's high time in microseconds (clamped to one period).
    pub fn set_pulse_width_us(&mut self, output: PwmOutput, us: f32) {
        let level = self.timing.pulse_width_level(us);
        self.set_level(output, level);
    }

    /// Set one output's raw compare level (clamped to `wrap + 1`).
    ///
    /// Only the compare register changes; divider and top are reapplied as stored.
    pub fn set_level(&mut self, output: PwmOutput, level: u16) {
        let level = level.min(self.timing.wrap().saturating_add(1));
        match output {
            PwmOutput::A => self.cfg.compare_a = level,
            PwmOutput::B => self.cfg.compare_b = level,
        }
        self.pwm.set_config(&self.cfg);
    }

    /// Current compare level of one output.
    #[must_use]
    pub const fn level(&self, output: PwmOutput) -> u16 {
        match output {
            PwmOutput::A => self.cfg.compare_a,
            PwmOutput::B => self.cfg.compare_b,
        }
    }
}
