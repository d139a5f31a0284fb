//! Latest-sample pulse timing shared between an edge-capture task and the control loop.
//!
//! [`PulseMetrics`] holds the most recent period and high time of a digital signal, such as
//! a single-channel wheel encoder. Edges are recorded with [`PulseMetrics::record_edge`],
//! normally by the capture task from [`edge_capture`](mod@crate::edge_capture), and read with
//! [`PulseMetrics::snapshot`].
//!
//! # Concurrency
//!
//! Each field has exactly one writer (the capture path) and one reader (the control loop).
//! Writes are single 32-bit stores with no lock. Reads that need more than one field take a
//! short critical section so the pair is never torn (an old period with a new high time).
//!
//! # Timestamps
//!
//! Timestamps are free-running microseconds that wrap at 2^32 (about 71.6 minutes). All
//! deltas use wrapping subtraction, so a rise at `4_294_967_290` followed by a rise at `10`
//! is a period of 16 µs.
//!
//! # Example
//!
//! ```rust
//! use device_motion::pulse_metrics::{Edge, PulseMetrics};
//!
//! static ENCODER: PulseMetrics = PulseMetrics::new();
//!
//! ENCODER.record_edge(Edge::Rising, 1_000);
//! ENCODER.record_edge(Edge::Falling, 1_450);
//! ENCODER.record_edge(Edge::Rising, 1_600);
//!
//! let snapshot = ENCODER.snapshot();
//! assert_eq!(snapshot.period_us, 600);
//! assert_eq!(snapshot.high_us, 450);
//! ```

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Direction of a digital transition.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
}

/// Period and high time read together.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct PulseSnapshot {
    /// Microseconds between the last two rising edges (0 until two rises are seen).
    pub period_us: u32,
    /// Microseconds from the last rising edge to the falling edge after it (0 until seen).
    pub high_us: u32,
}

impl PulseSnapshot {
    /// Percentage of the period spent high, or `None` before a period is known.
    #[must_use]
    pub fn duty_percent(&self) -> Option<f32> {
        if self.period_us == 0 {
            return None;
        }
        Some(self.high_us as f32 * 100.0 / self.period_us as f32)
    }

    /// Pulse frequency in hertz, or `None` before a period is known.
    #[must_use]
    pub fn frequency_hz(&self) -> Option<f32> {
        if self.period_us == 0 {
            return None;
        }
        Some(1_000_000.0 / self.period_us as f32)
    }
}

/// Every field of [`PulseMetrics`] read together.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct PulseSample {
    /// Timestamp (µs) of the last rising edge.
    pub last_rise_us: u32,
    /// Timestamp (µs) of the last falling edge that followed a rise.
    pub last_fall_us: u32,
    /// See [`PulseSnapshot::period_us`].
    pub period_us: u32,
    /// See [`PulseSnapshot::high_us`].
    pub high_us: u32,
}

impl PulseSample {
    /// Microseconds since the last rising edge, tolerant of counter wraparound.
    ///
    /// A large age means the signal has stopped and `period_us` is stale.
    #[must_use]
    pub const fn age_us(&self, now_us: u32) -> u32 {
        now_us.wrapping_sub(self.last_rise_us)
    }

    /// The period and high time alone.
    #[must_use]
    pub const fn snapshot(&self) -> PulseSnapshot {
        PulseSnapshot {
            period_us: self.period_us,
            high_us: self.high_us,
        }
    }
}

/// Latest pulse timing for one input line.
///
/// Create as a `static` with [`new`](Self::new) and share `&'static` references with the
/// capture task and the control loop. See the [module documentation](self) for an example.
pub struct PulseMetrics {
    has_rise: AtomicBool,
    last_rise_us: AtomicU32,
    last_fall_us: AtomicU32,
    period_us: AtomicU32,
    high_us: AtomicU32,
}

impl PulseMetrics {
    /// Zeroed metrics with no rise recorded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            has_rise: AtomicBool::new(false),
            last_rise_us: AtomicU32::new(0),
            last_fall_us: AtomicU32::new(0),
            period_us: AtomicU32::new(0),
            high_us: AtomicU32::new(0),
        }
    }

    /// Record one edge seen at `now_us`.
    ///
    /// On a rise, updates the period if an earlier rise exists, then stores the new rise
    /// time. On a fall, updates the high time if a rise exists. Never blocks.
    ///
    /// Call only from the single capture path that owns this line.
    pub fn record_edge(&self, edge: Edge, now_us: u32) {
        let has_rise = self.has_rise.load(Ordering::Acquire);
        match edge {
            Edge::Rising => {
                if has_rise {
                    let last_rise_us = self.last_rise_us.load(Ordering::Relaxed);
                    self.period_us
                        .store(now_us.wrapping_sub(last_rise_us), Ordering::Release);
                }
                self.last_rise_us.store(now_us, Ordering::Release);
                if !has_rise {
                    self.has_rise.store(true, Ordering::Release);
                }
            }
            Edge::Falling => {
                if has_rise {
                    let last_rise_us = self.last_rise_us.load(Ordering::Relaxed);
                    self.high_us
                        .store(now_us.wrapping_sub(last_rise_us), Ordering::Release);
                    self.last_fall_us.store(now_us, Ordering::Release);
                }
            }
        }
    }

    /// Period and high time, read inside a critical section so the pair is consistent.
    #[must_use]
    pub fn snapshot(&self) -> PulseSnapshot {
        critical_section::with(|_| PulseSnapshot {
            period_us: self.period_us.load(Ordering::Acquire),
            high_us: self.high_us.load(Ordering::Acquire),
        })
    }

    /// All fields, read inside a critical section.
    #[must_use]
    pub fn sample(&self) -> PulseSample {
        critical_section::with(|_| PulseSample {
            last_rise_us: self.last_rise_us.load(Ordering::Acquire),
            last_fall_us: self.last_fall_us.load(Ordering::Acquire),
            period_us: self.period_us.load(Ordering::Acquire),
            high_us: self.high_us.load(Ordering::Acquire),
        })
    }

    /// Latest period alone (a single word, no critical section needed).
    #[must_use]
    pub fn period_us(&self) -> u32 {
        self.period_us.load(Ordering::Acquire)
    }

    /// Latest high time alone (a single word, no critical section needed).
    #[must_use]
    pub fn high_us(&self) -> u32 {
        self.high_us.load(Ordering::Acquire)
    }

    /// Whether at least one rising edge has been recorded since creation or reset.
    #[must_use]
    pub fn has_rise(&self) -> bool {
        self.has_rise.load(Ordering::Acquire)
    }

    /// Forget all edges, as if newly created.
    pub fn reset(&self) {
        critical_section::with(|_| {
            self.has_rise.store(false, Ordering::Release);
            self.last_rise_us.store(0, Ordering::Release);
            self.last_fall_us.store(0, Ordering::Release);
            self.period_us.store(0, Ordering::Release);
            self.high_us.store(0, Ordering::Release);
        });
    }
}

impl Default for PulseMetrics {
    fn default() -> Self {
        Self::new()
    }
}
