//! Edge timestamp capture for encoder and other pulse inputs.
//!
//! [`spawn_edge_capture`] configures a GPIO as an input and spawns a capture task for it.
//! The task sleeps until the GPIO bank interrupt reports an edge, timestamps it in
//! microseconds, and records it into a [`PulseMetrics`]. The control loop reads the metrics
//! whenever it likes.
//!
//! Spawn the capture tasks on an [`InterruptExecutor`](embassy_executor::InterruptExecutor)
//! that runs at a higher priority than thread mode. Its tasks then preempt the control
//! loop, so edges are still stamped on time while the loop busy-waits (for example in
//! [`Rangefinder::measure`](crate::rangefinder::Rangefinder::measure)). A task on the
//! thread-mode executor would only run once the loop yields, and would stamp its edges late.
//!
//! Up to [`EDGE_CAPTURE_POOL_SIZE`] lines can be captured at once. Lines are independent:
//! there is no ordering between the metrics of two different lines.
//!
//! # Example
//!
//! ```rust,no_run
//! # #![no_std]
//! # #![no_main]
//! use device_motion::edge_capture::spawn_edge_capture;
//! use device_motion::pulse_metrics::PulseMetrics;
//! use embassy_executor::InterruptExecutor;
//! use embassy_rp::gpio::Pull;
//! use embassy_rp::interrupt;
//! use embassy_rp::interrupt::{InterruptExt, Priority};
//! # #[panic_handler]
//! # fn panic(_info: &core::panic::PanicInfo) -> ! { loop {} }
//!
//! static CAPTURE_EXECUTOR: InterruptExecutor = InterruptExecutor::new();
//! static ENCODER1: PulseMetrics = PulseMetrics::new();
//!
//! #[interrupt]
//! unsafe fn SWI_IRQ_1() {
//!     unsafe { CAPTURE_EXECUTOR.on_interrupt() }
//! }
//!
//! fn example(p: embassy_rp::Peripherals) -> device_motion::Result<()> {
//!     interrupt::SWI_IRQ_1.set_priority(Priority::P2);
//!     let capture_spawner = CAPTURE_EXECUTOR.start(interrupt::SWI_IRQ_1);
//!     spawn_edge_capture(p.PIN_6, Pull::Up, &ENCODER1, capture_spawner)?;
//!
//!     let snapshot = ENCODER1.snapshot();
//!     defmt::info!("high={}us period={}us", snapshot.high_us, snapshot.period_us);
//!     Ok(())
//! }
//! ```

use embassy_executor::SendSpawner;
use embassy_rp::Peri;
use embassy_rp::gpio::{Input, Pin, Pull};
use embassy_time::Instant;

use crate::pulse_metrics::{Edge, PulseMetrics};
use crate::{Error, Result};

/// How many input lines can be captured at the same time.
pub const EDGE_CAPTURE_POOL_SIZE: usize = 4;

/// Configure `pin` as an input with `pull` and record its edges into `metrics` from a
/// background task spawned with `spawner`.
///
/// Pass the spawner of a higher-priority interrupt executor (see the
/// [module documentation](self)). A thread-mode `Spawner` converts with `make_send()`, but
/// then edges wait for the control loop to yield.
///
/// # Errors
///
/// Returns [`Error::TaskSpawn`] if [`EDGE_CAPTURE_POOL_SIZE`] lines are already captured.
pub fn spawn_edge_capture<P: Pin>(
    pin: Peri<'static, P>,
    pull: Pull,
    metrics: &'static PulseMetrics,
    spawner: SendSpawner,
) -> Result<()> {
    let input = Input::new(pin, pull);
    let token = edge_capture_task(input, metrics);
    spawner.spawn(token).map_err(Error::TaskSpawn)?;
    defmt::info!("edge capture started ({} line pool)", EDGE_CAPTURE_POOL_SIZE);
    Ok(())
}

/// Free-running microsecond timestamp; the truncation to `u32` is the wraparound.
#[inline]
#[must_use]
pub fn now_us() -> u32 {
    Instant::now().as_micros() as u32
}

#[embassy_executor::task(pool_size = EDGE_CAPTURE_POOL_SIZE)]
async fn edge_capture_task(mut input: Input<'static>, metrics: &'static PulseMetrics) -> ! {
    // Rise first: a line that starts high skips its partial pulse.
    loop {
        input.wait_for_rising_edge().await;
        metrics.record_edge(Edge::Rising, now_us());
        input.wait_for_falling_edge().await;
        metrics.record_edge(Edge::Falling, now_us());
    }
}
