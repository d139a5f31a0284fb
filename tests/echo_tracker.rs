#![allow(missing_docs)]
//! Host-level tests for the ultrasonic echo state machine.

use core::task::Poll;
use device_motion::rangefinder::{
    ECHO_FALL_TIMEOUT_US, ECHO_RISE_TIMEOUT_US, EchoPhase, EchoTracker, RangeMeasurement,
};

/// Run `tracker` against an echo that is high for `now` in `rise..fall`, stepping 1 µs.
fn run(tracker: &mut EchoTracker, start_us: u32, rise_us: u32, fall_us: u32) -> (u32, RangeMeasurement) {
    let mut now = start_us;
    loop {
        let offset = now.wrapping_sub(start_us);
        let echo_high = offset >= rise_us.wrapping_sub(start_us) && offset < fall_us.wrapping_sub(start_us);
        if let Poll::Ready(measurement) = tracker.poll(echo_high, now) {
            return (offset, measurement);
        }
        now = now.wrapping_add(1);
    }
}

#[test]
fn echo_time_converts_to_millimeters() {
    assert_eq!(RangeMeasurement::from_echo_us(5_830).distance_mm, 1_000);
    assert_eq!(RangeMeasurement::from_echo_us(0).distance_mm, 0);
    // 100 µs * 0.1716 = 17.16 -> 17; 3 µs * 0.1716 = 0.5148 -> 1
    assert_eq!(RangeMeasurement::from_echo_us(100).distance_mm, 17);
    assert_eq!(RangeMeasurement::from_echo_us(3).distance_mm, 1);
}

#[test]
fn full_cycle_measures_echo_width() {
    let mut tracker = EchoTracker::new();
    tracker.begin_trigger();
    assert_eq!(tracker.phase(), EchoPhase::Trigger);
    tracker.trigger_sent(1_000);
    assert_eq!(tracker.phase(), EchoPhase::WaitEchoRise);

    let (_, measurement) = run(&mut tracker, 1_000, 1_500, 1_500 + 5_830);
    assert_eq!(
        measurement,
        RangeMeasurement {
            distance_mm: 1_000,
            valid: true,
        }
    );
    assert_eq!(measurement.millimeters(), Some(1_000));
    assert_eq!(tracker.phase(), EchoPhase::Done(measurement));
}

#[test]
fn rise_phase_records_rise_time() {
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(0);
    assert_eq!(tracker.poll(false, 100), Poll::Pending);
    assert_eq!(tracker.poll(true, 200), Poll::Pending);
    assert_eq!(tracker.phase(), EchoPhase::WaitEchoFall { rise_us: 200 });
}

#[test]
fn missing_echo_times_out_exactly_at_rise_bound() {
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(0);
    assert_eq!(tracker.poll(false, ECHO_RISE_TIMEOUT_US - 1), Poll::Pending);
    assert_eq!(
        tracker.poll(false, ECHO_RISE_TIMEOUT_US),
        Poll::Ready(RangeMeasurement::TIMEOUT)
    );
    assert_eq!(tracker.phase(), EchoPhase::Timeout);
}

#[test]
fn missing_echo_never_waits_past_rise_bound() {
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(10_000);
    let (elapsed, measurement) = run(&mut tracker, 10_000, u32::MAX, u32::MAX);
    assert!(!measurement.valid);
    assert_eq!(measurement.millimeters(), None);
    assert_eq!(elapsed, ECHO_RISE_TIMEOUT_US);
}

#[test]
fn stuck_high_echo_times_out_at_fall_bound() {
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(0);
    let (elapsed, measurement) = run(&mut tracker, 0, 1_000, u32::MAX);
    assert_eq!(measurement, RangeMeasurement::TIMEOUT);
    assert_eq!(elapsed, ECHO_FALL_TIMEOUT_US);
}

#[test]
fn cycle_straddling_counter_wrap_is_timed() {
    let start = u32::MAX - 2_000;
    let rise = start.wrapping_add(400);
    let fall = rise.wrapping_add(5_830);
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(start);
    let (_, measurement) = run(&mut tracker, start, rise, fall);
    assert_eq!(measurement.millimeters(), Some(1_000));
}

#[test]
fn idle_tracker_stays_pending() {
    let mut tracker = EchoTracker::default();
    assert_eq!(tracker.poll(true, 123), Poll::Pending);
    assert_eq!(tracker.poll(false, 99_999), Poll::Pending);
    assert_eq!(tracker.phase(), EchoPhase::Idle);
}

#[test]
fn finished_cycle_repeats_result_until_next_trigger() {
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(0);
    assert_eq!(
        tracker.poll(false, ECHO_RISE_TIMEOUT_US),
        Poll::Ready(RangeMeasurement::TIMEOUT)
    );
    assert_eq!(
        tracker.poll(true, ECHO_RISE_TIMEOUT_US + 5),
        Poll::Ready(RangeMeasurement::TIMEOUT)
    );

    tracker.begin_trigger();
    assert_eq!(tracker.poll(true, 0), Poll::Pending);
    tracker.trigger_sent(100);
    assert_eq!(tracker.poll(true, 150), Poll::Pending);
    assert_eq!(
        tracker.poll(false, 150 + 5_830),
        Poll::Ready(RangeMeasurement::from_echo_us(5_830))
    );
}

#[test]
fn echo_rise_first_seen_after_rise_bound_is_a_timeout() {
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(0);
    assert_eq!(tracker.poll(false, 10_000), Poll::Pending);
    assert_eq!(
        tracker.poll(true, 50_000),
        Poll::Ready(RangeMeasurement::TIMEOUT)
    );
    assert_eq!(tracker.phase(), EchoPhase::Timeout);
    assert_eq!(
        tracker.poll(false, 55_000),
        Poll::Ready(RangeMeasurement::TIMEOUT)
    );
}

#[test]
fn echo_rise_seen_on_rise_bound_is_a_timeout() {
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(0);
    assert_eq!(
        tracker.poll(true, ECHO_RISE_TIMEOUT_US),
        Poll::Ready(RangeMeasurement::TIMEOUT)
    );
}

#[test]
fn echo_fall_first_seen_after_fall_bound_is_a_timeout() {
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(0);
    assert_eq!(tracker.poll(true, 1_000), Poll::Pending);
    assert_eq!(
        tracker.poll(false, 90_000),
        Poll::Ready(RangeMeasurement::TIMEOUT)
    );
    assert_eq!(tracker.phase(), EchoPhase::Timeout);
}

#[test]
fn sparse_polls_inside_the_window_still_measure() {
    let mut tracker = EchoTracker::new();
    tracker.trigger_sent(0);
    assert_eq!(tracker.poll(false, 5_000), Poll::Pending);
    assert_eq!(tracker.poll(true, 29_999), Poll::Pending);
    assert_eq!(
        tracker.poll(false, 59_999),
        Poll::Ready(RangeMeasurement::from_echo_us(30_000))
    );
}
