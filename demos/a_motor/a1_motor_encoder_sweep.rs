#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]
#![expect(unsafe_code, reason = "interrupt executor handler")]

use core::{convert::Infallible, panic};
use device_motion::{
    Result,
    edge_capture::spawn_edge_capture,
    motor::{Motor, MotorPair},
    pulse_metrics::PulseMetrics,
};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::interrupt;
use embassy_rp::{
    gpio::Pull,
    interrupt::{InterruptExt, Priority},
    pwm::{Config, Pwm},
};
use embassy_time::Timer;
use {defmt::info, defmt_rtt as _, panic_probe as _};

// Encoder capture preempts the control loop, so edges keep their timestamps while it blocks.
static CAPTURE_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

static ENCODER1: PulseMetrics = PulseMetrics::new();
static ENCODER2: PulseMetrics = PulseMetrics::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    unsafe { CAPTURE_EXECUTOR.on_interrupt() }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());
    info!("[Motor + Encoder Demo]");

    // Motor 1 on GPIO 8 (forward) / 9 (backward), motor 2 on GPIO 10 / 11.
    let motor1 = Motor::new_pwm_pair(Pwm::new_output_ab(
        p.PWM_SLICE4,
        p.PIN_8,
        p.PIN_9,
        Config::default(),
    ));
    let motor2 = Motor::new_pwm_pair(Pwm::new_output_ab(
        p.PWM_SLICE5,
        p.PIN_10,
        p.PIN_11,
        Config::default(),
    ));
    let mut motors = MotorPair::new(motor1, motor2);

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let capture_spawner = CAPTURE_EXECUTOR.start(interrupt::SWI_IRQ_1);

    // Encoder outputs are open-collector; pull up.
    spawn_edge_capture(p.PIN_6, Pull::Up, &ENCODER1, capture_spawner)?;
    spawn_edge_capture(p.PIN_4, Pull::Up, &ENCODER2, capture_spawner)?;

    loop {
        info!("Forward sweep");
        sweep(&mut motors, 1.0).await;
        motors.stop();
        Timer::after_millis(1_500).await;

        info!("Backward sweep");
        sweep(&mut motors, -1.0).await;
        motors.stop();
        Timer::after_millis(2_000).await;
    }
}

async fn sweep(motors: &mut MotorPair<'_>, sign: f32) {
    for speed in (20..=100_u8).step_by(20) {
        let duty = sign * f32::from(speed);
        motors.set_command(duty, duty);
        let encoder1 = ENCODER1.snapshot();
        let encoder2 = ENCODER2.snapshot();
        info!(
            "Speed {}% | ENC1 high={}us period={}us | ENC2 high={}us period={}us",
            duty,
            encoder1.high_us,
            encoder1.period_us,
            encoder2.high_us,
            encoder2.period_us
        );
        Timer::after_millis(1_000).await;
    }
}
