#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, future, panic};
use device_motion::{
    Result,
    rangefinder::Rangefinder,
    servo::{Servo, ServoCalibration},
};
use embassy_executor::Spawner;
use embassy_rp::pwm::{Config, Pwm};
use embassy_time::Timer;
use {defmt::info, defmt_rtt as _, panic_probe as _};

const ANGLES: [f32; 3] = [-30.0, 0.0, 30.0];

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());
    info!("Ultrasonic + Servo demo");

    // Trigger on GPIO 2, echo on GPIO 3. The echo MUST be level-shifted to 3.3 V.
    let mut rangefinder = Rangefinder::new(p.PIN_2, p.PIN_3);

    // GPIO 15 → slice 7, output B
    let mut servo = Servo::new_output_b(
        Pwm::new_output_b(p.PWM_SLICE7, p.PIN_15, Config::default()),
        ServoCalibration::default(),
    );

    for angle in ANGLES.iter().copied().cycle() {
        servo.set_angle(angle);
        Timer::after_millis(300).await; // allow settle

        match rangefinder.measure().millimeters() {
            Some(mm) => info!("Angle {} deg -> distance {} mm", angle, mm),
            None => info!("Angle {} deg -> timeout", angle),
        }
        Timer::after_millis(300).await;
    }

    future::pending().await
}
