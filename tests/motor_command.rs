#![allow(missing_docs)]
//! Host-level tests for signed motor commands.

use device_motion::motor::{Direction, DirectionPin, MotorCommand};

#[test]
fn out_of_range_commands_saturate() {
    assert_eq!(MotorCommand::new(150.0), MotorCommand::new(100.0));
    assert_eq!(MotorCommand::new(-150.0), MotorCommand::new(-100.0));
    assert_eq!(MotorCommand::new(150.0).duty_percent(), 100.0);
    assert_eq!(MotorCommand::new(-150.0).duty_percent(), -100.0);
}

#[test]
fn nan_is_a_stop() {
    assert_eq!(MotorCommand::new(f32::NAN), MotorCommand::STOP);
}

#[test]
fn sign_selects_direction() {
    assert_eq!(MotorCommand::new(40.0).direction(), Some(Direction::Forward));
    assert_eq!(MotorCommand::new(-40.0).direction(), Some(Direction::Reverse));
    assert_eq!(MotorCommand::new(0.0).direction(), None);
    assert_eq!(MotorCommand::new(-0.0).direction(), None);
}

#[test]
fn magnitude_drives_the_active_bridge_input() {
    assert_eq!(MotorCommand::new(60.0).bridge_duties(), (60.0, 0.0));
    assert_eq!(MotorCommand::new(-60.0).bridge_duties(), (0.0, 60.0));
    assert_eq!(MotorCommand::new(250.0).bridge_duties(), (100.0, 0.0));
    assert_eq!(MotorCommand::STOP.bridge_duties(), (0.0, 0.0));
}

#[test]
fn bridge_inputs_are_never_both_driven() {
    let mut duty = -120.0_f32;
    while duty <= 120.0 {
        let (forward, reverse) = MotorCommand::new(duty).bridge_duties();
        assert!(forward == 0.0 || reverse == 0.0, "both driven at {duty}");
        if let Some(pins) = MotorCommand::new(duty).direction_pins() {
            assert_ne!(pins, (true, true), "both pins high at {duty}");
        }
        duty += 7.5;
    }
}

#[test]
fn direction_pins_follow_sign_and_zero_leaves_them() {
    assert_eq!(MotorCommand::new(10.0).direction_pins(), Some((true, false)));
    assert_eq!(MotorCommand::new(-10.0).direction_pins(), Some((false, true)));
    assert_eq!(MotorCommand::STOP.direction_pins(), None);
}

#[test]
fn pair_command_matches_clamped_equivalent() {
    let clamped = (MotorCommand::new(150.0), MotorCommand::new(-150.0));
    let nominal = (MotorCommand::new(100.0), MotorCommand::new(-100.0));
    assert_eq!(clamped, nominal);
    assert_eq!(clamped.0.magnitude(), 100.0);
    assert_eq!(clamped.1.magnitude(), 100.0);
}

#[test]
fn direction_pin_writes_release_before_assert() {
    assert_eq!(
        MotorCommand::new(30.0).direction_pin_writes(),
        Some([(DirectionPin::Reverse, false), (DirectionPin::Forward, true)])
    );
    assert_eq!(
        MotorCommand::new(-30.0).direction_pin_writes(),
        Some([(DirectionPin::Forward, false), (DirectionPin::Reverse, true)])
    );
    assert_eq!(MotorCommand::STOP.direction_pin_writes(), None);
}

#[test]
fn direction_pins_never_both_high_while_switching() {
    let commands = [80.0, -80.0, 0.0, -5.0, 5.0, 100.0, -100.0];
    for start in [(false, false), (true, false), (false, true)] {
        let (mut forward, mut reverse) = start;
        for duty in commands {
            for (pin, high) in MotorCommand::new(duty)
                .direction_pin_writes()
                .into_iter()
                .flatten()
            {
                match pin {
                    DirectionPin::Forward => forward = high,
                    DirectionPin::Reverse => reverse = high,
                }
                assert!(!(forward && reverse), "both high at {duty} from {start:?}");
            }
            if let Some(pins) = MotorCommand::new(duty).direction_pins() {
                assert_eq!((forward, reverse), pins);
            }
        }
    }
}
