//! Unit tests for piecewise-linear correction through the sensor API

use crate::common::test_utils::image;
use crate::common::{MockAnalog, MockI2c, MockMemory, TestSensor, create_sensor, test_config};
use orp_sensor::{CalibrationPoint, I2cAdc};

/// Sensor loaded with `slots`, reading from a mock I2C converter
fn sensor_with_slots(slots: &[CalibrationPoint]) -> (TestSensor, MockI2c) {
    let memory = MockMemory::with_image(0, &image(slots));
    let (mut sensor, _memory, _analog) = create_sensor(
        test_config(slots.len() as u8, 0),
        memory,
        MockAnalog::new(),
    );
    let i2c = MockI2c::new();
    sensor.select_external_i2c_source(I2cAdc::default(i2c.clone()));
    (sensor, i2c)
}

fn calibrated(sensor: &mut TestSensor, i2c: &MockI2c, raw: i16) -> i32 {
    i2c.set_conversion(raw);
    sensor.get_reading(true).unwrap()
}

#[test]
fn test_three_slot_scenario() {
    let (mut sensor, i2c) = sensor_with_slots(&[
        CalibrationPoint::DISABLED,
        CalibrationPoint::enabled(400, 410),
        CalibrationPoint::enabled(200, 190),
    ]);

    assert_eq!(
        sensor.calibration().used_points(),
        &[
            CalibrationPoint::enabled(200, 190),
            CalibrationPoint::enabled(400, 410),
        ]
    );
    assert_eq!(sensor.calibration().segments().len(), 1);

    assert_eq!(calibrated(&mut sensor, &i2c, 190), 200);
    assert_eq!(calibrated(&mut sensor, &i2c, 410), 400);

    // Interpolated strictly between the two references
    let mid = calibrated(&mut sensor, &i2c, 300);
    assert!(mid > 200 && mid < 400);
    assert_eq!(mid, 300);

    // Extrapolated along the upper segment
    assert_eq!(calibrated(&mut sensor, &i2c, 500), 482);
}

#[test]
fn test_single_point_offset() {
    let (mut sensor, i2c) = sensor_with_slots(&[
        CalibrationPoint::DISABLED,
        CalibrationPoint::enabled(300, 280),
    ]);

    assert_eq!(sensor.calibration().segments().len(), 1);
    assert_eq!(calibrated(&mut sensor, &i2c, 280), 300);
    assert_eq!(calibrated(&mut sensor, &i2c, 0), 20);
    assert_eq!(calibrated(&mut sensor, &i2c, -500), -480);
}

#[test]
fn test_no_points_identity() {
    let (mut sensor, i2c) = sensor_with_slots(&[
        CalibrationPoint::new(false, 300, 280),
        CalibrationPoint::enabled(-300, 280),
    ]);

    assert!(sensor.calibration().used_points().is_empty());
    assert!(sensor.calibration().segments().is_empty());
    assert_eq!(calibrated(&mut sensor, &i2c, 1234), 1234);
    assert_eq!(calibrated(&mut sensor, &i2c, -77), -77);
}

#[test]
fn test_calibration_not_applied_when_disabled() {
    let (mut sensor, i2c) = sensor_with_slots(&[CalibrationPoint::enabled(300, 280)]);

    i2c.set_conversion(280);
    assert_eq!(sensor.get_reading(false).unwrap(), 280);
    assert_eq!(sensor.read_raw().unwrap(), 280);
    assert_eq!(sensor.get_reading(true).unwrap(), 300);
}

#[test]
fn test_duplicate_actual_value_lower_slot_wins() {
    let (sensor, _i2c) = sensor_with_slots(&[
        CalibrationPoint::enabled(100, 150),
        CalibrationPoint::enabled(200, 150),
    ]);
    assert_eq!(
        sensor.calibration().used_points(),
        &[CalibrationPoint::enabled(100, 150)]
    );
}

#[test]
fn test_duplicate_reference_value_lower_slot_wins() {
    let (sensor, _i2c) = sensor_with_slots(&[
        CalibrationPoint::DISABLED,
        CalibrationPoint::enabled(500, 480),
        CalibrationPoint::enabled(500, 300),
        CalibrationPoint::enabled(250, 260),
    ]);
    assert_eq!(
        sensor.calibration().used_points(),
        &[
            CalibrationPoint::enabled(250, 260),
            CalibrationPoint::enabled(500, 480),
        ]
    );
}

#[test]
fn test_used_points_map_exactly_onto_references() {
    let slots = [
        CalibrationPoint::enabled(650, 612),
        CalibrationPoint::enabled(95, 120),
        CalibrationPoint::enabled(1999, 1850),
        CalibrationPoint::enabled(470, 433),
        CalibrationPoint::enabled(225, 251),
        CalibrationPoint::enabled(1, 7),
    ];
    let (mut sensor, i2c) = sensor_with_slots(&slots);
    let used = sensor.calibration().used_points().to_vec();

    assert_eq!(used.len(), slots.len());
    assert!(used.windows(2).all(|pair| pair[0].act_value < pair[1].act_value));
    assert_eq!(sensor.calibration().segments().len(), used.len() - 1);

    for point in &used {
        assert_eq!(
            calibrated(&mut sensor, &i2c, point.act_value),
            i32::from(point.ref_value)
        );
    }
}

#[test]
fn test_extrapolation_uses_outer_segments() {
    let (mut sensor, i2c) = sensor_with_slots(&[
        CalibrationPoint::enabled(100, 100),
        CalibrationPoint::enabled(300, 300),
        CalibrationPoint::enabled(600, 500),
    ]);

    // Upper segment: slope 1.5, intercept -150
    assert_eq!(calibrated(&mut sensor, &i2c, 700), 900);
    assert_eq!(calibrated(&mut sensor, &i2c, 1500), 2100);
    // Lower segment is identity, continued below the first point
    assert_eq!(calibrated(&mut sensor, &i2c, -200), -200);
    // Inner readings pick the segment ending at the next point
    assert_eq!(calibrated(&mut sensor, &i2c, 400), 450);
    assert_eq!(calibrated(&mut sensor, &i2c, 200), 200);
}

#[test]
fn test_write_rebuilds_correction() {
    let (mut sensor, i2c) = sensor_with_slots(&[
        CalibrationPoint::DISABLED,
        CalibrationPoint::DISABLED,
        CalibrationPoint::DISABLED,
    ]);
    assert_eq!(calibrated(&mut sensor, &i2c, 280), 280);

    sensor
        .set_calibration_point(2, CalibrationPoint::enabled(300, 280))
        .unwrap();
    assert_eq!(sensor.calibration().used_count(), 1);
    assert_eq!(calibrated(&mut sensor, &i2c, 280), 300);

    sensor
        .set_calibration_point(0, CalibrationPoint::enabled(500, 520))
        .unwrap();
    assert_eq!(sensor.calibration().used_count(), 2);
    assert_eq!(calibrated(&mut sensor, &i2c, 520), 500);
    assert_eq!(calibrated(&mut sensor, &i2c, 280), 300);

    // Disabling a point removes it from the correction
    sensor
        .set_calibration_point(2, CalibrationPoint::new(false, 300, 280))
        .unwrap();
    assert_eq!(sensor.calibration().used_count(), 1);
    assert_eq!(calibrated(&mut sensor, &i2c, 520), 500);
    assert_eq!(calibrated(&mut sensor, &i2c, 0), -20);
}
