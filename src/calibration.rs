//! Sensor bias offsets.
//!
//! Offsets are kept as raw sums over the calibration run rather than averages.
//! The divisor is applied when a sample is scaled, which keeps the persisted
//! file integral. The file holds six lines: `ax, ay, az, gx, gy, gz`.

use crate::error::CalibrationError;
use crate::estimator::MotionSample;
use crate::hal::{BoundedRetry, MotionSensor, RawSample};
use crate::Result;
use embedded_hal::blocking::delay::DelayMs;
use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub const CALIBRATION_ITERATIONS: u32 = 100;

/// Most samples whose full-scale sum still fits an `i32`.
pub const MAX_CALIBRATION_ITERATIONS: u32 = (i32::MAX / -(i16::MIN as i32)) as u32;

/// Spacing between calibration samples.
pub const CALIBRATION_INTERVAL_MS: u16 = 50;

/// Accelerometer span in g of the full 16-bit range (+/- 2g).
pub const ACCEL_SPAN: f32 = 4.;

/// Gyroscope span in degrees per second of the full 16-bit range (+/- 500 deg/s).
pub const GYRO_SPAN: f32 = 1000.;

const FULL_RANGE: f32 = 65536.;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CalibrationOffset {
    pub accel: [i32; 3],
    pub gyro: [i32; 3],
}

impl CalibrationOffset {
    pub fn from_array(values: [i32; 6]) -> Self {
        Self {
            accel: [values[0], values[1], values[2]],
            gyro: [values[3], values[4], values[5]],
        }
    }

    pub fn to_array(&self) -> [i32; 6] {
        let [ax, ay, az] = self.accel;
        let [gx, gy, gz] = self.gyro;
        [ax, ay, az, gx, gy, gz]
    }

    /// Accumulate one raw sample into the sums.
    ///
    /// The sums are left untouched if any of them would overflow.
    pub fn accumulate(&mut self, raw: &RawSample) -> Result<(), CalibrationError> {
        let mut next = *self;
        let sums = next.accel.iter_mut().chain(next.gyro.iter_mut());
        for (sum, value) in sums.zip(raw.accel.into_iter().chain(raw.gyro)) {
            *sum = sum
                .checked_add(value as i32)
                .ok_or(CalibrationError::Overflow)?;
        }
        *self = next;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), CalibrationError> {
        for value in self.to_array() {
            writeln!(writer, "{}", value)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, CalibrationError> {
        let mut lines = reader.lines();
        let mut values = [0; 6];

        for (index, value) in values.iter_mut().enumerate() {
            let line = index + 1;
            let text = lines
                .next()
                .ok_or(CalibrationError::MissingValue { line })??;

            *value = text
                .trim()
                .parse()
                .map_err(|_| CalibrationError::InvalidValue { line, value: text })?;
        }

        Ok(Self::from_array(values))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CalibrationError> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }
}

/// Offsets plus the number of samples they were summed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calibration {
    pub offset: CalibrationOffset,
    pub iterations: u32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(CalibrationOffset::default(), CALIBRATION_ITERATIONS)
    }
}

impl Calibration {
    pub fn new(offset: CalibrationOffset, iterations: u32) -> Self {
        Self { offset, iterations }
    }

    /// Remove the bias from a raw sample and scale it to g and degrees per second.
    pub fn apply(&self, raw: &RawSample, time: f32) -> MotionSample {
        let accel = self.scale(raw.accel, self.offset.accel, ACCEL_SPAN);
        let gyro = self.scale(raw.gyro, self.offset.gyro, GYRO_SPAN);
        MotionSample::new(accel, gyro, time)
    }

    fn scale(&self, raw: [i16; 3], offset: [i32; 3], span: f32) -> Vector3<f32> {
        let n = self.iterations as i64;
        let divisor = FULL_RANGE * self.iterations as f32;

        Vector3::from_fn(|axis, _| {
            let unbiased = raw[axis] as i64 * n - offset[axis] as i64;
            unbiased as f32 * span / divisor
        })
    }
}

/// Sum `iterations` raw samples taken `interval_ms` apart.
pub fn calibrate<S, D>(
    sensor: &mut BoundedRetry<S>,
    delay: &mut D,
    iterations: u32,
    interval_ms: u16,
) -> Result<CalibrationOffset>
where
    S: MotionSensor,
    D: DelayMs<u16>,
{
    log::info!("calibrating over {} samples", iterations);

    let mut offset = CalibrationOffset::default();
    for _ in 0..iterations {
        let raw = sensor.read(delay)?;
        offset.accumulate(&raw)?;
        delay.delay_ms(interval_ms);
    }

    log::info!("calibration offsets {:?}", offset.to_array());
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::{
        calibrate, Calibration, CalibrationOffset, CALIBRATION_ITERATIONS, MAX_CALIBRATION_ITERATIONS,
    };
    use crate::error::CalibrationError;
    use crate::estimator::Estimator;
    use crate::hal::mock::{NoDelay, ScriptedSensor};
    use crate::hal::{BoundedRetry, RawSample};
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;

    /// 1g on z with a small bias on every other axis
    fn resting() -> RawSample {
        RawSample::new([12, -40, 16384], 0, [-7, 3, 25])
    }

    #[test]
    fn offsets_round_trip() {
        let offset = CalibrationOffset::from_array([1200, -3400, 1638400, -700, 300, 0]);

        let mut buf = Vec::new();
        offset.write_to(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf.clone()).unwrap(),
            "1200\n-3400\n1638400\n-700\n300\n0\n"
        );

        let read = CalibrationOffset::read_from(Cursor::new(buf)).unwrap();
        assert_eq!(read, offset);
    }

    #[test]
    fn offsets_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("quad-flight-offsets-{}.cfg", std::process::id()));
        let offset = CalibrationOffset::from_array([-1, 2, -3, 4, -5, 6]);

        offset.save(&path).unwrap();
        let read = CalibrationOffset::load(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(read.unwrap(), offset);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = CalibrationOffset::load("/nonexistent/quad-flight/offsets.cfg");
        assert!(matches!(result, Err(CalibrationError::Io(_))));
    }

    #[test]
    fn corrupt_offsets_are_rejected() {
        let result = CalibrationOffset::read_from(Cursor::new("1\n2\nthree\n4\n5\n6\n"));
        match result {
            Err(CalibrationError::InvalidValue { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "three");
            }
            other => panic!("unexpected {:?}", other),
        }

        let result = CalibrationOffset::read_from(Cursor::new("1\n2\n3\n"));
        assert!(matches!(result, Err(CalibrationError::MissingValue { line: 4 })));
    }

    #[test]
    fn calibration_sums_samples() {
        let mut sensor = BoundedRetry::new(ScriptedSensor::constant(resting()), 3);

        let offset = calibrate(&mut sensor, &mut NoDelay, CALIBRATION_ITERATIONS, 50).unwrap();

        assert_eq!(offset.accel, [1200, -4000, 1638400]);
        assert_eq!(offset.gyro, [-700, 300, 2500]);
        assert_eq!(sensor.sensor_mut().reads(), 100);
    }

    #[test]
    fn full_scale_sums_fit_the_iteration_bound() {
        let mut offset = CalibrationOffset::default();
        let floor = RawSample::new([i16::MIN; 3], 0, [i16::MIN; 3]);
        for _ in 0..MAX_CALIBRATION_ITERATIONS {
            offset.accumulate(&floor).unwrap();
        }
        assert_eq!(offset.accel[0], MAX_CALIBRATION_ITERATIONS as i32 * i16::MIN as i32);

        let result = offset.accumulate(&floor);
        assert!(matches!(result, Err(CalibrationError::Overflow)));
        // The sums are kept as they were
        assert_eq!(offset.gyro[2], MAX_CALIBRATION_ITERATIONS as i32 * i16::MIN as i32);
    }

    #[test]
    fn overflowing_sum_is_an_error() {
        let mut offset = CalibrationOffset::from_array([0, 0, 0, 0, 0, i32::MAX - 10]);

        let result = offset.accumulate(&RawSample::new([1, 1, 1], 0, [1, 1, 100]));
        assert!(matches!(result, Err(CalibrationError::Overflow)));
        assert_eq!(offset.to_array(), [0, 0, 0, 0, 0, i32::MAX - 10]);
    }

    #[test]
    fn scaling_removes_bias() {
        let mut sensor = BoundedRetry::new(ScriptedSensor::constant(resting()), 3);
        let offset = calibrate(&mut sensor, &mut NoDelay, CALIBRATION_ITERATIONS, 50).unwrap();
        let calibration = Calibration::new(offset, CALIBRATION_ITERATIONS);

        let sample = calibration.apply(&resting(), 0.);
        assert_eq!(sample.accel.norm(), 0.);
        assert_eq!(sample.gyro.norm(), 0.);

        // Half a g above rest
        let lifted = RawSample::new([12, -40, 16384 + 8192], 0, [-7, 3, 25]);
        let sample = calibration.apply(&lifted, 0.);
        assert_abs_diff_eq!(sample.accel.z, 0.5, epsilon = 1e-6);

        let turning = RawSample::new([12, -40, 16384], 0, [-7 + 6554, 3, 25]);
        let sample = calibration.apply(&turning, 0.);
        assert_abs_diff_eq!(sample.gyro.x, 100., epsilon = 0.01);
    }

    #[test]
    fn resting_vehicle_holds_zero_vertical_speed() {
        let mut sensor = BoundedRetry::new(ScriptedSensor::constant(resting()), 3);
        let offset = calibrate(&mut sensor, &mut NoDelay, CALIBRATION_ITERATIONS, 50).unwrap();
        let calibration = Calibration::new(offset, CALIBRATION_ITERATIONS);

        let mut estimator = Estimator::default();
        for tick in 0..1000 {
            let sample = calibration.apply(&resting(), tick as f32 * 0.005);
            estimator.update(&sample, 0.005);
        }

        assert_abs_diff_eq!(estimator.speed().z, 0., epsilon = 1e-6);
    }
}
