use crate::calibration::{self, Calibration, CalibrationOffset};
use crate::estimator::MotionSample;
use crate::hal::{BoundedRetry, MotionSensor};
use crate::{CalibrationError, Result};
use embedded_hal::blocking::delay::DelayMs;

/// A motion sensor producing calibrated samples.
///
/// Reads fail until offsets are installed with [`set_calibration`](Self::set_calibration)
/// or measured with [`calibrate`](Self::calibrate).
pub struct CalibratedSensor<S> {
    sensor: BoundedRetry<S>,
    calibration: Option<Calibration>,
}

impl<S: MotionSensor> CalibratedSensor<S> {
    pub fn new(sensor: BoundedRetry<S>) -> Self {
        Self {
            sensor,
            calibration: None,
        }
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = Some(calibration);
    }

    /// Read a sample and tag it with mission time `time`.
    pub fn read<D>(&mut self, delay: &mut D, time: f32) -> Result<MotionSample>
    where
        D: DelayMs<u16>,
    {
        let calibration = self.calibration.ok_or(CalibrationError::Missing)?;
        let raw = self.sensor.read(delay)?;
        Ok(calibration.apply(&raw, time))
    }

    /// Sum `iterations` samples at rest and use them as the new offsets.
    pub fn calibrate<D>(
        &mut self,
        iterations: u32,
        interval_ms: u16,
        delay: &mut D,
    ) -> Result<CalibrationOffset>
    where
        D: DelayMs<u16>,
    {
        let offset = calibration::calibrate(&mut self.sensor, delay, iterations, interval_ms)?;
        self.calibration = Some(Calibration::new(offset, iterations));
        Ok(offset)
    }

    pub fn inner_mut(&mut self) -> &mut S {
        self.sensor.sensor_mut()
    }
}
