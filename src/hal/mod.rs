use crate::{Error, Result};
use embedded_hal::blocking::delay::DelayMs;

pub mod esc;
pub use esc::{PulseRange, PwmEsc, ESC};

mod sounder;
pub use sounder::Sounder;

#[cfg(test)]
pub(crate) mod mock;

/// The seven signed 16-bit output registers of the motion sensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawSample {
    pub accel: [i16; 3],
    pub temperature: i16,
    pub gyro: [i16; 3],
}

impl RawSample {
    pub fn new(accel: [i16; 3], temperature: i16, gyro: [i16; 3]) -> Self {
        Self {
            accel,
            temperature,
            gyro,
        }
    }

    /// Die temperature in degrees Celsius.
    pub fn celsius(&self) -> f32 {
        self.temperature as f32 / 340. + 36.53
    }
}

/// A six-axis accelerometer/gyroscope.
pub trait MotionSensor {
    type Error: core::fmt::Debug;

    /// Block until the next sample is ready and read it.
    fn read_raw(&mut self) -> core::result::Result<RawSample, Self::Error>;
}

impl<T> MotionSensor for &mut T
where
    T: MotionSensor + ?Sized,
{
    type Error = T::Error;

    fn read_raw(&mut self) -> core::result::Result<RawSample, Self::Error> {
        (**self).read_raw()
    }
}

/// Retries failed reads of a [`MotionSensor`] a bounded number of times.
pub struct BoundedRetry<S> {
    sensor: S,
    attempts: u8,
}

impl<S> BoundedRetry<S>
where
    S: MotionSensor,
{
    pub fn new(sensor: S, attempts: u8) -> Self {
        Self {
            sensor,
            attempts: attempts.max(1),
        }
    }

    /// Read a sample, waiting 1ms between failed attempts.
    ///
    /// Gives up with [`Error::SensorUnavailable`] once every attempt failed.
    pub fn read<D>(&mut self, delay: &mut D) -> Result<RawSample>
    where
        D: DelayMs<u16>,
    {
        for attempt in 1..=self.attempts {
            match self.sensor.read_raw() {
                Ok(sample) => return Ok(sample),
                Err(error) => {
                    log::warn!(
                        "sensor read failed ({}/{}): {:?}",
                        attempt,
                        self.attempts,
                        error
                    );
                    delay.delay_ms(1);
                }
            }
        }

        log::error!("sensor unavailable");
        Err(Error::SensorUnavailable {
            attempts: self.attempts,
        })
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}
