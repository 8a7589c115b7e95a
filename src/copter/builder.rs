use super::{control::QuadMotors, Copter};
use crate::config::FlightConfig;
use crate::hal::{BoundedRetry, MotionSensor, Sounder, ESC};
use crate::sensor::CalibratedSensor;
use crate::signal::ShutdownSignal;
use crate::{Error, Result};
use embedded_hal::digital::v2::OutputPin;

pub struct Builder<S, E, C, D, P, W> {
    sensor: Option<S>,
    escs: Option<[E; 4]>,
    clock: Option<C>,
    delay: Option<D>,
    sounder: Option<P>,
    diagnostics: Option<W>,
    signal: Option<ShutdownSignal>,
    config: FlightConfig,
}

impl<S, E, C, D, P, W> Default for Builder<S, E, C, D, P, W> {
    fn default() -> Self {
        Self {
            sensor: None,
            escs: None,
            clock: None,
            delay: None,
            sounder: None,
            diagnostics: None,
            signal: None,
            config: FlightConfig::default(),
        }
    }
}

impl<S, E, C, D, P, W> Builder<S, E, C, D, P, W>
where
    S: MotionSensor,
    E: ESC,
    P: OutputPin,
    P::Error: core::fmt::Debug,
{
    pub fn sensor(mut self, sensor: S) -> Self {
        self.sensor = Some(sensor);
        self
    }

    /// The ESCs of the front left, front right, back left and back right blades.
    pub fn escs(mut self, front_left: E, front_right: E, back_left: E, back_right: E) -> Self {
        self.escs = Some([front_left, front_right, back_left, back_right]);
        self
    }

    pub fn clock(mut self, clock: C) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn delay(mut self, delay: D) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sounder(mut self, pin: P) -> Self {
        self.sounder = Some(pin);
        self
    }

    pub fn diagnostics(mut self, diagnostics: W) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Share an existing shutdown signal (a fresh one is created otherwise).
    pub fn signal(mut self, signal: ShutdownSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn config(mut self, config: FlightConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Copter<S, E, C, D, P, W>> {
        self.config.validate()?;

        let [front_left, front_right, back_left, back_right] = required(self.escs, "escs")?;
        let motors = QuadMotors::new(
            front_left,
            front_right,
            back_left,
            back_right,
            self.config.pulse_range,
        );

        let sensor = BoundedRetry::new(required(self.sensor, "sensor")?, self.config.sensor_attempts);

        Ok(Copter {
            sensor: CalibratedSensor::new(sensor),
            motors,
            clock: required(self.clock, "clock")?,
            delay: required(self.delay, "delay")?,
            sounder: Sounder::new(required(self.sounder, "sounder")?),
            diagnostics: required(self.diagnostics, "diagnostics")?,
            signal: self.signal.unwrap_or_default(),
            config: self.config,
            flight: None,
            is_shut_down: false,
        })
    }
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| Error::Config(format!("copter is missing its {}", name)))
}
