use crate::calibration::{Calibration, CalibrationOffset};
use crate::clock::MissionTimer;
use crate::config::FlightConfig;
use crate::diagnostics::{DiagnosticsSink, TickRecord};
use crate::estimator::{accel_euler_angles, Estimator, MotionSample};
use crate::hal::{MotionSensor, Sounder, ESC};
use crate::phase::{FlightPhase, PhaseMachine, Transition};
use crate::sensor::CalibratedSensor;
use crate::signal::ShutdownSignal;
use crate::{CalibrationError, Error, Result};
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::Clock;
use nalgebra::Vector3;
use std::path::Path;

mod builder;
pub use builder::Builder;

pub mod control;
pub use control::{CascadeController, ControlOutput, MotorOutput, QuadMotors};

/// Samples averaged for the post-flight drift report.
const DRIFT_SAMPLES: u16 = 100;

/// State of the flight loop, created when the loop starts.
pub struct Flight {
    timer: MissionTimer,
    pub estimator: Estimator,
    pub phase: PhaseMachine,
    pub controller: CascadeController,
    pub tick: u64,
    /// Mission time (in seconds) of the latest sample.
    pub elapsed: f32,
}

/// What a completed flight reports.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightSummary {
    pub ticks: u64,
    pub elapsed: f32,
    /// Integrated roll, pitch and yaw at the end of the flight.
    pub angles: Vector3<f32>,
    /// Tilt implied by gravity after landing, when the sensor could be read.
    pub euler: Option<(f32, f32, f32)>,
}

impl FlightSummary {
    /// Flight loop ticks per second.
    pub fn loop_rate(&self) -> f32 {
        if self.elapsed > 0. {
            self.ticks as f32 / self.elapsed
        } else {
            0.
        }
    }
}

/// A quadcopter flying a fixed takeoff, hover and landing mission.
pub struct Copter<S, E, C, D, P, W> {
    pub sensor: CalibratedSensor<S>,
    pub motors: QuadMotors<E>,
    pub clock: C,
    pub delay: D,
    pub sounder: Sounder<P>,
    pub diagnostics: W,
    pub signal: ShutdownSignal,
    pub config: FlightConfig,
    flight: Option<Flight>,
    is_shut_down: bool,
}

impl<S, E, C, D, P, W> Copter<S, E, C, D, P, W>
where
    S: MotionSensor,
    E: ESC,
    C: Clock<T = u64>,
    D: DelayMs<u16>,
    P: OutputPin,
    P::Error: core::fmt::Debug,
    W: DiagnosticsSink,
{
    pub fn builder() -> Builder<S, E, C, D, P, W> {
        Builder::default()
    }

    /// The current (or last) flight loop state.
    pub fn flight(&self) -> Option<&Flight> {
        self.flight.as_ref()
    }

    /// Calibrate or fly (or both) as configured, with the offsets stored at `offsets`.
    pub fn run(&mut self, offsets: impl AsRef<Path>) -> Result<Option<FlightSummary>> {
        self.config.validate()?;
        self.countdown(5);

        if self.config.calibrate {
            self.calibrate_to(&offsets)?;
        } else if self.config.fly {
            self.load_calibration(&offsets)?;
        }

        if !self.config.fly {
            log::info!("calibration complete");
            return Ok(None);
        }
        self.fly().map(Some)
    }

    /// Measure the sensor offsets at rest and persist them to `path`.
    pub fn calibrate_to(&mut self, path: impl AsRef<Path>) -> Result<CalibrationOffset> {
        let offset = self.sensor.calibrate(
            self.config.calibration_iterations,
            self.config.calibration_interval_ms,
            &mut self.delay,
        )?;

        if let Err(error) = offset.save(path) {
            log::error!("saving calibration: {}", error);
            return Err(error.into());
        }
        Ok(offset)
    }

    /// Install the offsets persisted at `path`.
    pub fn load_calibration(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let offset = match CalibrationOffset::load(path) {
            Ok(offset) => offset,
            Err(error) => {
                log::error!("loading calibration (calibrate on a level surface first): {}", error);
                return Err(error.into());
            }
        };

        self.sensor
            .set_calibration(Calibration::new(offset, self.config.calibration_iterations));
        Ok(())
    }

    /// Arm, spin up and fly the mission until the vehicle is back in `Off`.
    ///
    /// Fails without arming if no offsets are installed. Once armed, every
    /// exit path, successful or not, stops the blades first.
    pub fn fly(&mut self) -> Result<FlightSummary> {
        if !self.sensor.is_calibrated() {
            log::error!("refusing to fly without sensor offsets");
            return Err(CalibrationError::Missing.into());
        }

        self.is_shut_down = false;
        self.motors.arm();

        if let Err(error) = self.prepare() {
            log::warn!("flight abandoned before takeoff: {}", error);
            self.shutdown();
            return Err(error);
        }

        if let Err(error) = self.start() {
            self.shutdown();
            return Err(error);
        }

        loop {
            match self.tick() {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => {
                    log::error!("flight loop failed: {}", error);
                    self.shutdown();
                    return Err(error);
                }
            }
        }

        self.motors.spin_stop();
        let summary = self.report();
        self.shutdown();
        Ok(summary)
    }

    fn prepare(&mut self) -> Result<()> {
        self.countdown(4);
        self.countdown(3);
        self.check_abort()?;
        self.countdown(2);
        self.check_abort()?;

        self.motors.spin_start();
        self.countdown(1);
        self.check_abort()?;

        let spin_up = self.config.spin_up;
        let step = spin_up.step.max(1) as usize;
        for pulse in (0..spin_up.target).step_by(step) {
            self.check_abort()?;
            self.motors.spin_update(pulse as f32);
            self.sounder.toggle();
            self.delay.delay_ms(spin_up.interval_ms);
        }
        Ok(())
    }

    fn countdown(&mut self, beeps: u8) {
        if self.config.countdown {
            self.sounder.countdown(beeps, &mut self.delay);
        }
    }

    fn check_abort(&mut self) -> Result<()> {
        if self.signal.take() {
            Err(Error::Aborted)
        } else {
            Ok(())
        }
    }

    /// Start the mission clock and build the controllers at mission time zero.
    fn start(&mut self) -> Result<()> {
        self.check_abort()?;

        let timer = MissionTimer::start(&self.clock)?;
        self.flight = Some(Flight {
            timer,
            estimator: Estimator::default(),
            phase: PhaseMachine::new(self.config.timing),
            controller: CascadeController::new(&self.config, 0.),
            tick: 0,
            elapsed: 0.,
        });
        log::info!("flight loop started");
        Ok(())
    }

    /// Run one tick of the flight loop, returning `false` once the mission is over.
    pub fn tick(&mut self) -> Result<bool> {
        let flight = match self.flight.as_mut() {
            Some(flight) if !flight.phase.is_finished() => flight,
            _ => return Ok(false),
        };
        flight.tick += 1;

        let shutdown = self.signal.take();
        if shutdown && flight.phase.phase() == FlightPhase::Off {
            log::warn!("shutdown requested before takeoff");
            return Err(Error::Aborted);
        }
        if let Some(transition) = flight.phase.step(flight.elapsed, shutdown) {
            flight.controller.apply_transition(&transition, flight.elapsed);
            indicate(&mut self.sounder, &transition);

            if flight.phase.is_finished() {
                return Ok(false);
            }
        }

        let sample = self.sensor.read(&mut self.delay, flight.elapsed)?;
        let elapsed = flight.timer.elapsed(&self.clock)?;
        let sample = MotionSample {
            time: elapsed,
            ..sample
        };
        let dt = elapsed - flight.elapsed;
        flight.elapsed = elapsed;

        flight.estimator.update(&sample, dt);
        let speed = flight.estimator.speed();
        if flight.phase.observe_vertical_speed(elapsed, speed.z) {
            flight.controller.activate_vertical(elapsed);
        }

        let output = flight.controller.update(sample.gyro, speed, elapsed);
        self.motors.output(&output.motor);

        self.diagnostics.record(&TickRecord {
            elapsed,
            dt,
            tick: flight.tick,
            gyro: sample.gyro,
            accel: sample.accel,
            angles: flight.estimator.attitude.angles,
            speed,
            terms: output.terms,
            rate_target: output.rate_target,
            output: output.motor,
            pulses: self.motors.pulses(),
        });

        Ok(true)
    }

    fn report(&mut self) -> FlightSummary {
        let (ticks, elapsed, angles) = match &self.flight {
            Some(flight) => (flight.tick, flight.elapsed, flight.estimator.attitude.angles),
            None => (0, 0., Vector3::zeros()),
        };

        let euler = match self.resting_euler_angles() {
            Ok(euler) => Some(euler),
            Err(error) => {
                log::warn!("drift report skipped: {}", error);
                None
            }
        };

        let summary = FlightSummary {
            ticks,
            elapsed,
            angles,
            euler,
        };
        log::info!("loop speed {:.1} loops per second", summary.loop_rate());

        if let Some((theta, psi, phi)) = euler {
            log::info!("pitch angle integrated {:.3}, euler {:.3}", angles.y, theta);
            log::info!("roll angle integrated {:.3}, euler {:.3}", angles.x, psi);
            log::info!("yaw angle integrated {:.3}, euler {:.3}", angles.z, phi);
        }
        summary
    }

    fn resting_euler_angles(&mut self) -> Result<(f32, f32, f32)> {
        let mut sum = Vector3::zeros();
        for _ in 0..DRIFT_SAMPLES {
            let sample = self.sensor.read(&mut self.delay, 0.)?;
            let (theta, psi, phi) = accel_euler_angles(sample.accel);
            sum += Vector3::new(theta, psi, phi);
            self.delay.delay_ms(10);
        }

        let mean = sum / DRIFT_SAMPLES as f32;
        Ok((mean.x, mean.y, mean.z))
    }

    /// Stop the blades, flush diagnostics and silence the sounder.
    ///
    /// Only the first call after a flight does anything.
    pub fn shutdown(&mut self) {
        if self.is_shut_down {
            return;
        }
        self.is_shut_down = true;

        self.motors.spin_stop();
        self.diagnostics.flush();
        self.sounder.off();
        log::info!("shutdown complete");
    }
}

fn indicate<P>(sounder: &mut Sounder<P>, transition: &Transition)
where
    P: OutputPin,
    P::Error: core::fmt::Debug,
{
    match transition.to {
        FlightPhase::Ascending | FlightPhase::Descending => sounder.on(),
        FlightPhase::Levelling | FlightPhase::Hovering | FlightPhase::Off => sounder.off(),
    }
}
