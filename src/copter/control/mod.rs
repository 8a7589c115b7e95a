//! Cascaded speed and body rate control.
//!
//! The outer loop turns earth-frame speed errors into body rate targets (and a
//! vertical thrust correction once the vehicle has levelled). The inner loop
//! turns body rate errors into pitch, roll and yaw pulse outputs.

use crate::config::{FlightConfig, RATE_GAINS};
use crate::phase::{FlightPhase, Transition};
use crate::pid::{Gains, PidTerms, PID};
use nalgebra::Vector3;

pub mod motor;
pub use motor::{Blade, Location, MotorOutput, QuadMotors, Rotation};

/// The P, I and D terms of every loop for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlTerms {
    pub eax: PidTerms,
    pub eay: PidTerms,
    pub eaz: PidTerms,
    pub pitch: PidTerms,
    pub roll: PidTerms,
    pub yaw: PidTerms,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlOutput {
    pub terms: ControlTerms,
    /// Pitch (x), roll (y) and yaw (z) rate targets in degrees per second.
    pub rate_target: Vector3<f32>,
    pub motor: MotorOutput,
}

pub struct CascadeController {
    pub eax_speed: PID,
    pub eay_speed: PID,
    /// Only active once the vehicle has levelled.
    pub eaz_speed: Option<PID>,
    vertical_gains: Gains,
    pub pitch_rate: PID,
    pub roll_rate: PID,
    pub yaw_rate: PID,
    /// Earth-frame speed targets in m/s.
    pub speed_target: Vector3<f32>,
    pub baseline_thrust: f32,
    levelling_thrust: f32,
    descent_rate: f32,
}

impl CascadeController {
    /// Build every always-on loop with `now` (in seconds) as its start time.
    pub fn new(config: &FlightConfig, now: f32) -> Self {
        Self {
            eax_speed: PID::new("eax speed", config.horizontal_gains, now),
            eay_speed: PID::new("eay speed", config.horizontal_gains, now),
            eaz_speed: None,
            vertical_gains: config.vertical_gains,
            pitch_rate: PID::new("pitch rate", RATE_GAINS, now),
            roll_rate: PID::new("roll rate", RATE_GAINS, now),
            yaw_rate: PID::new("yaw rate", RATE_GAINS, now),
            speed_target: Vector3::zeros(),
            baseline_thrust: config.takeoff_thrust as f32,
            levelling_thrust: config.levelling_thrust as f32,
            descent_rate: config.descent_rate,
        }
    }

    pub fn is_vertical_active(&self) -> bool {
        self.eaz_speed.is_some()
    }

    /// Start holding vertical speed with a fresh loop.
    pub fn activate_vertical(&mut self, now: f32) {
        log::info!("vertical speed control engaged at {:.3}s", now);
        self.eaz_speed = Some(PID::new("eaz speed", self.vertical_gains, now));
        self.speed_target.z = 0.;
    }

    /// Apply the entry actions of a phase transition.
    pub fn apply_transition(&mut self, transition: &Transition, now: f32) {
        match transition.to {
            FlightPhase::Ascending => self.speed_target.z = 0.,
            FlightPhase::Levelling => {
                self.speed_target.z = 0.;
                self.baseline_thrust = self.levelling_thrust;
            }
            FlightPhase::Hovering => {
                if !self.is_vertical_active() {
                    self.activate_vertical(now);
                }
                self.speed_target.z = 0.;
            }
            FlightPhase::Descending => self.speed_target.z = self.descent_rate,
            FlightPhase::Off => {
                self.speed_target.z = 0.;
                self.baseline_thrust = 0.;
            }
        }
    }

    /// Run both loops for measured body rates `gyro` and earth-frame `speed`.
    pub fn update(&mut self, gyro: Vector3<f32>, speed: Vector3<f32>, now: f32) -> ControlOutput {
        let target = self.speed_target;

        let eax = self.eax_speed.update(speed.x, target.x, now);
        let eay = self.eay_speed.update(speed.y, target.y, now);
        let eaz = match &mut self.eaz_speed {
            Some(pid) => pid.update(speed.z, target.z, now),
            None => PidTerms::default(),
        };

        // Roll is inverted in the body frame
        let rate_target = Vector3::new(eax.sum(), -eay.sum(), 0.);

        let pitch = self.pitch_rate.update(gyro.y, rate_target.x, now);
        let roll = self.roll_rate.update(gyro.x, rate_target.y, now);
        let yaw = self.yaw_rate.update(gyro.z, rate_target.z, now);

        let motor = MotorOutput {
            vert: self.baseline_thrust + eaz.sum(),
            pitch: half_pulse(pitch.sum()),
            roll: half_pulse(roll.sum()),
            yaw: half_pulse(yaw.sum()),
        };

        ControlOutput {
            terms: ControlTerms {
                eax,
                eay,
                eaz,
                pitch,
                roll,
                yaw,
            },
            rate_target,
            motor,
        }
    }
}

fn half_pulse(output: f32) -> i32 {
    (output / 2.).round() as i32
}
