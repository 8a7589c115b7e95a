//! Attitude and earth-frame velocity estimation from raw inertial rates.
//!
//! Angles are integrated independently per axis with the trapezoid rule and
//! accelerations are projected into the earth frame using only the cosines of
//! pitch and roll. This is a small-angle approximation that drifts over time.

use nalgebra::Vector3;

/// Standard gravity in m/s^2 per g.
pub const GRAVITY: f32 = 9.80665;

/// One calibrated reading of the motion sensor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionSample {
    /// Body-frame acceleration in g.
    pub accel: Vector3<f32>,
    /// Body-frame angular rate in degrees per second.
    pub gyro: Vector3<f32>,
    /// Mission time (in seconds) the sample was taken.
    pub time: f32,
}

impl MotionSample {
    pub fn new(accel: Vector3<f32>, gyro: Vector3<f32>, time: f32) -> Self {
        Self { accel, gyro, time }
    }
}

/// Accumulated body angles in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttitudeState {
    /// Roll (x), pitch (y) and yaw (z) angles, integrated from the matching gyro axis.
    pub angles: Vector3<f32>,
    pub prev_gyro: Vector3<f32>,
}

impl AttitudeState {
    pub fn roll(&self) -> f32 {
        self.angles.x
    }

    pub fn pitch(&self) -> f32 {
        self.angles.y
    }

    pub fn yaw(&self) -> f32 {
        self.angles.z
    }
}

/// Earth-frame velocities in m/s.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityState {
    pub speed: Vector3<f32>,
    /// Earth-frame acceleration (in g) of the previous tick.
    pub prev_accel: Vector3<f32>,
}

#[derive(Clone, Debug, Default)]
pub struct Estimator {
    pub attitude: AttitudeState,
    pub velocity: VelocityState,
}

impl Estimator {
    /// Integrate one sample taken `dt` seconds after the previous one.
    pub fn update(&mut self, sample: &MotionSample, dt: f32) {
        let attitude = &mut self.attitude;
        attitude.angles += trapezoid(sample.gyro, attitude.prev_gyro, dt);
        attitude.prev_gyro = sample.gyro;

        let earth_accel = earth_frame(sample.accel, attitude.pitch(), attitude.roll());

        let velocity = &mut self.velocity;
        velocity.speed += trapezoid(earth_accel, velocity.prev_accel, dt) * GRAVITY;
        velocity.prev_accel = earth_accel;
    }

    pub fn speed(&self) -> Vector3<f32> {
        self.velocity.speed
    }
}

fn trapezoid(value: Vector3<f32>, prev: Vector3<f32>, dt: f32) -> Vector3<f32> {
    (value + prev) * dt / 2.
}

/// Project a body-frame acceleration into the earth frame using pitch and roll (in degrees).
pub fn earth_frame(accel: Vector3<f32>, pitch: f32, roll: f32) -> Vector3<f32> {
    let cos_pitch = pitch.to_radians().cos();
    let cos_roll = roll.to_radians().cos();

    Vector3::new(
        accel.x * cos_pitch,
        accel.y * cos_roll,
        accel.z * cos_pitch * cos_roll,
    )
}

/// Tilt angles (in degrees) implied by the gravity vector alone.
///
/// Returns `(theta, psi, phi)`: the x axis and y axis angles from horizontal
/// and the z axis angle from vertical.
pub fn accel_euler_angles(accel: Vector3<f32>) -> (f32, f32, f32) {
    let (x, y, z) = (accel.x, accel.y, accel.z);

    let theta = x.atan2((y * y + z * z).sqrt());
    let psi = y.atan2((x * x + z * z).sqrt());
    let phi = (x * x + y * y).sqrt().atan2(z);

    (theta.to_degrees(), psi.to_degrees(), phi.to_degrees())
}
