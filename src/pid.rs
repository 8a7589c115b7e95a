/// Largest contribution (in pulse units) the integral term may make.
pub const INTEGRAL_LIMIT: f32 = 250.;

/// Proportional, integral and derivative gains.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gains {
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

impl Gains {
    pub const fn new(p: f32, i: f32, d: f32) -> Self {
        Self { p, i, d }
    }
}

/// The separately scaled output terms of one PID update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PidTerms {
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

impl PidTerms {
    pub fn sum(&self) -> f32 {
        self.p + self.i + self.d
    }
}

/// Single axis PID controller driven by wall-clock time.
///
/// The integral is accumulated with the trapezoid rule and clamped so that
/// `gains.i * integral` never exceeds [`INTEGRAL_LIMIT`] in magnitude.
#[derive(Clone, Debug)]
pub struct PID {
    pub gains: Gains,
    pub last_error: f32,
    /// Time of the last update in seconds.
    pub last_time: f32,
    pub integral: f32,
    /// Clamp for `integral`, `None` when the integral gain is zero.
    integral_bound: Option<f32>,
    label: &'static str,
}

impl PID {
    /// Create a controller whose first update measures time from `now` (in seconds).
    pub fn new(label: &'static str, gains: Gains, now: f32) -> Self {
        let integral_bound = if gains.i != 0. {
            Some(INTEGRAL_LIMIT / gains.i.abs())
        } else {
            None
        };

        Self {
            gains,
            last_error: 0.,
            last_time: now,
            integral: 0.,
            integral_bound,
            label,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Update the controller with the measured `input` and desired `target` at time `now`.
    pub fn update(&mut self, input: f32, target: f32, now: f32) -> PidTerms {
        let dt = now - self.last_time;
        let error = target - input;

        self.integral += (error + self.last_error) * dt / 2.;
        if let Some(bound) = self.integral_bound {
            if self.integral > bound {
                self.integral = bound;
                log::warn!("{} integral cropped to max", self.label);
            } else if self.integral < -bound {
                self.integral = -bound;
                log::warn!("{} integral cropped to min", self.label);
            }
        }

        // No time has passed since the last update
        let derivative = if dt > 0. {
            (error - self.last_error) / dt
        } else {
            0.
        };

        self.last_error = error;
        self.last_time = now;

        PidTerms {
            p: self.gains.p * error,
            i: self.gains.i * self.integral,
            d: self.gains.d * derivative,
        }
    }
}
