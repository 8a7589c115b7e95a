use crate::calibration::{
    CALIBRATION_INTERVAL_MS, CALIBRATION_ITERATIONS, MAX_CALIBRATION_ITERATIONS,
};
use crate::hal::PulseRange;
use crate::phase::PhaseTiming;
use crate::pid::Gains;
use crate::{Error, Result};

/// Largest thrust (in pulse units above the minimum) an operator may request.
pub const MAX_THRUST: u16 = 1000;

/// Gains shared by the pitch, roll and yaw rate loops.
pub const RATE_GAINS: Gains = Gains::new(2.5, 5.0, 0.1);

/// Open loop ramp run after arming, before the flight loop starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpinUp {
    pub target: u16,
    pub step: u16,
    pub interval_ms: u16,
}

impl Default for SpinUp {
    fn default() -> Self {
        Self {
            target: 550,
            step: 10,
            interval_ms: 10,
        }
    }
}

/// Startup parameters for a calibration run or a flight.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightConfig {
    pub calibrate: bool,
    pub fly: bool,
    /// Baseline thrust during the ascent.
    pub takeoff_thrust: u16,
    /// Baseline thrust once the ascent period is over.
    pub levelling_thrust: u16,
    pub horizontal_gains: Gains,
    pub vertical_gains: Gains,
    /// Vertical speed target (m/s) while descending.
    pub descent_rate: f32,
    pub timing: PhaseTiming,
    pub spin_up: SpinUp,
    pub calibration_iterations: u32,
    pub calibration_interval_ms: u16,
    pub sensor_attempts: u8,
    pub pulse_range: PulseRange,
    pub countdown: bool,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            calibrate: false,
            fly: true,
            takeoff_thrust: 590,
            levelling_thrust: 570,
            horizontal_gains: Gains::new(12.5, 0.05, 0.),
            vertical_gains: Gains::new(175., 100., 0.),
            descent_rate: -0.15,
            timing: PhaseTiming::default(),
            spin_up: SpinUp::default(),
            calibration_iterations: CALIBRATION_ITERATIONS,
            calibration_interval_ms: CALIBRATION_INTERVAL_MS,
            sensor_attempts: 10,
            pulse_range: PulseRange::default(),
            countdown: true,
        }
    }
}

impl FlightConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.fly && !self.calibrate {
            return Err(Error::Config("nothing to do: enable fly or calibrate".into()));
        }
        if self.takeoff_thrust > MAX_THRUST {
            return Err(Error::Config(format!(
                "takeoff thrust {} exceeds {}",
                self.takeoff_thrust, MAX_THRUST
            )));
        }
        if self.levelling_thrust > MAX_THRUST {
            return Err(Error::Config(format!(
                "levelling thrust {} exceeds {}",
                self.levelling_thrust, MAX_THRUST
            )));
        }
        if self.calibration_iterations == 0 {
            return Err(Error::Config("calibration needs at least one sample".into()));
        }
        if self.calibration_iterations > MAX_CALIBRATION_ITERATIONS {
            return Err(Error::Config(format!(
                "{} calibration samples exceed the limit of {}",
                self.calibration_iterations, MAX_CALIBRATION_ITERATIONS
            )));
        }
        if self.pulse_range.min >= self.pulse_range.max {
            return Err(Error::Config(format!(
                "empty pulse range {}..{}",
                self.pulse_range.min, self.pulse_range.max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FlightConfig;
    use crate::hal::PulseRange;
    use crate::Error;

    #[test]
    fn defaults_are_valid() {
        let config = FlightConfig::default();
        config.validate().unwrap();

        assert_eq!(config.takeoff_thrust, 590);
        assert_eq!(config.vertical_gains.p, 175.);
        assert_eq!(config.pulse_range, PulseRange::RPIO);
    }

    #[test]
    fn rejects_bad_parameters() {
        let idle = FlightConfig {
            fly: false,
            ..FlightConfig::default()
        };
        assert!(matches!(idle.validate(), Err(Error::Config(_))));

        let too_fast = FlightConfig {
            takeoff_thrust: 1001,
            ..FlightConfig::default()
        };
        assert!(matches!(too_fast.validate(), Err(Error::Config(_))));

        let no_samples = FlightConfig {
            calibrate: true,
            calibration_iterations: 0,
            ..FlightConfig::default()
        };
        assert!(matches!(no_samples.validate(), Err(Error::Config(_))));

        let too_many_samples = FlightConfig {
            calibrate: true,
            calibration_iterations: 100_000,
            ..FlightConfig::default()
        };
        assert!(matches!(too_many_samples.validate(), Err(Error::Config(_))));

        let most_samples = FlightConfig {
            calibration_iterations: 65_535,
            ..FlightConfig::default()
        };
        most_samples.validate().unwrap();

        let inverted = FlightConfig {
            pulse_range: PulseRange::new(2000, 1000),
            ..FlightConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(Error::Config(_))));
    }
}
