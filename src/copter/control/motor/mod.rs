use crate::hal::{PulseRange, ESC};

mod quad;
pub use quad::QuadMotors;

/// Corner of the frame a blade is mounted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub is_back: bool,
    pub is_right: bool,
}

impl Location {
    pub const FRONT_LEFT: Self = Self::new(false, false);
    pub const FRONT_RIGHT: Self = Self::new(false, true);
    pub const BACK_LEFT: Self = Self::new(true, false);
    pub const BACK_RIGHT: Self = Self::new(true, true);

    pub const fn new(is_back: bool, is_right: bool) -> Self {
        Self { is_back, is_right }
    }

    /// Diagonal pairs spin the same way so their torques cancel the other pair's.
    pub fn rotation(&self) -> Rotation {
        if self.is_back == self.is_right {
            Rotation::AntiClockwise
        } else {
            Rotation::Clockwise
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    AntiClockwise,
}

/// Control outputs in pulse units, ready for mixing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotorOutput {
    pub vert: f32,
    pub pitch: i32,
    pub roll: i32,
    pub yaw: i32,
}

/// One propeller and the ESC driving it.
pub struct Blade<E> {
    esc: E,
    location: Location,
    range: PulseRange,
    hover_pulse: u16,
    current_pulse: u16,
}

impl<E: ESC> Blade<E> {
    pub fn new(esc: E, location: Location, range: PulseRange) -> Self {
        Self {
            esc,
            location,
            range,
            hover_pulse: range.min,
            current_pulse: range.min,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn rotation(&self) -> Rotation {
        self.location.rotation()
    }

    pub fn current_pulse(&self) -> u16 {
        self.current_pulse
    }

    pub fn hover_pulse(&self) -> u16 {
        self.hover_pulse
    }

    pub fn arm(&mut self) {
        self.esc.arm();
    }

    pub fn spin_start(&mut self) {
        self.set_pulse(self.range.min);
    }

    /// Make `spin` above the minimum the pulse every update is relative to.
    pub fn spin_handover(&mut self, spin: u16) {
        self.hover_pulse = self.range.clamp(self.range.min as i32 + spin as i32);
    }

    /// Drive the blade `delta` pulse units above its hover pulse.
    pub fn spin_update(&mut self, delta: f32) {
        let pulse = (self.hover_pulse as f32 + delta).trunc() as i32;
        self.set_pulse(self.range.clamp(pulse));
    }

    pub fn spin_stop(&mut self) {
        self.current_pulse = self.range.min;
        self.esc.stop();
    }

    fn set_pulse(&mut self, pulse: u16) {
        log::debug!("blade {:?} pulse {}", self.location, pulse);
        self.current_pulse = pulse;
        self.esc.set_pulse(pulse);
    }
}

#[cfg(test)]
mod tests {
    use super::{Blade, Location, Rotation};
    use crate::hal::mock::RecordingEsc;
    use crate::hal::PulseRange;

    #[test]
    fn torques_cancel() {
        assert_eq!(Location::FRONT_LEFT.rotation(), Rotation::AntiClockwise);
        assert_eq!(Location::BACK_RIGHT.rotation(), Rotation::AntiClockwise);
        assert_eq!(Location::FRONT_RIGHT.rotation(), Rotation::Clockwise);
        assert_eq!(Location::BACK_LEFT.rotation(), Rotation::Clockwise);
    }

    #[test]
    fn updates_are_clamped() {
        let esc = RecordingEsc::default();
        let mut blade = Blade::new(esc.clone(), Location::FRONT_LEFT, PulseRange::RPIO);

        blade.spin_start();
        assert_eq!(blade.current_pulse(), 1000);

        blade.spin_update(550.9);
        assert_eq!(blade.current_pulse(), 1550);

        blade.spin_update(-20.);
        assert_eq!(blade.current_pulse(), 1000);

        blade.spin_update(5000.);
        assert_eq!(blade.current_pulse(), 2000);

        assert_eq!(esc.pulses(), vec![1000, 1550, 1000, 2000]);
    }

    #[test]
    fn handover_moves_the_reference() {
        let esc = RecordingEsc::default();
        let mut blade = Blade::new(esc.clone(), Location::BACK_LEFT, PulseRange::PCA9685);

        blade.spin_handover(100);
        assert_eq!(blade.hover_pulse(), 2148);

        blade.spin_update(10.);
        assert_eq!(esc.last_pulse(), Some(2158));

        blade.spin_stop();
        assert_eq!(blade.current_pulse(), 2048);
        assert_eq!(esc.stops(), 1);
    }
}
