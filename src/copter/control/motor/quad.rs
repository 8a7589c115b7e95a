use super::{Blade, Location, MotorOutput};
use crate::hal::{PulseRange, ESC};

/// Four blades in an X frame.
pub struct QuadMotors<E> {
    /// Front left, front right, back left, back right.
    pub blades: [Blade<E>; 4],
}

impl<E: ESC> QuadMotors<E> {
    pub fn new(front_left: E, front_right: E, back_left: E, back_right: E, range: PulseRange) -> Self {
        Self {
            blades: [
                Blade::new(front_left, Location::FRONT_LEFT, range),
                Blade::new(front_right, Location::FRONT_RIGHT, range),
                Blade::new(back_left, Location::BACK_LEFT, range),
                Blade::new(back_right, Location::BACK_RIGHT, range),
            ],
        }
    }

    /// Pulse delta for the blade at `location`.
    pub fn mix(location: Location, output: &MotorOutput) -> f32 {
        let mut delta = output.vert;

        if location.is_right {
            delta -= output.roll as f32;
        } else {
            delta += output.roll as f32;
        }

        if location.is_back {
            delta += output.pitch as f32;
        } else {
            delta -= output.pitch as f32;
        }

        // Front right and back left
        if location.is_back != location.is_right {
            delta += output.yaw as f32;
        } else {
            delta -= output.yaw as f32;
        }

        delta
    }

    pub fn output(&mut self, output: &MotorOutput) {
        for blade in &mut self.blades {
            let delta = Self::mix(blade.location(), output);
            blade.spin_update(delta);
        }
    }

    pub fn arm(&mut self) {
        self.blades.iter_mut().for_each(Blade::arm);
    }

    pub fn spin_start(&mut self) {
        self.blades.iter_mut().for_each(Blade::spin_start);
    }

    pub fn spin_update(&mut self, delta: f32) {
        for blade in &mut self.blades {
            blade.spin_update(delta);
        }
    }

    pub fn spin_stop(&mut self) {
        self.blades.iter_mut().for_each(Blade::spin_stop);
    }

    pub fn pulses(&self) -> [u16; 4] {
        let [fl, fr, bl, br] = &self.blades;
        [
            fl.current_pulse(),
            fr.current_pulse(),
            bl.current_pulse(),
            br.current_pulse(),
        ]
    }
}
