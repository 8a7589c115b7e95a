mod builder;

pub use builder::Builder;
use embedded_hal::PwmPin;
use num_traits::NumCast;

use super::{PulseRange, ESC};

/// An ESC driven by a PWM channel whose duty is expressed in pulse units.
pub struct PwmEsc<T: PwmPin> {
    range: PulseRange,
    pin: T,
}

impl<T> PwmEsc<T>
where
    T: PwmPin,
    T::Duty: NumCast,
{
    pub fn new(range: PulseRange, pin: T) -> Self {
        Self { range, pin }
    }

    pub fn range(&self) -> PulseRange {
        self.range
    }

    fn write(&mut self, pulse: u16) {
        match <T::Duty as NumCast>::from(pulse) {
            Some(duty) => self.pin.set_duty(duty),
            None => log::error!("pulse {} does not fit the PWM duty type", pulse),
        }
    }
}

impl<T> ESC for PwmEsc<T>
where
    T: PwmPin,
    T::Duty: NumCast,
{
    fn arm(&mut self) {
        self.pin.enable();
        self.write(self.range.min);
    }

    fn set_pulse(&mut self, pulse: u16) {
        let pulse = self.range.clamp(pulse as i32);
        self.write(pulse);
    }

    fn stop(&mut self) {
        self.write(self.range.min);
    }
}
