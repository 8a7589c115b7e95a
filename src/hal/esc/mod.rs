mod pwm;
pub use pwm::{Builder, PwmEsc};

/// Inclusive range of pulse widths accepted by a motor backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseRange {
    pub min: u16,
    pub max: u16,
}

impl PulseRange {
    /// DMA-timed GPIO pulses in 1us increments.
    pub const RPIO: Self = Self::new(1000, 2000);

    /// 12-bit PCA9685 PWM controller ticks.
    pub const PCA9685: Self = Self::new(2048, 4096);

    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, pulse: i32) -> u16 {
        pulse.max(self.min as i32).min(self.max as i32) as u16
    }
}

impl Default for PulseRange {
    fn default() -> Self {
        Self::RPIO
    }
}

/// Electronic speed controller
pub trait ESC {
    /// Enable output at the idle pulse.
    fn arm(&mut self);

    /// Drive the motor with a pulse width in backend units.
    fn set_pulse(&mut self, pulse: u16);

    /// Return the motor to idle.
    fn stop(&mut self);
}

impl<T> ESC for &mut T
where
    T: ESC + ?Sized,
{
    fn arm(&mut self) {
        (**self).arm()
    }

    fn set_pulse(&mut self, pulse: u16) {
        (**self).set_pulse(pulse)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}
