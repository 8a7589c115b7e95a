use embedded_hal::PwmPin;
use num_traits::NumCast;

use super::PwmEsc;
use crate::hal::PulseRange;

#[derive(Default)]
pub struct Builder {
    range: PulseRange,
}

impl Builder {
    pub fn range(mut self, range: PulseRange) -> Self {
        self.range = range;
        self
    }

    pub fn build<P>(self, pin: P) -> PwmEsc<P>
    where
        P: PwmPin,
        P::Duty: NumCast,
    {
        PwmEsc::new(self.range, pin)
    }
}
