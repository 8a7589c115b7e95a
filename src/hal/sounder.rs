use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;

/// Status buzzer/LED on a digital output.
///
/// The indicator never affects flight, so pin errors are logged and dropped.
pub struct Sounder<P> {
    pin: P,
    is_on: bool,
}

impl<P> Sounder<P>
where
    P: OutputPin,
    P::Error: core::fmt::Debug,
{
    pub fn new(pin: P) -> Self {
        let mut sounder = Self { pin, is_on: true };
        sounder.off();
        sounder
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn on(&mut self) {
        self.set(true)
    }

    pub fn off(&mut self) {
        self.set(false)
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_on)
    }

    pub fn set(&mut self, on: bool) {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };

        match result {
            Ok(()) => self.is_on = on,
            Err(error) => log::debug!("status sounder: {:?}", error),
        }
    }

    /// Sound `beeps` short beeps followed by a two second pause.
    pub fn countdown<D>(&mut self, beeps: u8, delay: &mut D)
    where
        D: DelayMs<u16>,
    {
        for _ in 0..beeps {
            self.on();
            delay.delay_ms(250);
            self.off();
            delay.delay_ms(250);
        }
        delay.delay_ms(2000);
    }
}

#[cfg(test)]
mod tests {
    use super::Sounder;
    use crate::hal::mock::{MockPin, NoDelay};

    #[test]
    fn starts_off_and_toggles() {
        let pin = MockPin::default();
        let mut sounder = Sounder::new(pin.clone());
        assert!(!sounder.is_on());

        sounder.toggle();
        assert!(sounder.is_on());
        assert!(pin.is_high());

        sounder.toggle();
        assert!(!pin.is_high());
    }

    #[test]
    fn countdown_beeps() {
        let pin = MockPin::default();
        let mut sounder = Sounder::new(pin.clone());

        sounder.countdown(3, &mut NoDelay);

        // Initial off plus an on/off pair per beep
        assert_eq!(pin.edges(), vec![false, true, false, true, false, true, false]);
        assert!(!sounder.is_on());
    }
}
