use crate::Result;
use embedded_time::{clock, duration::Microseconds, rate::Fraction, Clock, Instant};

/// Monotonic host clock ticking in microseconds.
pub struct SystemClock {
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    type T = u64;

    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> core::result::Result<Instant<Self>, clock::Error> {
        Ok(Instant::new(self.start.elapsed().as_micros() as u64))
    }
}

/// Measures mission time in seconds from a start instant.
pub struct MissionTimer {
    start_us: u64,
}

impl MissionTimer {
    pub fn start<C>(clock: &C) -> Result<Self>
    where
        C: Clock<T = u64>,
    {
        Ok(Self {
            start_us: micros_since_epoch(clock)?,
        })
    }

    /// Seconds elapsed since the timer started.
    pub fn elapsed<C>(&self, clock: &C) -> Result<f32>
    where
        C: Clock<T = u64>,
    {
        let now_us = micros_since_epoch(clock)?;
        Ok(now_us.saturating_sub(self.start_us) as f32 * 1.0e-6)
    }
}

fn micros_since_epoch<C>(clock: &C) -> Result<u64>
where
    C: Clock<T = u64>,
{
    let instant = clock.try_now()?;
    let micros = Microseconds::<u64>::try_from(instant.duration_since_epoch())?;
    Ok(micros.0)
}

#[cfg(test)]
mod tests {
    use super::{MissionTimer, SystemClock};
    use crate::hal::mock::ManualClock;
    use approx::assert_abs_diff_eq;

    #[test]
    fn elapsed_follows_clock() {
        let clock = ManualClock::default();
        clock.advance(3.);

        let timer = MissionTimer::start(&clock).unwrap();
        assert_eq!(timer.elapsed(&clock).unwrap(), 0.);

        clock.advance(0.25);
        assert_abs_diff_eq!(timer.elapsed(&clock).unwrap(), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::default();
        let timer = MissionTimer::start(&clock).unwrap();

        let first = timer.elapsed(&clock).unwrap();
        let second = timer.elapsed(&clock).unwrap();
        assert!(second >= first);
    }
}
