//! In-memory stand-ins for the hardware seams.

use super::{MotionSensor, RawSample, ESC};
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;
use embedded_time::{clock, rate::Fraction, Clock, Instant};
use std::rc::Rc;

pub struct NoDelay;

impl DelayMs<u16> for NoDelay {
    fn delay_ms(&mut self, _ms: u16) {}
}

#[derive(Debug)]
pub struct BusError;

type Script = Box<dyn FnMut(usize) -> Result<RawSample, BusError>>;

/// Motion sensor replaying a script indexed by the read count.
pub struct ScriptedSensor {
    reads: usize,
    script: Script,
}

impl ScriptedSensor {
    pub fn new(script: impl FnMut(usize) -> Result<RawSample, BusError> + 'static) -> Self {
        Self {
            reads: 0,
            script: Box::new(script),
        }
    }

    pub fn constant(sample: RawSample) -> Self {
        Self::new(move |_| Ok(sample))
    }

    pub fn failing_then(failures: usize, sample: RawSample) -> Self {
        Self::new(move |read| if read < failures { Err(BusError) } else { Ok(sample) })
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl MotionSensor for ScriptedSensor {
    type Error = BusError;

    fn read_raw(&mut self) -> Result<RawSample, BusError> {
        let read = self.reads;
        self.reads += 1;
        (self.script)(read)
    }
}

/// Clock advanced by hand, shared between clones.
#[derive(Clone, Default)]
pub struct ManualClock {
    micros: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn advance(&self, seconds: f32) {
        let micros = (seconds * 1e6).round() as u64;
        self.micros.set(self.micros.get() + micros);
    }
}

impl Clock for ManualClock {
    type T = u64;

    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
        Ok(Instant::new(self.micros.get()))
    }
}

#[derive(Default)]
struct EscState {
    armed: bool,
    pulses: Vec<u16>,
    stops: usize,
}

/// ESC recording every command it receives.
#[derive(Clone, Default)]
pub struct RecordingEsc {
    state: Rc<RefCell<EscState>>,
}

impl RecordingEsc {
    pub fn is_armed(&self) -> bool {
        self.state.borrow().armed
    }

    pub fn pulses(&self) -> Vec<u16> {
        self.state.borrow().pulses.clone()
    }

    pub fn last_pulse(&self) -> Option<u16> {
        self.state.borrow().pulses.last().copied()
    }

    pub fn stops(&self) -> usize {
        self.state.borrow().stops
    }
}

impl ESC for RecordingEsc {
    fn arm(&mut self) {
        self.state.borrow_mut().armed = true;
    }

    fn set_pulse(&mut self, pulse: u16) {
        self.state.borrow_mut().pulses.push(pulse);
    }

    fn stop(&mut self) {
        self.state.borrow_mut().stops += 1;
    }
}

#[derive(Default)]
struct PwmState {
    enabled: bool,
    history: Vec<u16>,
}

#[derive(Clone, Default)]
pub struct MockPwm {
    state: Rc<RefCell<PwmState>>,
}

impl MockPwm {
    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn history(&self) -> Vec<u16> {
        self.state.borrow().history.clone()
    }
}

impl PwmPin for MockPwm {
    type Duty = u16;

    fn disable(&mut self) {
        self.state.borrow_mut().enabled = false;
    }

    fn enable(&mut self) {
        self.state.borrow_mut().enabled = true;
    }

    fn get_duty(&self) -> u16 {
        self.state.borrow().history.last().copied().unwrap_or(0)
    }

    fn get_max_duty(&self) -> u16 {
        u16::MAX
    }

    fn set_duty(&mut self, duty: u16) {
        self.state.borrow_mut().history.push(duty);
    }
}

#[derive(Clone, Default)]
pub struct MockPin {
    edges: Rc<RefCell<Vec<bool>>>,
}

impl MockPin {
    pub fn is_high(&self) -> bool {
        self.edges.borrow().last().copied().unwrap_or(false)
    }

    pub fn edges(&self) -> Vec<bool> {
        self.edges.borrow().clone()
    }
}

impl OutputPin for MockPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.edges.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.edges.borrow_mut().push(true);
        Ok(())
    }
}
