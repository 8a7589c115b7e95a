//! Flight phase state machine.
//!
//! Events are derived once per tick from mission time, the pending shutdown
//! signal and apex detection. Each tick advances at most one phase.

use core::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlightPhase {
    #[default]
    Off,
    Ascending,
    Levelling,
    Hovering,
    Descending,
}

impl fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlightPhase::Off => "off",
            FlightPhase::Ascending => "ascending",
            FlightPhase::Levelling => "levelling",
            FlightPhase::Hovering => "hovering",
            FlightPhase::Descending => "descending",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightEvent {
    None,
    /// Mission time reached zero.
    Start,
    /// The ascent period has passed.
    AscentElapsed,
    /// Vertical speed went negative while levelling.
    Apex,
    /// The hover period after levelling has passed.
    HoverElapsed,
    /// The descent period after levelling has passed.
    DescentElapsed,
    Shutdown,
}

impl FlightEvent {
    /// Position of a time-derived event in mission order.
    fn milestone(self) -> Option<u8> {
        match self {
            FlightEvent::Start => Some(0),
            FlightEvent::AscentElapsed => Some(1),
            FlightEvent::HoverElapsed => Some(2),
            FlightEvent::DescentElapsed => Some(3),
            _ => None,
        }
    }
}

/// Phase durations in seconds.
///
/// `ascent` counts from mission start, `hover` and `descent` from the moment
/// the vehicle levelled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseTiming {
    pub ascent: f32,
    pub hover: f32,
    pub descent: f32,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            ascent: 2.,
            hover: 4.,
            descent: 6.,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: FlightPhase,
    pub to: FlightPhase,
    pub event: FlightEvent,
}

#[derive(Clone, Debug, Default)]
pub struct PhaseMachine {
    phase: FlightPhase,
    timing: PhaseTiming,
    levelled_time: Option<f32>,
    apex_pending: bool,
    finished: bool,
}

impl PhaseMachine {
    pub fn new(timing: PhaseTiming) -> Self {
        Self {
            timing,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn timing(&self) -> &PhaseTiming {
        &self.timing
    }

    /// Mission time (in seconds) at which the vehicle levelled.
    pub fn levelled_time(&self) -> Option<f32> {
        self.levelled_time
    }

    /// Returns `true` once the machine has flown and returned to `Off`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Derive this tick's event.
    ///
    /// A pending shutdown outranks a detected apex, which outranks time.
    pub fn event(&self, elapsed: f32, shutdown: bool) -> FlightEvent {
        if shutdown {
            return FlightEvent::Shutdown;
        }
        if self.apex_pending && self.phase == FlightPhase::Levelling {
            return FlightEvent::Apex;
        }

        if let Some(levelled) = self.levelled_time {
            if elapsed >= levelled + self.timing.descent {
                return FlightEvent::DescentElapsed;
            }
            if elapsed >= levelled + self.timing.hover {
                return FlightEvent::HoverElapsed;
            }
        }

        if elapsed >= self.timing.ascent {
            FlightEvent::AscentElapsed
        } else if elapsed >= 0. {
            FlightEvent::Start
        } else {
            FlightEvent::None
        }
    }

    /// Derive this tick's event and apply it.
    pub fn step(&mut self, elapsed: f32, shutdown: bool) -> Option<Transition> {
        let event = self.event(elapsed, shutdown);
        self.on_event(event, elapsed)
    }

    /// Apply an event, returning the transition it caused (if any).
    pub fn on_event(&mut self, event: FlightEvent, elapsed: f32) -> Option<Transition> {
        if self.finished || event == FlightEvent::None {
            return None;
        }

        let next = match (self.phase, event) {
            // The driver aborts instead
            (FlightPhase::Off, FlightEvent::Shutdown) => return None,
            (FlightPhase::Off, event) if reached(event, FlightEvent::Start) => {
                FlightPhase::Ascending
            }
            (FlightPhase::Ascending, FlightEvent::Shutdown) => FlightPhase::Levelling,
            (FlightPhase::Ascending, event) if reached(event, FlightEvent::AscentElapsed) => {
                FlightPhase::Levelling
            }
            (FlightPhase::Levelling, FlightEvent::Apex | FlightEvent::Shutdown) => {
                FlightPhase::Hovering
            }
            (FlightPhase::Hovering, FlightEvent::Shutdown) => FlightPhase::Descending,
            (FlightPhase::Hovering, event) if reached(event, FlightEvent::HoverElapsed) => {
                FlightPhase::Descending
            }
            (FlightPhase::Descending, FlightEvent::Shutdown) => FlightPhase::Off,
            (FlightPhase::Descending, event) if reached(event, FlightEvent::DescentElapsed) => {
                FlightPhase::Off
            }
            _ => return None,
        };

        let from = self.phase;
        self.phase = next;

        match next {
            FlightPhase::Hovering => {
                self.apex_pending = false;
                if self.levelled_time.is_none() {
                    self.levelled_time = Some(elapsed);
                }
            }
            FlightPhase::Off => self.finished = true,
            _ => {}
        }

        log::info!("phase {} -> {} on {:?} at {:.3}s", from, next, event, elapsed);

        Some(Transition {
            from,
            to: next,
            event,
        })
    }

    /// Watch the estimated vertical speed for the apex while levelling.
    ///
    /// Returns `true` on the tick the apex is first seen. The levelled time is
    /// recorded immediately and the transition fires on the next step.
    pub fn observe_vertical_speed(&mut self, elapsed: f32, vertical_speed: f32) -> bool {
        if self.phase != FlightPhase::Levelling || self.apex_pending || vertical_speed >= 0. {
            return false;
        }

        log::debug!("apex at {:.3}s", elapsed);
        self.apex_pending = true;
        self.levelled_time = Some(elapsed);
        true
    }
}

fn reached(event: FlightEvent, milestone: FlightEvent) -> bool {
    match (event.milestone(), milestone.milestone()) {
        (Some(event), Some(milestone)) => event >= milestone,
        _ => false,
    }
}
