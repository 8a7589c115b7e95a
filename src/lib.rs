//! # quad-flight
//! Cascaded PID flight software for a four-blade quadcopter
//!
//! # Generic components
//! [`pid`] contains the single axis PID controller.
//!
//! [`estimator`] integrates inertial rates into angles and earth-frame speeds.
//!
//! [`hal`] contains the hardware abstraction layer.
//!
//! # Flight components
//! [`Copter`] runs the flight loop: it reads the sensor, advances the
//! [`PhaseMachine`], runs the [`CascadeController`] and mixes its output onto the
//! blades (see [`QuadMotors`]).
//!
//! [`calibration`] measures and persists the sensor offsets the loop relies on.

pub mod calibration;
pub use calibration::{Calibration, CalibrationOffset};

pub mod clock;
pub use clock::{MissionTimer, SystemClock};

pub mod config;
pub use config::FlightConfig;

pub mod copter;
pub use copter::control::{CascadeController, MotorOutput, QuadMotors};
pub use copter::{Copter, FlightSummary};

pub mod diagnostics;
pub use diagnostics::{CsvDiagnostics, DiagnosticsSink, NoDiagnostics, TickRecord};

mod error;
pub use error::{CalibrationError, Error, Result};

pub mod estimator;
pub use estimator::{Estimator, MotionSample};

pub mod hal;
pub use hal::{MotionSensor, ESC};

pub mod phase;
pub use phase::{FlightEvent, FlightPhase, PhaseMachine};

pub mod pid;
pub use pid::{Gains, PID};

pub mod sensor;
pub use sensor::CalibratedSensor;

pub mod signal;
pub use signal::ShutdownSignal;
