use embedded_time::{clock, ConversionError};
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A fault that ends the flight (or stops it from starting).
#[derive(Debug, Error)]
pub enum Error {
    /// The motion sensor kept failing after every retry was spent.
    #[error("motion sensor unavailable after {attempts} attempts")]
    SensorUnavailable { attempts: u8 },

    #[error("calibration: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("clock error: {0:?}")]
    Clock(clock::Error),

    #[error("time conversion error: {0:?}")]
    Time(ConversionError),

    /// A shutdown signal arrived before takeoff.
    #[error("flight aborted before takeoff")]
    Aborted,
}

impl From<clock::Error> for Error {
    fn from(clock_error: clock::Error) -> Self {
        Error::Clock(clock_error)
    }
}

impl From<ConversionError> for Error {
    fn from(time_error: ConversionError) -> Self {
        Error::Time(time_error)
    }
}

/// Reading or writing the persisted sensor offsets failed.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("offset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("offset file is missing line {line}")]
    MissingValue { line: usize },

    #[error("offset file line {line} is not an integer: {value:?}")]
    InvalidValue { line: usize, value: String },

    /// No offsets were measured or loaded.
    #[error("no sensor offsets installed")]
    Missing,

    #[error("offset sum overflowed")]
    Overflow,
}
