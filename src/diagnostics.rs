//! Per-tick diagnostics.
//!
//! Recording is best effort: a failing sink never affects control.

use crate::copter::control::{ControlTerms, MotorOutput};
use crate::pid::PidTerms;
use nalgebra::Vector3;
use std::io::{self, Write};

/// Everything the flight loop knows at the end of a tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickRecord {
    pub elapsed: f32,
    pub dt: f32,
    pub tick: u64,
    pub gyro: Vector3<f32>,
    pub accel: Vector3<f32>,
    /// Integrated roll, pitch and yaw.
    pub angles: Vector3<f32>,
    pub speed: Vector3<f32>,
    pub terms: ControlTerms,
    /// Pitch, roll and yaw rate targets.
    pub rate_target: Vector3<f32>,
    pub output: MotorOutput,
    /// Front left, front right, back left and back right pulses.
    pub pulses: [u16; 4],
}

pub trait DiagnosticsSink {
    fn record(&mut self, record: &TickRecord);

    fn flush(&mut self) {}
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for &mut T {
    fn record(&mut self, record: &TickRecord) {
        (**self).record(record)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// Discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDiagnostics;

impl DiagnosticsSink for NoDiagnostics {
    fn record(&mut self, _record: &TickRecord) {}
}

pub const CSV_HEADER: &str = "time, dt, tick, \
gx, gy, gz, ax, ay, az, \
roll, pitch, yaw, \
eax speed, eay speed, eaz speed, \
exp, exi, exd, eyp, eyi, eyd, ezp, ezi, ezd, \
prp, pri, prd, rrp, rri, rrd, yrp, yri, yrd, \
pitch target, roll target, yaw target, \
pitch out, roll out, yaw out, vert out, \
fl, fr, bl, br";

/// Writes a header line and then one comma separated line per tick.
pub struct CsvDiagnostics<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> CsvDiagnostics<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, record: &TickRecord) -> io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{}", CSV_HEADER)?;
            self.header_written = true;
        }

        write!(
            self.writer,
            "{:.6}, {:.6}, {}",
            record.elapsed, record.dt, record.tick
        )?;
        for vector in [
            &record.gyro,
            &record.accel,
            &record.angles,
            &record.speed,
        ] {
            write_vector(&mut self.writer, vector)?;
        }

        let terms = &record.terms;
        for pid in [
            &terms.eax,
            &terms.eay,
            &terms.eaz,
            &terms.pitch,
            &terms.roll,
            &terms.yaw,
        ] {
            write_terms(&mut self.writer, pid)?;
        }
        write_vector(&mut self.writer, &record.rate_target)?;

        let output = &record.output;
        write!(
            self.writer,
            ", {}, {}, {}, {:.6}",
            output.pitch, output.roll, output.yaw, output.vert
        )?;

        let [fl, fr, bl, br] = record.pulses;
        writeln!(self.writer, ", {}, {}, {}, {}", fl, fr, bl, br)
    }
}

fn write_vector<W: Write>(writer: &mut W, vector: &Vector3<f32>) -> io::Result<()> {
    write!(writer, ", {:.6}, {:.6}, {:.6}", vector.x, vector.y, vector.z)
}

fn write_terms<W: Write>(writer: &mut W, terms: &PidTerms) -> io::Result<()> {
    write!(writer, ", {:.6}, {:.6}, {:.6}", terms.p, terms.i, terms.d)
}

impl<W: Write> DiagnosticsSink for CsvDiagnostics<W> {
    fn record(&mut self, record: &TickRecord) {
        if let Err(error) = self.write_record(record) {
            log::debug!("diagnostics record dropped: {}", error);
        }
    }

    fn flush(&mut self) {
        if let Err(error) = self.writer.flush() {
            log::debug!("diagnostics flush failed: {}", error);
        }
    }
}
