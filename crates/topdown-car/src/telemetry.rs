//! Per-tick vehicle telemetry as CSV.
//!
//! Supports multiple output destinations via the `TelemetryOutput` trait.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{error::Result, simulation::VehicleStatus};

/// Everything logged for one tick.
pub struct TelemetrySnapshot {
    pub dt: f32,
    pub status: VehicleStatus,
}

/// Trait for telemetry output destinations.
pub trait TelemetryOutput {
    /// Write the CSV header.
    fn write_header(&mut self, header: &str) -> io::Result<()>;
    /// Write a data row.
    fn write_row(&mut self, row: &str) -> io::Result<()>;
    /// Push buffered rows to their destination.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Buffered file output.
pub struct FileTelemetryOutput {
    writer: BufWriter<File>,
}

impl FileTelemetryOutput {
    /// Create or truncate the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }
}

impl TelemetryOutput for FileTelemetryOutput {
    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "{header}")
    }

    fn write_row(&mut self, row: &str) -> io::Result<()> {
        writeln!(self.writer, "{row}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Stdout output for the headless driver.
pub struct StdoutTelemetryOutput;

impl TelemetryOutput for StdoutTelemetryOutput {
    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{header}")
    }

    fn write_row(&mut self, row: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{row}")
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// In-memory output; keeps every line.
#[derive(Debug, Default)]
pub struct VecTelemetryOutput {
    pub lines: Vec<String>,
}

impl TelemetryOutput for VecTelemetryOutput {
    fn write_header(&mut self, header: &str) -> io::Result<()> {
        self.lines.clear();
        self.lines.push(header.to_string());
        Ok(())
    }

    fn write_row(&mut self, row: &str) -> io::Result<()> {
        self.lines.push(row.to_string());
        Ok(())
    }
}

/// Define the CSV schema once and generate `reset_telemetry_to()` and
/// `emit_telemetry_to()` from it, keeping column names and formats in sync.
macro_rules! define_telemetry {
    (
        columns: { $( $name:ident : $fmt:literal ),* $(,)? },
        prelude: |$snapshot:ident| { $( $prelude:stmt );* $(;)? },
        row_values: { $( $val:expr ),* $(,)? }
    ) => {
        /// CSV header string.
        const CSV_HEADER: &str = concat!( $( stringify!($name), "," ),* );

        /// Write the header to `output`.
        pub fn reset_telemetry_to(output: &mut dyn TelemetryOutput) -> std::io::Result<()> {
            output.write_header(CSV_HEADER.trim_end_matches(','))
        }

        /// Write one row for `snapshot` to `output`.
        pub fn emit_telemetry_to(
            $snapshot: &TelemetrySnapshot,
            output: &mut dyn TelemetryOutput,
        ) -> std::io::Result<()> {
            $( $prelude )*

            let line = format!( concat!( $( $fmt, "," ),* ), $( $val ),* );
            let line = line.trim_end_matches(',');

            output.write_row(line)
        }
    };
}

define_telemetry! {
    columns: {
        t: "{:.4}",
        tick: "{}",
        dt: "{:.5}",
        control: "{}",
        steer: "{}",
        wheel_deg: "{:.2}",
        pos_x: "{:.3}",
        pos_y: "{:.3}",
        heading_deg: "{:.2}",
        speed: "{:.3}",
        forward_speed: "{:.3}",
        lateral_speed: "{:.3}",
        vel_x: "{:.3}",
        vel_y: "{:.3}",
        ang_vel: "{:.4}",
    },
    prelude: |snapshot| {
        let s = &snapshot.status;
        // The car faces its local -Y.
        let forward = glam::Vec2::from_angle(s.angle).rotate(glam::Vec2::NEG_Y);
        let forward_speed = s.linear_velocity.dot(forward);
        let lateral_speed = s.linear_velocity.perp_dot(forward);
    },
    row_values: {
        s.elapsed,
        s.ticks,
        snapshot.dt,
        s.commands.control,
        s.commands.steer,
        s.wheel_angle.to_degrees(),
        s.position.x,
        s.position.y,
        s.angle.to_degrees(),
        s.linear_velocity.length(),
        forward_speed,
        lateral_speed,
        s.linear_velocity.x,
        s.linear_velocity.y,
        s.angular_velocity,
    }
}
