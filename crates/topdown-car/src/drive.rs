//! Headless car driver.
//!
//! Runs the simulation from a scripted key sequence and writes per-tick CSV
//! telemetry. A summary is printed to stderr with `#` prefixes so it can be
//! told apart from the CSV on stdout.
//!
//! Usage: `car-drive --script w:30,wd:20,:10,s:15 --dt 0.05`

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use topdown_car::{
    DriverCommands, Simulation, SimulationSpec, VehicleObservers,
    telemetry::{
        FileTelemetryOutput, StdoutTelemetryOutput, TelemetryOutput, TelemetrySnapshot,
        emit_telemetry_to, reset_telemetry_to,
    },
};

/// Held keys for a number of ticks.
#[derive(Clone, Debug, PartialEq)]
struct ScriptSegment {
    keys: String,
    ticks: u32,
}

/// Parse one `KEYS:TICKS` segment. `KEYS` may be empty to coast.
fn parse_segment(s: &str) -> Result<ScriptSegment, String> {
    let (keys, ticks) = s
        .trim()
        .rsplit_once(':')
        .ok_or_else(|| format!("expected KEYS:TICKS, got '{s}'"))?;
    if let Some(bad) = keys.chars().find(|c| !"wasdWASD".contains(*c)) {
        return Err(format!("unknown key '{bad}' in '{s}', expected w/a/s/d"));
    }
    let ticks = ticks
        .parse::<u32>()
        .map_err(|e| format!("invalid tick count in '{s}': {e}"))?;
    Ok(ScriptSegment {
        keys: keys.to_string(),
        ticks,
    })
}

fn parse_dt(s: &str) -> Result<f32, String> {
    let dt = s
        .parse::<f32>()
        .map_err(|e| format!("invalid time step: {e}"))?;
    if dt.is_finite() && dt >= 0.0 {
        Ok(dt)
    } else {
        Err(format!("time step must be a non-negative number, got {dt}"))
    }
}

#[derive(Parser)]
#[command(about = "Drive the top-down car headlessly and log telemetry")]
struct CliArgs {
    /// Simulation spec as JSON. Uses the stock car without walls if omitted.
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Comma-separated `KEYS:TICKS` segments, e.g. `w:50,wd:20,s:10`.
    #[arg(long, value_delimiter = ',', value_parser = parse_segment, default_value = "w:50")]
    script: Vec<ScriptSegment>,

    /// Seconds per tick.
    #[arg(long, value_parser = parse_dt, default_value_t = 0.1)]
    dt: f32,

    /// Write telemetry CSV to this file instead of stdout.
    #[arg(long)]
    telemetry: Option<PathBuf>,
}

/// Aggregates reported at the end of a run.
#[derive(Default)]
struct RunSummary {
    ticks: u64,
    max_speed: f32,
    distance: f32,
}

fn run(args: &CliArgs) -> topdown_car::Result<()> {
    let spec = match &args.spec {
        Some(path) => SimulationSpec::load(path)?,
        None => SimulationSpec::default(),
    };

    let mut output: Box<dyn TelemetryOutput> = match &args.telemetry {
        Some(path) => Box::new(FileTelemetryOutput::create(path)?),
        None => Box::new(StdoutTelemetryOutput),
    };
    reset_telemetry_to(output.as_mut())?;

    let (observers, chassis, _wheels) = VehicleObservers::recording();
    let mut simulation = Simulation::new(&spec, observers)?;

    let start = simulation.status().position;
    let mut summary = RunSummary::default();
    let mut last = start;

    for segment in &args.script {
        let commands = DriverCommands::from_held_keys(segment.keys.chars());
        simulation.set_control(commands.control);
        simulation.set_steer(commands.steer);
        tracing::debug!(
            "Segment '{}' for {} ticks: {} / {}",
            segment.keys,
            segment.ticks,
            commands.control,
            commands.steer
        );

        for _ in 0..segment.ticks {
            simulation.update(args.dt);
            let status = simulation.status();
            emit_telemetry_to(
                &TelemetrySnapshot {
                    dt: args.dt,
                    status,
                },
                output.as_mut(),
            )?;

            summary.ticks += 1;
            summary.max_speed = summary.max_speed.max(status.linear_velocity.length());
            summary.distance += (status.position - last).length();
            last = status.position;
        }
    }
    output.flush()?;

    let status = simulation.status();
    eprintln!("# Run complete");
    eprintln!("#   Ticks: {} ({:.2} s)", summary.ticks, status.elapsed);
    eprintln!(
        "#   Final position: ({:.3}, {:.3}), heading {:.2} deg",
        status.position.x,
        status.position.y,
        status.angle.to_degrees()
    );
    eprintln!(
        "#   Displacement: {:.3} m, path length {:.3} m",
        (status.position - start).length(),
        summary.distance
    );
    eprintln!("#   Max speed: {:.3} m/s", summary.max_speed);
    eprintln!("#   Chassis poses observed: {}", chassis.len());

    simulation.shutdown();
    Ok(())
}

fn main() -> ExitCode {
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("car-drive failed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segment() {
        assert_eq!(
            parse_segment("wd:20").unwrap(),
            ScriptSegment {
                keys: "wd".to_string(),
                ticks: 20
            }
        );
        assert_eq!(parse_segment(":5").unwrap().keys, "");
        assert!(parse_segment("w").is_err());
        assert!(parse_segment("wq:3").is_err());
        assert!(parse_segment("w:-1").is_err());
    }

    #[test]
    fn test_parse_dt() {
        assert_eq!(parse_dt("0.05").unwrap(), 0.05);
        assert!(parse_dt("-0.1").is_err());
        assert!(parse_dt("inf").is_err());
        assert!(parse_dt("fast").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let args = CliArgs::parse_from(["car-drive"]);
        assert_eq!(
            args.script,
            vec![ScriptSegment {
                keys: "w".to_string(),
                ticks: 50
            }]
        );
        assert_eq!(args.dt, 0.1);
        assert!(args.spec.is_none());

        let args = CliArgs::parse_from(["car-drive", "--script", "w:10,wa:5,:2"]);
        assert_eq!(args.script.len(), 3);
        assert_eq!(args.script[1].keys, "wa");
    }

    #[test]
    fn test_unwritable_telemetry_fails_the_run() {
        let path = std::env::temp_dir()
            .join("car-drive-missing-dir")
            .join("t.csv");
        let args = CliArgs::parse_from([
            std::ffi::OsStr::new("car-drive"),
            std::ffi::OsStr::new("--telemetry"),
            path.as_os_str(),
        ]);
        assert!(matches!(run(&args), Err(topdown_car::Error::Io(_))));
    }
}
