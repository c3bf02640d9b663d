use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::info;

use pid_rocket_simulation::logging::init_logging;
use pid_rocket_simulation::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    /// Vertical rocket holding a target altitude against gravity
    Rocket,
    /// Drag-dominated autopilot used for gain tuning
    Autopilot,
}

#[derive(Parser, Debug)]
#[command(name = "main", about = "PID-controlled altitude simulation")]
struct Cli {
    /// TOML file with [rocket] and [autopilot] tables
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Variant::Rocket)]
    variant: Variant,

    #[arg(long)]
    kp: Option<f64>,

    #[arg(long)]
    ki: Option<f64>,

    #[arg(long)]
    kd: Option<f64>,

    /// Target altitude in meters
    #[arg(long)]
    setpoint: Option<f64>,

    /// Maximum number of ticks
    #[arg(long)]
    ticks: Option<u32>,

    /// Autopilot control input multiplier
    #[arg(long)]
    thrust_factor: Option<f64>,

    /// Sleep one time step between ticks to follow the flight live
    #[arg(long)]
    pace: bool,

    /// Write the recorded time series to a CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;
    let cli = Cli::parse();

    let config_file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    if cli.dump_config {
        print!("{}", config_file.to_toml_string()?);
        return Ok(());
    }

    let state = match cli.variant {
        Variant::Rocket => {
            let mut config = config_file.rocket;
            config.kp = cli.kp.unwrap_or(config.kp);
            config.ki = cli.ki.unwrap_or(config.ki);
            config.kd = cli.kd.unwrap_or(config.kd);
            config.setpoint = cli.setpoint.unwrap_or(config.setpoint);
            config.sim_time_limit = cli.ticks.unwrap_or(config.sim_time_limit);

            info!(
                kp = config.kp,
                ki = config.ki,
                kd = config.kd,
                setpoint = config.setpoint,
                "starting rocket simulation"
            );
            let simulation = Simulation::from_config(&config)?;
            fly(simulation, config.setpoint, config.dt, cli.pace, cli.csv.as_deref())?
        }
        Variant::Autopilot => {
            let mut config = config_file.autopilot;
            config.kp = cli.kp.unwrap_or(config.kp);
            config.ki = cli.ki.unwrap_or(config.ki);
            config.kd = cli.kd.unwrap_or(config.kd);
            config.target_altitude = cli.setpoint.unwrap_or(config.target_altitude);
            config.thrust_factor = cli.thrust_factor.unwrap_or(config.thrust_factor);
            if let Some(ticks) = cli.ticks {
                config.sim_time = f64::from(ticks) * config.dt;
            }

            info!(
                kp = config.kp,
                ki = config.ki,
                kd = config.kd,
                thrust_factor = config.thrust_factor,
                "starting autopilot simulation"
            );
            let simulation = Simulation::autopilot(&config)?;
            fly(
                simulation,
                config.target_altitude,
                config.dt,
                cli.pace,
                cli.csv.as_deref(),
            )?
        }
    };

    match state {
        SimulationState::StoppedNormal => println!("SIM ENDED"),
        SimulationState::StoppedOutOfBounds(Boundary::Upper) => println!("OUT OF BOUNDS (High)"),
        SimulationState::StoppedOutOfBounds(Boundary::Lower) => println!("OUT OF BOUNDS (Low)"),
        SimulationState::Cancelled | SimulationState::Running => println!("SIM INTERRUPTED"),
    }

    Ok(())
}

fn fly<P: Plant>(
    simulation: Simulation<P>,
    setpoint: f64,
    dt: f64,
    pace: bool,
    csv: Option<&Path>,
) -> Result<SimulationState, SimulationError> {
    let mut telemetry = Telemetry::new(setpoint, dt);
    let pause = pace.then(|| Duration::from_secs_f64(dt));

    let result = simulation.run_with(|record| {
        telemetry.collect_data(record);
        if let Some(pause) = pause {
            thread::sleep(pause);
        }
    });

    telemetry.display_data();

    if let Some(path) = csv {
        telemetry.write_csv(BufWriter::new(File::create(path)?))?;
        info!(path = %path.display(), records = result.records.len(), "wrote telemetry");
    }

    Ok(result.state)
}
