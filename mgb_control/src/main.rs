//! # MGB Chamber Controller
//!
//! Loads the chamber TOML, builds one adaptive PID loop per configured
//! variable and runs the monitoring cycle until Ctrl-C (or `--cycles`).
//!
//! Hardware drivers live outside this workspace; the binary wires every
//! loop to the simulated chamber. One cycle advances the simulation by the
//! configured measurement interval, and `--time-scale` shortens the wall
//! time between cycles accordingly.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use mgb_common::config::LogLevel;
use mgb_common::consts::DEFAULT_CONFIG_PATH;
use mgb_control::config::{ChamberConfig, load_config};
use mgb_control::cycle::{ControlLoop, CycleRunner, StopToken};
use mgb_control::datalog::{JsonLinesSink, NullSink, ReadingSink};
use mgb_control::sim::SimulatedChamber;

/// MGB chamber controller: adaptive PID for temperature, humidity and CO2
#[derive(Parser, Debug)]
#[command(name = "mgb_control")]
#[command(version)]
#[command(about = "Adaptive PID environmental control for the MGB cultivation chamber")]
struct Args {
    /// Path to the chamber configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many monitoring cycles.
    #[arg(long)]
    cycles: Option<u64>,

    /// Simulated seconds per wall-clock second.
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,

    /// Make every n-th simulated sensor read fail (0 = never).
    #[arg(long, default_value_t = 0)]
    sensor_fail_every: u32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => {
            setup_tracing(&args, config.shared.log_level);
            config
        }
        Err(e) => {
            setup_tracing(&args, LogLevel::default());
            error!("FATAL: {}: {e}", args.config.display());
            process::exit(1);
        }
    };

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("{} shutdown complete", config.shared.service_name);
}

fn run(args: &Args, config: &ChamberConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !(args.time_scale.is_finite() && args.time_scale > 0.0) {
        return Err(format!("--time-scale must be > 0, got {}", args.time_scale).into());
    }

    let chamber = SimulatedChamber::default();
    let mut loops = Vec::new();
    for (variable, loop_cfg) in config.loops.iter() {
        let sensor = chamber
            .sensor(variable)
            .with_failures_every(args.sensor_fail_every);
        let actuator = chamber.actuator(variable.actuator_kind());
        loops.push(ControlLoop::from_config(
            variable,
            loop_cfg,
            Box::new(sensor),
            Box::new(actuator),
        )?);
        info!(
            "Loop {variable}: setpoint={} {}, kp={}, ki={}, kd={}, adaptive={}",
            loop_cfg.pid.setpoint,
            variable.unit(),
            loop_cfg.pid.kp,
            loop_cfg.pid.ki,
            loop_cfg.pid.kd,
            loop_cfg.pid.adaptive
        );
    }

    let sink: Box<dyn ReadingSink> = match &config.datalog.path {
        Some(path) => {
            info!("Logging readings to {}", path.display());
            Box::new(JsonLinesSink::open(path)?)
        }
        None => Box::new(NullSink),
    };

    let interval = config.measurement.interval();
    let interval_s = interval.as_secs_f64();
    let pause = Duration::try_from_secs_f64(interval_s / args.time_scale)?;
    let plant = chamber.clone();
    let mut runner = CycleRunner::new(loops, Box::new(chamber), sink, pause)
        .with_after_cycle(move || plant.step(interval_s));
    runner.initialize()?;

    let stop = StopToken::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_stop.cancel();
    })?;

    let stats = runner.run(&stop, args.cycles);
    info!(
        "Cycles={}, readings={}, missed={}, switches={}, actuator_failures={}, alarms={}",
        stats.cycle_count,
        stats.readings,
        stats.missed_readings,
        stats.actuator_switches,
        stats.actuator_failures,
        stats.alarms
    );
    info!("Final status: {}", serde_json::to_string(&runner.status())?);

    Ok(())
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::from(configured)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
