//! Monitoring cycle with simulated devices.
//!
//! Runs the full sensor → controller → actuator → datalog path against the
//! simulated chamber, one simulated minute per cycle.

use std::thread;
use std::time::Duration;

use mgb_common::device::Sensor;
use mgb_common::reading::{ActuatorKind, AlarmKind, ControlledVariable};
use mgb_control::config::LoopConfig;
use mgb_control::controller::PidConfig;
use mgb_control::cycle::{ControlLoop, CycleRunner, StopToken};
use mgb_control::datalog::{DatalogRecord, JsonLinesSink, MemorySink};
use mgb_control::sim::SimulatedChamber;
use tempfile::TempDir;

const INTERVAL_S: f64 = 60.0;

fn temperature_loop(chamber: &SimulatedChamber, sensor: impl Sensor + 'static) -> ControlLoop {
    let cfg = LoopConfig::new(
        PidConfig::new(50.0, 0.0, 0.0)
            .with_setpoint(24.0)
            .with_adaptive(false),
    );
    ControlLoop::from_config(
        ControlledVariable::Temperature,
        &cfg,
        Box::new(sensor),
        Box::new(chamber.actuator(ActuatorKind::Heater)),
    )
    .unwrap()
}

fn stepped_runner(
    chamber: &SimulatedChamber,
    loops: Vec<ControlLoop>,
    sink: MemorySink,
    pause: Duration,
) -> CycleRunner {
    let plant = chamber.clone();
    let mut runner = CycleRunner::new(loops, Box::new(chamber.clone()), Box::new(sink), pause)
        .with_after_cycle(move || plant.step(INTERVAL_S));
    runner.initialize().unwrap();
    runner
}

#[test]
fn relay_loop_holds_temperature_band() {
    let chamber = SimulatedChamber::default();
    let sink = MemorySink::new();
    let lp = temperature_loop(&chamber, chamber.sensor(ControlledVariable::Temperature));
    let mut runner = stepped_runner(&chamber, vec![lp], sink.clone(), Duration::ZERO);

    let stats = runner.run(&StopToken::new(), Some(200));
    assert_eq!(stats.cycle_count, 200);
    assert_eq!(stats.missed_readings, 0);

    let readings = sink.readings();
    assert_eq!(readings.len(), 200);
    for r in &readings[30..] {
        assert!(
            (22.0..=25.0).contains(&r.value),
            "temperature {} at t={} outside band",
            r.value,
            r.timestamp
        );
    }
    assert_eq!(readings[1].timestamp - readings[0].timestamp, INTERVAL_S);
    assert!(stats.actuator_switches > 10, "relay should cycle");
    assert!(!chamber.snapshot().heater_on);
}

#[test]
fn failed_reads_skip_the_controller() {
    let chamber = SimulatedChamber::default();
    let sink = MemorySink::new();
    let sensor = chamber
        .sensor(ControlledVariable::Temperature)
        .with_failures_every(4);
    let lp = temperature_loop(&chamber, sensor);
    let controller = lp.controller().clone();
    let mut runner = stepped_runner(&chamber, vec![lp], sink.clone(), Duration::ZERO);

    let stats = runner.run(&StopToken::new(), Some(12));
    assert_eq!(stats.missed_readings, 3);
    assert_eq!(stats.readings, 9);
    assert_eq!(sink.readings().len(), 9);
    assert_eq!(controller.tuning_info().error_count, 9);

    assert_eq!(stats.alarms, 3);
    let alarms = sink.alarms();
    assert_eq!(alarms.len(), 3);
    assert!(alarms.iter().all(|a| a.kind == AlarmKind::SensorUnavailable));
    assert_eq!(alarms[1].timestamp - alarms[0].timestamp, 4.0 * INTERVAL_S);

    let recent = sink.recent_readings(Some(&alarms[0].source), 5);
    assert_eq!(recent.len(), 5);
    assert!(recent.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
}

#[test]
fn every_loop_runs_each_cycle() {
    let chamber = SimulatedChamber::default();
    let sink = MemorySink::new();
    let loops = ControlledVariable::ALL
        .into_iter()
        .map(|variable| {
            let mut cfg = LoopConfig::new(PidConfig::new(10.0, 0.0, 0.0));
            match variable {
                ControlledVariable::Temperature => cfg.pid.setpoint = 24.0,
                ControlledVariable::Humidity => cfg.pid.setpoint = 85.0,
                ControlledVariable::Co2 => {
                    cfg.pid.setpoint = 800.0;
                    cfg.reverse_acting = true;
                }
            }
            ControlLoop::from_config(
                variable,
                &cfg,
                Box::new(chamber.sensor(variable)),
                Box::new(chamber.actuator(variable.actuator_kind())),
            )
            .unwrap()
        })
        .collect();
    let mut runner = stepped_runner(&chamber, loops, sink.clone(), Duration::ZERO);

    runner.run_cycle();
    let readings = sink.readings();
    assert_eq!(readings.len(), 3);
    assert_eq!(readings[0].unit, "°C");
    assert_eq!(readings[1].unit, "%");
    assert_eq!(readings[2].unit, "ppm");

    let m = chamber.snapshot();
    assert!(m.heater_on);
    assert!(m.humidifier_on);
    assert!(!m.fan_on, "CO2 starts below setpoint");

    let status = runner.status();
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json[2]["variable"], "co2");
    assert_eq!(json[0]["actuator"]["kind"], "heater");
    assert_eq!(json[0]["tuning"]["state"], "tracking");
}

#[test]
fn stop_token_ends_an_unbounded_run() {
    let chamber = SimulatedChamber::default();
    let sink = MemorySink::new();
    let lp = temperature_loop(&chamber, chamber.sensor(ControlledVariable::Temperature));
    let mut runner = stepped_runner(&chamber, vec![lp], sink.clone(), Duration::from_millis(5));

    let stop = StopToken::new();
    let canceller = {
        let stop = stop.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            stop.cancel();
        })
    };

    let stats = runner.run(&stop, None);
    canceller.join().unwrap();

    assert!(stats.cycle_count > 0);
    assert!(!chamber.snapshot().heater_on);
    if let Some(last) = sink.actuator_events().last() {
        assert!(!last.active);
    }
}

#[test]
fn json_lines_datalog_records_every_event() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("readings.jsonl");

    let chamber = SimulatedChamber::default();
    let lp = temperature_loop(&chamber, chamber.sensor(ControlledVariable::Temperature));
    let plant = chamber.clone();
    let mut runner = CycleRunner::new(
        vec![lp],
        Box::new(chamber.clone()),
        Box::new(JsonLinesSink::open(&path).unwrap()),
        Duration::ZERO,
    )
    .with_after_cycle(move || plant.step(INTERVAL_S));
    runner.initialize().unwrap();
    let stats = runner.run(&StopToken::new(), Some(20));

    let content = std::fs::read_to_string(&path).unwrap();
    let records: Vec<DatalogRecord> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(
        records.len() as u64,
        stats.readings + stats.actuator_switches + stats.alarms
    );
    assert_eq!(stats.datalog_failures, 0);
}
