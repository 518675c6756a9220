//! Monitoring cycle: sensor → controller → actuator → datalog.
//!
//! Each cycle reads every loop's sensor once. A missing reading is logged
//! and the loop's controller is left untouched for that cycle. Otherwise the
//! controller command is mapped to the relay actuator through the loop's
//! threshold; the actuator is only switched when the desired state differs
//! from the current one. Readings and state changes go to the sink, as do
//! alarms for missed reads and rejected actuator commands.
//!
//! [`CycleRunner::run`] repeats cycles until the [`StopToken`] fires or the
//! requested number of cycles is reached, then turns every actuator off.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use mgb_common::device::{Actuator, ActuatorStatus, DeviceError, Sensor, SensorStatus};
use mgb_common::reading::{ActuatorEvent, Alarm, AlarmKind, ControlledVariable, Reading};

use crate::clock::Clock;
use crate::config::LoopConfig;
use crate::control::tuning::TuningInfo;
use crate::datalog::{DatalogRecord, ReadingSink};
use crate::error::ControllerError;
use crate::shared::SharedController;

/// Longest uninterrupted sleep while waiting for the next cycle.
const STOP_POLL_SLICE: Duration = Duration::from_millis(50);

// ─── Stop Token ─────────────────────────────────────────────────────

/// Cooperative cancellation flag. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sleep up to `timeout`, waking early on cancellation.
    /// Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep((deadline - now).min(STOP_POLL_SLICE));
        }
    }
}

// ─── Control Loop ───────────────────────────────────────────────────

/// One sensor, one controller, one actuator.
pub struct ControlLoop {
    variable: ControlledVariable,
    sensor: Box<dyn Sensor>,
    actuator: Box<dyn Actuator>,
    controller: SharedController,
    on_threshold: f64,
    reverse_acting: bool,
}

impl ControlLoop {
    pub fn new(
        variable: ControlledVariable,
        sensor: Box<dyn Sensor>,
        actuator: Box<dyn Actuator>,
        controller: SharedController,
        on_threshold: f64,
    ) -> Self {
        Self {
            variable,
            sensor,
            actuator,
            controller,
            on_threshold,
            reverse_acting: false,
        }
    }

    /// Build the controller from `config` and wire it to the devices.
    pub fn from_config(
        variable: ControlledVariable,
        config: &LoopConfig,
        sensor: Box<dyn Sensor>,
        actuator: Box<dyn Actuator>,
    ) -> Result<Self, ControllerError> {
        let controller = config.build_controller()?;
        Ok(Self::new(variable, sensor, actuator, controller, config.on_threshold)
            .with_reverse_acting(config.reverse_acting))
    }

    pub fn with_reverse_acting(mut self, reverse: bool) -> Self {
        self.reverse_acting = reverse;
        self
    }

    pub fn variable(&self) -> ControlledVariable {
        self.variable
    }

    /// Handle for status readers and operator changes.
    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    /// Desired relay state for a controller command.
    pub fn relay_state(&self, command: f64) -> bool {
        command >= self.on_threshold
    }

    pub fn status(&self) -> LoopStatus {
        LoopStatus {
            variable: self.variable,
            sensor: self.sensor.status(),
            actuator: self.actuator.status(),
            tuning: self.controller.tuning_info(),
        }
    }
}

/// Serializable snapshot of one loop.
#[derive(Debug, Clone, Serialize)]
pub struct LoopStatus {
    pub variable: ControlledVariable,
    pub sensor: SensorStatus,
    pub actuator: ActuatorStatus,
    pub tuning: TuningInfo,
}

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Counters over the runner's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    /// Completed monitoring cycles.
    pub cycle_count: u64,
    /// Readings passed to a controller.
    pub readings: u64,
    /// Sensor reads that returned no value.
    pub missed_readings: u64,
    /// Actuator on/off transitions performed.
    pub actuator_switches: u64,
    /// Failed actuator commands.
    pub actuator_failures: u64,
    /// Alarms raised (missed reads and failed actuator commands).
    pub alarms: u64,
    /// Records the sink rejected.
    pub datalog_failures: u64,
}

// ─── Runner ─────────────────────────────────────────────────────────

/// Drives all configured loops at a fixed interval.
pub struct CycleRunner {
    loops: Vec<ControlLoop>,
    clock: Box<dyn Clock>,
    sink: Box<dyn ReadingSink>,
    /// Wall time between cycles.
    pause: Duration,
    /// Called after every cycle (plant stepping in simulation).
    after_cycle: Option<Box<dyn FnMut() + Send>>,
    stats: CycleStats,
}

impl CycleRunner {
    pub fn new(
        loops: Vec<ControlLoop>,
        clock: Box<dyn Clock>,
        sink: Box<dyn ReadingSink>,
        pause: Duration,
    ) -> Self {
        Self {
            loops,
            clock,
            sink,
            pause,
            after_cycle: None,
            stats: CycleStats::default(),
        }
    }

    pub fn with_after_cycle(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.after_cycle = Some(Box::new(hook));
        self
    }

    pub fn loops(&self) -> &[ControlLoop] {
        &self.loops
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Initialize every sensor and actuator. Stops at the first failure.
    pub fn initialize(&mut self) -> Result<(), DeviceError> {
        for lp in &mut self.loops {
            lp.sensor.initialize()?;
            lp.actuator.initialize()?;
            info!(
                "{} loop ready: sensor={}, actuator={}",
                lp.variable,
                lp.sensor.name(),
                lp.actuator.name()
            );
        }
        Ok(())
    }

    /// One pass over all loops.
    pub fn run_cycle(&mut self) {
        let now = self.clock.now_secs();

        for lp in &mut self.loops {
            let Some(measured) = lp.sensor.read() else {
                warn!("{}: no reading from {}, skipping", lp.variable, lp.sensor.name());
                self.stats.missed_readings += 1;
                Self::raise_alarm(
                    &mut *self.sink,
                    &mut self.stats,
                    Alarm {
                        timestamp: now,
                        kind: AlarmKind::SensorUnavailable,
                        source: lp.sensor.name().to_string(),
                        message: format!("no {} reading", lp.variable),
                    },
                );
                continue;
            };
            self.stats.readings += 1;

            let command = if lp.reverse_acting {
                lp.controller.update_mirrored(measured, Some(now))
            } else {
                lp.controller.update(measured, Some(now))
            };
            debug!(
                variable = %lp.variable,
                measured,
                command,
                "control update"
            );

            Self::record(
                &mut *self.sink,
                &mut self.stats,
                DatalogRecord::Reading(Reading {
                    timestamp: now,
                    sensor: lp.sensor.name().to_string(),
                    variable: lp.variable,
                    value: measured,
                    unit: lp.sensor.unit().to_string(),
                    command,
                }),
            );

            let desired = lp.relay_state(command);
            if desired == lp.actuator.is_active() {
                continue;
            }
            let result = if desired {
                lp.actuator.turn_on()
            } else {
                lp.actuator.turn_off()
            };
            match result {
                Ok(()) => {
                    self.stats.actuator_switches += 1;
                    info!(
                        "{} {}",
                        lp.actuator.name(),
                        if desired { "on" } else { "off" }
                    );
                    Self::record(
                        &mut *self.sink,
                        &mut self.stats,
                        DatalogRecord::Actuator(ActuatorEvent {
                            timestamp: now,
                            actuator: lp.actuator.name().to_string(),
                            kind: lp.actuator.kind(),
                            active: desired,
                        }),
                    );
                }
                Err(e) => {
                    self.stats.actuator_failures += 1;
                    warn!("{}: actuator command failed: {e}", lp.variable);
                    Self::raise_alarm(
                        &mut *self.sink,
                        &mut self.stats,
                        Alarm {
                            timestamp: now,
                            kind: AlarmKind::ActuatorFailure,
                            source: lp.actuator.name().to_string(),
                            message: format!(
                                "turn {} failed: {e}",
                                if desired { "on" } else { "off" }
                            ),
                        },
                    );
                }
            }
        }

        if let Err(e) = self.sink.flush() {
            self.stats.datalog_failures += 1;
            warn!("datalog flush failed: {e}");
        }
        self.stats.cycle_count += 1;

        if let Some(hook) = self.after_cycle.as_mut() {
            hook();
        }
    }

    fn record(sink: &mut dyn ReadingSink, stats: &mut CycleStats, record: DatalogRecord) {
        if let Err(e) = sink.record(record) {
            stats.datalog_failures += 1;
            warn!("datalog write failed: {e}");
        }
    }

    fn raise_alarm(sink: &mut dyn ReadingSink, stats: &mut CycleStats, alarm: Alarm) {
        stats.alarms += 1;
        Self::record(sink, stats, DatalogRecord::Alarm(alarm));
    }

    /// Run cycles until `stop` fires or `max_cycles` cycles have completed,
    /// then turn all actuators off.
    pub fn run(&mut self, stop: &StopToken, max_cycles: Option<u64>) -> CycleStats {
        info!(
            "Monitoring {} loop(s) every {:?}",
            self.loops.len(),
            self.pause
        );
        let start = self.stats.cycle_count;
        while !stop.is_cancelled() {
            self.run_cycle();
            if max_cycles.is_some_and(|max| self.stats.cycle_count - start >= max) {
                break;
            }
            if stop.wait_timeout(self.pause) {
                break;
            }
        }
        self.shutdown();
        self.stats
    }

    /// Turn every actuator off. Failures are logged, not propagated.
    pub fn shutdown(&mut self) {
        let now = self.clock.now_secs();
        for lp in &mut self.loops {
            let was_active = lp.actuator.is_active();
            match lp.actuator.turn_off() {
                Ok(()) if was_active => {
                    self.stats.actuator_switches += 1;
                    Self::record(
                        &mut *self.sink,
                        &mut self.stats,
                        DatalogRecord::Actuator(ActuatorEvent {
                            timestamp: now,
                            actuator: lp.actuator.name().to_string(),
                            kind: lp.actuator.kind(),
                            active: false,
                        }),
                    );
                }
                Ok(()) => {}
                Err(e) => {
                    self.stats.actuator_failures += 1;
                    warn!("{}: failed to turn off {}: {e}", lp.variable, lp.actuator.name());
                }
            }
        }
        if let Err(e) = self.sink.flush() {
            warn!("datalog flush failed: {e}");
        }
        info!("All actuators off after {} cycle(s)", self.stats.cycle_count);
    }

    pub fn status(&self) -> Vec<LoopStatus> {
        self.loops.iter().map(ControlLoop::status).collect()
    }
}
