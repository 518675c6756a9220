//! Control accuracy against a first-order plant.
//!
//! Verifies the controller settles on a step in setpoint with and without
//! gain adaptation, and that adaptation keeps the loop stable.

use mgb_control::controller::{AdaptivePid, PidConfig};

/// First-order thermal plant: `ẋ = (ambient − x) / tau + gain · u`.
struct FirstOrderPlant {
    value: f64,
    ambient: f64,
    tau: f64,
    gain: f64,
}

impl FirstOrderPlant {
    fn new(ambient: f64, tau: f64, gain: f64) -> Self {
        Self {
            value: ambient,
            ambient,
            tau,
            gain,
        }
    }

    fn step(&mut self, command: f64, dt: f64) {
        self.value += dt * ((self.ambient - self.value) / self.tau + self.gain * command);
    }
}

/// Run `cycles` samples 1 s apart and return the plant trajectory.
fn run_closed_loop(config: &PidConfig, cycles: usize) -> (Vec<f64>, AdaptivePid) {
    let mut controller = AdaptivePid::new(config).unwrap();
    let mut plant = FirstOrderPlant::new(18.0, 100.0, 0.01);
    let mut trajectory = Vec::with_capacity(cycles);

    for k in 0..cycles {
        let command = controller.update(plant.value, Some(k as f64));
        assert!(
            controller.output_bounds().contains(command),
            "command {command} out of bounds"
        );
        plant.step(command, 1.0);
        trajectory.push(plant.value);
    }
    (trajectory, controller)
}

fn reference_config() -> PidConfig {
    PidConfig::new(2.0, 0.1, 0.0).with_setpoint(24.0)
}

#[test]
fn fixed_gains_settle_on_setpoint() {
    let (trajectory, controller) =
        run_closed_loop(&reference_config().with_adaptive(false), 3000);

    let final_value = *trajectory.last().unwrap();
    assert!(
        (final_value - 24.0).abs() < 0.05,
        "final value {final_value} not within 0.05 of 24"
    );
    assert_eq!(controller.gains(), controller.base_gains());
}

#[test]
fn adaptive_gains_settle_on_setpoint() {
    let (trajectory, controller) = run_closed_loop(&reference_config(), 3000);

    let final_value = *trajectory.last().unwrap();
    assert!(
        (final_value - 24.0).abs() < 0.05,
        "final value {final_value} not within 0.05 of 24"
    );
    assert!(controller.gains().within_band_of(&controller.base_gains()));
}

#[test]
fn adaptive_loop_never_diverges() {
    let (trajectory, _) = run_closed_loop(&reference_config(), 3000);
    let peak = trajectory.iter().copied().fold(f64::MIN, f64::max);
    assert!(peak < 30.0, "overshoot to {peak}");
    assert!(trajectory.iter().all(|v| v.is_finite()));
}

#[test]
fn setpoint_step_is_tracked() {
    let mut controller = AdaptivePid::new(&reference_config().with_adaptive(false)).unwrap();
    let mut plant = FirstOrderPlant::new(18.0, 100.0, 0.01);

    for k in 0..2000 {
        let u = controller.update(plant.value, Some(k as f64));
        plant.step(u, 1.0);
    }
    controller.set_setpoint(28.0).unwrap();
    assert_eq!(controller.integral(), 0.0);

    for k in 2000..5000 {
        let u = controller.update(plant.value, Some(k as f64));
        plant.step(u, 1.0);
    }
    assert!(
        (plant.value - 28.0).abs() < 0.05,
        "final value {} not within 0.05 of 28",
        plant.value
    );
}

#[test]
fn integral_limit_bounds_windup_under_saturation() {
    // Output capped at 5 cannot hold 24 °C (needs 6): the error persists.
    let config = reference_config()
        .with_adaptive(false)
        .with_output_bounds(0.0, 5.0)
        .with_integral_limit(50.0);
    let (_, controller) = run_closed_loop(&config, 2000);
    assert!(controller.integral() <= 50.0);

    let unbounded = reference_config()
        .with_adaptive(false)
        .with_output_bounds(0.0, 5.0);
    let (_, controller) = run_closed_loop(&unbounded, 2000);
    assert!(controller.integral() > 50.0);
}
