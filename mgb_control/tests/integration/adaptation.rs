//! Adaptation behaviour over long runs.
//!
//! Each scenario drives the controller with a synthetic measurement series
//! that keeps the error statistics in one regime, then checks the direction
//! of the gain drift and that the band around the base gains holds.

use mgb_control::control::adaptation::Regime;
use mgb_control::control::pid::PidGains;
use mgb_control::controller::{AdaptivePid, PidConfig};
use mgb_control::state::ControllerState;

const BASE: PidGains = PidGains::new(2.0, 0.1, 0.5);

fn controller() -> AdaptivePid {
    AdaptivePid::new(&PidConfig::new(BASE.kp, BASE.ki, BASE.kd).with_setpoint(10.0)).unwrap()
}

fn drive(c: &mut AdaptivePid, updates: usize, measured: impl Fn(usize) -> f64) {
    for k in 0..updates {
        c.update(measured(k), Some(k as f64));
        assert!(
            c.gains().within_band_of(&c.base_gains()),
            "gains {:?} left the band at update {k}",
            c.gains()
        );
    }
}

#[test]
fn persistent_large_error_raises_kp_to_ceiling() {
    let mut c = controller();
    drive(&mut c, 1000, |_| 0.0);

    let g = c.gains();
    assert!((g.kp - 5.0 * BASE.kp).abs() < 1e-9);
    assert_eq!(g.ki, BASE.ki);
    assert_eq!(g.kd, BASE.kd);
    assert_eq!(c.last_adaptation().unwrap().regime, Regime::LargeError);
}

#[test]
fn oscillating_error_lowers_kp_and_raises_kd() {
    let mut c = controller();
    // |error| alternates 0.2 / 3.0.
    drive(&mut c, 2000, |k| if k % 2 == 0 { 9.8 } else { 13.0 });

    let g = c.gains();
    assert!(g.kp < 0.2 * BASE.kp, "kp {}", g.kp);
    assert!(g.kp >= 0.1 * BASE.kp);
    assert!((g.kd - 5.0 * BASE.kd).abs() < 1e-9);
    assert_eq!(g.ki, BASE.ki);
    assert_eq!(c.last_adaptation().unwrap().regime, Regime::Oscillating);
}

#[test]
fn steady_offset_raises_ki_only() {
    let mut c = controller();
    drive(&mut c, 1000, |_| 9.5);

    let g = c.gains();
    assert!(g.ki > 2.0 * BASE.ki, "ki {}", g.ki);
    assert_eq!(g.kp, BASE.kp);
    assert_eq!(g.kd, BASE.kd);
    assert_eq!(c.last_adaptation().unwrap().regime, Regime::SteadyStateError);
}

#[test]
fn small_error_leaves_gains_alone() {
    let mut c = controller();
    drive(&mut c, 500, |_| 9.95);
    assert_eq!(c.gains(), BASE);
    assert_eq!(c.last_adaptation().unwrap().regime, Regime::Nominal);
}

#[test]
fn adaptation_runs_every_interval() {
    let mut c = AdaptivePid::new(
        &PidConfig::new(BASE.kp, BASE.ki, BASE.kd)
            .with_setpoint(10.0)
            .with_adaptation_interval(25),
    )
    .unwrap();

    drive(&mut c, 24, |_| 0.0);
    assert!(c.last_adaptation().is_none());
    assert_eq!(c.cycles_since_adaptation(), 24);

    c.update(0.0, Some(24.0));
    assert_eq!(c.cycles_since_adaptation(), 0);
    assert!((c.gains().kp - BASE.kp * 1.02).abs() < 1e-9);
}

#[test]
fn disabling_adaptation_restores_and_pins_base_gains() {
    let mut c = controller();
    drive(&mut c, 200, |_| 0.0);
    assert_ne!(c.gains(), BASE);

    c.set_adaptive(false);
    assert_eq!(c.gains(), BASE);
    assert_eq!(c.state(), ControllerState::Locked);

    for k in 200..400 {
        c.update(0.0, Some(k as f64));
    }
    assert_eq!(c.gains(), BASE);
    assert_eq!(c.tuning_info().error_count, 20);
}

#[test]
fn reset_to_base_clears_history_but_keeps_setpoint() {
    let mut c = controller();
    drive(&mut c, 200, |_| 0.0);
    c.reset_to_base_parameters();

    let info = c.tuning_info();
    assert_eq!(info.live_gains(), BASE);
    assert_eq!(info.error_count, 0);
    assert_eq!(info.avg_error, 0.0);
    assert_eq!(info.setpoint, 10.0);
    assert_eq!(c.cycles_since_adaptation(), 0);
    assert_eq!(c.state(), ControllerState::Tracking);
}
