//! Shared handle under concurrent access.
//!
//! One thread drives updates while readers take tuning snapshots. Every
//! snapshot must be internally consistent: gains inside the band and a
//! history length that never exceeds the capacity or goes backwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use mgb_common::consts::HISTORY_CAPACITY;
use mgb_control::controller::PidConfig;
use mgb_control::shared::SharedController;

#[test]
fn readers_see_consistent_snapshots() {
    let controller =
        SharedController::new(&PidConfig::new(2.0, 0.1, 0.5).with_setpoint(24.0)).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let controller = controller.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut last_count = 0;
                let mut snapshots = 0u64;
                while !done.load(Ordering::Acquire) {
                    let info = controller.tuning_info();
                    assert!(info.live_gains().within_band_of(&info.base_gains()));
                    assert!(info.error_count <= HISTORY_CAPACITY);
                    assert!(info.error_count >= last_count);
                    assert!(info.avg_error.is_finite());
                    last_count = info.error_count;
                    snapshots += 1;
                }
                snapshots
            })
        })
        .collect();

    let writer = {
        let controller = controller.clone();
        thread::spawn(move || {
            for k in 0..5_000 {
                let measured = if k % 2 == 0 { 20.0 } else { 27.0 };
                let out = controller.update(measured, Some(k as f64));
                assert!((0.0..=100.0).contains(&out));
            }
        })
    };

    writer.join().unwrap();
    done.store(true, Ordering::Release);
    for r in readers {
        r.join().unwrap();
    }

    let info = controller.tuning_info();
    assert_eq!(info.error_count, HISTORY_CAPACITY);
    assert!(info.live_gains().within_band_of(&info.base_gains()));
}

#[test]
fn operator_changes_interleave_with_updates() {
    let controller =
        SharedController::new(&PidConfig::new(2.0, 0.1, 0.5).with_setpoint(24.0)).unwrap();

    let operator = {
        let controller = controller.clone();
        thread::spawn(move || {
            for k in 0..500 {
                controller.set_setpoint(20.0 + (k % 10) as f64).unwrap();
                if k % 50 == 0 {
                    controller.reset_to_base_parameters();
                }
                controller.set_adaptive(k % 3 != 0);
            }
        })
    };

    for k in 0..5_000 {
        let out = controller.update(22.0, Some(k as f64));
        assert!((0.0..=100.0).contains(&out));
    }
    operator.join().unwrap();

    let info = controller.tuning_info();
    assert!(info.live_gains().within_band_of(&info.base_gains()));
    assert!(info.error_count <= HISTORY_CAPACITY);
}
