//! Chamber configuration loading from disk.

use std::io::Write;
use std::path::Path;

use mgb_common::config::{ConfigError, LogLevel};
use mgb_common::reading::ControlledVariable;
use mgb_control::config::load_config;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn shipped_chamber_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/chamber.toml");
    let cfg = load_config(&path).unwrap();

    assert_eq!(cfg.shared.log_level, LogLevel::Info);
    assert_eq!(cfg.loops.iter().count(), 3);
    let co2 = cfg.loops.get(ControlledVariable::Co2).unwrap();
    assert!(co2.reverse_acting);
    for (_, lp) in cfg.loops.iter() {
        lp.build_controller().unwrap();
    }
}

#[test]
fn missing_file_is_reported_with_path() {
    let err = load_config(Path::new("/nonexistent/mgb/chamber.toml")).unwrap_err();
    match err {
        ConfigError::FileNotFound(path) => assert!(path.contains("chamber.toml")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_config("[shared\nservice_name = ");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn invalid_learning_rate_is_rejected() {
    let file = write_config(
        r#"
[shared]
service_name = "mgb-test"

[loops.temperature]
kp = 1.0
ki = 0.1
kd = 0.0
learning_rate = 1.5
"#,
    );
    match load_config(file.path()) {
        Err(ConfigError::ValidationError(msg)) => {
            assert!(msg.contains("loops.temperature"), "{msg}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn negative_gain_is_rejected() {
    let file = write_config(
        r#"
[shared]
service_name = "mgb-test"

[loops.humidity]
kp = -1.0
ki = 0.1
kd = 0.0
"#,
    );
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}
