use std::io::Write;

use heimdall_validator::config::ValidatorConfig;
use heimdall_validator::error::ConfigError;
use heimdall_validator::layer::{Pipeline, register};

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
enabled = true
max_nsec3_iterations = 100
log_level = "debug"
time_override = 1700000000
"#
    )
    .unwrap();

    let config = ValidatorConfig::from_file(file.path()).unwrap();
    assert_eq!(config.max_nsec3_iterations, 100);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.time_override, Some(1_700_000_000));
}

#[test]
fn test_config_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("validator.toml");
    assert!(matches!(ValidatorConfig::from_file(&missing), Err(ConfigError::Io(_))));

    assert!(matches!(
        ValidatorConfig::from_toml_str("max_nsec3_iterations = \"many\""),
        Err(ConfigError::Toml(_))
    ));
    assert!(matches!(
        ValidatorConfig::from_toml_str("max_nsec3_iterations = 0"),
        Err(ConfigError::InvalidIterationLimit(_))
    ));
}

#[test]
fn test_config_round_trips_through_toml() {
    let config = ValidatorConfig {
        enabled: false,
        time_override: Some(42),
        ..Default::default()
    };
    let text = toml::to_string(&config).unwrap();
    assert_eq!(ValidatorConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_config_from_env() {
    // SAFETY: no other test in this binary reads these variables
    unsafe {
        std::env::set_var("HEIMDALL_VALIDATOR_ENABLED", "off");
        std::env::set_var("HEIMDALL_VALIDATOR_MAX_NSEC3_ITERATIONS", "50");
        std::env::set_var("HEIMDALL_VALIDATOR_LOG_LEVEL", "WARN");
    }

    let config = ValidatorConfig::from_env().unwrap();
    assert!(!config.enabled);
    assert_eq!(config.max_nsec3_iterations, 50);
    assert_eq!(config.log_level, "warn");

    let mut pipeline = Pipeline::new();
    assert!(!register(&mut pipeline, &config));
    assert!(pipeline.is_empty());

    unsafe {
        std::env::set_var("HEIMDALL_VALIDATOR_MAX_NSEC3_ITERATIONS", "lots");
    }
    assert!(matches!(
        ValidatorConfig::from_env(),
        Err(ConfigError::InvalidIterationLimit(_))
    ));

    unsafe {
        std::env::remove_var("HEIMDALL_VALIDATOR_ENABLED");
        std::env::remove_var("HEIMDALL_VALIDATOR_MAX_NSEC3_ITERATIONS");
        std::env::remove_var("HEIMDALL_VALIDATOR_LOG_LEVEL");
    }
}
