use std::fs;

use fschurn_config::{parse_duration, Config, ConfigError, DigestAlgorithm};
use tempfile::TempDir;

#[test]
fn test_load_explicit_file_with_env_overrides() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("fschurn.toml");
    fs::write(
        &path,
        r#"
        [store]
        algorithm = "blake3"
        fsync = true

        [pipeline]
        workers = 3
        seed = 7

        [pipeline.sample]
        admit_probability = 0.5

        [generator.sizes]
        min = 4096
        max = 8192
        "#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.store.algorithm, DigestAlgorithm::Blake3);
    assert!(config.store.fsync);
    assert_eq!(config.pipeline.workers, 3);
    assert_eq!(config.pipeline.seed, Some(7));
    assert_eq!(config.pipeline.sample.admit_probability, 0.5);
    assert_eq!(config.pipeline.sample.max_replicas, 3);
    assert_eq!(config.generator.sizes.min, 4096);
    config.validate().unwrap();

    // Environment wins over the file. This is the only test in this binary touching these vars.
    std::env::set_var("FSCHURN_WORKERS", "6");
    std::env::set_var("FSCHURN_DIGEST", "sha256");
    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.pipeline.workers, 6);
    assert_eq!(config.store.algorithm, DigestAlgorithm::Sha256);

    std::env::set_var("FSCHURN_WORKERS", "many");
    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Invalid(_))
    ));

    std::env::remove_var("FSCHURN_WORKERS");
    std::env::remove_var("FSCHURN_DIGEST");
}

#[test]
fn test_missing_explicit_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let result = Config::from_file(&temp.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_malformed_toml_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.toml");
    fs::write(&path, "[pipeline\nworkers = ").unwrap();
    assert!(matches!(Config::from_file(&path), Err(ConfigError::Toml(_))));
}

#[test]
fn test_durations_used_by_time_boxed_tools() {
    assert_eq!(parse_duration("30s").unwrap().as_secs(), 30);
    assert_eq!(parse_duration("1h").unwrap().as_secs(), 3600);
    assert!(parse_duration("forever").is_err());
}
