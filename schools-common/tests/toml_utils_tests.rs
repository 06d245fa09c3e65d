//! Unit tests for atomic TOML config writes

use schools_common::config::{write_toml_config, PipelineConfig};
use tempfile::TempDir;

#[test]
fn test_atomic_write_cleans_up_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("config.toml");

    write_toml_config(&PipelineConfig::default(), &target).unwrap();

    assert!(target.exists());
    assert!(!temp_dir.path().join("config.toml.tmp").exists());
}

#[test]
fn test_atomic_write_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("schools-data").join("config.toml");

    write_toml_config(&PipelineConfig::default(), &target).unwrap();
    assert!(target.exists());
}

#[test]
fn test_atomic_write_preserves_custom_fields() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("config.toml");

    let mut config = PipelineConfig::default();
    config.grade_bands.elementary = "grade_2".to_string();
    config.analysis.seed = Some(42);
    config.boroughs.insert("Z".to_string(), "Zanzibar".to_string());

    write_toml_config(&config, &target).unwrap();

    let content = std::fs::read_to_string(&target).unwrap();
    let parsed = PipelineConfig::from_toml_str(&content).unwrap();
    assert_eq!(parsed.grade_bands.elementary, "grade_2");
    assert_eq!(parsed.analysis.seed, Some(42));
    assert_eq!(parsed.boroughs.get("Z").map(String::as_str), Some("Zanzibar"));
}

#[test]
fn test_atomic_write_overwrites_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("config.toml");
    std::fs::write(&target, "garbage that is not toml [[[").unwrap();

    write_toml_config(&PipelineConfig::default(), &target).unwrap();

    let content = std::fs::read_to_string(&target).unwrap();
    assert!(PipelineConfig::from_toml_str(&content).is_ok());
}
