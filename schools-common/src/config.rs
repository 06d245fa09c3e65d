//! Pipeline configuration and TOML config resolution
//!
//! All lookup tables the pipeline depends on (borough letters, test category
//! labels, name abbreviations, representative grade columns) live here and are
//! passed explicitly to the components that need them. The compiled defaults
//! reproduce the tables of the upstream open-data sources.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SCHOOLS_DATA_CONFIG";

/// Top-level pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Borough letter (as found at offset 2 of the school code) → full name
    pub boroughs: BTreeMap<String, String>,

    /// Lowercased raw test category label → canonical category key
    pub categories: BTreeMap<String, String>,

    /// Punctuated abbreviations recognised in display names, checked in order
    pub abbreviations: Vec<AbbreviationRule>,

    pub grade_bands: GradeBandConfig,
    pub resolver: ResolverConfig,
    pub coercion: CoercionConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

/// A short code and the punctuated spellings that map to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbbreviationRule {
    /// Short code emitted in the short name ("PS", "MS", "IS")
    pub code: String,
    /// Uppercase spellings searched for in the display name
    pub variants: Vec<String>,
}

/// Representative grade-enrollment column per grade band
///
/// A band is flagged when its representative column is positive. The
/// elementary column changes how K-2-only schools classify, so it is
/// configuration rather than a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeBandConfig {
    pub pre_k: String,
    pub elementary: String,
    pub middle: String,
    pub high: String,
}

impl Default for GradeBandConfig {
    fn default() -> Self {
        Self {
            pre_k: "grade_3k_pk_half_day_full".to_string(),
            elementary: "grade_1".to_string(),
            middle: "grade_7".to_string(),
            high: "grade_10".to_string(),
        }
    }
}

/// School resolver tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Token-set score (0-100) a clean name must exceed to survive stage 2
    pub fuzzy_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { fuzzy_threshold: 80.0 }
    }
}

/// Suppressed-percentage sentinels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoercionConfig {
    pub below_label: String,
    pub below_value: f64,
    pub above_label: String,
    pub above_value: f64,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            below_label: "Below 5%".to_string(),
            below_value: 0.04,
            above_label: "Above 95%".to_string(),
            above_value: 0.96,
        }
    }
}

/// Segregation analysis options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Seed for multiset-size equalization; `None` draws from OS entropy
    pub seed: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive (overridden by `RUST_LOG`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let boroughs = [
            ("M", "Manhattan"),
            ("K", "Brooklyn"),
            ("X", "Bronx"),
            ("Q", "Queens"),
            ("R", "Staten Island"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let categories = [
            ("all students", "all"),
            ("never ell", "never_ell"),
            ("ever ell", "ever_ell"),
            ("current ell", "current_ell"),
            ("ell", "current_ell"),
            ("swd", "swd"),
            ("not swd", "not_swd"),
            ("econ disadv", "econ_disadv"),
            ("not econ disadv", "not_econ_disadv"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let abbreviations = [("PS", "P.S.", "P. S."), ("MS", "M.S.", "M. S."), ("IS", "I.S.", "I. S.")]
            .into_iter()
            .map(|(code, a, b)| AbbreviationRule {
                code: code.to_string(),
                variants: vec![a.to_string(), b.to_string()],
            })
            .collect();

        Self {
            boroughs,
            categories,
            abbreviations,
            grade_bands: GradeBandConfig::default(),
            resolver: ResolverConfig::default(),
            coercion: CoercionConfig::default(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tables the pipeline cannot use
    pub fn validate(&self) -> Result<()> {
        if self.boroughs.is_empty() {
            return Err(Error::Config("borough table is empty".to_string()));
        }
        for key in self.boroughs.keys() {
            if key.chars().count() != 1 {
                return Err(Error::Config(format!(
                    "borough key '{}' must be a single letter",
                    key
                )));
            }
        }
        if !(0.0..=100.0).contains(&self.resolver.fuzzy_threshold) {
            return Err(Error::Config(format!(
                "resolver.fuzzy_threshold {} out of range [0, 100]",
                self.resolver.fuzzy_threshold
            )));
        }
        for (label, value) in [
            ("coercion.below_value", self.coercion.below_value),
            ("coercion.above_value", self.coercion.above_value),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} {} out of range [0, 1]",
                    label, value
                )));
            }
        }
        Ok(())
    }
}

/// Config file path resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. `<config dir>/schools-data/config.toml`
///
/// Returns `None` when no candidate exists (compiled defaults apply).
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: user config directory
    default_config_path().filter(|p| p.exists())
}

/// Platform config location (`~/.config/schools-data/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("schools-data").join("config.toml"))
}

/// Load configuration following [`resolve_config_path`] priority
///
/// An explicitly named file (CLI or environment) must exist and parse. A
/// missing default file falls back to compiled defaults with a warning.
pub fn load_config(cli_arg: Option<&Path>) -> Result<PipelineConfig> {
    let explicit = cli_arg.is_some() || std::env::var(CONFIG_ENV_VAR).is_ok();

    match resolve_config_path(cli_arg, CONFIG_ENV_VAR) {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path)?;
            let config = PipelineConfig::from_toml_str(&content)?;
            info!("Loaded pipeline config from {}", path.display());
            Ok(config)
        }
        Some(path) if explicit => Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        ))),
        _ => {
            warn!("No config file found, using compiled defaults");
            Ok(PipelineConfig::default())
        }
    }
}

/// Write a config file atomically (temp file + rename)
pub fn write_toml_config(config: &PipelineConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = target.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let config = PipelineConfig::default();
        assert_eq!(config.boroughs.len(), 5);
        assert_eq!(config.boroughs.get("K").map(String::as_str), Some("Brooklyn"));
        assert_eq!(config.boroughs.get("R").map(String::as_str), Some("Staten Island"));
        assert_eq!(config.categories.get("not swd").map(String::as_str), Some("not_swd"));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [grade_bands]
            elementary = "grade_2"

            [resolver]
            fuzzy_threshold = 85.0
            "#,
        )
        .unwrap();

        assert_eq!(config.grade_bands.elementary, "grade_2");
        assert_eq!(config.grade_bands.middle, "grade_7");
        assert_eq!(config.resolver.fuzzy_threshold, 85.0);
        assert_eq!(config.boroughs.len(), 5);
    }

    #[test]
    fn test_multi_letter_borough_key_rejected() {
        let result = PipelineConfig::from_toml_str(
            r#"
            [boroughs]
            MN = "Manhattan"
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let result = PipelineConfig::from_toml_str(
            r#"
            [resolver]
            fuzzy_threshold = 120.0
            "#,
        );
        assert!(result.is_err());
    }
}
