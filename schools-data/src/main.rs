//! schools-data - NYC school data pipeline CLI
//!
//! Loads demographic (and optionally test-score) rows from JSON files, runs
//! one pipeline operation and prints the result as JSON on stdout. Logs go
//! to stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use schools_common::config::{load_config, resolve_config_path, write_toml_config, CONFIG_ENV_VAR};
use schools_common::PipelineConfig;
use schools_data::models::Subject;
use schools_data::services::{
    aggregate, aggregate_by_borough, combine, disambiguation_choices, sort_districts, DistrictOrder,
    FeatureTable, SortDirection, SortKey,
};
use schools_data::source::JsonFileSource;
use schools_data::Pipeline;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "schools-data", version)]
#[command(about = "Normalize, resolve and analyze NYC school demographic and test-score data")]
struct Cli {
    /// Pipeline config file (overrides SCHOOLS_DATA_CONFIG and the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Demographic snapshot rows (JSON array of row objects)
    #[arg(long, global = true)]
    demographics: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a free-text school reference ("ms88", "peter rouget")
    Resolve {
        query: String,

        /// Academic year to search (default: latest year present)
        #[arg(long)]
        year: Option<i32>,
    },

    /// District (or borough) rollups
    Districts {
        /// Sort column: district, year, school_count, total_enrollment,
        /// <category> (percentage) or <category>_count
        #[arg(long)]
        sort_by: Option<String>,

        #[arg(long)]
        ascending: bool,

        /// Roll up by borough instead of district
        #[arg(long)]
        by_borough: bool,
    },

    /// Per-school chi-square and KS segregation tests
    Segregation {
        /// RNG seed for multiset equalization (overrides analysis.seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Merge pivoted test scores onto the school table
    Pivot {
        /// Long-format test rows (JSON array of row objects)
        #[arg(long)]
        tests: PathBuf,

        /// math or ela
        #[arg(long)]
        subject: Subject,
    },

    /// Write the compiled default configuration to a file
    InitConfig {
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load pipeline config")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting schools-data v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match resolve_config_path(cli.config.as_deref(), CONFIG_ENV_VAR) {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: compiled defaults"),
    }

    if let Command::InitConfig { path } = &cli.command {
        write_toml_config(&PipelineConfig::default(), path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let Some(demographics) = cli.demographics.clone() else {
        bail!("--demographics <json> is required for this command");
    };

    let pipeline = Pipeline::new(config)?;
    let mut source = JsonFileSource::new(demographics);
    if let Command::Pivot { tests, subject } = &cli.command {
        source = source.with_tests(*subject, tests);
    }
    let schools = pipeline.load_schools(&source)?;

    match cli.command {
        Command::Resolve { query, year } => {
            let matches = pipeline.resolver(&schools).resolve_utterance(&query, year);
            info!("{} match(es) for '{}'", matches.len(), query);
            print_json(&serde_json::json!({
                "matches": matches,
                "choices": disambiguation_choices(&matches),
            }))?;
        }
        Command::Districts {
            sort_by,
            ascending,
            by_borough,
        } => {
            if by_borough {
                print_json(&aggregate_by_borough(&schools))?;
            } else {
                let mut districts = aggregate(&schools);
                if let Some(column) = sort_by {
                    let direction = if ascending {
                        SortDirection::Ascending
                    } else {
                        SortDirection::Descending
                    };
                    let key: SortKey = column.parse()?;
                    sort_districts(&mut districts, &DistrictOrder::new(key, direction));
                }
                print_json(&districts)?;
            }
        }
        Command::Segregation { seed } => {
            let results = pipeline.segregation(&schools, seed)?;
            print_json(&results)?;
        }
        Command::Pivot { subject, .. } => {
            let rows = pipeline.load_tests(&source, subject)?;
            let table = combine(FeatureTable::from_schools(schools), &rows, subject)?;
            print_json(&table.to_json_rows())?;
        }
        Command::InitConfig { .. } => {}
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
