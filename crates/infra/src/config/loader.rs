//! Configuration loader
//!
//! Loads pipeline configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from a TOML file
//! 3. Probes multiple paths for config files
//!
//! ## Environment Variables
//! - `TIMELENS_RAW_DIR`: Raw archive input directory
//! - `TIMELENS_MERGED_DIR`: Merged working directory
//! - `TIMELENS_OUT_DIR`: Final output directory
//! - `TIMELENS_WORKERS`: Worker pool size (optional, 0 = auto)
//!
//! ## File Locations
//! The loader probes `./timelens.toml` and `./config.toml` in the current
//! working directory.

use std::path::{Path, PathBuf};

use timelens_domain::{PipelineConfig, Result, TimelensError};

/// Load configuration with automatic fallback strategy.
pub fn load() -> Result<PipelineConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(err) => {
            tracing::debug!(error = ?err, "environment configuration incomplete, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables. The three directory
/// variables are required; everything else keeps its default.
pub fn load_from_env() -> Result<PipelineConfig> {
    let raw_dir = env_var("TIMELENS_RAW_DIR")?;
    let merged_dir = env_var("TIMELENS_MERGED_DIR")?;
    let out_dir = env_var("TIMELENS_OUT_DIR")?;
    let worker_count = match std::env::var("TIMELENS_WORKERS") {
        Ok(value) => value
            .parse::<usize>()
            .map_err(|e| TimelensError::Config(format!("invalid TIMELENS_WORKERS: {e}")))?,
        Err(_) => 0,
    };

    Ok(PipelineConfig {
        raw_dir: PathBuf::from(raw_dir),
        merged_dir: PathBuf::from(merged_dir),
        out_dir: PathBuf::from(out_dir),
        worker_count,
        ..PipelineConfig::default()
    })
}

/// Load configuration from a TOML file. With no explicit path, probes
/// `timelens.toml` then `config.toml` in the working directory.
pub fn load_from_file(path: Option<&Path>) -> Result<PipelineConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_default_paths()?,
    };

    let text = std::fs::read_to_string(&path)
        .map_err(|e| TimelensError::Config(format!("read {}: {e}", path.display())))?;
    let config = toml::from_str(&text)
        .map_err(|e| TimelensError::Config(format!("parse {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "configuration loaded from file");
    Ok(config)
}

fn probe_default_paths() -> Result<PathBuf> {
    for candidate in ["timelens.toml", "config.toml"] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(path);
        }
    }
    Err(TimelensError::Config("no configuration file found".to_string()))
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| TimelensError::Config(format!("missing environment variable {name}")))
}
