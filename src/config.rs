//! Parser configuration.
//!
//! Settings come from a configuration file (any format the `config` crate
//! knows, TOML in practice) overlaid with `CCG_*` environment variables, e.g.
//! `CCG_BEAM_SIZE=32`.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::{CcgError, Result};

/// How the chart decides that two nodes belong to one equivalence class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Packing {
    /// Category, variables and unfilled dependencies.
    #[default]
    Exact,
    /// As `Exact`, but nodes with different numbers of filled dependencies
    /// below them are kept apart. Needed by the F-score oracle.
    SplitByOutside,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub max_words: usize,
    pub max_supercats: usize,
    pub beam_size: usize,
    /// Log-space margin below the best score of a cell.
    pub beam_beta: f64,
    pub use_beam: bool,
    /// Best-first pair enumeration for large cells. Only takes effect with
    /// `use_beam`; the adaptive mode always combines every pair.
    pub cube_pruning: bool,
    /// Supertagger cutoffs, tightest first.
    pub betas: Vec<f64>,
    pub start_level: usize,
    pub seen_rules: bool,
    pub packing: Packing,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_words: 250,
            max_supercats: 300_000,
            beam_size: 16,
            beam_beta: 8.0,
            use_beam: true,
            cube_pruning: true,
            betas: vec![0.075, 0.03, 0.01, 0.005, 0.001],
            start_level: 0,
            seen_rules: false,
            packing: Packing::Exact,
        }
    }
}

impl ParserConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("CCG").try_parsing(true))
            .build()?;
        let config: ParserConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        let config: ParserConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.beam_size == 0 {
            return Err(CcgError::Config("beam_size must be positive".into()));
        }
        if self.betas.is_empty() {
            return Err(CcgError::Config("betas must not be empty".into()));
        }
        if self.start_level >= self.betas.len() {
            return Err(CcgError::Config(format!(
                "start_level {} is outside the {} beta levels",
                self.start_level,
                self.betas.len()
            )));
        }
        if self.max_words == 0 || self.max_words > u16::MAX as usize {
            return Err(CcgError::Config(format!("max_words {} out of range", self.max_words)));
        }
        Ok(())
    }

    /// Supertagger cutoff of a level.
    pub fn beta(&self, level: usize) -> f64 {
        self.betas.get(level).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ParserConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ParserConfig::from_toml_str("beam_size = 4\npacking = \"split_by_outside\"").unwrap();
        assert_eq!(config.beam_size, 4);
        assert_eq!(config.packing, Packing::SplitByOutside);
        assert_eq!(config.max_supercats, 300_000);
    }
}
