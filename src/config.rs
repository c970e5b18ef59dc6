// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const API_KEY_ENV: &str = "CENSUS_API_KEY";

/// Tie-breaking rule for derived integer rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// 2.5 → 3, -2.5 → -3
    #[default]
    HalfUp,
    /// 2.5 → 2, 3.5 → 4
    HalfEven,
}

impl RoundingMode {
    pub fn round(self, v: f64) -> f64 {
        match self {
            // f64::round already breaks ties away from zero
            RoundingMode::HalfUp => v.round(),
            RoundingMode::HalfEven => v.round_ties_even(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Parquet,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub state_occupations: PathBuf,
    pub metro_occupations: PathBuf,
    pub national_occupations: PathBuf,
    pub case_counts: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            state_occupations: PathBuf::from("data/state_M2019_dl.csv"),
            metro_occupations: PathBuf::from("data/MSA_M2019_dl.csv"),
            national_occupations: PathBuf::from("data/national_M2019_dl.csv"),
            case_counts: PathBuf::from("data/case_counts.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensusConfig {
    pub base_url: String,
    pub year: u16,
    /// Survey path segment, e.g. `acs1` for 1-year estimates.
    pub survey: String,
    /// Total-population estimate variable.
    pub variable: String,
    pub api_key: Option<String>,
    /// Pipe-delimited `STATE|STUSAB|STATE_NAME|STATENS` reference file.
    pub state_codes_url: String,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.census.gov/data".into(),
            year: 2018,
            survey: "acs1".into(),
            variable: "B01003_001E".into(),
            api_key: None,
            state_codes_url: "https://www2.census.gov/geo/docs/reference/state.txt".into(),
            max_retries: 3,
            initial_backoff_ms: 500,
        }
    }
}

/// Column overrides for the case-count extract. Unset fields fall back to the alias table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseConfig {
    pub name_column: Option<String>,
    pub count_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub formats: Vec<OutputFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            formats: vec![OutputFormat::Parquet, OutputFormat::Csv],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub inputs: InputPaths,
    pub census: CensusConfig,
    pub cases: CaseConfig,
    pub output: OutputConfig,
    pub rounding: RoundingMode,
}

impl PipelineConfig {
    /// Read a YAML config; every section is optional.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Fill `census.api_key` from the environment when the file left it unset.
    pub fn with_env(mut self) -> Self {
        if self.census.api_key.is_none() {
            self.census.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        self
    }
}
