//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::binning::OverflowPolicy;
use crate::models::{DistanceBasis, Grouping, ShotType};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Shot classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Putts longer than this are long putts (collar shots become ARG).
    #[serde(default = "default_long_putt_feet")]
    pub long_putt_feet: f64,

    /// Off-green shots longer than this are approaches.
    #[serde(default = "default_arg_green_yards")]
    pub arg_green_yards: f64,

    /// An approach is "advanced" when it leaves more than this share of its start distance.
    #[serde(default = "default_advanced_pct")]
    pub advanced_pct: f64,

    /// Pars on which a tee shot is a TEE shot rather than an approach.
    #[serde(default = "default_tee_shot_pars")]
    pub tee_shot_pars: Vec<u8>,
}

fn default_long_putt_feet() -> f64 {
    12.0
}

fn default_arg_green_yards() -> f64 {
    30.0
}

fn default_advanced_pct() -> f64 {
    0.5
}

fn default_tee_shot_pars() -> Vec<u8> {
    vec![4, 5]
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            long_putt_feet: default_long_putt_feet(),
            arg_green_yards: default_arg_green_yards(),
            advanced_pct: default_advanced_pct(),
            tee_shot_pars: default_tee_shot_pars(),
        }
    }
}

impl ClassifierConfig {
    pub fn long_putt_inches(&self) -> f64 {
        self.long_putt_feet * 12.0
    }

    pub fn arg_inches(&self) -> f64 {
        self.arg_green_yards * 36.0
    }
}

/// Distance binning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinningConfig {
    /// Upper bound for full-hole bins (tee shots, approaches, distance left).
    #[serde(default = "default_max_hole_yards")]
    pub max_hole_yards: u32,

    /// Upper bound for on-green bins.
    #[serde(default = "default_max_green_yards")]
    pub max_green_yards: u32,

    /// Target number of quantile bins per group.
    #[serde(default = "default_target_quantile_count")]
    pub target_quantile_count: usize,

    /// Share of distinct cut points kept when a group has few distinct distances.
    #[serde(default = "default_quantile_shrink")]
    pub quantile_shrink: f64,

    #[serde(default)]
    pub overflow: OverflowPolicy,
}

fn default_max_hole_yards() -> u32 {
    700
}

fn default_max_green_yards() -> u32 {
    50
}

fn default_target_quantile_count() -> usize {
    40
}

fn default_quantile_shrink() -> f64 {
    0.75
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            max_hole_yards: default_max_hole_yards(),
            max_green_yards: default_max_green_yards(),
            target_quantile_count: default_target_quantile_count(),
            quantile_shrink: default_quantile_shrink(),
            overflow: OverflowPolicy::default(),
        }
    }
}

/// LOWESS smoother settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmootherConfig {
    #[serde(default = "default_max_frac")]
    pub max_frac: f64,

    #[serde(default = "default_min_frac")]
    pub min_frac: f64,

    /// How fast the span shrinks as the bin count approaches `binning.target_quantile_count`.
    #[serde(default = "default_frac_slope")]
    pub frac_slope: f64,

    /// Points closer than this share of the x range reuse the last fit.
    #[serde(default = "default_delta_fraction")]
    pub delta_fraction: f64,

    #[serde(default = "default_robust_iterations")]
    pub robust_iterations: usize,
}

fn default_max_frac() -> f64 {
    0.9
}

fn default_min_frac() -> f64 {
    0.3
}

fn default_frac_slope() -> f64 {
    0.3
}

fn default_delta_fraction() -> f64 {
    0.01
}

fn default_robust_iterations() -> usize {
    3
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            max_frac: default_max_frac(),
            min_frac: default_min_frac(),
            frac_slope: default_frac_slope(),
            delta_fraction: default_delta_fraction(),
            robust_iterations: default_robust_iterations(),
        }
    }
}

/// Model grouping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Basis for TEE models.
    #[serde(default = "default_tee_basis")]
    pub tee_basis: DistanceBasis,

    /// Basis for every other shot type.
    #[serde(default = "default_basis")]
    pub basis: DistanceBasis,

    #[serde(default = "Grouping::defaults")]
    pub groupings: Vec<Grouping>,
}

fn default_tee_basis() -> DistanceBasis {
    DistanceBasis::Start
}

fn default_basis() -> DistanceBasis {
    DistanceBasis::Left
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            tee_basis: default_tee_basis(),
            basis: default_basis(),
            groupings: Grouping::defaults(),
        }
    }
}

impl GroupingConfig {
    pub fn basis_for(&self, shot_type: ShotType) -> DistanceBasis {
        if shot_type == ShotType::Tee {
            self.tee_basis
        } else {
            self.basis
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub binning: BinningConfig,

    #[serde(default)]
    pub smoother: SmootherConfig,

    #[serde(default)]
    pub grouping: GroupingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            classifier: ClassifierConfig::default(),
            binning: BinningConfig::default(),
            smoother: SmootherConfig::default(),
            grouping: GroupingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if self.classifier.long_putt_feet <= 0.0 {
            return invalid("long_putt_feet must be greater than 0");
        }
        if self.classifier.arg_green_yards <= 0.0 {
            return invalid("arg_green_yards must be greater than 0");
        }
        if !(self.classifier.advanced_pct > 0.0 && self.classifier.advanced_pct <= 1.0) {
            return invalid("advanced_pct must be in (0, 1]");
        }

        if self.binning.max_hole_yards == 0 || self.binning.max_green_yards == 0 {
            return invalid("bin upper bounds must be greater than 0");
        }
        if self.binning.target_quantile_count == 0 {
            return invalid("target_quantile_count must be at least 1");
        }
        if !(self.binning.quantile_shrink > 0.0 && self.binning.quantile_shrink <= 1.0) {
            return invalid("quantile_shrink must be in (0, 1]");
        }

        let s = &self.smoother;
        if !(s.min_frac > 0.0 && s.min_frac <= s.max_frac && s.max_frac <= 1.0) {
            return invalid("smoother fractions must satisfy 0 < min_frac <= max_frac <= 1");
        }
        if s.delta_fraction < 0.0 {
            return invalid("delta_fraction must not be negative");
        }

        if self.grouping.groupings.is_empty() {
            return invalid("at least one grouping is required");
        }
        let mut names = std::collections::HashSet::new();
        for grouping in &self.grouping.groupings {
            if grouping.dimensions.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "grouping '{}' has no dimensions",
                    grouping.name
                )));
            }
            if !names.insert(grouping.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate grouping name '{}'",
                    grouping.name
                )));
            }
        }

        Ok(())
    }
}
