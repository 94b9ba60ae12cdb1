use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const RECENT_NUMBER: usize = 50;
pub const MAX_NUMBER: u8 = 43;
pub const MAIN_NUMBERS: usize = 6;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Rank boundaries that split a ranking into zones. Ranks `1..=top_max` are
/// `top`, `top_max+1..=mid_max` are `mid`, the rest are `low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBounds {
    pub top_max: u32,
    pub mid_max: u32,
}

impl Default for ZoneBounds {
    fn default() -> Self {
        Self {
            top_max: 14,
            mid_max: 29,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub window: usize,
    pub max_number: u8,
    pub zones: ZoneBounds,
    pub retain_rankings: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window: RECENT_NUMBER,
            max_number: MAX_NUMBER,
            zones: ZoneBounds::default(),
            retain_rankings: false,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.window == 0 {
            return Err(CoreError::InvalidConfig("window must be at least 1".to_string()));
        }
        if self.zones.top_max == 0 {
            return Err(CoreError::InvalidConfig("top zone must hold at least rank 1".to_string()));
        }
        if self.zones.top_max >= self.zones.mid_max {
            return Err(CoreError::InvalidConfig(format!(
                "top_max ({}) must be below mid_max ({})",
                self.zones.top_max, self.zones.mid_max
            )));
        }
        if self.zones.mid_max >= u32::from(self.max_number) {
            return Err(CoreError::InvalidConfig(format!(
                "mid_max ({}) must be below max_number ({})",
                self.zones.mid_max, self.max_number
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub issue_file: PathBuf,
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub log_level: String,
    pub features: FeatureConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let data_dir = env_string("LOTO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let issue_file = env_string("LOTO_ISSUE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("issue_number.json"));

        let mut features = FeatureConfig::default();
        if let Some(window) = env_parse::<usize>("LOTO_WINDOW")? {
            features.window = window;
        }
        if let Some(top_max) = env_parse::<u32>("LOTO_ZONE_TOP_MAX")? {
            features.zones.top_max = top_max;
        }
        if let Some(mid_max) = env_parse::<u32>("LOTO_ZONE_MID_MAX")? {
            features.zones.mid_max = mid_max;
        }
        features.validate()?;

        Ok(Self {
            data_dir,
            issue_file,
            request_delay: Duration::from_millis(
                env_parse("LOTO_REQUEST_DELAY_MS")?.unwrap_or(DEFAULT_REQUEST_DELAY_MS),
            ),
            request_timeout: Duration::from_secs(
                env_parse("LOTO_REQUEST_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                    .max(1),
            ),
            log_level: env_string("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            features,
        })
    }

    pub fn html_dir(&self) -> PathBuf {
        self.data_dir.join("html")
    }

    pub fn rawdf_dir(&self) -> PathBuf {
        self.data_dir.join("rawdf")
    }

    pub fn features_dir(&self) -> PathBuf {
        self.data_dir.join("features")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("draws.sqlite")
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_string(key)
        .map(|raw| raw.parse::<T>().with_context(|| format!("{key}={raw} is not valid")))
        .transpose()
}
