use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// How often a freshly opened tab should rotate to the next artwork.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum UpdateFrequency {
    #[default]
    #[serde(rename = "every_tab")]
    EveryTab,
    #[serde(rename = "every_10min")]
    Every10Min,
    #[serde(rename = "every_hour")]
    EveryHour,
    #[serde(rename = "every_day")]
    EveryDay,
}

impl UpdateFrequency {
    pub const ALL: [UpdateFrequency; 4] = [
        UpdateFrequency::EveryTab,
        UpdateFrequency::Every10Min,
        UpdateFrequency::EveryHour,
        UpdateFrequency::EveryDay,
    ];

    /// Minimum time between rotations; `None` rotates on every tab.
    pub const fn period(self) -> Option<Duration> {
        match self {
            UpdateFrequency::EveryTab => None,
            UpdateFrequency::Every10Min => Some(Duration::from_secs(10 * 60)),
            UpdateFrequency::EveryHour => Some(Duration::from_secs(60 * 60)),
            UpdateFrequency::EveryDay => {
                Some(Duration::from_secs(24 * 60 * 60))
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            UpdateFrequency::EveryTab => "every_tab",
            UpdateFrequency::Every10Min => "every_10min",
            UpdateFrequency::EveryHour => "every_hour",
            UpdateFrequency::EveryDay => "every_day",
        }
    }
}

impl fmt::Display for UpdateFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateFrequency {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpdateFrequency::ALL
            .into_iter()
            .find(|freq| freq.as_str() == s)
            .ok_or_else(|| ModelError::UnknownUpdateFrequency(s.to_string()))
    }
}

/// Which persisted partitions a cache-clear request targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    #[default]
    All,
    Images,
    Metadata,
}

impl CacheKind {
    pub const fn includes_images(self) -> bool {
        matches!(self, CacheKind::All | CacheKind::Images)
    }

    pub const fn includes_metadata(self) -> bool {
        matches!(self, CacheKind::All | CacheKind::Metadata)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CacheKind::All => "all",
            CacheKind::Images => "images",
            CacheKind::Metadata => "metadata",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(CacheKind::All),
            "images" => Ok(CacheKind::Images),
            "metadata" => Ok(CacheKind::Metadata),
            _ => Err(ModelError::UnknownCacheKind(s.to_string())),
        }
    }
}
