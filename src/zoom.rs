//! Zoom level configuration.
//!
//! A [`ZoomProfile`] maps each configured map zoom level to the radii used to
//! cluster points at that resolution. Higher level numbers are finer. The
//! profile is an immutable value handed to the clusterer; nothing here is
//! global state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HerdTrackError, Result};

/// Clustering radii for one zoom level, in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomSetting {
    /// Radius around an anchor point that forms a candidate cluster. Also the
    /// viewport radius around the map center when a zoom level is requested.
    pub search_radius_km: f64,
    /// Candidate clusters whose diameter is at most this distance are kept
    /// whole instead of being split at the next finer level.
    pub merge_distance_km: f64,
}

impl ZoomSetting {
    pub const fn new(search_radius_km: f64, merge_distance_km: f64) -> Self {
        Self {
            search_radius_km,
            merge_distance_km,
        }
    }

    pub fn search_radius_m(&self) -> f64 {
        self.search_radius_km * 1000.0
    }

    pub fn merge_distance_m(&self) -> f64 {
        self.merge_distance_km * 1000.0
    }

    fn is_valid(&self) -> bool {
        self.search_radius_km.is_finite()
            && self.merge_distance_km.is_finite()
            && self.search_radius_km >= 0.0
            && self.merge_distance_km >= 0.0
    }
}

/// Zoom key of a clustering request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomKey {
    /// A configured map zoom level.
    Level(u8),
    /// No zoom given: summarize the busiest area.
    Overview,
}

impl ZoomKey {
    /// Map an optional query parameter to a key; absent means overview.
    pub fn from_query(zoom: Option<u8>) -> Self {
        zoom.map_or(ZoomKey::Overview, ZoomKey::Level)
    }
}

impl fmt::Display for ZoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoomKey::Level(level) => write!(f, "{level}"),
            ZoomKey::Overview => write!(f, "overview"),
        }
    }
}

/// Zoom level table used to parameterize clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawZoomProfile", into = "RawZoomProfile")]
pub struct ZoomProfile {
    levels: BTreeMap<u8, ZoomSetting>,
    overview: ZoomSetting,
}

#[derive(Serialize, Deserialize)]
struct RawZoomProfile {
    levels: BTreeMap<u8, ZoomSetting>,
    overview: ZoomSetting,
}

impl TryFrom<RawZoomProfile> for ZoomProfile {
    type Error = HerdTrackError;

    fn try_from(raw: RawZoomProfile) -> Result<Self> {
        ZoomProfile::new(raw.levels, raw.overview)
    }
}

impl From<ZoomProfile> for RawZoomProfile {
    fn from(profile: ZoomProfile) -> Self {
        Self {
            levels: profile.levels,
            overview: profile.overview,
        }
    }
}

impl Default for ZoomProfile {
    /// Four map zoom levels from regional (11) to pasture scale (14), and a
    /// 40 km overview radius.
    fn default() -> Self {
        let levels = BTreeMap::from([
            (11, ZoomSetting::new(30.0, 7.0)),
            (12, ZoomSetting::new(20.0, 4.0)),
            (13, ZoomSetting::new(10.0, 2.0)),
            (14, ZoomSetting::new(5.0, 0.0)),
        ]);
        Self {
            levels,
            overview: ZoomSetting::new(40.0, 40.0),
        }
    }
}

impl ZoomProfile {
    /// Build a profile, rejecting empty tables and negative or non-finite radii.
    pub fn new(levels: BTreeMap<u8, ZoomSetting>, overview: ZoomSetting) -> Result<Self> {
        if levels.is_empty() {
            return Err(HerdTrackError::InvalidZoomProfile(
                "at least one zoom level is required".to_string(),
            ));
        }
        if let Some((level, _)) = levels.iter().find(|(_, s)| !s.is_valid()) {
            return Err(HerdTrackError::InvalidZoomProfile(format!(
                "zoom level {level} has a negative or non-finite radius"
            )));
        }
        if !overview.is_valid() {
            return Err(HerdTrackError::InvalidZoomProfile(
                "overview has a negative or non-finite radius".to_string(),
            ));
        }
        Ok(Self { levels, overview })
    }

    /// Parse a profile from JSON such as
    /// `{"levels": {"11": {"search_radius_km": 30, "merge_distance_km": 7}},
    ///   "overview": {"search_radius_km": 40, "merge_distance_km": 40}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HerdTrackError::InvalidZoomProfile(e.to_string()))
    }

    /// Look up the setting for a key.
    pub fn setting(&self, key: ZoomKey) -> Result<ZoomSetting> {
        match key {
            ZoomKey::Level(level) => self.level(level),
            ZoomKey::Overview => Ok(self.overview),
        }
    }

    /// Look up the setting for a configured level.
    pub fn level(&self, level: u8) -> Result<ZoomSetting> {
        self.levels
            .get(&level)
            .copied()
            .ok_or(HerdTrackError::UnknownZoomKey {
                key: ZoomKey::Level(level),
            })
    }

    pub fn overview(&self) -> ZoomSetting {
        self.overview
    }

    /// Whether the level is configured.
    pub fn contains(&self, level: u8) -> bool {
        self.levels.contains_key(&level)
    }

    /// Configured levels, coarsest first.
    pub fn levels(&self) -> impl Iterator<Item = (u8, ZoomSetting)> + '_ {
        self.levels.iter().map(|(&l, &s)| (l, s))
    }

    /// The next configured level finer than `level`, if any.
    pub fn finer_level(&self, level: u8) -> Option<u8> {
        self.levels
            .range(level.saturating_add(1)..)
            .next()
            .map(|(&l, _)| l)
            .filter(|&l| l > level)
    }

    pub fn coarsest_level(&self) -> u8 {
        self.levels.keys().next().copied().unwrap_or_default()
    }

    pub fn finest_level(&self) -> u8 {
        self.levels.keys().next_back().copied().unwrap_or_default()
    }

    /// Clamp a requested map zoom into the configured range.
    ///
    /// Map clients send any zoom between 0 and 22; requests coarser than the
    /// table are served at the coarsest level and finer ones at the finest.
    /// Values between configured levels snap to the nearest coarser level.
    pub fn clamp_level(&self, requested: u8) -> u8 {
        self.levels
            .range(..=requested)
            .next_back()
            .map(|(&l, _)| l)
            .unwrap_or_else(|| self.coarsest_level())
    }

    /// Distance beyond which a point with no neighbors is guaranteed to come
    /// back as a singleton when clustered at `level`.
    ///
    /// This is the larger of the finest search radius and the merge distances
    /// of every level from `level` to the finest.
    pub fn isolation_distance_km(&self, level: u8) -> Result<f64> {
        self.level(level)?;
        let finest = self.finest_level();
        let merge = self
            .levels
            .range(level..=finest)
            .map(|(_, s)| s.merge_distance_km)
            .fold(0.0_f64, f64::max);
        let finest_radius = self
            .levels
            .values()
            .next_back()
            .map_or(0.0, |s| s.search_radius_km);
        Ok(merge.max(finest_radius))
    }
}
