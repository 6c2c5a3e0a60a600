use std::{fs, path::Path, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::from_slice;

use crate::error::MapError;
use crate::lod::LodPolicy;

/// Tunables of the map engine. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub lod: LodPolicy,
    pub debounce_ms: u64,
    /// Minimum zoom of a selection flight.
    pub select_zoom: f64,
    pub fly_duration_ms: u64,
    /// Zoom added when drilling into a cluster.
    pub cluster_zoom_step: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            lod: LodPolicy::default(),
            debounce_ms: 150,
            select_zoom: 15.0,
            fly_duration_ms: 1200,
            cluster_zoom_step: 2.0,
        }
    }
}

impl MapConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let data = fs::read(path)?;
        let config: Self = from_slice(&data)?;
        config.validate()
    }

    /// Apply `ATLAS_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, MapError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MapError> {
        if let Some(v) = parse_var(&lookup, "ATLAS_MAX_SINGLES")? {
            self.lod.max_singles = v;
        }
        if let Some(v) = parse_var(&lookup, "ATLAS_MAX_MARKERS")? {
            self.lod.max_markers = v;
        }
        if let Some(v) = parse_var(&lookup, "ATLAS_DETAIL_ZOOM")? {
            self.lod.detail_zoom = v;
        }
        if let Some(v) = parse_var(&lookup, "ATLAS_DEBOUNCE_MS")? {
            self.debounce_ms = v;
        }
        self.validate()
    }

    pub fn validate(self) -> Result<Self, MapError> {
        let grid = &self.lod.grid;
        if !(grid.base_cell_size > 0.0 && grid.min_cell_size > 0.0) {
            return Err(MapError::Config("cell sizes must be positive".into()));
        }
        if grid.cluster_threshold < 2 {
            return Err(MapError::Config("cluster_threshold must be at least 2".into()));
        }
        if !self.lod.detail_zoom.is_finite() || !self.select_zoom.is_finite() {
            return Err(MapError::Config("zoom levels must be finite".into()));
        }
        Ok(self)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn fly_duration(&self) -> Duration {
        Duration::from_millis(self.fly_duration_ms)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, MapError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| MapError::Config(format!("{name}: cannot parse `{raw}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: MapConfig = serde_json::from_str(r#"{"lod": {"max_singles": 12}, "debounce_ms": 80}"#).unwrap();
        assert_eq!(cfg.lod.max_singles, 12);
        assert_eq!(cfg.lod.max_markers, 300);
        assert_eq!(cfg.lod.grid.cluster_threshold, 3);
        assert_eq!(cfg.debounce(), Duration::from_millis(80));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [("ATLAS_MAX_SINGLES", "5"), ("ATLAS_DETAIL_ZOOM", " 10.5 ")].into();
        let cfg = MapConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.lod.max_singles, 5);
        assert_eq!(cfg.lod.detail_zoom, 10.5);
        assert_eq!(cfg.debounce_ms, 150);
    }

    #[test]
    fn bad_override_is_reported() {
        let err = MapConfig::default()
            .with_overrides(|k| (k == "ATLAS_MAX_MARKERS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, MapError::Config(msg) if msg.contains("ATLAS_MAX_MARKERS")));
    }

    #[test]
    fn threshold_below_two_is_rejected() {
        let mut cfg = MapConfig::default();
        cfg.lod.grid.cluster_threshold = 1;
        assert!(cfg.validate().is_err());
    }
}
