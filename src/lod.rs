//! Level-of-detail policy: what the map actually shows at a given zoom.

use std::collections::BTreeMap;
use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterId, GridConfig, cluster};
use crate::model::{Property, PropertyId};

/// Key of a displayed marker. Properties and clusters live in one table
/// but can never collide because the variant is part of the key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKey {
    Property(PropertyId),
    Cluster(ClusterId),
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKey::Property(id) => write!(f, "property:{id}"),
            MarkerKey::Cluster(id) => write!(f, "{id}"),
        }
    }
}

/// What a marker shows; handed to the host on creation.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkerPayload {
    Single(Property),
    Cluster { count: usize, members: Vec<PropertyId> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DesiredMarker {
    pub coord: Coord<f64>,
    pub payload: MarkerPayload,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailMode {
    /// Clusters plus a capped number of singles.
    Clustered,
    /// One marker per property, no clusters.
    Individual,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplaySet {
    pub mode: DetailMode,
    pub markers: BTreeMap<MarkerKey, DesiredMarker>,
}

impl DisplaySet {
    pub fn cluster_count(&self) -> usize {
        self.markers.keys().filter(|k| matches!(k, MarkerKey::Cluster(_))).count()
    }

    pub fn single_count(&self) -> usize {
        self.markers.len() - self.cluster_count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodPolicy {
    /// At or above this zoom clustering is bypassed.
    pub detail_zoom: f64,
    pub max_singles: usize,
    pub max_markers: usize,
    pub grid: GridConfig,
}

impl Default for LodPolicy {
    fn default() -> Self {
        Self {
            detail_zoom: 12.0,
            max_singles: 30,
            max_markers: 300,
            grid: GridConfig::default(),
        }
    }
}

impl LodPolicy {
    pub fn mode(&self, zoom: f64) -> DetailMode {
        if zoom >= self.detail_zoom {
            DetailMode::Individual
        } else {
            DetailMode::Clustered
        }
    }

    /// Markers to show for the viewport-filtered `visible` set.
    ///
    /// Excess singles are dropped from display only; the records stay in
    /// the data model.
    pub fn display_set(&self, visible: &[&Property], zoom: f64) -> DisplaySet {
        let mode = self.mode(zoom);
        let mut markers = BTreeMap::new();

        match mode {
            DetailMode::Clustered => {
                let grouped = cluster(visible.iter().copied(), zoom, &self.grid);
                for c in grouped.clusters {
                    markers.insert(
                        MarkerKey::Cluster(c.id),
                        DesiredMarker {
                            coord: c.centroid,
                            payload: MarkerPayload::Cluster { count: c.count, members: c.members },
                        },
                    );
                }
                for p in grouped.singles.into_iter().take(self.max_singles) {
                    insert_single(&mut markers, p);
                }
            }
            DetailMode::Individual => {
                let mut located: Vec<&Property> =
                    visible.iter().copied().filter(|p| p.location().is_some()).collect();
                located.sort_by(|a, b| a.id.cmp(&b.id));
                for p in located.into_iter().take(self.max_markers) {
                    insert_single(&mut markers, p);
                }
            }
        }

        DisplaySet { mode, markers }
    }
}

fn insert_single(markers: &mut BTreeMap<MarkerKey, DesiredMarker>, property: &Property) {
    if let Some(coord) = property.location() {
        markers.insert(
            MarkerKey::Property(property.id.clone()),
            DesiredMarker { coord, payload: MarkerPayload::Single(property.clone()) },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Source, Status};

    fn prop(id: String, lat: f64, lng: f64) -> Property {
        Property {
            id: PropertyId(id),
            lat,
            lng,
            price: 3_200_000.0,
            status: Status::Sold,
            source: Source::External,
        }
    }

    /// One property per 1° cell, so at zoom 5 every record is a single.
    fn sparse(n: usize) -> Vec<Property> {
        (0..n)
            .map(|i| prop(format!("s{i:04}"), -80.0 + (i / 100) as f64 * 2.0 + 0.5, -170.0 + (i % 100) as f64 * 3.0 + 0.5))
            .collect()
    }

    #[test]
    fn keys_are_namespaced() {
        let p = MarkerKey::Property(PropertyId::new("1"));
        let c = MarkerKey::Cluster(ClusterId { resolution: 1, col: 0, row: 0 });
        assert_eq!(p.to_string(), "property:1");
        assert_eq!(c.to_string(), "cluster:1:0:0");
        assert_ne!(p, c);
    }

    #[test]
    fn singles_are_capped_below_detail_zoom() {
        let mut props = sparse(1000);
        // two dense cells in an otherwise empty area
        for i in 0..4 {
            props.push(prop(format!("d{i}"), 85.1 + i as f64 * 0.1, 10.1));
            props.push(prop(format!("e{i}"), 85.1 + i as f64 * 0.1, 20.1));
        }
        let visible: Vec<&Property> = props.iter().collect();
        let policy = LodPolicy::default();

        let set = policy.display_set(&visible, 5.0);
        assert_eq!(set.mode, DetailMode::Clustered);
        assert_eq!(set.single_count(), 30);
        assert_eq!(set.cluster_count(), 2);
    }

    #[test]
    fn detail_zoom_ignores_clusters_and_caps_markers() {
        let mut props: Vec<_> = (0..500)
            .map(|i| prop(format!("p{i:03}"), 13.75 + i as f64 * 1e-5, 100.5))
            .collect();
        props.push(prop("unlocated".into(), 0.0, 0.0));
        let visible: Vec<&Property> = props.iter().collect();
        let policy = LodPolicy { max_markers: 120, ..LodPolicy::default() };

        let set = policy.display_set(&visible, 14.0);
        assert_eq!(set.mode, DetailMode::Individual);
        assert_eq!(set.cluster_count(), 0);
        assert_eq!(set.markers.len(), 120);
        assert!(set.markers.contains_key(&MarkerKey::Property(PropertyId::new("p000"))));
        assert!(!set.markers.contains_key(&MarkerKey::Property(PropertyId::new("unlocated"))));
    }

    #[test]
    fn threshold_is_inclusive() {
        let policy = LodPolicy::default();
        assert_eq!(policy.mode(11.99), DetailMode::Clustered);
        assert_eq!(policy.mode(12.0), DetailMode::Individual);
    }

    #[test]
    fn same_inputs_same_display() {
        let props = sparse(300);
        let visible: Vec<&Property> = props.iter().collect();
        let policy = LodPolicy::default();
        assert_eq!(policy.display_set(&visible, 7.0), policy.display_set(&visible, 7.0));
    }
}
