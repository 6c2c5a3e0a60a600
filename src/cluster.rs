//! Zoom-dependent grid clustering.
//!
//! Every located property is bucketed into a square cell whose size halves
//! with each zoom step. Dense cells collapse into a single [`Cluster`],
//! sparse cells pass their members through as singles.

use std::collections::BTreeMap;
use std::fmt;

use geo::{Coord, coord};
use serde::{Deserialize, Serialize};

use crate::model::{Property, PropertyId};

/// Grid policy constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell edge in degrees at `reference_zoom`.
    pub base_cell_size: f64,
    /// Lower bound for the cell edge, reached at high zoom.
    pub min_cell_size: f64,
    pub reference_zoom: f64,
    /// Minimum population for a cell to form a cluster.
    pub cluster_threshold: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            base_cell_size: 1.0,
            min_cell_size: 0.005,
            reference_zoom: 5.0,
            cluster_threshold: 3,
        }
    }
}

impl GridConfig {
    pub fn cell_size(&self, zoom: f64) -> f64 {
        let scaled = self.base_cell_size / 2f64.powf(zoom - self.reference_zoom);
        // f64::max discards NaN, so a bogus zoom falls back to the finest grid
        scaled.max(self.min_cell_size)
    }
}

/// Identity of a grid cell: resolution in micro-degrees, column, row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId {
    pub resolution: u64,
    pub col: i64,
    pub row: i64,
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster:{}:{}:{}", self.resolution, self.col, self.row)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub id: ClusterId,
    pub centroid: Coord<f64>,
    pub count: usize,
    /// Sorted by id.
    pub members: Vec<PropertyId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clustering<'a> {
    pub clusters: Vec<Cluster>,
    pub singles: Vec<&'a Property>,
}

/// Partition `properties` into clusters and singles for the given zoom.
///
/// The result depends only on the set of inputs, never on their order:
/// cells are visited in key order and members are sorted by id before
/// their coordinates are averaged.
pub fn cluster<'a, I>(properties: I, zoom: f64, grid: &GridConfig) -> Clustering<'a>
where
    I: IntoIterator<Item = &'a Property>,
{
    let cell = grid.cell_size(zoom);
    let resolution = (cell * 1e6).round() as u64;

    let mut cells: BTreeMap<(i64, i64), Vec<(&'a Property, Coord<f64>)>> = BTreeMap::new();
    for property in properties {
        let Some(at) = property.location() else {
            continue;
        };
        let key = ((at.x / cell).floor() as i64, (at.y / cell).floor() as i64);
        cells.entry(key).or_default().push((property, at));
    }

    let mut out = Clustering::default();
    for ((col, row), mut members) in cells {
        members.sort_by(|a, b| a.0.id.cmp(&b.0.id));
        if members.len() < grid.cluster_threshold {
            out.singles.extend(members.into_iter().map(|(p, _)| p));
            continue;
        }

        let count = members.len();
        let sum = members
            .iter()
            .fold(coord! { x: 0.0, y: 0.0 }, |acc, (_, at)| acc + *at);
        out.clusters.push(Cluster {
            id: ClusterId { resolution, col, row },
            centroid: coord! { x: sum.x / count as f64, y: sum.y / count as f64 },
            count,
            members: members.into_iter().map(|(p, _)| p.id.clone()).collect(),
        });
    }
    out
}
