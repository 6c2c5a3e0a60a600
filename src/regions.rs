use geo::{Area, BoundingRect, Contains, Coord, Geometry, MultiPolygon, Point, Polygon, Rect, coord};
use geojson::GeoJson;

use crate::error::MapError;

/// Keys tried, in order, for a feature's display name.
const NAME_KEYS: [&str; 3] = ["name", "NAME_1", "ADMIN"];

/// Fragments smaller than this share of the largest part are dropped.
const FRAGMENT_RATIO: f64 = 0.20;

/// Administrative region (province) outline.
#[derive(Clone, Debug)]
pub struct Region {
    pub name: String,
    pub shape: MultiPolygon<f64>,
}

/// Province polygons used for highlighting the region of a property.
#[derive(Clone, Debug)]
pub struct RegionIndex {
    regions: Vec<Region>,
    bounds: Option<Rect<f64>>,
}

impl RegionIndex {
    pub fn from_geojson(raw: GeoJson) -> Result<Self, MapError> {
        let mut regions = Vec::new();

        if let GeoJson::FeatureCollection(fc) = raw {
            for feature in fc.features {
                let name = feature
                    .properties
                    .as_ref()
                    .and_then(|p| NAME_KEYS.iter().find_map(|k| p.get(*k).and_then(|v| v.as_str())))
                    .unwrap_or("")
                    .to_string();

                let Some(gj) = feature.geometry else {
                    continue;
                };
                let geom: Geometry<f64> = gj.value.try_into()?;
                let shape = match geom {
                    Geometry::Polygon(p) => p.into(),
                    Geometry::MultiPolygon(m) => drop_fragments(m),
                    _ => continue,
                };
                regions.push(Region { name, shape });
            }
        }

        let bounds = regions
            .iter()
            .filter_map(|r| r.shape.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                    coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                )
            });

        Ok(Self { regions, bounds })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    /// First region whose outline contains `at`.
    pub fn region_at(&self, at: Coord<f64>) -> Option<&Region> {
        let point = Point::from(at);
        self.regions.iter().find(|r| r.shape.contains(&point))
    }
}

/// Drop islands and slivers when a multipolygon has several parts.
fn drop_fragments(mp: MultiPolygon<f64>) -> MultiPolygon<f64> {
    if mp.0.len() <= 1 {
        return mp;
    }
    let max_area = mp.0.iter().map(|p| p.unsigned_area()).fold(0.0, f64::max);
    let threshold = max_area * FRAGMENT_RATIO;
    let kept: Vec<Polygon<f64>> = mp.0.iter().filter(|p| p.unsigned_area() >= threshold).cloned().collect();
    if kept.is_empty() { mp } else { MultiPolygon(kept) }
}
