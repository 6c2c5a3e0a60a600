//! Input records and viewport geometry shared by every stage of the engine.

use std::fmt;

use geo::{Coord, Rect, coord};
use serde::{Deserialize, Serialize};

/// Stable identifier of a property record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub String);

impl PropertyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    ForSale,
    Sold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Internal,
    External,
}

/// A geo-tagged listing. `(0, 0)` means the record has no location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub lat: f64,
    pub lng: f64,
    pub price: f64,
    pub status: Status,
    pub source: Source,
}

impl Property {
    /// Coordinate as `x = lng, y = lat`, or `None` for unlocated and malformed records.
    pub fn location(&self) -> Option<Coord<f64>> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return None;
        }
        if self.lat == 0.0 && self.lng == 0.0 {
            return None;
        }
        Some(coord! { x: self.lng, y: self.lat })
    }
}

/// Visible map region plus zoom level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub bounds: Rect<f64>,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(north_east: Coord<f64>, south_west: Coord<f64>, zoom: f64) -> Self {
        Self { bounds: Rect::new(south_west, north_east), zoom }
    }

    /// Viewport of `width` x `height` degrees centred on `center`.
    pub fn around(center: Coord<f64>, width: f64, height: f64, zoom: f64) -> Self {
        let half = coord! { x: width / 2.0, y: height / 2.0 };
        Self::new(center + half, center - half, zoom)
    }

    pub fn north_east(&self) -> Coord<f64> {
        self.bounds.max()
    }

    pub fn south_west(&self) -> Coord<f64> {
        self.bounds.min()
    }

    pub fn center(&self) -> Coord<f64> {
        self.bounds.center()
    }

    /// Inclusive on every edge.
    pub fn contains(&self, c: Coord<f64>) -> bool {
        let (min, max) = (self.bounds.min(), self.bounds.max());
        c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y
    }
}

/// Located properties inside the viewport, in input order.
pub fn visible<'a>(properties: &'a [Property], viewport: &Viewport) -> Vec<&'a Property> {
    properties
        .iter()
        .filter(|p| p.location().is_some_and(|c| viewport.contains(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(id: &str, lat: f64, lng: f64) -> Property {
        Property {
            id: id.into(),
            lat,
            lng,
            price: 1.0,
            status: Status::ForSale,
            source: Source::Internal,
        }
    }

    #[test]
    fn sentinel_and_nan_are_unlocated() {
        assert!(prop("a", 0.0, 0.0).location().is_none());
        assert!(prop("b", f64::NAN, 100.0).location().is_none());
        assert!(prop("c", 13.7, f64::INFINITY).location().is_none());
        assert_eq!(prop("d", 13.7, 100.5).location(), Some(coord! { x: 100.5, y: 13.7 }));
        // only the exact pair is the sentinel
        assert!(prop("e", 0.0, 100.5).location().is_some());
    }

    #[test]
    fn visible_keeps_edges_and_drops_outside() {
        let vp = Viewport::new(coord! { x: 101.0, y: 14.0 }, coord! { x: 100.0, y: 13.0 }, 10.0);
        let props = vec![
            prop("edge", 14.0, 101.0),
            prop("inside", 13.5, 100.5),
            prop("outside", 15.0, 100.5),
            prop("unlocated", 0.0, 0.0),
        ];
        let ids: Vec<_> = visible(&props, &vp).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["edge", "inside"]);
    }

    #[test]
    fn property_json_uses_wire_names() {
        let p: Property = serde_json::from_str(
            r#"{"id":"p1","lat":13.7,"lng":100.5,"price":2500000,"status":"for-sale","source":"external"}"#,
        )
        .unwrap();
        assert_eq!(p.status, Status::ForSale);
        assert_eq!(p.source, Source::External);
        assert_eq!(p.id, PropertyId::new("p1"));
    }
}
