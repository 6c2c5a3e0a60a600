use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use geo::{Coord, coord};
use property_atlas::{
    MarkerKey, MarkerPayload, Property, ProviderError, Status, Viewport, ViewportProvider,
};

/// Szerokość widoku w stopniach przy zoomie 0
const WORLD_SPAN: f64 = 720.0;
const MIN_ZOOM: f64 = 2.0;
const MAX_ZOOM: f64 = 18.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MarkerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalloutId(u64);

#[derive(Clone, Debug)]
pub enum MarkerKind {
    Single { status: Status },
    Cluster { count: usize },
}

/// Znacznik postawiony na płótnie
#[derive(Clone, Debug)]
pub struct PlacedMarker {
    pub at: Coord<f64>,
    pub kind: MarkerKind,
}

/// Otwarty dymek ze szczegółami oferty
#[derive(Clone, Debug)]
pub struct Callout {
    pub property: Property,
    pub anchor: Option<Coord<f64>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub center: Coord<f64>,
    pub zoom: f64,
}

#[derive(Clone, Copy, Debug)]
struct Flight {
    from: Camera,
    to: Camera,
    started: Instant,
    duration: Duration,
}

/// Wynik kroku animacji kamery
#[derive(Clone, Copy, Debug, Default)]
pub struct HostUpdate {
    pub moved: bool,
    pub arrived: bool,
}

/// Terminalowy gospodarz mapy: kamera, znaczniki i dymek
pub struct TerminalHost {
    camera: Camera,
    aspect: f64,
    flight: Option<Flight>,
    markers: BTreeMap<MarkerId, PlacedMarker>,
    callout: Option<(CalloutId, Callout)>,
    next_id: u64,
}

impl TerminalHost {
    pub fn new(center: Coord<f64>, zoom: f64) -> Self {
        Self {
            camera: Camera { center, zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM) },
            aspect: 0.6,
            flight: None,
            markers: BTreeMap::new(),
            callout: None,
            next_id: 0,
        }
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn viewport(&self) -> Viewport {
        let width = WORLD_SPAN / 2f64.powf(self.camera.zoom);
        Viewport::around(self.camera.center, width, width * self.aspect, self.camera.zoom)
    }

    /// Przesunięcie o ułamek szerokości widoku; przerywa lot kamery
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.flight = None;
        let width = WORLD_SPAN / 2f64.powf(self.camera.zoom);
        self.camera.center = self.camera.center + coord! { x: dx * width, y: dy * width * self.aspect };
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.flight = None;
        self.camera.zoom = (self.camera.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Krok animacji lotu; `arrived` tylko raz, na końcu lotu
    pub fn advance(&mut self, now: Instant) -> HostUpdate {
        let Some(flight) = self.flight else {
            return HostUpdate::default();
        };
        let elapsed = now.saturating_duration_since(flight.started);
        let t = if flight.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / flight.duration.as_secs_f64()).min(1.0)
        };
        let eased = t * t * (3.0 - 2.0 * t);
        self.camera = Camera {
            center: flight.from.center + (flight.to.center - flight.from.center) * eased,
            zoom: flight.from.zoom + (flight.to.zoom - flight.from.zoom) * eased,
        };
        if t >= 1.0 {
            self.flight = None;
            return HostUpdate { moved: true, arrived: true };
        }
        HostUpdate { moved: true, arrived: false }
    }

    pub fn markers(&self) -> impl Iterator<Item = &PlacedMarker> {
        self.markers.values()
    }

    pub fn callout(&self) -> Option<&Callout> {
        self.callout.as_ref().map(|(_, c)| c)
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl ViewportProvider for TerminalHost {
    type Marker = MarkerId;
    type Callout = CalloutId;

    fn create_marker(
        &mut self,
        _key: &MarkerKey,
        at: Coord<f64>,
        payload: &MarkerPayload,
    ) -> Result<MarkerId, ProviderError> {
        if !(-90.0..=90.0).contains(&at.y) || !(-180.0..=180.0).contains(&at.x) {
            return Err(ProviderError::InvalidCoordinate { lat: at.y, lng: at.x });
        }
        let kind = match payload {
            MarkerPayload::Single(p) => MarkerKind::Single { status: p.status },
            MarkerPayload::Cluster { count, .. } => MarkerKind::Cluster { count: *count },
        };
        let id = MarkerId(self.next());
        self.markers.insert(id, PlacedMarker { at, kind });
        Ok(id)
    }

    fn destroy_marker(&mut self, marker: MarkerId) {
        self.markers.remove(&marker);
    }

    fn fly_to(&mut self, target: Coord<f64>, zoom: f64, duration: Duration) {
        self.flight = Some(Flight {
            from: self.camera,
            to: Camera { center: target, zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM) },
            started: Instant::now(),
            duration,
        });
    }

    fn open_callout(&mut self, property: &Property, anchor: Option<&MarkerId>) -> CalloutId {
        let anchor = anchor.and_then(|m| self.markers.get(m)).map(|m| m.at);
        let id = CalloutId(self.next());
        self.callout = Some((id, Callout { property: property.clone(), anchor }));
        id
    }

    fn close_callout(&mut self, callout: CalloutId) {
        if self.callout.as_ref().is_some_and(|(id, _)| *id == callout) {
            self.callout = None;
        }
    }
}
