use std::time::Duration;

use geo::Coord;

use crate::error::ProviderError;
use crate::lod::{MarkerKey, MarkerPayload};
use crate::model::Property;

/// Primitives a map host exposes to the engine.
///
/// Handles are opaque to the engine; it only stores them and hands them
/// back for destruction.
pub trait ViewportProvider {
    type Marker;
    type Callout;

    fn create_marker(
        &mut self,
        key: &MarkerKey,
        at: Coord<f64>,
        payload: &MarkerPayload,
    ) -> Result<Self::Marker, ProviderError>;

    fn destroy_marker(&mut self, marker: Self::Marker);

    /// Start a camera flight. The host reports arrival with
    /// [`MapEvent::MoveComplete`](crate::engine::MapEvent::MoveComplete).
    fn fly_to(&mut self, target: Coord<f64>, zoom: f64, duration: Duration);

    /// `anchor` is the property's marker when one is currently displayed.
    fn open_callout(&mut self, property: &Property, anchor: Option<&Self::Marker>) -> Self::Callout;

    fn close_callout(&mut self, callout: Self::Callout);
}
