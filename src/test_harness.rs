//! In-memory [`ViewportProvider`] that records every call, for driving the
//! engine without a real map host.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;
use std::time::Duration;

use geo::Coord;

use crate::error::ProviderError;
use crate::lod::{MarkerKey, MarkerPayload};
use crate::model::{Property, PropertyId};
use crate::provider::ViewportProvider;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Create(MarkerKey),
    Destroy(MarkerKey),
    FlyTo { target: Coord<f64>, zoom: f64, duration: Duration },
    OpenCallout { property: PropertyId, anchored: bool },
    CloseCallout(PropertyId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockMarker {
    pub serial: u64,
    pub key: MarkerKey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockCallout {
    pub serial: u64,
    pub property: PropertyId,
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<Call>,
    next_serial: u64,
    live_markers: BTreeSet<u64>,
    open_callouts: BTreeSet<u64>,
    rejected: HashSet<MarkerKey>,
}

/// Cloning shares the recording, so a test can keep a copy after handing
/// the provider to the engine.
#[derive(Clone, Debug, Default)]
pub struct RecordingProvider {
    inner: Rc<RefCell<Recorder>>,
}

impl RecordingProvider {
    pub fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    pub fn created(&self) -> Vec<MarkerKey> {
        self.filter_keys(|c| match c {
            Call::Create(k) => Some(k.clone()),
            _ => None,
        })
    }

    pub fn destroyed(&self) -> Vec<MarkerKey> {
        self.filter_keys(|c| match c {
            Call::Destroy(k) => Some(k.clone()),
            _ => None,
        })
    }

    pub fn live_markers(&self) -> usize {
        self.inner.borrow().live_markers.len()
    }

    pub fn open_callouts(&self) -> usize {
        self.inner.borrow().open_callouts.len()
    }

    /// Make the next creations of `key` fail.
    pub fn reject(&self, key: MarkerKey) {
        self.inner.borrow_mut().rejected.insert(key);
    }

    pub fn accept(&self, key: &MarkerKey) {
        self.inner.borrow_mut().rejected.remove(key);
    }

    fn filter_keys(&self, f: impl Fn(&Call) -> Option<MarkerKey>) -> Vec<MarkerKey> {
        self.inner.borrow().calls.iter().filter_map(f).collect()
    }

    fn serial(rec: &mut Recorder) -> u64 {
        rec.next_serial += 1;
        rec.next_serial
    }
}

impl ViewportProvider for RecordingProvider {
    type Marker = MockMarker;
    type Callout = MockCallout;

    fn create_marker(
        &mut self,
        key: &MarkerKey,
        at: Coord<f64>,
        _payload: &MarkerPayload,
    ) -> Result<MockMarker, ProviderError> {
        let mut rec = self.inner.borrow_mut();
        if rec.rejected.contains(key) {
            return Err(ProviderError::InvalidCoordinate { lat: at.y, lng: at.x });
        }
        let serial = Self::serial(&mut rec);
        rec.live_markers.insert(serial);
        rec.calls.push(Call::Create(key.clone()));
        Ok(MockMarker { serial, key: key.clone() })
    }

    fn destroy_marker(&mut self, marker: MockMarker) {
        let mut rec = self.inner.borrow_mut();
        rec.live_markers.remove(&marker.serial);
        rec.calls.push(Call::Destroy(marker.key));
    }

    fn fly_to(&mut self, target: Coord<f64>, zoom: f64, duration: Duration) {
        self.inner.borrow_mut().calls.push(Call::FlyTo { target, zoom, duration });
    }

    fn open_callout(&mut self, property: &Property, anchor: Option<&MockMarker>) -> MockCallout {
        let mut rec = self.inner.borrow_mut();
        let serial = Self::serial(&mut rec);
        rec.open_callouts.insert(serial);
        rec.calls.push(Call::OpenCallout { property: property.id.clone(), anchored: anchor.is_some() });
        MockCallout { serial, property: property.id.clone() }
    }

    fn close_callout(&mut self, callout: MockCallout) {
        let mut rec = self.inner.borrow_mut();
        rec.open_callouts.remove(&callout.serial);
        rec.calls.push(Call::CloseCallout(callout.property));
    }
}
