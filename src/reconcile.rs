//! Minimal create/destroy diff between the desired display set and the
//! markers already placed on the host.
//!
//! [`MarkerTable`] is the only state that survives a recomputation. Its
//! mutating operations are private to this module, so the reconciler is
//! the sole writer; everyone else reads through [`MarkerTable::get`].

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::lod::{DisplaySet, MarkerKey};
use crate::provider::ViewportProvider;

/// Owned table of displayed marker handles keyed by marker id.
#[derive(Debug)]
pub struct MarkerTable<H> {
    handles: BTreeMap<MarkerKey, H>,
}

impl<H> Default for MarkerTable<H> {
    fn default() -> Self {
        Self { handles: BTreeMap::new() }
    }
}

impl<H> MarkerTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MarkerKey) -> Option<&H> {
        self.handles.get(key)
    }

    pub fn contains(&self, key: &MarkerKey) -> bool {
        self.handles.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &MarkerKey> {
        self.handles.keys()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn insert(&mut self, key: MarkerKey, handle: H) {
        self.handles.insert(key, handle);
    }

    fn remove(&mut self, key: &MarkerKey) -> Option<H> {
        self.handles.remove(key)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_create: Vec<MarkerKey>,
    pub to_remove: Vec<MarkerKey>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_remove.is_empty()
    }
}

/// Outcome of one reconciliation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub removed: usize,
    /// Creations the host rejected; they are retried on the next pass.
    pub failed: usize,
    pub kept: usize,
}

/// Keys to create and keys to remove. Keys present on both sides appear in neither list.
pub fn plan<'a, I, H>(desired: I, displayed: &MarkerTable<H>) -> ReconcilePlan
where
    I: IntoIterator<Item = &'a MarkerKey>,
{
    let desired: Vec<&MarkerKey> = desired.into_iter().collect();

    let to_create = desired
        .iter()
        .filter(|k| !displayed.contains(k))
        .map(|k| (*k).clone())
        .collect();

    let mut wanted: Vec<&MarkerKey> = desired;
    wanted.sort();
    let to_remove = displayed
        .keys()
        .filter(|k| wanted.binary_search(k).is_err())
        .cloned()
        .collect();

    ReconcilePlan { to_create, to_remove }
}

/// Bring `table` in line with `display`, issuing only the necessary host calls.
pub fn reconcile<P: ViewportProvider>(
    display: &DisplaySet,
    table: &mut MarkerTable<P::Marker>,
    provider: &mut P,
) -> ReconcileReport {
    let plan = plan(display.markers.keys(), table);
    let mut report = ReconcileReport {
        kept: display.markers.len() - plan.to_create.len(),
        ..ReconcileReport::default()
    };

    for key in &plan.to_remove {
        if let Some(handle) = table.remove(key) {
            provider.destroy_marker(handle);
            report.removed += 1;
        }
    }

    for key in plan.to_create {
        let Some(desired) = display.markers.get(&key) else {
            continue;
        };
        match provider.create_marker(&key, desired.coord, &desired.payload) {
            Ok(handle) => {
                table.insert(key, handle);
                report.created += 1;
            }
            Err(err) => {
                warn!(marker = %key, "marker creation failed: {err}");
                report.failed += 1;
            }
        }
    }

    debug!(
        created = report.created,
        removed = report.removed,
        kept = report.kept,
        failed = report.failed,
        "reconciled markers"
    );
    report
}

/// Destroy every displayed marker. Returns how many were destroyed.
pub fn clear<P: ViewportProvider>(table: &mut MarkerTable<P::Marker>, provider: &mut P) -> usize {
    let handles = std::mem::take(&mut table.handles);
    let count = handles.len();
    for (_, handle) in handles {
        provider.destroy_marker(handle);
    }
    count
}
