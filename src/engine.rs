//! Single entry point of the property map.
//!
//! Hosts translate their callbacks (move, zoom, click, camera arrival) into
//! [`MapEvent`]s and feed them to [`PropertyMap::handle`] together with the
//! current time. Viewport changes go through the debouncer; everything else
//! is handled immediately.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::MapConfig;
use crate::debounce::Debouncer;
use crate::error::MapError;
use crate::lod::{DetailMode, DisplaySet, MarkerKey, MarkerPayload};
use crate::model::{Property, PropertyId, Viewport, visible};
use crate::provider::ViewportProvider;
use crate::reconcile::{self, MarkerTable, ReconcileReport};
use crate::regions::{Region, RegionIndex};
use crate::selection::SelectionController;

#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    /// Pan, zoom or tilt frame reported by the host.
    ViewportChanged(Viewport),
    /// New property list; replaces the old one wholesale.
    PropertiesReplaced(Vec<Property>),
    MarkerClicked(MarkerKey),
    /// Selection coming from outside the map, e.g. a list row.
    Select(PropertyId),
    /// The camera flight started by a selection or drill-in has settled.
    MoveComplete,
    Dismiss,
    /// Clock advanced; fires a due debounce timer.
    Tick,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapStats {
    pub recomputations: u64,
    pub clusters: usize,
    pub singles: usize,
    pub last_report: ReconcileReport,
}

pub struct PropertyMap<P: ViewportProvider> {
    config: MapConfig,
    provider: P,
    properties: Vec<Property>,
    index: HashMap<PropertyId, usize>,
    viewport: Option<Viewport>,
    debouncer: Debouncer<Viewport>,
    markers: MarkerTable<P::Marker>,
    display: Option<DisplaySet>,
    selection: SelectionController<P::Callout>,
    regions: Option<RegionIndex>,
    stats: MapStats,
    torn_down: bool,
}

impl<P: ViewportProvider> PropertyMap<P> {
    pub fn new(provider: P, config: MapConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce());
        let selection = SelectionController::new(config.select_zoom, config.fly_duration());
        Self {
            config,
            provider,
            properties: Vec::new(),
            index: HashMap::new(),
            viewport: None,
            debouncer,
            markers: MarkerTable::new(),
            display: None,
            selection,
            regions: None,
            stats: MapStats::default(),
            torn_down: false,
        }
    }

    pub fn handle(&mut self, event: MapEvent, now: Instant) -> Result<(), MapError> {
        if self.torn_down {
            return Err(MapError::TornDown);
        }
        match event {
            MapEvent::ViewportChanged(viewport) => self.debouncer.push(viewport, now),
            MapEvent::Tick => {
                if let Some(viewport) = self.debouncer.poll(now) {
                    self.recompute(viewport);
                }
            }
            MapEvent::PropertiesReplaced(properties) => self.replace_properties(properties),
            MapEvent::MarkerClicked(MarkerKey::Property(id)) | MapEvent::Select(id) => self.select(&id)?,
            MapEvent::MarkerClicked(MarkerKey::Cluster(id)) => self.drill_into(&MarkerKey::Cluster(id)),
            MapEvent::MoveComplete => self.selection.move_complete(&mut self.provider, &self.markers),
            MapEvent::Dismiss => self.selection.dismiss(&mut self.provider),
        }
        Ok(())
    }

    /// Attach province outlines. A failed load only disables highlighting.
    pub fn attach_regions(&mut self, loaded: Result<RegionIndex, MapError>) {
        match loaded {
            Ok(regions) => {
                info!(regions = regions.len(), "region outlines loaded");
                self.regions = Some(regions);
            }
            Err(err) => {
                warn!("region outlines unavailable, highlighting disabled: {err}");
                self.regions = None;
            }
        }
    }

    /// Cancel the pending timer, destroy every marker and close the callout.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let dropped = self.debouncer.cancel().is_some();
        self.selection.dismiss(&mut self.provider);
        let destroyed = reconcile::clear(&mut self.markers, &mut self.provider);
        self.display = None;
        info!(destroyed, pending_dropped = dropped, "map view torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Host access for camera input. Marker handles stay owned by the engine.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, id: &PropertyId) -> Option<&Property> {
        self.index.get(id).map(|&i| &self.properties[i])
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn markers(&self) -> &MarkerTable<P::Marker> {
        &self.markers
    }

    pub fn display(&self) -> Option<&DisplaySet> {
        self.display.as_ref()
    }

    pub fn mode(&self) -> Option<DetailMode> {
        self.display.as_ref().map(|d| d.mode)
    }

    pub fn selection(&self) -> &SelectionController<P::Callout> {
        &self.selection
    }

    pub fn stats(&self) -> MapStats {
        self.stats
    }

    pub fn regions(&self) -> Option<&RegionIndex> {
        self.regions.as_ref()
    }

    /// Province containing the property, when outlines are loaded.
    pub fn region_of(&self, property: &Property) -> Option<&Region> {
        let at = property.location()?;
        self.regions.as_ref()?.region_at(at)
    }

    pub fn has_pending_recompute(&self) -> bool {
        self.debouncer.is_pending()
    }

    fn replace_properties(&mut self, properties: Vec<Property>) {
        let destroyed = reconcile::clear(&mut self.markers, &mut self.provider);
        self.display = None;
        self.index = properties.iter().enumerate().map(|(i, p)| (p.id.clone(), i)).collect();
        self.properties = properties;
        info!(count = self.properties.len(), destroyed, "property set replaced");

        if let Some(viewport) = self.viewport {
            self.recompute(viewport);
        }
    }

    fn recompute(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
        let in_view = visible(&self.properties, &viewport);
        let display = self.config.lod.display_set(&in_view, viewport.zoom);
        let report = reconcile::reconcile(&display, &mut self.markers, &mut self.provider);

        self.stats.recomputations += 1;
        self.stats.clusters = display.cluster_count();
        self.stats.singles = display.single_count();
        self.stats.last_report = report;
        debug!(
            zoom = viewport.zoom,
            visible = in_view.len(),
            clusters = self.stats.clusters,
            singles = self.stats.singles,
            "recomputed display set"
        );
        self.display = Some(display);
    }

    fn select(&mut self, id: &PropertyId) -> Result<(), MapError> {
        let property = self
            .property(id)
            .cloned()
            .ok_or_else(|| MapError::UnknownProperty(id.clone()))?;
        let zoom = self.viewport.map_or(self.config.select_zoom, |v| v.zoom);
        self.selection.select(property, zoom, &mut self.provider);
        Ok(())
    }

    /// Zoom towards a cluster; the finer grid of the next recompute splits it.
    fn drill_into(&mut self, key: &MarkerKey) {
        let target = self
            .display
            .as_ref()
            .and_then(|d| d.markers.get(key))
            .filter(|m| matches!(m.payload, MarkerPayload::Cluster { .. }))
            .map(|m| m.coord);
        let Some(target) = target else {
            warn!(marker = %key, "click on a cluster that is no longer displayed");
            return;
        };
        let zoom = self.viewport.map_or(self.config.select_zoom, |v| v.zoom) + self.config.cluster_zoom_step;
        self.provider.fly_to(target, zoom, self.config.fly_duration());
    }
}

impl<P: ViewportProvider> Drop for PropertyMap<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
