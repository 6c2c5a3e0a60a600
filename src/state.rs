use crossterm::event::KeyCode;
use std::time::Instant;
use tracing::warn;

use property_atlas::{
    MapEvent, MarkerKey, Property, PropertyId, PropertyMap, Status,
};

use crate::host::TerminalHost;

/// Filtr statusu; zmiana podmienia cały zbiór ofert w silniku
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    ForSale,
    Sold,
}

impl StatusFilter {
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::ForSale,
            StatusFilter::ForSale => StatusFilter::Sold,
            StatusFilter::Sold => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "wszystkie",
            StatusFilter::ForSale => "na sprzedaż",
            StatusFilter::Sold => "sprzedane",
        }
    }

    fn matches(self, p: &Property) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::ForSale => p.status == Status::ForSale,
            StatusFilter::Sold => p.status == Status::Sold,
        }
    }
}

pub struct AppState {
    pub map: PropertyMap<TerminalHost>,
    all: Vec<Property>,
    pub filter: StatusFilter,
    pub list_items: Vec<PropertyId>,
    pub selected: usize,
    pub message: Option<String>,
}

impl AppState {
    pub const HELP_TEXT: &'static str = "\
↑/↓: ruch w liście
Enter: pokaż ofertę
w/a/s/d: przesuwanie mapy
+/-: zoom
c: wejdź w najbliższy klaster
f: filtr statusu
Esc: zamknij dymek
q: wyjście";

    pub fn new(map: PropertyMap<TerminalHost>, all: Vec<Property>, now: Instant) -> Self {
        let mut state = Self {
            map,
            all,
            filter: StatusFilter::All,
            list_items: Vec::new(),
            selected: 0,
            message: None,
        };
        state.apply_filter(now);
        let viewport = state.map.provider().viewport();
        state.send(MapEvent::ViewportChanged(viewport), now);
        state
    }

    /// Zwraca true, jeśli trzeba wyjść
    pub fn handle_input(&mut self, key: KeyCode, now: Instant) -> bool {
        use KeyCode::*;
        match key {
            Char('q') => return true,
            Up => if self.selected > 0 { self.selected -= 1 },
            Down => if self.selected + 1 < self.list_items.len() { self.selected += 1 },
            Enter => {
                if let Some(id) = self.list_items.get(self.selected).cloned() {
                    self.send(MapEvent::Select(id), now);
                }
            }
            Esc | Backspace => self.send(MapEvent::Dismiss, now),
            Char('w') => self.camera(now, |h| h.pan(0.0, 0.25)),
            Char('s') => self.camera(now, |h| h.pan(0.0, -0.25)),
            Char('a') => self.camera(now, |h| h.pan(-0.25, 0.0)),
            Char('d') => self.camera(now, |h| h.pan(0.25, 0.0)),
            Char('+') | Char('=') => self.camera(now, |h| h.zoom_by(1.0)),
            Char('-') => self.camera(now, |h| h.zoom_by(-1.0)),
            Char('c') => {
                if let Some(key) = self.nearest_cluster() {
                    self.send(MapEvent::MarkerClicked(key), now);
                }
            }
            Char('f') => {
                self.filter = self.filter.next();
                self.apply_filter(now);
            }
            _ => {}
        }
        false
    }

    /// Krok pętli: animacja kamery, koniec lotu, zegar debouncera
    pub fn tick(&mut self, now: Instant) {
        let update = self.map.provider_mut().advance(now);
        if update.moved {
            let viewport = self.map.provider().viewport();
            self.send(MapEvent::ViewportChanged(viewport), now);
        }
        if update.arrived {
            self.send(MapEvent::MoveComplete, now);
        }
        self.send(MapEvent::Tick, now);
    }

    pub fn selected_property(&self) -> Option<&Property> {
        self.map.selection().selected()
    }

    pub fn list_property(&self, id: &PropertyId) -> Option<&Property> {
        self.map.property(id)
    }

    fn camera(&mut self, now: Instant, f: impl FnOnce(&mut TerminalHost)) {
        f(self.map.provider_mut());
        let viewport = self.map.provider().viewport();
        self.send(MapEvent::ViewportChanged(viewport), now);
    }

    fn apply_filter(&mut self, now: Instant) {
        let filtered: Vec<Property> = self.all.iter().filter(|p| self.filter.matches(p)).cloned().collect();
        let mut ids: Vec<PropertyId> = filtered.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        self.list_items = ids;
        self.selected = 0;
        self.send(MapEvent::PropertiesReplaced(filtered), now);
    }

    fn nearest_cluster(&self) -> Option<MarkerKey> {
        let center = self.map.provider().camera().center;
        let display = self.map.display()?;
        display
            .markers
            .iter()
            .filter(|(k, _)| matches!(k, MarkerKey::Cluster(_)))
            .map(|(k, m)| (k, (m.coord.x - center.x).powi(2) + (m.coord.y - center.y).powi(2)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(k, _)| k.clone())
    }

    fn send(&mut self, event: MapEvent, now: Instant) {
        if let Err(err) = self.map.handle(event, now) {
            warn!("map event failed: {err}");
            self.message = Some(err.to_string());
        }
    }
}
