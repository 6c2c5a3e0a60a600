use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use geo::coord;
use property_atlas::data::{scatter_properties, thailand};
use property_atlas::test_harness::RecordingProvider;
use property_atlas::{DetailMode, MapConfig, MapError, MapEvent, MarkerKey, PropertyMap, Viewport};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn thailand_at(zoom: f64) -> Viewport {
    let b = thailand();
    Viewport::new(b.max(), b.min(), zoom)
}

fn new_map(count: usize) -> (PropertyMap<RecordingProvider>, RecordingProvider, Instant) {
    let provider = RecordingProvider::default();
    let mut map = PropertyMap::new(provider.clone(), MapConfig::default());
    let t0 = Instant::now();
    let props = scatter_properties(count, thailand(), &mut StdRng::seed_from_u64(2024));
    map.handle(MapEvent::PropertiesReplaced(props), t0).unwrap();
    (map, provider, t0)
}

fn settle(map: &mut PropertyMap<RecordingProvider>, viewport: Viewport, at: Instant) -> Instant {
    map.handle(MapEvent::ViewportChanged(viewport), at).unwrap();
    let later = at + map.config().debounce();
    map.handle(MapEvent::Tick, later).unwrap();
    later
}

#[test]
fn test_thailand_zoom_in_swaps_clusters_for_markers() {
    let (mut map, provider, t0) = new_map(500);

    let t1 = settle(&mut map, thailand_at(5.0), t0);
    let coarse = map.display().unwrap().clone();
    assert_eq!(coarse.mode, DetailMode::Clustered);
    assert!(coarse.cluster_count() >= 3, "expected several clusters, got {}", coarse.cluster_count());
    assert!(coarse.single_count() <= 30);
    for (key, marker) in &coarse.markers {
        if let (MarkerKey::Cluster(_), property_atlas::MarkerPayload::Cluster { count, .. }) = (key, &marker.payload) {
            assert!(*count >= 3);
        }
    }
    let before: BTreeSet<MarkerKey> = map.markers().keys().cloned().collect();
    assert_eq!(before.len(), coarse.markers.len());
    provider.clear_calls();

    settle(&mut map, thailand_at(14.0), t1);
    let fine = map.display().unwrap();
    assert_eq!(fine.mode, DetailMode::Individual);
    assert_eq!(fine.cluster_count(), 0);
    assert_eq!(fine.markers.len(), map.config().lod.max_markers);
    assert_eq!(map.markers().len(), map.config().lod.max_markers);

    let destroyed: BTreeSet<MarkerKey> = provider.destroyed().into_iter().collect();
    let created: BTreeSet<MarkerKey> = provider.created().into_iter().collect();
    let old_clusters: BTreeSet<MarkerKey> =
        before.iter().filter(|k| matches!(k, MarkerKey::Cluster(_))).cloned().collect();
    assert!(old_clusters.is_subset(&destroyed));
    assert!(created.is_disjoint(&before), "a displayed marker was re-created");
    assert!(map.markers().keys().all(|k| matches!(k, MarkerKey::Property(_))));
}

#[test]
fn test_burst_of_viewport_events_recomputes_once_with_latest() {
    let (mut map, _provider, t0) = new_map(200);
    let delay = map.config().debounce();

    let mut at = t0;
    for i in 0..10 {
        let zoom = 5.0 + i as f64;
        map.handle(MapEvent::ViewportChanged(thailand_at(zoom)), at).unwrap();
        map.handle(MapEvent::Tick, at).unwrap();
        at += delay / 10;
    }
    assert_eq!(map.stats().recomputations, 0);

    map.handle(MapEvent::Tick, at + delay).unwrap();
    map.handle(MapEvent::Tick, at + delay * 3).unwrap();
    assert_eq!(map.stats().recomputations, 1);
    assert_eq!(map.viewport().map(|v| v.zoom), Some(14.0));
    assert_eq!(map.mode(), Some(DetailMode::Individual));
}

#[test]
fn test_teardown_with_pending_timer_fires_nothing() {
    let (mut map, provider, t0) = new_map(300);
    let t1 = settle(&mut map, thailand_at(6.0), t0);
    assert!(provider.live_markers() > 0);

    let some_id = map.properties()[0].id.clone();
    map.handle(MapEvent::Select(some_id), t1).unwrap();
    map.handle(MapEvent::MoveComplete, t1).unwrap();
    assert_eq!(provider.open_callouts(), 1);

    map.handle(MapEvent::ViewportChanged(thailand_at(9.0)), t1).unwrap();
    assert!(map.has_pending_recompute());
    map.teardown();

    assert!(!map.has_pending_recompute());
    assert_eq!(provider.live_markers(), 0);
    assert_eq!(provider.open_callouts(), 0);
    let late = t1 + Duration::from_secs(5);
    assert!(matches!(map.handle(MapEvent::Tick, late), Err(MapError::TornDown)));
    assert_eq!(map.stats().recomputations, 1);
}

#[test]
fn test_dropping_the_map_releases_everything() {
    let (mut map, provider, t0) = new_map(100);
    settle(&mut map, thailand_at(5.0), t0);
    map.handle(MapEvent::ViewportChanged(thailand_at(7.0)), t0).unwrap();
    let recomputations = map.stats().recomputations;
    drop(map);

    assert_eq!(recomputations, 1);
    assert_eq!(provider.live_markers(), 0);
}

#[test]
fn test_pan_keeps_markers_that_stay_in_view() {
    let (mut map, provider, t0) = new_map(500);
    let center = coord! { x: 100.5, y: 13.75 };
    let t1 = settle(&mut map, Viewport::around(center, 1.0, 0.6, 13.0), t0);
    let before: BTreeSet<MarkerKey> = map.markers().keys().cloned().collect();
    provider.clear_calls();

    settle(&mut map, Viewport::around(center + coord! { x: 0.3, y: 0.0 }, 1.0, 0.6, 13.0), t1);
    let after: BTreeSet<MarkerKey> = map.markers().keys().cloned().collect();

    let created: BTreeSet<MarkerKey> = provider.created().into_iter().collect();
    let destroyed: BTreeSet<MarkerKey> = provider.destroyed().into_iter().collect();
    assert_eq!(created, after.difference(&before).cloned().collect());
    assert_eq!(destroyed, before.difference(&after).cloned().collect());
}

#[test]
fn test_unlocated_records_never_get_markers() {
    let provider = RecordingProvider::default();
    let mut map = PropertyMap::new(provider.clone(), MapConfig::default());
    let t0 = Instant::now();
    let mut props = scatter_properties(20, thailand(), &mut StdRng::seed_from_u64(9));
    props[0].lat = 0.0;
    props[0].lng = 0.0;
    props[1].lat = f64::NAN;
    let bad = [props[0].id.clone(), props[1].id.clone()];
    map.handle(MapEvent::PropertiesReplaced(props), t0).unwrap();
    settle(&mut map, thailand_at(13.0), t0);

    assert_eq!(map.markers().len(), 18);
    for id in bad {
        assert!(!map.markers().contains(&MarkerKey::Property(id)));
    }
}
