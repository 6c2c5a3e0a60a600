//! Geospatial clustering and marker reconciliation for an interactive
//! property map.
//!
//! Data flows one way: viewport events are debounced, the visible
//! properties are clustered on a zoom-dependent grid, the level-of-detail
//! policy picks what to show, and the reconciler issues the minimal set of
//! marker create/destroy calls to the host. See [`engine::PropertyMap`].

pub mod cluster;
pub mod config;
pub mod data;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod lod;
pub mod model;
pub mod provider;
pub mod reconcile;
pub mod regions;
pub mod selection;
pub mod test_harness;

pub use config::MapConfig;
pub use engine::{MapEvent, MapStats, PropertyMap};
pub use error::{MapError, ProviderError};
pub use lod::{DetailMode, DisplaySet, LodPolicy, MarkerKey, MarkerPayload};
pub use model::{Property, PropertyId, Source, Status, Viewport};
pub use provider::ViewportProvider;
