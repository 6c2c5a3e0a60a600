use thiserror::Error;

use crate::model::PropertyId;

/// Błędy silnika mapy i warstwy danych
#[derive(Debug, Error)]
pub enum MapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown property `{0}`")]
    UnknownProperty(PropertyId),

    #[error("map view has been torn down")]
    TornDown,
}

/// Returned by a host that refuses to place a marker.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ProviderError {
    #[error("coordinate (lat {lat}, lng {lng}) rejected by host")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("host refused marker: {0}")]
    Refused(String),
}
