use geo::Rect;
use geo::coord;
use geojson::GeoJson;
use rand::Rng;
use serde_json::from_slice;
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::error::MapError;
use crate::model::{Property, PropertyId, Source, Status};
use crate::regions::RegionIndex;

/// Prostokąt obejmujący Tajlandię (lng 97.3–105.6, lat 5.6–20.5)
pub fn thailand() -> Rect<f64> {
    Rect::new(coord! { x: 97.3, y: 5.6 }, coord! { x: 105.6, y: 20.5 })
}

/// Ładowanie ofert (.json) i granic prowincji (.geojson) z katalogu danych
pub struct DataCache {
    base: PathBuf,
}

impl DataCache {
    pub fn new<P: AsRef<Path>>(base: P) -> Result<Self, MapError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn load_properties(&self, file: &str) -> Result<Vec<Property>, MapError> {
        let data = fs::read(self.base.join(file))?;
        let list: Vec<Property> = from_slice(&data)?;
        Ok(list)
    }

    pub fn load_geojson(&self, file: &str) -> Result<GeoJson, MapError> {
        let txt = fs::read_to_string(self.base.join(file))?;
        Ok(GeoJson::from_str(&txt)?)
    }

    /// Granice prowincji; błąd zwracany wywołującemu, który decyduje o degradacji
    pub fn load_regions(&self, file: &str) -> Result<RegionIndex, MapError> {
        RegionIndex::from_geojson(self.load_geojson(file)?)
    }
}

/// Losowo rozrzucone oferty w podanym prostokącie (dane demonstracyjne)
pub fn scatter_properties<R: Rng>(count: usize, bounds: Rect<f64>, rng: &mut R) -> Vec<Property> {
    let (min, max) = (bounds.min(), bounds.max());
    (0..count)
        .map(|i| Property {
            id: PropertyId(format!("TH-{i:05}")),
            lat: rng.random_range(min.y..=max.y),
            lng: rng.random_range(min.x..=max.x),
            price: (rng.random_range(8..=250) as f64) * 100_000.0,
            status: if rng.random_bool(0.7) { Status::ForSale } else { Status::Sold },
            source: if rng.random_bool(0.8) { Source::Internal } else { Source::External },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn scatter_stays_in_bounds_and_is_seeded() {
        let a = scatter_properties(200, thailand(), &mut StdRng::seed_from_u64(7));
        let b = scatter_properties(200, thailand(), &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.iter().all(|p| {
            let c = p.location().unwrap();
            c.x >= 97.3 && c.x <= 105.6 && c.y >= 5.6 && c.y <= 20.5
        }));
        assert_eq!(a[0].id, PropertyId::new("TH-00000"));
    }

    #[test]
    fn properties_round_trip_through_the_data_dir() {
        let dir = std::env::temp_dir().join(format!("property_atlas_data_{}", std::process::id()));
        let cache = DataCache::new(&dir).unwrap();
        let props = scatter_properties(5, thailand(), &mut StdRng::seed_from_u64(1));
        fs::write(dir.join("properties.json"), serde_json::to_vec(&props).unwrap()).unwrap();

        let loaded = cache.load_properties("properties.json").unwrap();
        let ids: Vec<_> = loaded.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, props.iter().map(|p| p.id.clone()).collect::<Vec<_>>());
        assert_eq!(loaded[3].status, props[3].status);
        assert!(matches!(cache.load_regions("missing.geojson"), Err(MapError::Io(_))));
        fs::remove_dir_all(&dir).unwrap();
    }
}
