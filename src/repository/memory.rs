use std::{fs::read_to_string, path::Path};

use _model::{LatLng, Store, StoreCollection};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::{Radius, StoreRepository, HIDDEN_COLUMNS};

/// Answers queries from a GeoJSON export of the drop-off table held in memory.
pub struct MemoryRepository {
    stores: Vec<Store>,
    radius: Radius,
}

impl MemoryRepository {
    pub fn new(collection: StoreCollection, radius: Radius) -> Self {
        let stores = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(i, mut store)| {
                let fid = store.properties.extra.remove("ogc_fid");
                for column in HIDDEN_COLUMNS {
                    store.properties.extra.remove(column);
                }
                if store.id.is_none() {
                    store.id = Some(fid.unwrap_or(Value::from(i + 1)));
                }
                store
            })
            .collect();
        Self { stores, radius }
    }

    pub fn load(path: &Path, radius: Radius) -> Result<Self> {
        let raw = read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let collection: StoreCollection = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        let repository = Self::new(collection, radius);
        info!(
            "Loaded {} drop-off locations from {}",
            repository.len(),
            path.display()
        );
        Ok(repository)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Nearest `limit` stores, then only those strictly inside the radius.
    pub fn query(&self, center: LatLng) -> StoreCollection {
        let mut nearby: Vec<(f64, &Store)> = self
            .stores
            .iter()
            .map(|x| (center.distance_to(&x.location()), x))
            .collect();
        nearby.sort_by(|(a, _), (b, _)| a.total_cmp(b));

        let features = nearby
            .into_iter()
            .take(self.radius.limit)
            .filter(|(d, _)| *d < self.radius.meters)
            .map(|(d, x)| {
                let mut store = x.clone();
                store
                    .properties
                    .extra
                    .insert("distance".to_string(), Value::from(d));
                store
            })
            .collect();
        StoreCollection::new(features)
    }
}

#[async_trait]
impl StoreRepository for MemoryRepository {
    async fn nearby(&self, center: LatLng) -> Result<StoreCollection> {
        Ok(self.query(center))
    }
}

#[cfg(test)]
mod tests {
    use _model::StoreProperties;
    use serde_json::json;

    use super::*;
    use crate::config::AUSTIN;

    fn store(name: &str, lat: f64, lng: f64) -> Store {
        Store::new(
            None,
            LatLng::new(lat, lng),
            StoreProperties::new(name, "1 Main St", "78701"),
        )
    }

    // points due north of downtown, `km` kilometers away
    fn north(name: &str, km: f64) -> Store {
        store(name, AUSTIN.lat + km / 111.195, AUSTIN.lng)
    }

    fn names(x: &StoreCollection) -> Vec<&str> {
        x.features.iter().map(|x| x.name()).collect()
    }

    #[test]
    fn nearest_first_within_radius() {
        let repo = MemoryRepository::new(
            StoreCollection::new(vec![
                north("far", 20.0),
                north("mid", 5.0),
                north("near", 1.0),
                north("edge", 16.0),
            ]),
            Radius::default(),
        );
        let result = repo.query(AUSTIN);
        assert_eq!(names(&result), ["near", "mid", "edge"]);

        let distance = result.features[0].properties.extra["distance"]
            .as_f64()
            .unwrap();
        assert!((distance - 1000.0).abs() < 5.0, "{distance}");
    }

    #[test]
    fn limit_applies_before_radius() {
        let repo = MemoryRepository::new(
            StoreCollection::new(vec![
                north("a", 1.0),
                north("b", 2.0),
                north("c", 3.0),
                north("outside", 30.0),
            ]),
            Radius {
                meters: 16090.0,
                limit: 2,
            },
        );
        assert_eq!(names(&repo.query(AUSTIN)), ["a", "b"]);

        let far_away = LatLng::new(AUSTIN.lat + 30.0 / 111.195, AUSTIN.lng);
        assert_eq!(names(&repo.query(far_away)), ["outside"]);
    }

    #[test]
    fn empty_when_nothing_nearby() {
        let repo = MemoryRepository::new(
            StoreCollection::new(vec![north("far", 50.0)]),
            Radius::default(),
        );
        let result = repo.query(AUSTIN);
        assert!(result.features.is_empty());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"type": "FeatureCollection", "features": []})
        );
    }

    #[test]
    fn row_columns_become_ids() {
        let mut with_fid = north("with fid", 1.0);
        with_fid
            .properties
            .extra
            .insert("ogc_fid".to_string(), json!(42));
        with_fid
            .properties
            .extra
            .insert("wkb_geometry".to_string(), json!("0101000000"));
        let mut with_id = north("with id", 2.0);
        with_id.id = Some(json!("x-7"));

        let repo = MemoryRepository::new(
            StoreCollection::new(vec![with_fid, with_id, north("bare", 3.0)]),
            Radius::default(),
        );
        assert_eq!(repo.len(), 3);

        let result = repo.query(AUSTIN);
        let ids: Vec<_> = result.features.iter().map(|x| x.id.clone()).collect();
        assert_eq!(ids, [Some(json!(42)), Some(json!("x-7")), Some(json!(3))]);
        let extra = &result.features[0].properties.extra;
        assert!(!extra.contains_key("ogc_fid"));
        assert!(!extra.contains_key("wkb_geometry"));
    }

    #[test]
    fn sample_data() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/dropoffs.geojson"));
        let repo = MemoryRepository::load(path, Radius::default()).unwrap();
        assert_eq!(repo.len(), 5);

        let result = repo.query(AUSTIN);
        assert_eq!(result.features.len(), 4);
        assert_eq!(result.features[0].name(), "Ecology Action");
        assert_eq!(result.features[0].id, Some(json!(2)));
    }

    #[tokio::test]
    async fn trait_object() {
        let repo: Box<dyn StoreRepository> = Box::new(MemoryRepository::new(
            StoreCollection::new(vec![north("near", 1.0)]),
            Radius::default(),
        ));
        let result = repo.nearby(AUSTIN).await.unwrap();
        assert_eq!(names(&result), ["near"]);
    }
}
