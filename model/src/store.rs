use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::LatLng;

/// A drop-off location as served by `/data/dropoffs`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: PointGeometry,
    pub properties: StoreProperties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreProperties {
    pub business_name: String,
    pub address_address: String,
    pub zip_code: String,
    #[serde(
        rename = "distanceText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub distance_text: Option<String>,
    /// Driving distance in meters.
    #[serde(
        rename = "distanceValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub distance_value: Option<u64>,
    // remaining columns of the source row, e.g. `distance`
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: GeometryType,
    /// `[lng, lat]`
    pub coordinates: [f64; 2],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Feature,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionType {
    FeatureCollection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreCollection {
    #[serde(rename = "type")]
    pub kind: CollectionType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub features: Vec<Store>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Store>, D::Error> {
    Ok(Option::<Vec<Store>>::deserialize(d)?.unwrap_or_default())
}

impl Store {
    pub fn new(id: Option<Value>, location: LatLng, properties: StoreProperties) -> Self {
        Self {
            kind: FeatureType::Feature,
            id,
            geometry: PointGeometry {
                kind: GeometryType::Point,
                coordinates: [location.lng, location.lat],
            },
            properties,
        }
    }

    pub fn location(&self) -> LatLng {
        let [lng, lat] = self.geometry.coordinates;
        LatLng { lat, lng }
    }

    pub fn name(&self) -> &str {
        &self.properties.business_name
    }
}

impl StoreProperties {
    pub fn new(business_name: &str, address_address: &str, zip_code: &str) -> Self {
        Self {
            business_name: business_name.to_string(),
            address_address: address_address.to_string(),
            zip_code: zip_code.to_string(),
            distance_text: None,
            distance_value: None,
            extra: BTreeMap::new(),
        }
    }
}

impl StoreCollection {
    pub fn new(features: Vec<Store>) -> Self {
        Self {
            kind: CollectionType::FeatureCollection,
            features,
        }
    }
}

impl Default for StoreCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
