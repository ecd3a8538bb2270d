use std::{fs::read_to_string, path::Path};

use _model::LatLng;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings read from the optional YAML file passed with `--config`.
///
/// Every key is optional; anything left out keeps the Austin defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map: MapConfig,
    pub search: SearchConfig,
    pub circle: CircleStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: u8,
    /// Appended to the street address in info windows.
    pub city_label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub radius_miles: u32,
    pub limit: usize,
    pub table: String,
    /// Places autocomplete country restriction.
    pub country: String,
    pub endpoint: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleStyle {
    pub radius: f64,
    pub stroke_color: String,
    pub stroke_opacity: f64,
    pub stroke_weight: u32,
}

pub const AUSTIN: LatLng = LatLng::new(30.262129, -97.7468);
const MILES_TO_METERS: u32 = 1609;

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: AUSTIN,
            zoom: 12,
            city_label: "Austin, TX".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            radius_miles: 10,
            limit: 25,
            table: "austinrecycling".to_string(),
            country: "us".to_string(),
            endpoint: "http://localhost:8080".to_string(),
        }
    }
}

impl Default for CircleStyle {
    fn default() -> Self {
        Self {
            radius: 50.0,
            stroke_color: "#579d42".to_string(),
            stroke_opacity: 0.8,
            stroke_weight: 5,
        }
    }
}

impl SearchConfig {
    pub fn radius_meters(&self) -> f64 {
        f64::from(self.radius_miles * MILES_TO_METERS)
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => {
                let raw = read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                Self::parse(&raw).with_context(|| format!("Invalid config {}", path.display()))
            }
            None => Ok(Config::default()),
        }
    }

    fn parse(raw: &str) -> Result<Config> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
