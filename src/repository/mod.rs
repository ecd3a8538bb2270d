use _model::{LatLng, StoreCollection};
use anyhow::Result;
use async_trait::async_trait;

use crate::config::SearchConfig;

mod memory;
mod postgis;

pub use memory::MemoryRepository;
pub use postgis::{DatabaseArgs, PostgisRepository};

/// Where the server finds drop-off locations.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Stores near `center`, nearest first, each with a `distance` property
    /// in meters.
    async fn nearby(&self, center: LatLng) -> Result<StoreCollection>;
}

/// Bounds applied to every nearby query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Radius {
    pub meters: f64,
    pub limit: usize,
}

impl From<&SearchConfig> for Radius {
    fn from(x: &SearchConfig) -> Self {
        Self {
            meters: x.radius_meters(),
            limit: x.limit,
        }
    }
}

impl Default for Radius {
    fn default() -> Self {
        Radius::from(&SearchConfig::default())
    }
}

// columns that describe the row rather than the store
const HIDDEN_COLUMNS: [&str; 2] = ["ogc_fid", "wkb_geometry"];
