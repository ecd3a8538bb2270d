use _model::{LatLng, StoreCollection};
use anyhow::{Context, Result};
use tracing::debug;
use ureq::Agent;

/// Where the front end gets its drop-off locations from.
pub trait StoreSource {
    fn fetch(&self, center: LatLng) -> Result<StoreCollection>;
}

/// The `/data/dropoffs` endpoint of a running server.
pub struct HttpStores {
    agent: Agent,
    endpoint: String,
}

impl HttpStores {
    pub fn new(endpoint: &str) -> Self {
        Self {
            agent: Agent::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/data/dropoffs", self.endpoint)
    }
}

impl StoreSource for HttpStores {
    fn fetch(&self, center: LatLng) -> Result<StoreCollection> {
        let url = self.url();
        debug!("Fetching stores near {center} from {url}");
        let stores: StoreCollection = self
            .agent
            .get(&url)
            .query("centerLat", &center.lat.to_string())
            .query("centerLng", &center.lng.to_string())
            .call()
            .with_context(|| format!("Failed to fetch {url}"))?
            .into_json()?;
        Ok(stores)
    }
}
