use _model::{LatLng, Store};
use anyhow::Result;
use tracing::{debug, info};

use crate::{
    config::Config,
    error::SearchError,
    map::{overlays, store_to_circle, Circle, MapView, Marker},
    maps::{Bias, MapsService, Place},
    panel::{render_panel, Panel},
    stores::StoreSource,
};

/// Everything on screen: the map, its overlays, and the results panel.
///
/// Actions run one at a time, so each search sees the stores fetched by
/// the one before it and replaces them wholesale.
pub struct Session<S, M> {
    source: S,
    maps: M,
    config: Config,
    pub map: MapView,
    pub origin: Marker,
    pub stores: Vec<Store>,
    pub circles: Vec<Circle>,
    pub panel: Panel,
}

impl<S: StoreSource, M: MapsService> Session<S, M> {
    /// Centers the map on the configured city and shows the stores around it.
    pub fn initialize(source: S, maps: M, config: Config) -> Result<Self> {
        let mut session = Self {
            source,
            maps,
            map: MapView::new(&config),
            config,
            origin: Marker::default(),
            stores: Vec::new(),
            circles: Vec::new(),
            panel: Panel::default(),
        };
        session.fetch_and_render_stores(session.map.center)?;
        Ok(session)
    }

    pub fn maps(&self) -> &M {
        &self.maps
    }

    /// The area place suggestions should favor.
    pub fn bias(&self) -> Bias {
        Bias {
            center: self.map.center,
            radius: self.config.search.radius_meters(),
        }
    }

    pub fn fetch_and_render_stores(&mut self, center: LatLng) -> Result<()> {
        self.stores = self.source.fetch(center)?.features;
        self.circles = self
            .stores
            .iter()
            .map(|x| store_to_circle(x, &self.config.circle, &self.config.map.city_label))
            .collect();
        info!("{} drop-off locations near {center}", self.stores.len());
        Ok(())
    }

    /// Runs a search from a selected place. A place without geometry leaves
    /// the map cleared and fails with [`SearchError::NoAddress`].
    pub fn place_changed(&mut self, place: &Place) -> Result<()> {
        self.circles.clear();
        self.origin.hide();

        let origin = match place.geometry {
            Some(x) => x,
            None => {
                return Err(SearchError::NoAddress {
                    input: place.name.clone(),
                }
                .into())
            }
        };

        info!(
            "Searching from {}",
            place.formatted_address.as_deref().unwrap_or(&place.name)
        );
        self.map.center = origin;
        self.origin.show(origin);
        debug!("Map centered on {origin} at zoom {}", self.map.zoom);

        self.fetch_and_render_stores(origin)?;
        self.calculate_distances(origin)?;
        self.panel = render_panel(&mut self.stores);
        Ok(())
    }

    /// Fills in driving distances from `origin`; results line up with
    /// `self.stores` by position.
    pub fn calculate_distances(&mut self, origin: LatLng) -> Result<()> {
        if self.stores.is_empty() {
            return Ok(());
        }
        let destinations: Vec<LatLng> = self.stores.iter().map(|x| x.location()).collect();
        let distances = self.maps.distance_matrix(origin, &destinations)?;
        debug!("Received {} distances", distances.len());

        for (store, distance) in self.stores.iter_mut().zip(distances) {
            let properties = &mut store.properties;
            properties.distance_text = distance.as_ref().map(|x| x.text.clone());
            properties.distance_value = distance.map(|x| x.value);
        }
        Ok(())
    }

    pub fn overlays(&self) -> geojson::FeatureCollection {
        overlays(&self.circles, &self.origin)
    }
}
