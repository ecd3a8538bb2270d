use _model::LatLng;
use anyhow::Result;
use itertools::Itertools;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;
use ureq::{Agent, AgentBuilder};

use super::{Bias, Distance, MapsService, Place, Prediction};
use crate::error::MapsError;

const BASE_URL: &str = "https://maps.googleapis.com/maps/api";
// most destinations a single distance matrix request accepts
const MAX_DESTINATIONS: usize = 25;

#[derive(Clone)]
pub struct GoogleMaps {
    agent: Agent,
    key: String,
    base_url: String,
    country: String,
}

impl GoogleMaps {
    pub fn new(key: &str, country: &str) -> Self {
        let agent = AgentBuilder::new()
            .user_agent(concat!("dropoffs/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            key: key.to_string(),
            base_url: BASE_URL.to_string(),
            country: country.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn components(&self) -> String {
        format!("country:{}", self.country)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        debug!("GET {path} {query:?}");
        let mut request = self
            .agent
            .get(&format!("{}/{path}/json", self.base_url))
            .query("key", &self.key);
        for (k, v) in query {
            request = request.query(k, v);
        }
        Ok(request.call()?.into_json()?)
    }
}

impl MapsService for GoogleMaps {
    fn autocomplete(&self, input: &str, bias: &Bias) -> Result<Vec<Prediction>> {
        let components = self.components();
        let location = bias.center.to_string();
        let radius = format!("{:.0}", bias.radius);
        let response: AutocompleteResponse = self.get(
            "place/autocomplete",
            &[
                ("input", input),
                ("types", "address"),
                ("components", components.as_str()),
                ("location", location.as_str()),
                ("radius", radius.as_str()),
            ],
        )?;
        Ok(response.predictions()?)
    }

    fn place_details(&self, place_id: &str) -> Result<Place> {
        let response: DetailsResponse = self.get(
            "place/details",
            &[
                ("place_id", place_id),
                ("fields", "address_components,geometry,name"),
            ],
        )?;
        Ok(response.place(place_id)?)
    }

    fn geocode(&self, address: &str) -> Result<Place> {
        let components = self.components();
        let response: GeocodeResponse = self.get(
            "geocode",
            &[("address", address), ("components", components.as_str())],
        )?;
        Ok(response.place(address)?)
    }

    fn distance_matrix(
        &self,
        origin: LatLng,
        destinations: &[LatLng],
    ) -> Result<Vec<Option<Distance>>> {
        let origins = origin.to_string();
        let mut output = Vec::with_capacity(destinations.len());
        for chunk in destinations.chunks(MAX_DESTINATIONS) {
            let joined = chunk.iter().join("|");
            let response: DistanceMatrixResponse = self.get(
                "distancematrix",
                &[
                    ("origins", origins.as_str()),
                    ("destinations", joined.as_str()),
                    ("mode", "driving"),
                    ("units", "metric"),
                ],
            )?;
            output.extend(response.distances(chunk.len())?);
        }
        Ok(output)
    }
}

fn check(
    service: &'static str,
    status: &str,
    message: &Option<String>,
    allowed: &[&str],
) -> Result<(), MapsError> {
    if allowed.contains(&status) {
        Ok(())
    } else {
        Err(MapsError::Status {
            service,
            status: status.to_string(),
            message: message.clone(),
        })
    }
}

#[derive(Deserialize)]
struct AutocompleteResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    predictions: Vec<RawPrediction>,
}

#[derive(Deserialize)]
struct RawPrediction {
    description: String,
    place_id: String,
}

impl AutocompleteResponse {
    fn predictions(self) -> Result<Vec<Prediction>, MapsError> {
        check(
            "autocomplete",
            &self.status,
            &self.error_message,
            &["OK", "ZERO_RESULTS"],
        )?;
        Ok(self
            .predictions
            .into_iter()
            .map(|x| Prediction {
                description: x.description,
                place_id: x.place_id,
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct RawGeometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct DetailsResponse {
    status: String,
    error_message: Option<String>,
    result: Option<RawPlace>,
}

#[derive(Deserialize)]
struct RawPlace {
    name: Option<String>,
    formatted_address: Option<String>,
    geometry: Option<RawGeometry>,
}

impl DetailsResponse {
    fn place(self, place_id: &str) -> Result<Place, MapsError> {
        check(
            "place details",
            &self.status,
            &self.error_message,
            &["OK", "NOT_FOUND", "ZERO_RESULTS"],
        )?;
        Ok(match self.result {
            Some(x) => Place {
                name: x.name.unwrap_or_else(|| place_id.to_string()),
                formatted_address: x.formatted_address,
                geometry: x.geometry.map(|x| x.location),
            },
            None => Place::unresolved(place_id),
        })
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    formatted_address: Option<String>,
    geometry: RawGeometry,
}

impl GeocodeResponse {
    fn place(self, address: &str) -> Result<Place, MapsError> {
        check(
            "geocode",
            &self.status,
            &self.error_message,
            &["OK", "ZERO_RESULTS"],
        )?;
        Ok(match self.results.into_iter().next() {
            Some(x) => Place {
                name: address.to_string(),
                formatted_address: x.formatted_address,
                geometry: Some(x.geometry.location),
            },
            None => Place::unresolved(address),
        })
    }
}

#[derive(Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<DistanceMatrixRow>,
}

#[derive(Deserialize)]
struct DistanceMatrixRow {
    elements: Vec<DistanceMatrixElement>,
}

#[derive(Deserialize)]
struct DistanceMatrixElement {
    status: String,
    distance: Option<RawDistance>,
}

#[derive(Deserialize)]
struct RawDistance {
    text: String,
    value: u64,
}

impl DistanceMatrixResponse {
    fn distances(self, expected: usize) -> Result<Vec<Option<Distance>>, MapsError> {
        check("distance matrix", &self.status, &self.error_message, &["OK"])?;
        // one origin, so only the first row
        let elements = self
            .rows
            .into_iter()
            .next()
            .map(|x| x.elements)
            .unwrap_or_default();
        if elements.len() != expected {
            return Err(MapsError::Mismatch {
                service: "distance matrix",
                expected,
                got: elements.len(),
            });
        }
        Ok(elements
            .into_iter()
            .map(|x| match (x.status.as_str(), x.distance) {
                ("OK", Some(d)) => Some(Distance {
                    text: d.text,
                    value: d.value,
                }),
                _ => None,
            })
            .collect())
    }
}
