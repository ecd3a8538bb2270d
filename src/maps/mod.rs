//! The third-party mapping service: place search, geocoding and driving
//! distances.

use _model::LatLng;
use anyhow::Result;

mod google;

pub use google::GoogleMaps;

#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub description: String,
    pub place_id: String,
}

/// A resolved place. `geometry` is missing when the input could not be
/// matched to a location.
#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub name: String,
    pub formatted_address: Option<String>,
    pub geometry: Option<LatLng>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Distance {
    pub text: String,
    /// meters
    pub value: u64,
}

/// Area suggestions are biased towards, following the visible map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bias {
    pub center: LatLng,
    pub radius: f64,
}

pub trait MapsService {
    fn autocomplete(&self, input: &str, bias: &Bias) -> Result<Vec<Prediction>>;

    fn place_details(&self, place_id: &str) -> Result<Place>;

    fn geocode(&self, address: &str) -> Result<Place>;

    /// Driving distances from `origin`, in the order of `destinations`.
    /// Unreachable destinations are `None`.
    fn distance_matrix(
        &self,
        origin: LatLng,
        destinations: &[LatLng],
    ) -> Result<Vec<Option<Distance>>>;
}

impl Place {
    pub fn unresolved(name: &str) -> Self {
        Self {
            name: name.to_string(),
            formatted_address: None,
            geometry: None,
        }
    }
}
