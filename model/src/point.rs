use std::fmt;

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 position in the `{ lat, lng }` shape used by the maps APIs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        Point::from(*self).haversine_distance(&Point::from(*other))
    }
}

impl From<LatLng> for Point {
    fn from(x: LatLng) -> Self {
        Point::new(x.lng, x.lat)
    }
}

impl From<Point> for LatLng {
    fn from(x: Point) -> Self {
        LatLng::new(x.y(), x.x())
    }
}

// the `lat,lng` form the google web services take
impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}
