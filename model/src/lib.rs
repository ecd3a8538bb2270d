mod point;
mod store;

pub use point::LatLng;
pub use store::{Store, StoreCollection, StoreProperties};
