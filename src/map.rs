//! What would be drawn on the map: one circle per store, an info window for
//! each circle, and a marker at the searched address. Overlays export as
//! GeoJSON so any map viewer can display them.

use _model::{LatLng, Store};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde_json::{json, Value};

use crate::config::{CircleStyle, Config};

#[derive(Clone, Debug, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub center: LatLng,
    pub style: CircleStyle,
    pub info: InfoWindow,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InfoWindow {
    pub content: String,
    pub pixel_offset: (i32, i32),
}

/// Marks the origin of the current search; hidden until an address is picked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Marker {
    pub position: Option<LatLng>,
    pub visible: bool,
}

const INFO_WINDOW_OFFSET: (i32, i32) = (0, -30);

impl MapView {
    pub fn new(config: &Config) -> Self {
        Self {
            center: config.map.center,
            zoom: config.map.zoom,
        }
    }
}

impl Marker {
    pub fn show(&mut self, position: LatLng) {
        self.position = Some(position);
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

pub fn store_to_circle(store: &Store, style: &CircleStyle, city_label: &str) -> Circle {
    let center = store.location();
    Circle {
        center,
        style: style.clone(),
        info: InfoWindow {
            content: info_window_content(store, city_label),
            pixel_offset: INFO_WINDOW_OFFSET,
        },
    }
}

pub fn info_window_content(store: &Store, city_label: &str) -> String {
    let x = &store.properties;
    format!(
        "{}<br />\n{}<br />\n{} {}",
        escape(&x.business_name),
        escape(&x.address_address),
        escape(city_label),
        escape(&x.zip_code)
    )
}

pub(crate) fn escape(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            c => output.push(c),
        }
    }
    output
}

fn point(x: LatLng) -> Geometry {
    Geometry::new(GeoValue::Point(vec![x.lng, x.lat]))
}

fn feature(position: LatLng, properties: Value) -> Feature {
    let properties: Option<JsonObject> = match properties {
        Value::Object(x) => Some(x),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(point(position)),
        id: None,
        properties,
        foreign_members: None,
    }
}

/// Circles, plus the origin marker when it is visible.
pub fn overlays(circles: &[Circle], origin: &Marker) -> FeatureCollection {
    let mut features: Vec<Feature> = circles
        .iter()
        .map(|x| {
            feature(
                x.center,
                json!({
                    "overlay": "circle",
                    "radius": x.style.radius,
                    "strokeColor": x.style.stroke_color,
                    "strokeOpacity": x.style.stroke_opacity,
                    "strokeWeight": x.style.stroke_weight,
                    "info": x.info.content,
                    "pixelOffset": [x.info.pixel_offset.0, x.info.pixel_offset.1],
                }),
            )
        })
        .collect();

    if let (true, Some(position)) = (origin.visible, origin.position) {
        features.push(feature(position, json!({ "overlay": "origin" })));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
