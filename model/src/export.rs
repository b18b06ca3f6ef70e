//! GeoJSON export of imported layers, so alignments can feed external web maps.

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};

use crate::layer::RouteLayer;
use crate::registry::LayerRegistry;

/// One MultiLineString feature per layer, in registry order.
pub fn registry_to_geojson(registry: &LayerRegistry) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: registry.all_layers().map(layer_to_feature).collect(),
        foreign_members: None,
    }
}

pub fn registry_to_geojson_string(registry: &LayerRegistry) -> String {
    GeoJson::from(registry_to_geojson(registry)).to_string()
}

fn layer_to_feature(layer: &RouteLayer) -> Feature {
    let coords: Vec<Vec<Vec<f64>>> = layer
        .segments
        .iter()
        .map(|seg| seg.points.iter().map(|pt| vec![pt.lon, pt.lat]).collect())
        .collect();

    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), JsonValue::from(layer.name.clone()));
    properties.insert("road".to_string(), JsonValue::from(layer.road_name.clone()));
    properties.insert("color".to_string(), JsonValue::from(layer.color.clone()));
    properties.insert(
        "length_km".to_string(),
        JsonValue::from(layer.total_length_km),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::MultiLineString(coords))),
        id: Some(geojson::feature::Id::Number((layer.id.0 as u64).into())),
        properties: Some(properties),
        foreign_members: None,
    }
}
