#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub mod export;
mod geometry;
mod kml;
mod layer;
mod projector;
mod registry;
mod resolver;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::geometry::{
    format_chainage, haversine_km, parse_chainage, GeoBounds, GeoPoint, EARTH_RADIUS_KM,
};
pub use self::layer::{
    ProjectedPoint, RouteLayer, RouteSegment, LAYER_COLORS, SCHEMATIC_HEIGHT, SCHEMATIC_PADDING,
    SCHEMATIC_WIDTH,
};
pub use self::projector::{
    chainage_of_point, project_to_geo, project_to_schematic, SchematicPosition, FALLBACK_HEIGHT,
    FALLBACK_WIDTH,
};
pub use self::registry::{ImportReport, LayerRegistry};
pub use self::resolver::DEFAULT_PROJECT_LENGTH_KM;

/// Assigned by the registry when a layer is imported. Ids are never reused, not even
/// after a clear-all, so a stale id can't silently alias a newer layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerID(pub usize);

impl fmt::Display for LayerID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "layer #{}", self.0)
    }
}
