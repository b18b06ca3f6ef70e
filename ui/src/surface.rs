//! The seam between the scene builder and a concrete mapping engine. The core never
//! talks to a map library; it hands a scene to whatever implements `MapSurface`.

use model::GeoPoint;

use crate::overlay::OverlayScene;
use crate::view::BaseLayer;

/// Implementations own their tile-layer and overlay-group handles exclusively while
/// attached, and must release every one of them in `detach` -- a leaked handle would
/// duplicate listeners and overlays the next time the map view mounts.
pub trait MapSurface {
    fn attach(&mut self, center: GeoPoint, base_layer: BaseLayer);
    fn set_base_layer(&mut self, base_layer: BaseLayer);
    fn update_overlays(&mut self, scene: &OverlayScene);
    fn detach(&mut self);
}

/// Headless surface for the CLI harness: logs what a real engine would draw.
#[derive(Default)]
pub struct LogSurface {
    attached: bool,
}

impl MapSurface for LogSurface {
    fn attach(&mut self, center: GeoPoint, base_layer: BaseLayer) {
        self.attached = true;
        info!(
            "map attached at ({:.4}, {:.4}), base layer {:?}",
            center.lat, center.lon, base_layer
        );
    }

    fn set_base_layer(&mut self, base_layer: BaseLayer) {
        info!("base layer switched to {:?}", base_layer);
    }

    fn update_overlays(&mut self, scene: &OverlayScene) {
        if !self.attached {
            warn!("overlay update before attach");
        }
        info!(
            "drawing {} route layer(s), {} marker(s), {} heat band(s)",
            scene.polylines.len(),
            scene.markers.len(),
            scene.heat_bands.len()
        );
    }

    fn detach(&mut self) {
        self.attached = false;
        info!("map torn down");
    }
}
