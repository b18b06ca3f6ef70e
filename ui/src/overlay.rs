//! Turns the registry plus the latest project snapshot into a renderable scene. Pure:
//! the same inputs always build the same scene, and nothing here touches a mapping
//! engine directly.

use model::{
    project_to_geo, project_to_schematic, GeoPoint, LayerID, LayerRegistry, SchematicPosition,
};

use crate::drift::DriftState;
use crate::entities::{tracked_entities, EntityKind, Project};
use crate::view::{OverlayKey, ViewMode, ViewState};

pub const HEAT_BUCKETS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteStyle {
    /// The authoritative alignment: white casing underlay plus a full-opacity stroke.
    Reference,
    /// Another layer of the active road.
    Active,
    /// A layer of some other road, toggled visible anyway; drawn dashed at reduced
    /// opacity.
    Dimmed,
}

#[derive(Clone, Debug)]
pub struct RoutePolyline {
    pub layer: LayerID,
    pub color: String,
    pub path: String,
    pub style: RouteStyle,
}

#[derive(Clone, Debug)]
pub struct Marker {
    pub kind: EntityKind,
    pub id: String,
    pub label: String,
    pub schematic: SchematicPosition,
    pub geo: GeoPoint,
    pub color: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskLevel {
    Medium,
    High,
}

#[derive(Clone, Debug)]
pub struct HeatBand {
    pub start_km: f64,
    pub end_km: f64,
    pub level: RiskLevel,
    pub color: String,
}

#[derive(Clone, Debug, Default)]
pub struct OverlayScene {
    pub polylines: Vec<RoutePolyline>,
    pub markers: Vec<Marker>,
    pub heat_bands: Vec<HeatBand>,
}

pub fn build_scene(
    registry: &LayerRegistry,
    project: &Project,
    drift: &DriftState,
    view: &ViewState,
) -> OverlayScene {
    let reference = registry.reference_layer();
    let reference_id = reference.map(|l| l.id);
    let total_km = registry.project_length_km();

    let mut polylines = Vec::new();
    for layer in registry.all_layers() {
        if !view.is_visible(OverlayKey::Layer(layer.id)) {
            continue;
        }
        let style = if Some(layer.id) == reference_id {
            RouteStyle::Reference
        } else if registry.active_road.as_deref() == Some(layer.road_name.as_str()) {
            RouteStyle::Active
        } else {
            RouteStyle::Dimmed
        };
        polylines.push(RoutePolyline {
            layer: layer.id,
            color: layer.color.clone(),
            path: layer.path.clone(),
            style,
        });
    }

    let mut markers = Vec::new();
    for entity in tracked_entities(project, drift) {
        let key = match entity.kind {
            EntityKind::Vehicle => OverlayKey::Vehicles,
            EntityKind::Rfi => OverlayKey::Rfis,
            EntityKind::WorkSite => OverlayKey::WorkSites,
            EntityKind::Structure => OverlayKey::Structures,
        };
        if !view.is_visible(key) {
            continue;
        }
        markers.push(Marker {
            schematic: project_to_schematic(reference, &entity.chainage, total_km, 0.0),
            geo: project_to_geo(reference, &entity.chainage, total_km),
            kind: entity.kind,
            id: entity.id,
            label: entity.label,
            color: entity.color.to_string(),
        });
    }

    let heat_bands = if view.mode == ViewMode::Schematic && view.is_visible(OverlayKey::HeatMap) {
        build_heat_bands(total_km)
    } else {
        Vec::new()
    };

    OverlayScene {
        polylines,
        markers,
        heat_bands,
    }
}

/// Illustrative risk bands: 20 equal buckets, pseudo-intensity from the start chainage.
/// Only the bucket count and the >7 / >4 thresholds are meaningful.
pub fn build_heat_bands(total_km: f64) -> Vec<HeatBand> {
    let mut bands = Vec::new();
    if total_km <= 0.0 {
        return bands;
    }
    let bucket_km = total_km / HEAT_BUCKETS as f64;
    for i in 0..HEAT_BUCKETS {
        let start_km = i as f64 * bucket_km;
        let intensity = (start_km * 7.0).rem_euclid(10.0);
        let level = if intensity > 7.0 {
            RiskLevel::High
        } else if intensity > 4.0 {
            RiskLevel::Medium
        } else {
            continue;
        };
        let c = colorous::YELLOW_ORANGE_RED.eval_continuous(intensity / 10.0);
        bands.push(HeatBand {
            start_km,
            end_km: start_km + bucket_km,
            level,
            color: format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b),
        });
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::LayerRegistry;

    fn registry_with_two_roads() -> LayerRegistry {
        let mut registry = LayerRegistry::new();
        let r1 = r#"<kml><Document>
            <Placemark><name>Centerline</name><LineString><coordinates>36.0,0.0 36.0,0.09</coordinates></LineString></Placemark>
            <Placemark><name>Edge</name><LineString><coordinates>36.001,0.0 36.001,0.09</coordinates></LineString></Placemark>
        </Document></kml>"#;
        let r2 = r#"<kml><Placemark><name>Spur</name><LineString><coordinates>37.0,0.0 37.0,0.02</coordinates></LineString></Placemark></kml>"#;
        registry
            .import_files("R1", &[("r1.kml".to_string(), r1.to_string())])
            .unwrap();
        registry
            .import_files("R2", &[("r2.kml".to_string(), r2.to_string())])
            .unwrap();
        registry.set_active_road("R1");
        registry
    }

    #[test]
    fn styles_follow_the_active_road() {
        let registry = registry_with_two_roads();
        let scene = build_scene(
            &registry,
            &Project::default(),
            &DriftState::default(),
            &ViewState::new(),
        );
        assert_eq!(scene.polylines.len(), 3);
        let styles: Vec<RouteStyle> = scene.polylines.iter().map(|p| p.style).collect();
        assert_eq!(
            styles,
            vec![RouteStyle::Reference, RouteStyle::Active, RouteStyle::Dimmed]
        );
    }

    #[test]
    fn hidden_layers_are_skipped() {
        let registry = registry_with_two_roads();
        let mut view = ViewState::new();
        let edge_id = registry
            .all_layers()
            .find(|l| l.name == "Edge")
            .unwrap()
            .id;
        view.set_visible(OverlayKey::Layer(edge_id), false);
        let scene = build_scene(
            &registry,
            &Project::default(),
            &DriftState::default(),
            &view,
        );
        assert_eq!(scene.polylines.len(), 2);
        assert!(scene.polylines.iter().all(|p| p.layer != edge_id));
    }

    #[test]
    fn hidden_categories_drop_their_markers() {
        let registry = registry_with_two_roads();
        let raw = r#"{"rfis": [{"id": "r1", "rfiNumber": "RFI-1", "location": "3+000", "status": "Open", "description": "x"}]}"#;
        let project: Project = serde_json::from_str(raw).unwrap();

        let mut view = ViewState::new();
        let scene = build_scene(&registry, &project, &DriftState::default(), &view);
        assert_eq!(scene.markers.len(), 1);
        assert_eq!(scene.markers[0].kind, EntityKind::Rfi);
        // Projected onto the reference layer, not the fallback curve
        assert!(scene.markers[0].geo.lon < 36.5);

        view.toggle(OverlayKey::Rfis);
        let scene = build_scene(&registry, &project, &DriftState::default(), &view);
        assert!(scene.markers.is_empty());
    }

    #[test]
    fn heat_bands_only_in_schematic_mode() {
        let registry = registry_with_two_roads();
        let mut view = ViewState::new();
        let scene = build_scene(
            &registry,
            &Project::default(),
            &DriftState::default(),
            &view,
        );
        assert!(!scene.heat_bands.is_empty());

        view.mode = ViewMode::Map;
        let scene = build_scene(
            &registry,
            &Project::default(),
            &DriftState::default(),
            &view,
        );
        assert!(scene.heat_bands.is_empty());
    }

    #[test]
    fn heat_band_thresholds() {
        // 20km route: bucket i starts at i km, intensity (i*7) mod 10
        let bands = build_heat_bands(20.0);
        assert!(bands.len() <= HEAT_BUCKETS);
        for band in &bands {
            let intensity = (band.start_km * 7.0).rem_euclid(10.0);
            match band.level {
                RiskLevel::High => assert!(intensity > 7.0),
                RiskLevel::Medium => assert!(intensity > 4.0 && intensity <= 7.0),
            }
            assert!(band.color.starts_with('#'));
        }
        // Bucket at 4km: 28 mod 10 = 8 -> high risk
        assert!(bands
            .iter()
            .any(|b| b.start_km == 4.0 && b.level == RiskLevel::High));
        // Bucket at 1km: 7 mod 10 = 7 -> medium, not high
        assert!(bands
            .iter()
            .any(|b| b.start_km == 1.0 && b.level == RiskLevel::Medium));

        assert!(build_heat_bands(0.0).is_empty());
    }
}
