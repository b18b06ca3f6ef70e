use crate::layer::RouteLayer;
use crate::registry::LayerRegistry;

/// Assumed project length when nothing has been imported yet.
pub const DEFAULT_PROJECT_LENGTH_KM: f64 = 15.0;

/// Names that usually mark the main alignment in survey exports.
const CENTERLINE_HINTS: [&str; 4] = ["RC", "CENTERLINE", "CL", "ALIGNMENT"];

impl LayerRegistry {
    /// The authoritative alignment for the active road: the user's explicit pick if it
    /// belongs to this road, else the first centerline-looking name, else the longest
    /// layer, else nothing.
    pub fn reference_layer(&self) -> Option<&RouteLayer> {
        let road = self.active_road.as_deref()?;
        let layers = self.layers_for_road(road);

        if let Some(id) = self.reference_choice {
            if let Some(layer) = layers.iter().find(|l| l.id == id) {
                return Some(*layer);
            }
            // The pick belongs to another road; ignore it but don't clear it
        }

        if let Some(layer) = layers.iter().find(|l| {
            let name = l.name.to_uppercase();
            CENTERLINE_HINTS.iter().any(|hint| name.contains(hint))
        }) {
            return Some(*layer);
        }

        layers
            .into_iter()
            .max_by(|a, b| a.total_length_km.total_cmp(&b.total_length_km))
    }

    /// Total project length in km, rounded to 2 decimals. Resolution already falls back
    /// to the longest layer, so this only hits the default when the road has no layers
    /// at all.
    pub fn project_length_km(&self) -> f64 {
        match self.reference_layer() {
            Some(layer) => (layer.total_length_km * 100.0).round() / 100.0,
            None => DEFAULT_PROJECT_LENGTH_KM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kml_three_layers() -> String {
        // Edge ~5km, Centerline ~8km, RC ~8km, all along a meridian
        let pm = |name: &str, max_lat: f64| {
            format!(
                "<Placemark><name>{}</name><LineString><coordinates>36.0,0.0 36.0,{}</coordinates></LineString></Placemark>",
                name, max_lat
            )
        };
        format!(
            "<kml><Document>{}{}{}</Document></kml>",
            pm("Edge", 0.045),
            pm("Centerline", 0.072),
            pm("RC", 0.072)
        )
    }

    #[test]
    fn pattern_beats_length() {
        let mut registry = LayerRegistry::new();
        registry
            .import_files("R1", &[("r1.kml".to_string(), kml_three_layers())])
            .unwrap();
        // No explicit pick: "Edge" loses to the centerline pattern even though the
        // lengths differ
        let reference = registry.reference_layer().unwrap();
        assert_eq!(reference.name, "Centerline");
        assert!((registry.project_length_km() - 8.0).abs() < 0.1);
    }

    #[test]
    fn explicit_pick_wins() {
        let mut registry = LayerRegistry::new();
        let report = registry
            .import_files("R1", &[("r1.kml".to_string(), kml_three_layers())])
            .unwrap();
        let edge = report.added[0];
        registry.choose_reference(edge);
        assert_eq!(registry.reference_layer().unwrap().name, "Edge");
    }

    #[test]
    fn pick_on_another_road_is_ignored_but_kept() {
        let mut registry = LayerRegistry::new();
        let report = registry
            .import_files("R1", &[("r1.kml".to_string(), kml_three_layers())])
            .unwrap();
        let other = "<kml><Placemark><name>Shoulder</name><LineString><coordinates>37.0,0.0 37.0,0.02</coordinates></LineString></Placemark></kml>".to_string();
        registry
            .import_files("R2", &[("r2.kml".to_string(), other)])
            .unwrap();

        // Active road is now R2; a pick pointing at R1 is ignored
        registry.choose_reference(report.added[1]);
        assert_eq!(registry.reference_layer().unwrap().name, "Shoulder");
        assert_eq!(registry.reference_choice, Some(report.added[1]));

        // Switching back to R1 revives the pick
        registry.set_active_road("R1");
        assert_eq!(registry.reference_layer().unwrap().name, "Centerline");
    }

    #[test]
    fn longest_layer_when_no_pattern_matches() {
        let mut registry = LayerRegistry::new();
        let raw = "<kml><Document>\
            <Placemark><name>Shoulder</name><LineString><coordinates>36.0,0.0 36.0,0.02</coordinates></LineString></Placemark>\
            <Placemark><name>Drain</name><LineString><coordinates>36.0,0.0 36.0,0.05</coordinates></LineString></Placemark>\
            </Document></kml>";
        registry
            .import_files("R1", &[("r1.kml".to_string(), raw.to_string())])
            .unwrap();
        assert_eq!(registry.reference_layer().unwrap().name, "Drain");
    }

    #[test]
    fn default_length_without_layers() {
        let registry = LayerRegistry::new();
        assert!(registry.reference_layer().is_none());
        assert_eq!(registry.project_length_km(), DEFAULT_PROJECT_LENGTH_KM);
    }
}
