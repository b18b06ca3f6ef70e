use std::collections::BTreeMap;

use anyhow::Result;

use crate::kml;
use crate::layer::{self, RouteLayer};
use crate::LayerID;

/// Everything imported so far, across all roads. This is the only owner of layers;
/// everything else borrows per render pass.
pub struct LayerRegistry {
    layers: BTreeMap<LayerID, RouteLayer>,
    next_id: usize,
    pub active_road: Option<String>,
    /// Sticky: may point at a layer on another road, in which case the resolver ignores
    /// it until the user switches back to that road.
    pub reference_choice: Option<LayerID>,
}

/// What a multi-file import did. Failures are isolated per file.
pub struct ImportReport {
    pub added: Vec<LayerID>,
    /// (file name, what went wrong)
    pub errors: Vec<(String, anyhow::Error)>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self {
            layers: BTreeMap::new(),
            next_id: 0,
            active_road: None,
            reference_choice: None,
        }
    }

    /// Imports a batch of route files for one road. Each file either fully commits its
    /// layers or fully fails; a corrupt file doesn't block the others. Appends to
    /// whatever is already registered.
    pub fn import_files(&mut self, road_name: &str, files: &[(String, String)]) -> Result<ImportReport> {
        let road_name = road_name.trim();
        if road_name.is_empty() {
            bail!("road name can't be empty");
        }

        let mut report = ImportReport {
            added: Vec::new(),
            errors: Vec::new(),
        };
        for (filename, raw) in files {
            match self.import_one(road_name, raw) {
                Ok(mut ids) => {
                    info!("imported {} layer(s) from {}", ids.len(), filename);
                    report.added.append(&mut ids);
                }
                Err(err) => {
                    warn!("skipping {}: {}", filename, err);
                    report.errors.push((filename.clone(), err));
                }
            }
        }
        if !report.added.is_empty() {
            self.active_road = Some(road_name.to_string());
        }
        Ok(report)
    }

    fn import_one(&mut self, road_name: &str, raw: &str) -> Result<Vec<LayerID>> {
        // Parse the whole file before touching the registry, so a bad file commits nothing
        let placemarks = kml::parse(raw)?;

        let color_offset = self.layers.len();
        let mut counter = self.next_id;
        let layers = layer::build_layers(
            placemarks,
            road_name,
            &mut || {
                let id = LayerID(counter);
                counter += 1;
                id
            },
            color_offset,
        );
        self.next_id = counter;

        let mut ids = Vec::new();
        for layer in layers {
            ids.push(layer.id);
            self.layers.insert(layer.id, layer);
        }
        Ok(ids)
    }

    pub fn get(&self, id: LayerID) -> Option<&RouteLayer> {
        self.layers.get(&id)
    }

    /// In import order, since ids are monotonic.
    pub fn all_layers(&self) -> impl Iterator<Item = &RouteLayer> {
        self.layers.values()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers_for_road(&self, road: &str) -> Vec<&RouteLayer> {
        self.layers
            .values()
            .filter(|l| l.road_name == road)
            .collect()
    }

    /// Derived on demand, never stored, so it can't go stale after a clear-all.
    pub fn roads(&self) -> BTreeMap<&str, Vec<&RouteLayer>> {
        let mut out: BTreeMap<&str, Vec<&RouteLayer>> = BTreeMap::new();
        for layer in self.layers.values() {
            out.entry(&layer.road_name).or_default().push(layer);
        }
        out
    }

    pub fn set_active_road(&mut self, road: &str) {
        self.active_road = Some(road.to_string());
    }

    /// Click-to-designate the authoritative alignment.
    pub fn choose_reference(&mut self, id: LayerID) {
        self.reference_choice = Some(id);
    }

    /// All-or-nothing; the caller is responsible for confirming with the user first.
    /// The id counter is deliberately not reset.
    pub fn clear_all(&mut self) {
        self.layers.clear();
        self.active_road = None;
        self.reference_choice = None;
        info!("cleared all imported layers");
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn kml_line(name: &str, coords: &str) -> String {
        format!(
            r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document><Placemark><name>{}</name><LineString><coordinates>{}</coordinates></LineString></Placemark></Document></kml>"#,
            name, coords
        )
    }

    #[test]
    fn end_to_end_single_placemark() {
        let mut registry = LayerRegistry::new();
        // 3 points spanning ~10km along a meridian
        let file = kml_line("Centerline", "36.0,0.0,0 36.0,0.045,0 36.0,0.09,0");
        let report = registry
            .import_files("Main Road", &[("route.kml".to_string(), file)])
            .unwrap();
        assert_eq!(report.added.len(), 1);
        assert!(report.errors.is_empty());
        assert_eq!(registry.active_road.as_deref(), Some("Main Road"));

        let layer = registry.get(report.added[0]).unwrap();
        assert_eq!(layer.segments.len(), 1);
        assert_eq!(layer.segments[0].start_chainage_km, 0.0);
        assert!((layer.total_length_km - 10.0).abs() < 0.5);
        assert_eq!(layer.segments[0].end_chainage_km, layer.total_length_km);
    }

    #[test]
    fn bad_file_doesnt_block_good_file() {
        let mut registry = LayerRegistry::new();
        let good = kml_line("Centerline", "36.0,0.0 36.0,0.01 36.0,0.02");
        let bad = "<kml><Placemark>".to_string();
        let report = registry
            .import_files(
                "Main Road",
                &[("good.kml".to_string(), good), ("bad.kml".to_string(), bad)],
            )
            .unwrap();
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, "bad.kml");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_road_name_blocks_import_entirely() {
        let mut registry = LayerRegistry::new();
        let good = kml_line("Centerline", "36.0,0.0 36.0,0.01");
        assert!(registry
            .import_files("  ", &[("good.kml".to_string(), good)])
            .is_err());
        assert!(registry.is_empty());
        assert!(registry.active_road.is_none());
    }

    #[test]
    fn import_is_additive_and_ids_are_unique() {
        let mut registry = LayerRegistry::new();
        let file = kml_line("Centerline", "36.0,0.0 36.0,0.01");
        let first = registry
            .import_files("Road A", &[("a.kml".to_string(), file.clone())])
            .unwrap();
        let second = registry
            .import_files("Road B", &[("b.kml".to_string(), file)])
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert_ne!(first.added[0], second.added[0]);
        // Colors continue cycling instead of repeating
        let a = registry.get(first.added[0]).unwrap();
        let b = registry.get(second.added[0]).unwrap();
        assert_ne!(a.color, b.color);
        // Importing road B didn't touch road A's layers
        assert_eq!(registry.layers_for_road("Road A").len(), 1);
        assert_eq!(registry.roads().len(), 2);
        assert_eq!(registry.active_road.as_deref(), Some("Road B"));
    }

    #[test]
    fn clear_all_resets_selection_but_not_ids() {
        let mut registry = LayerRegistry::new();
        let file = kml_line("Centerline", "36.0,0.0 36.0,0.01");
        let report = registry
            .import_files("Road A", &[("a.kml".to_string(), file.clone())])
            .unwrap();
        registry.choose_reference(report.added[0]);

        registry.clear_all();
        assert!(registry.is_empty());
        assert!(registry.active_road.is_none());
        assert!(registry.reference_choice.is_none());

        // A fresh import after clearing never reuses an old id
        let fresh = registry
            .import_files("Road A", &[("a.kml".to_string(), file)])
            .unwrap();
        assert_ne!(fresh.added[0], report.added[0]);
    }
}
