use serde::Serialize;

use crate::geometry::{haversine_km, GeoBounds, GeoPoint};
use crate::kml::Placemark;
use crate::LayerID;

/// Logical canvas the normalized schematic projection targets.
pub const SCHEMATIC_WIDTH: f64 = 900.0;
pub const SCHEMATIC_HEIGHT: f64 = 400.0;
pub const SCHEMATIC_PADDING: f64 = 50.0;

/// Cycled as layers are imported, continuing from the registry size so a second import
/// doesn't restart at the first color.
pub const LAYER_COLORS: [&str; 8] = [
    "#2563eb", "#dc2626", "#16a34a", "#9333ea", "#ea580c", "#0891b2", "#ca8a04", "#db2777",
];

/// A vertex in schematic space, paired with its chainage along the whole layer (not
/// just its segment).
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub chainage_km: f64,
}

/// One contiguous polyline of a layer. `points` and `projected` are parallel.
#[derive(Clone, Debug, Serialize)]
pub struct RouteSegment {
    pub points: Vec<GeoPoint>,
    pub projected: Vec<ProjectedPoint>,
    pub length_km: f64,
    pub start_chainage_km: f64,
    pub end_chainage_km: f64,
}

/// One named geometry layer from one imported file, tagged with the road it belongs to.
#[derive(Clone, Debug, Serialize)]
pub struct RouteLayer {
    pub id: LayerID,
    pub name: String,
    pub road_name: String,
    pub segments: Vec<RouteSegment>,
    pub total_length_km: f64,
    pub color: String,
    /// SVG path over all segments, in schematic space.
    pub path: String,
    pub bounds: GeoBounds,
}

/// Builds one layer per placemark. All placemarks from the same file share one
/// normalization box, so their schematic shapes stay in proportion to each other.
pub fn build_layers(
    placemarks: Vec<Placemark>,
    road_name: &str,
    next_id: &mut dyn FnMut() -> LayerID,
    color_offset: usize,
) -> Vec<RouteLayer> {
    let mut file_bounds = GeoBounds::new();
    for pm in &placemarks {
        for line in &pm.lines {
            for pt in line {
                file_bounds.update(*pt);
            }
        }
    }

    let mut layers = Vec::new();
    for (idx, pm) in placemarks.into_iter().enumerate() {
        let mut segments = Vec::new();
        let mut path = String::new();
        let mut bounds = GeoBounds::new();
        let mut running_km = 0.0;
        for line in pm.lines {
            let seg = build_segment(&line, running_km, &file_bounds, &mut path);
            running_km = seg.end_chainage_km;
            for pt in &seg.points {
                bounds.update(*pt);
            }
            segments.push(seg);
        }
        layers.push(RouteLayer {
            id: next_id(),
            name: pm.name,
            road_name: road_name.to_string(),
            segments,
            total_length_km: running_km,
            color: LAYER_COLORS[(color_offset + idx) % LAYER_COLORS.len()].to_string(),
            path,
            bounds,
        });
    }
    layers
}

fn build_segment(
    line: &[GeoPoint],
    start_chainage_km: f64,
    file_bounds: &GeoBounds,
    path: &mut String,
) -> RouteSegment {
    let mut projected = Vec::with_capacity(line.len());
    let mut cumulative_km = start_chainage_km;
    let mut prev: Option<GeoPoint> = None;
    for (i, pt) in line.iter().enumerate() {
        if let Some(prev) = prev {
            cumulative_km += haversine_km(prev, *pt);
        }
        prev = Some(*pt);

        let (x, y) = schematic_xy(*pt, file_bounds);
        if !path.is_empty() {
            path.push(' ');
        }
        let cmd = if i == 0 { 'M' } else { 'L' };
        path.push_str(&format!("{} {:.1} {:.1}", cmd, x, y));

        projected.push(ProjectedPoint {
            x,
            y,
            chainage_km: cumulative_km,
        });
    }
    RouteSegment {
        points: line.to_vec(),
        projected,
        length_km: cumulative_km - start_chainage_km,
        start_chainage_km,
        end_chainage_km: cumulative_km,
    }
}

/// North up, so latitude flips.
fn schematic_xy(pt: GeoPoint, bounds: &GeoBounds) -> (f64, f64) {
    let w = SCHEMATIC_WIDTH - 2.0 * SCHEMATIC_PADDING;
    let h = SCHEMATIC_HEIGHT - 2.0 * SCHEMATIC_PADDING;
    let x = SCHEMATIC_PADDING + (pt.lon - bounds.min_lon) / bounds.lon_span() * w;
    let y = SCHEMATIC_PADDING + (bounds.max_lat - pt.lat) / bounds.lat_span() * h;
    (x, y)
}
