use std::f64::consts::PI;

use crate::geometry::{haversine_km, parse_chainage, GeoPoint};
use crate::layer::{RouteLayer, RouteSegment};

/// Canvas for the no-data fallback curve.
pub const FALLBACK_WIDTH: f64 = 1000.0;
pub const FALLBACK_HEIGHT: f64 = 500.0;

/// Where the fallback geo line runs before anything is imported.
const FALLBACK_START: GeoPoint = GeoPoint {
    lat: -1.2833,
    lon: 36.8167,
};
const FALLBACK_END: GeoPoint = GeoPoint {
    lat: -1.45,
    lon: 37.05,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchematicPosition {
    pub x: f64,
    pub y: f64,
    pub chainage_km: f64,
}

/// Maps a chainage string to a point on the schematic canvas. The lateral offset (in
/// percent of the route, used for simulated GPS drift) is added before clamping to
/// `[0, total_km]`. Without a reference layer this degrades to a parametric S-curve;
/// it never fails.
pub fn project_to_schematic(
    reference: Option<&RouteLayer>,
    chainage: &str,
    total_km: f64,
    lateral_offset_pct: f64,
) -> SchematicPosition {
    let km = parse_chainage(chainage) + lateral_offset_pct / 100.0 * total_km;
    let km = km.clamp(0.0, total_km.max(0.0));

    if let Some(layer) = reference {
        if let Some((seg, i0, i1, ratio)) = locate(layer, km) {
            let a = seg.projected[i0];
            let b = seg.projected[i1];
            return SchematicPosition {
                x: a.x + (b.x - a.x) * ratio,
                y: a.y + (b.y - a.y) * ratio,
                chainage_km: km,
            };
        }
    }
    fallback_schematic(km, total_km)
}

/// Same segment walk as `project_to_schematic`, but interpolating the original lat/lng
/// vertices instead of the normalized ones.
pub fn project_to_geo(reference: Option<&RouteLayer>, chainage: &str, total_km: f64) -> GeoPoint {
    let km = parse_chainage(chainage).clamp(0.0, total_km.max(0.0));

    if let Some(layer) = reference {
        if let Some((seg, i0, i1, ratio)) = locate(layer, km) {
            let a = seg.points[i0];
            let b = seg.points[i1];
            return GeoPoint::new(
                a.lat + (b.lat - a.lat) * ratio,
                a.lon + (b.lon - a.lon) * ratio,
            );
        }
    }
    fallback_geo(km, total_km)
}

/// Inverse projection: snap an arbitrary point to the layer and return the chainage of
/// the closest spot on it.
pub fn chainage_of_point(layer: &RouteLayer, pt: GeoPoint) -> f64 {
    let mut best_km = 0.0;
    let mut best_dist = f64::INFINITY;
    for seg in &layer.segments {
        if seg.points.len() == 1 {
            let d = haversine_km(pt, seg.points[0]);
            if d < best_dist {
                best_dist = d;
                best_km = seg.start_chainage_km;
            }
            continue;
        }
        for (i, pair) in seg.points.windows(2).enumerate() {
            // Planar projection in degree space, with longitude scaled to match latitude
            let scale = pair[0].lat.to_radians().cos();
            let (ax, ay) = (pair[0].lon * scale, pair[0].lat);
            let (bx, by) = (pair[1].lon * scale, pair[1].lat);
            let (px, py) = (pt.lon * scale, pt.lat);
            let len2 = (bx - ax).powi(2) + (by - ay).powi(2);
            let t = if len2 == 0.0 {
                0.0
            } else {
                (((px - ax) * (bx - ax) + (py - ay) * (by - ay)) / len2).clamp(0.0, 1.0)
            };
            let candidate = GeoPoint::new(
                pair[0].lat + (pair[1].lat - pair[0].lat) * t,
                pair[0].lon + (pair[1].lon - pair[0].lon) * t,
            );
            let d = haversine_km(pt, candidate);
            if d < best_dist {
                best_dist = d;
                let c0 = seg.projected[i].chainage_km;
                let c1 = seg.projected[i + 1].chainage_km;
                best_km = c0 + (c1 - c0) * t;
            }
        }
    }
    best_km
}

/// Finds the segment whose chainage range contains `km` (the last one if float drift
/// pushed `km` past everything), then the bracketing vertex pair inside it. Returns
/// vertex indices plus the interpolation ratio; zero-length spans get ratio 0.
fn locate(layer: &RouteLayer, km: f64) -> Option<(&RouteSegment, usize, usize, f64)> {
    let seg = layer
        .segments
        .iter()
        .find(|s| km >= s.start_chainage_km && km <= s.end_chainage_km)
        .or_else(|| layer.segments.last())?;

    if seg.projected.len() < 2 {
        return Some((seg, 0, 0, 0.0));
    }
    for (i, pair) in seg.projected.windows(2).enumerate() {
        if km >= pair[0].chainage_km && km <= pair[1].chainage_km {
            return Some((seg, i, i + 1, ratio(pair[0].chainage_km, pair[1].chainage_km, km)));
        }
    }
    // Past the last vertex; pin to the end
    let i = seg.projected.len() - 2;
    Some((seg, i, i + 1, 1.0))
}

fn ratio(c0: f64, c1: f64, km: f64) -> f64 {
    let span = c1 - c0;
    if span <= 0.0 {
        0.0
    } else {
        (km - c0) / span
    }
}

/// Parametric stand-in for a road shape: steady horizontal progress with a dip over the
/// first 40% and a rise over the rest.
fn fallback_schematic(km: f64, total_km: f64) -> SchematicPosition {
    let t = if total_km > 0.0 {
        km / total_km * 100.0
    } else {
        0.0
    };
    let x = t * 9.0 + 50.0;
    let mid = FALLBACK_HEIGHT / 2.0;
    let y = if t < 40.0 {
        mid + (t / 40.0 * PI).sin() * 120.0
    } else {
        mid - ((t - 40.0) / 60.0 * PI).sin() * 120.0
    };
    SchematicPosition {
        x,
        y,
        chainage_km: km,
    }
}

fn fallback_geo(km: f64, total_km: f64) -> GeoPoint {
    let t = if total_km > 0.0 { km / total_km } else { 0.0 };
    let lat = FALLBACK_START.lat + (FALLBACK_END.lat - FALLBACK_START.lat) * t;
    // Slight wobble so the placeholder route doesn't draw as a ruler line
    let lon = FALLBACK_START.lon
        + (FALLBACK_END.lon - FALLBACK_START.lon) * t
        + (t * 2.0 * PI).sin() * 0.01;
    GeoPoint::new(lat, lon)
}
