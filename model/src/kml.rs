use anyhow::Result;

use crate::GeoPoint;

/// One named group of polylines from a route file.
pub struct Placemark {
    pub name: String,
    pub lines: Vec<Vec<GeoPoint>>,
}

/// Extracts all line geometry from a KML document, grouped by Placemark name.
///
/// Matches on local tag names, since exports disagree about namespaces. A file with
/// bare LineStrings and no Placemarks at all gets a single synthetic group.
pub fn parse(raw: &str) -> Result<Vec<Placemark>> {
    let doc = roxmltree::Document::parse(raw)?;
    let root = doc.root_element();

    let mut placemarks = Vec::new();
    for node in root
        .descendants()
        .filter(|n| n.tag_name().name() == "Placemark")
    {
        let name = node
            .children()
            .find(|c| c.tag_name().name() == "name")
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Layer {}", placemarks.len() + 1));
        let lines = extract_lines(node);
        if !lines.is_empty() {
            placemarks.push(Placemark { name, lines });
        }
    }

    if placemarks.is_empty() {
        let lines = extract_lines(root);
        if !lines.is_empty() {
            placemarks.push(Placemark {
                name: "Route".to_string(),
                lines,
            });
        }
    }

    if placemarks.is_empty() {
        bail!("no route geometry found in file");
    }
    Ok(placemarks)
}

/// All LineStrings under this node, including inside a MultiGeometry.
fn extract_lines(node: roxmltree::Node) -> Vec<Vec<GeoPoint>> {
    let mut lines = Vec::new();
    for ls in node
        .descendants()
        .filter(|n| n.tag_name().name() == "LineString")
    {
        if let Some(raw) = ls
            .descendants()
            .find(|n| n.tag_name().name() == "coordinates")
            .and_then(|n| n.text())
        {
            let pts = parse_coordinates(raw);
            if !pts.is_empty() {
                lines.push(pts);
            }
        }
    }
    lines
}

/// Whitespace-separated "lon,lat[,alt]" tuples. Malformed tuples are skipped, not fatal.
fn parse_coordinates(raw: &str) -> Vec<GeoPoint> {
    let mut pts = Vec::new();
    for token in raw.split_whitespace() {
        let mut parts = token.split(',');
        let lon = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
        let lat = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
        if let (Some(lon), Some(lat)) = (lon, lat) {
            pts.push(GeoPoint::new(lat, lon));
        }
    }
    pts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespaced_placemarks() {
        let raw = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Centerline</name>
      <LineString>
        <coordinates>36.0,0.0,1200 36.01,0.01,1210 36.02,0.02</coordinates>
      </LineString>
    </Placemark>
    <Placemark>
      <name>Edge</name>
      <MultiGeometry>
        <LineString><coordinates>36.0,0.001 36.01,0.011</coordinates></LineString>
        <LineString><coordinates>36.01,0.011 36.02,0.021</coordinates></LineString>
      </MultiGeometry>
    </Placemark>
  </Document>
</kml>"#;
        let placemarks = parse(raw).unwrap();
        assert_eq!(placemarks.len(), 2);
        assert_eq!(placemarks[0].name, "Centerline");
        assert_eq!(placemarks[0].lines.len(), 1);
        assert_eq!(placemarks[0].lines[0].len(), 3);
        // lon,lat order in the file; lat,lon in memory
        assert_eq!(placemarks[0].lines[0][0], GeoPoint::new(0.0, 36.0));
        assert_eq!(placemarks[1].lines.len(), 2);
    }

    #[test]
    fn bare_linestrings_get_a_synthetic_group() {
        let raw = r#"<kml><LineString><coordinates>10.0,1.0 10.1,1.1</coordinates></LineString></kml>"#;
        let placemarks = parse(raw).unwrap();
        assert_eq!(placemarks.len(), 1);
        assert_eq!(placemarks[0].name, "Route");
    }

    #[test]
    fn unnamed_placemark_gets_a_fallback_name() {
        let raw = r#"<kml><Placemark><LineString><coordinates>10.0,1.0 10.1,1.1</coordinates></LineString></Placemark></kml>"#;
        let placemarks = parse(raw).unwrap();
        assert_eq!(placemarks[0].name, "Layer 1");
    }

    #[test]
    fn garbage_tokens_are_skipped() {
        let raw = r#"<kml><Placemark><name>X</name><LineString><coordinates>
            10.0,1.0  ,,  nope 10.1,abc 10.2,1.2
        </coordinates></LineString></Placemark></kml>"#;
        let placemarks = parse(raw).unwrap();
        assert_eq!(placemarks[0].lines[0].len(), 2);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse("<kml><Placemark>").is_err());
    }

    #[test]
    fn zero_points_is_an_error() {
        let raw = r#"<kml><Placemark><name>Empty</name><LineString><coordinates>  </coordinates></LineString></Placemark></kml>"#;
        assert!(parse(raw).is_err());
        assert!(parse("<kml><Document/></kml>").is_err());
    }
}
