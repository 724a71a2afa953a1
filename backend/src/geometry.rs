use serde_json::Value;

const EARTH_RADIUS_M: f64 = 6_371_008.8;
const SQM_PER_ACRE: f64 = 4046.86;

pub const DEFAULT_ACRES: f64 = 2.5;
const MIN_ACRES: f64 = 0.1;
const MAX_ACRES: f64 = 50.0;

/// Spherical excess area of a linear ring of [lng, lat] pairs, in m².
fn ring_area_sqm(ring: &[[f64; 2]]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..ring.len() {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % ring.len()];
        total += (p2[0] - p1[0]).to_radians()
            * (2.0 + p1[1].to_radians().sin() + p2[1].to_radians().sin());
    }
    (total * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}

fn outer_ring(coordinates: &Value) -> Option<Vec<[f64; 2]>> {
    let ring = coordinates.as_array()?.first()?.as_array()?;
    let mut points = Vec::with_capacity(ring.len());
    for point in ring {
        let pair = point.as_array()?;
        let lng = pair.first()?.as_f64()?;
        let lat = pair.get(1)?.as_f64()?;
        points.push([lng, lat]);
    }
    Some(points)
}

/// Acreage from a GeoJSON-style polygon coordinate array
/// (`[[[lng, lat], ...]]`), clamped to a plausible smallholding range.
/// Degenerate or malformed boundaries fall back to a default.
pub fn acres_from_boundary(coordinates: &Value) -> f64 {
    let ring = match outer_ring(coordinates) {
        Some(ring) if ring.len() >= 3 => ring,
        _ => return DEFAULT_ACRES,
    };

    let acres = ring_area_sqm(&ring) / SQM_PER_ACRE;
    if !acres.is_finite() || acres <= 0.0 {
        return DEFAULT_ACRES;
    }
    let clamped = acres.clamp(MIN_ACRES, MAX_ACRES);
    (clamped * 100.0).round() / 100.0
}

/// Centroid of the boundary's outer ring as (lat, lng).
pub fn boundary_centroid(coordinates: &Value) -> Option<(f64, f64)> {
    let ring = outer_ring(coordinates)?;
    if ring.is_empty() {
        return None;
    }
    let n = ring.len() as f64;
    let lng = ring.iter().map(|p| p[0]).sum::<f64>() / n;
    let lat = ring.iter().map(|p| p[1]).sum::<f64>() / n;
    Some((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // 0.01° x 0.01° square at the equator, about 1.24 km².
    fn square() -> Value {
        json!([[[0.0, 0.0], [0.01, 0.0], [0.01, 0.01], [0.0, 0.01], [0.0, 0.0]]])
    }

    #[test]
    fn ring_area_of_small_equatorial_square() {
        let ring = outer_ring(&square()).unwrap();
        let area = ring_area_sqm(&ring);
        let expected = 1.2365e6;
        assert!(
            (area - expected).abs() / expected < 0.01,
            "area was {area}"
        );
    }

    #[test]
    fn large_boundary_clamps_to_max_acres() {
        // ~305 acres unclamped
        assert_eq!(acres_from_boundary(&square()), 50.0);
    }

    #[test]
    fn degenerate_boundary_falls_back_to_default() {
        assert_eq!(acres_from_boundary(&json!([[[0.0, 0.0], [1.0, 1.0]]])), DEFAULT_ACRES);
        assert_eq!(acres_from_boundary(&json!("not a polygon")), DEFAULT_ACRES);
        assert_eq!(acres_from_boundary(&json!([])), DEFAULT_ACRES);
    }

    #[test]
    fn centroid_of_square() {
        let (lat, lng) = boundary_centroid(&square()).unwrap();
        assert!((lat - 0.004).abs() < 0.01);
        assert!((lng - 0.004).abs() < 0.01);
    }
}
