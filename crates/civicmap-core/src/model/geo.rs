// ── Geometry types ──
//
// Plain WGS84 lat/lng values, consumed as-is. No projection or
// coordinate-system conversion happens anywhere in this crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of distinct vertices for a closed ring.
pub const MIN_RING_VERTICES: usize = 3;

// ── LatLng ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

// ── GeometryError ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("ring needs at least {MIN_RING_VERTICES} distinct vertices, found {found}")]
    TooFewVertices { found: usize },

    #[error("vertex {index} is not a finite coordinate")]
    NonFinite { index: usize },
}

// ── Ring ────────────────────────────────────────────────────────────

/// A validated closed polygon ring.
///
/// Invariant: at least three distinct vertices, all finite, no two
/// consecutive vertices equal, and the closing vertex is implicit (never
/// repeated).
#[derive(Debug, Clone, PartialEq)]
pub struct Ring(Vec<LatLng>);

impl Ring {
    pub fn vertices(&self) -> &[LatLng] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<&[LatLng]> for Ring {
    type Error = GeometryError;

    fn try_from(raw: &[LatLng]) -> Result<Self, Self::Error> {
        if let Some(index) = raw.iter().position(|p| !p.is_finite()) {
            return Err(GeometryError::NonFinite { index });
        }

        let mut vertices: Vec<LatLng> = Vec::with_capacity(raw.len());
        for point in raw {
            if vertices.last() != Some(point) {
                vertices.push(*point);
            }
        }
        // Explicitly closed rings repeat the first vertex at the end.
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        // A path that revisits earlier points can be long and still enclose nothing.
        let mut distinct: Vec<LatLng> = Vec::with_capacity(vertices.len());
        for point in &vertices {
            if !distinct.contains(point) {
                distinct.push(*point);
            }
        }
        if distinct.len() < MIN_RING_VERTICES {
            return Err(GeometryError::TooFewVertices {
                found: distinct.len(),
            });
        }
        Ok(Self(vertices))
    }
}

// ── Boundary ────────────────────────────────────────────────────────

/// A project's footprint as stored on the entity: raw, unvalidated vertices.
///
/// Use [`ring()`](Self::ring) to obtain a validated [`Ring`] before rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Boundary(Vec<LatLng>);

impl Boundary {
    pub fn new(vertices: Vec<LatLng>) -> Self {
        Self(vertices)
    }

    /// Axis-aligned box around `center`, `size` degrees tall and `1.6 * size` wide.
    pub fn rectangle(center: LatLng, size: f64) -> Self {
        let dlat = size * 0.5;
        let dlng = size * 0.8;
        Self(vec![
            LatLng::new(center.lat + dlat, center.lng - dlng),
            LatLng::new(center.lat + dlat, center.lng + dlng),
            LatLng::new(center.lat - dlat, center.lng + dlng),
            LatLng::new(center.lat - dlat, center.lng - dlng),
        ])
    }

    pub fn vertices(&self) -> &[LatLng] {
        &self.0
    }

    pub fn ring(&self) -> Result<Ring, GeometryError> {
        Ring::try_from(self.0.as_slice())
    }
}

impl From<Vec<LatLng>> for Boundary {
    fn from(vertices: Vec<LatLng>) -> Self {
        Self(vertices)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(lat: f64, lng: f64) -> LatLng {
        LatLng::new(lat, lng)
    }

    #[test]
    fn triangle_is_valid() {
        let ring = Boundary::new(vec![p(0.0, 0.0), p(0.0, 1.0), p(1.0, 0.0)])
            .ring()
            .unwrap();
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn two_vertices_are_degenerate() {
        let err = Boundary::new(vec![p(0.0, 0.0), p(0.0, 1.0)]).ring().unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices { found: 2 });
    }

    #[test]
    fn closing_vertex_does_not_count() {
        let err = Boundary::new(vec![p(0.0, 0.0), p(0.0, 1.0), p(0.0, 0.0)])
            .ring()
            .unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices { found: 2 });

        let ring = Boundary::new(vec![p(0.0, 0.0), p(0.0, 1.0), p(1.0, 1.0), p(0.0, 0.0)])
            .ring()
            .unwrap();
        assert_eq!(ring.vertices(), &[p(0.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)]);
    }

    #[test]
    fn consecutive_duplicates_collapse() {
        let err = Boundary::new(vec![p(1.0, 1.0), p(1.0, 1.0), p(2.0, 2.0), p(2.0, 2.0)])
            .ring()
            .unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices { found: 2 });
    }

    #[test]
    fn revisiting_points_is_still_degenerate() {
        let (a, b) = (p(52.5, 13.4), p(52.6, 13.5));

        let back_and_forth = Boundary::new(vec![a, b, a, b]).ring().unwrap_err();
        assert_eq!(back_and_forth, GeometryError::TooFewVertices { found: 2 });

        let with_repeat = Boundary::new(vec![a, b, b, a, b]).ring().unwrap_err();
        assert_eq!(with_repeat, GeometryError::TooFewVertices { found: 2 });
    }

    #[test]
    fn nan_is_rejected() {
        let err = Boundary::new(vec![p(0.0, 0.0), p(f64::NAN, 1.0), p(1.0, 0.0)])
            .ring()
            .unwrap_err();
        assert_eq!(err, GeometryError::NonFinite { index: 1 });
    }

    #[test]
    fn rectangle_has_four_corners() {
        let b = Boundary::rectangle(p(52.0, 13.0), 0.0002);
        let ring = b.ring().unwrap();
        assert_eq!(ring.len(), 4);
        let first = ring.vertices()[0];
        assert!((first.lat - 52.0001).abs() < 1e-9);
        assert!((first.lng - 12.99984).abs() < 1e-9);
    }

    #[test]
    fn boundary_serializes_as_plain_array() {
        let b = Boundary::new(vec![p(1.0, 2.0)]);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, r#"[{"lat":1.0,"lng":2.0}]"#);
    }
}
