use tracing::debug;

use crate::contours::Contour;
use crate::geometry::{approx_poly_dp, arc_length, is_contour_convex, max_corner_cosine, Point, Quad};
use crate::types::DetConfig;

/// Decides whether a traced contour is a square-like quadrilateral.
#[derive(Debug, Clone)]
pub struct QuadClassifier {
    pub approx_epsilon_ratio: f64,
    pub min_area: f64,
    pub max_cosine: f64,
}

impl Default for QuadClassifier {
    fn default() -> Self {
        Self::from_config(&DetConfig::default())
    }
}

impl QuadClassifier {
    pub fn new(approx_epsilon_ratio: f64, min_area: f64, max_cosine: f64) -> Self {
        Self {
            approx_epsilon_ratio,
            min_area,
            max_cosine,
        }
    }

    pub fn from_config(cfg: &DetConfig) -> Self {
        Self::new(cfg.approx_epsilon_ratio, cfg.min_area, cfg.max_cosine)
    }

    /// Approximate the contour and return it as a quad when it passes every
    /// test: 4 vertices, area above the floor, convex, near-right corners.
    pub fn classify(&self, contour: &Contour) -> Option<Quad> {
        let epsilon = arc_length(&contour.points) * self.approx_epsilon_ratio;
        let approx = approx_poly_dp(&contour.points, epsilon);
        self.classify_polygon(&approx)
    }

    /// The tests of [`classify`](Self::classify) on an already simplified
    /// polygon.
    pub fn classify_polygon(&self, approx: &[Point]) -> Option<Quad> {
        let quad = Quad::new(approx.try_into().ok()?);

        if quad.area() <= self.min_area || !is_contour_convex(&quad.points) {
            return None;
        }

        if self.accepts_cosine(max_corner_cosine(&quad.points)) {
            Some(quad)
        } else {
            None
        }
    }

    #[inline]
    pub fn accepts_cosine(&self, max_cosine: f64) -> bool {
        max_cosine < self.max_cosine
    }
}

/// True unless points 0 and 2 of both quads each lie within `threshold`
/// pixels of each other on both axes. Points 1 and 3 are not compared.
pub fn squares_different(a: &Quad, b: &Quad, threshold: i32) -> bool {
    let near = |p: Point, q: Point| (p.x - q.x).abs() <= threshold && (p.y - q.y).abs() <= threshold;
    !(near(a.points[0], b.points[0]) && near(a.points[2], b.points[2]))
}

/// Collapse near-duplicate quads to a fixed point.
///
/// Each pass takes the first quad as anchor, keeps every other quad that is
/// neither identical to the anchor nor near it, and appends the anchor at the
/// end. Passes repeat until the count stops changing. Only the anchor is
/// compared in a pass, so quads that are near each other but not near the
/// current anchor can both survive.
pub fn deduplicate_squares(squares: Vec<Quad>, threshold: i32) -> Vec<Quad> {
    if squares.is_empty() {
        return squares;
    }

    let mut current = squares;
    let mut passes = 0usize;
    loop {
        passes += 1;
        let anchor = current[0];

        let mut keep: Vec<Quad> = current
            .iter()
            .filter(|q| **q != anchor && squares_different(&anchor, q, threshold))
            .copied()
            .collect();
        keep.push(anchor);

        if keep.len() == current.len() {
            break;
        }
        current = keep;
    }

    debug!(passes, remaining = current.len(), "deduplicated squares");
    current
}
