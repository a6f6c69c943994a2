use serde::{Deserialize, Serialize};

/// Guards the corner cosine against zero-length edges.
const COSINE_EPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Four ordered vertices of a detected square-like region.
///
/// Equality is structural and order-sensitive: the same corners listed from a
/// different starting vertex compare unequal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub points: [Point; 4],
}

impl Quad {
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    pub fn from_coords(coords: [(i32, i32); 4]) -> Self {
        Self {
            points: coords.map(|(x, y)| Point::new(x, y)),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    pub fn area(&self) -> f64 {
        contour_area(&self.points).abs()
    }
}

/// Axis-aligned extent of a quad. `max_x`/`max_y` are exclusive when used
/// as a crop range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl BoundingBox {
    pub fn from_points(points: &[Point; 4]) -> Self {
        let mut bbox = Self {
            min_x: points[0].x,
            max_x: points[0].x,
            min_y: points[0].y,
            max_y: points[0].y,
        };
        for p in &points[1..] {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        bbox
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    /// Clamp to a `width x height` image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let w = width as i32;
        let h = height as i32;
        Self {
            min_x: self.min_x.clamp(0, w),
            max_x: self.max_x.clamp(0, w),
            min_y: self.min_y.clamp(0, h),
            max_y: self.max_y.clamp(0, h),
        }
    }
}

/// Perimeter of a closed polyline.
pub fn arc_length(points: &[Point]) -> f64 {
    let len = points.len();
    if len < 2 {
        return 0.0;
    }

    let mut perimeter = 0.0;
    let mut prev = points[len - 1];
    for &p in points {
        let dx = (p.x - prev.x) as f64;
        let dy = (p.y - prev.y) as f64;
        perimeter += (dx * dx + dy * dy).sqrt();
        prev = p;
    }
    perimeter
}

/// Signed area (shoelace). The sign follows the vertex orientation.
pub fn contour_area(points: &[Point]) -> f64 {
    let len = points.len();
    if len < 3 {
        return 0.0;
    }

    let mut area = 0i64;
    let mut prev = points[len - 1];
    for &p in points {
        area += prev.x as i64 * p.y as i64 - p.x as i64 * prev.y as i64;
        prev = p;
    }
    area as f64 * 0.5
}

#[derive(Clone, Copy)]
struct Slice {
    start: usize,
    end: usize,
}

/// Douglas-Peucker simplification of a closed contour.
///
/// Mirrors OpenCV's `approxPolyDP` for closed curves: the recursion is seeded
/// with a pair of mutually distant points found by three farthest-point
/// sweeps, so the output starts at a stable vertex for similar contours, and
/// a final pass drops vertices lying almost on the chord of their neighbours.
pub fn approx_poly_dp(contour: &[Point], epsilon: f64) -> Vec<Point> {
    let len = contour.len();
    if len == 0 {
        return Vec::new();
    }

    let eps_sq = epsilon * epsilon;
    let mut poly = Vec::new();
    let mut stack: Vec<Slice> = Vec::new();

    let mut k = 0usize;
    let mut far = 0usize;
    let mut start_pt = contour[0];
    let mut max_dist = 0.0;

    for _ in 0..3 {
        max_dist = 0.0;
        k = (k + far) % len;
        start_pt = contour[k];
        k = (k + 1) % len;
        for j in 1..len {
            let pt = contour[k];
            k = (k + 1) % len;
            let dx = (pt.x - start_pt.x) as f64;
            let dy = (pt.y - start_pt.y) as f64;
            let dist = dx * dx + dy * dy;
            if dist > max_dist {
                max_dist = dist;
                far = j;
            }
        }
    }

    if max_dist <= eps_sq {
        poly.push(start_pt);
        return poly;
    }

    // `k` is back at the index of `start_pt` after the full sweep.
    let first = Slice {
        start: k,
        end: k + far,
    };
    let second_start = (k + far) % len;
    let mut second_end = k;
    if second_end < second_start {
        second_end += len;
    }
    stack.push(Slice {
        start: second_start,
        end: second_end,
    });
    stack.push(first);

    while let Some(slice) = stack.pop() {
        let start_pt = contour[slice.start % len];
        let end_pt = contour[slice.end % len];

        let mut split = None;
        if slice.end > slice.start + 1 {
            let dx = (end_pt.x - start_pt.x) as f64;
            let dy = (end_pt.y - start_pt.y) as f64;
            let mut max_dist = 0.0;
            let mut max_idx = slice.start;
            for i in slice.start + 1..slice.end {
                let pt = contour[i % len];
                let dist = ((pt.y - start_pt.y) as f64 * dx - (pt.x - start_pt.x) as f64 * dy).abs();
                if dist > max_dist {
                    max_dist = dist;
                    max_idx = i;
                }
            }
            if max_dist * max_dist > eps_sq * (dx * dx + dy * dy) {
                split = Some(max_idx);
            }
        }

        match split {
            None => poly.push(start_pt),
            Some(mid) => {
                stack.push(Slice {
                    start: mid,
                    end: slice.end,
                });
                stack.push(Slice {
                    start: slice.start,
                    end: mid,
                });
            }
        }
    }

    remove_flat_vertices(&mut poly, eps_sq);
    poly
}

/// Drop vertices within `epsilon / sqrt(2)` of the chord joining their
/// neighbours, in place. Axis-aligned chords are left alone. Reads and writes
/// share the buffer, so the closing chord ends at the first kept vertex.
fn remove_flat_vertices(poly: &mut Vec<Point>, eps_sq: f64) {
    let count = poly.len();
    if count < 3 {
        return;
    }

    let mut kept = count;
    let mut read = 0usize;
    let mut write = 0usize;
    let mut start_pt = poly[count - 1];
    let mut pt = poly[read];
    read += 1;

    let mut i = 0;
    while i < count && kept > 2 {
        let end_pt = poly[read % count];
        read += 1;

        let dx = (end_pt.x - start_pt.x) as f64;
        let dy = (end_pt.y - start_pt.y) as f64;
        let px = (pt.x - start_pt.x) as f64;
        let py = (pt.y - start_pt.y) as f64;
        let dist = (px * dy - py * dx).abs();
        let forward = px * (end_pt.x - pt.x) as f64 + py * (end_pt.y - pt.y) as f64;

        if dist * dist <= 0.5 * eps_sq * (dx * dx + dy * dy) && dx != 0.0 && dy != 0.0 && forward >= 0.0 {
            kept -= 1;
            poly[write % count] = end_pt;
            write += 1;
            start_pt = end_pt;
            pt = poly[read % count];
            read += 1;
            i += 2;
            continue;
        }

        poly[write % count] = pt;
        write += 1;
        start_pt = pt;
        pt = end_pt;
        i += 1;
    }

    poly.truncate(kept);
}

/// Convexity test over a closed polygon. Collinear consecutive edges count
/// as a turn in both directions, so degenerate polygons are not convex.
pub fn is_contour_convex(contour: &[Point]) -> bool {
    let len = contour.len();
    if len < 3 {
        return false;
    }

    let mut orientation = 0u8;
    let mut prev = contour[len - 1];
    let mut cur = contour[0];
    let mut dx0 = (cur.x - prev.x) as i64;
    let mut dy0 = (cur.y - prev.y) as i64;

    for i in 0..len {
        prev = cur;
        cur = contour[(i + 1) % len];

        let dx = (cur.x - prev.x) as i64;
        let dy = (cur.y - prev.y) as i64;

        let dxdy0 = dx * dy0;
        let dydx0 = dy * dx0;
        orientation |= if dydx0 > dxdy0 {
            1
        } else if dydx0 < dxdy0 {
            2
        } else {
            3
        };
        if orientation == 3 {
            return false;
        }

        dx0 = dx;
        dy0 = dy;
    }

    true
}

/// Cosine of the angle at `vertex` between the edges towards `a` and `b`.
pub fn corner_cosine(a: Point, b: Point, vertex: Point) -> f64 {
    let dx1 = (a.x - vertex.x) as f64;
    let dy1 = (a.y - vertex.y) as f64;
    let dx2 = (b.x - vertex.x) as f64;
    let dy2 = (b.y - vertex.y) as f64;
    let norm = (dx1 * dx1 + dy1 * dy1).sqrt() * (dx2 * dx2 + dy2 * dy2).sqrt();
    (dx1 * dx2 + dy1 * dy2) / (norm + COSINE_EPS)
}

/// Largest |cos| over the four corners of a quad.
pub fn max_corner_cosine(points: &[Point; 4]) -> f64 {
    (0..4)
        .map(|i| {
            let prev = points[(i + 3) % 4];
            let next = points[(i + 1) % 4];
            corner_cosine(prev, next, points[i]).abs()
        })
        .fold(0.0, f64::max)
}
