// Pure Rust contour extraction
// Suzuki-Abe border following in list mode with simple chain compression,
// the pure Rust counterpart of findContours(RETR_LIST, CHAIN_APPROX_SIMPLE)

#![cfg_attr(feature = "use-opencv", allow(dead_code))]

use image::GrayImage;

use crate::geometry::Point;

/// 8-neighbourhood offsets (x, y), counter-clockwise on screen starting east.
const NEIGHBORHOOD: [(i32, i32); 8] = [
    (1, 0),   // 0: East
    (1, -1),  // 1: NE
    (0, -1),  // 2: North
    (-1, -1), // 3: NW
    (-1, 0),  // 4: West
    (-1, 1),  // 5: SW
    (0, 1),   // 6: South
    (1, 1),   // 7: SE
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Find all contours of a binary image, outer borders and hole borders alike.
/// Any non-zero pixel is foreground; the image is treated as framed by
/// background.
pub fn find_contours(binary_img: &GrayImage) -> Vec<Contour> {
    let (width, height) = binary_img.dimensions();
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return Vec::new();
    }

    // One pixel of zero padding on every side keeps neighbour lookups in range.
    let stride = w + 2;
    let mut labels = vec![0i32; stride * (h + 2)];
    for (x, y, pixel) in binary_img.enumerate_pixels() {
        if pixel[0] != 0 {
            labels[(y as usize + 1) * stride + x as usize + 1] = 1;
        }
    }

    let deltas = neighborhood_deltas(stride as isize);
    let mut contours = Vec::new();
    let mut nbd = 1;

    for y in 0..h {
        let mut pos = (y + 1) * stride + 1;
        for x in 0..w {
            let pix = labels[pos];
            if pix != 0 {
                let outer = pix == 1 && labels[pos - 1] == 0;
                let hole = !outer && pix >= 1 && labels[pos + 1] == 0;

                if outer || hole {
                    nbd += 1;
                    let start = Point::new(x as i32, y as i32);
                    let border = follow_border(&mut labels, pos, nbd, start, hole, &deltas);
                    contours.push(Contour::new(compress_chain(&border)));
                }
            }
            pos += 1;
        }
    }

    contours
}

/// Flat-buffer offsets for the 8 directions, repeated so that a
/// counter-clockwise sweep can run past direction 7 without wrapping.
fn neighborhood_deltas(stride: isize) -> [isize; 16] {
    let mut deltas = [0isize; 16];
    for (i, &(dx, dy)) in NEIGHBORHOOD.iter().enumerate() {
        let delta = dx as isize + dy as isize * stride;
        deltas[i] = delta;
        deltas[i + 8] = delta;
    }
    deltas
}

#[inline]
fn offset(pos: usize, delta: isize) -> usize {
    (pos as isize + delta) as usize
}

/// Trace one border starting at `pos`, marking visited border pixels with
/// `nbd` (or `-nbd` where the pixel's east neighbour is background).
fn follow_border(
    labels: &mut [i32],
    pos: usize,
    nbd: i32,
    mut point: Point,
    hole: bool,
    deltas: &[isize; 16],
) -> Vec<Point> {
    let mut border = Vec::new();

    // Clockwise search for the first foreground neighbour, starting next to
    // the background pixel that triggered the border.
    let mut s: usize = if hole { 0 } else { 4 };
    let mut pos1 = None;
    for _ in 0..8 {
        s = (s + 7) & 7;
        let candidate = offset(pos, deltas[s]);
        if labels[candidate] != 0 {
            pos1 = Some(candidate);
            break;
        }
    }

    let Some(pos1) = pos1 else {
        // Isolated pixel
        labels[pos] = -nbd;
        border.push(point);
        return border;
    };

    let mut pos3 = pos;
    loop {
        let s_end = s;

        // Counter-clockwise search around pos3, starting after the previous
        // direction. pos3 always has at least one foreground neighbour.
        let pos4 = loop {
            s = (s + 1) & 15;
            let candidate = offset(pos3, deltas[s]);
            if labels[candidate] != 0 {
                break candidate;
            }
        };
        s &= 7;

        // The sweep wrapped through east: the east neighbour is background.
        if (s.wrapping_sub(1) as u32) < (s_end as u32) {
            labels[pos3] = -nbd;
        } else if labels[pos3] == 1 {
            labels[pos3] = nbd;
        }

        border.push(point);
        point.x += NEIGHBORHOOD[s].0;
        point.y += NEIGHBORHOOD[s].1;

        if pos4 == pos && pos3 == pos1 {
            break;
        }

        pos3 = pos4;
        s = (s + 4) & 7;
    }

    border
}

/// Drop points in the middle of straight horizontal, vertical or diagonal
/// runs, keeping only the points where the chain changes direction.
fn compress_chain(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let step = |a: Point, b: Point| (b.x - a.x, b.y - a.y);

    let mut compressed: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if compressed.is_empty() {
        compressed.push(points[0]);
    }
    compressed
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn filled(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for &(x0, y0, x1, y1) in rects {
            for y in y0..y1 {
                for x in x0..x1 {
                    img.put_pixel(x, y, Luma([255]));
                }
            }
        }
        img
    }

    #[test]
    fn test_find_contours_simple() {
        let img = filled(40, 30, &[(10, 10, 30, 20)]);

        let contours = find_contours(&img);
        assert_eq!(contours.len(), 1);

        let mut corners = contours[0].points.clone();
        corners.sort_by_key(|p| (p.y, p.x));
        assert_eq!(
            corners,
            vec![
                Point::new(10, 10),
                Point::new(29, 10),
                Point::new(10, 19),
                Point::new(29, 19),
            ]
        );
    }

    #[test]
    fn test_ring_has_outer_and_hole_border() {
        let mut img = filled(12, 12, &[(2, 2, 10, 10)]);
        for y in 4..8 {
            for x in 4..8 {
                img.put_pixel(x, y, Luma([0]));
            }
        }

        let contours = find_contours(&img);
        assert_eq!(contours.len(), 2);

        // Outer border first (top-left pixel at (2, 2)), then the hole border
        // which runs through the ring pixels next to the hole.
        assert!(contours[0].points.contains(&Point::new(2, 2)));
        assert!(contours[1].points.iter().all(|p| (3..=8).contains(&p.x) && (3..=8).contains(&p.y)));
    }

    #[test]
    fn test_separate_blobs_are_listed_flat() {
        let img = filled(50, 20, &[(2, 2, 10, 10), (20, 5, 30, 15), (40, 1, 45, 3)]);
        let contours = find_contours(&img);
        assert_eq!(contours.len(), 3);
        assert!(contours.iter().all(|c| c.len() == 4));
    }

    #[test]
    fn test_isolated_pixel() {
        let img = filled(5, 5, &[(2, 2, 3, 3)]);
        let contours = find_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![Point::new(2, 2)]);
    }

    #[test]
    fn test_blob_touching_image_border() {
        let img = filled(8, 8, &[(0, 0, 8, 8)]);
        let contours = find_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
    }

    #[test]
    fn test_empty_image_has_no_contours() {
        assert!(find_contours(&GrayImage::new(16, 16)).is_empty());
        assert!(find_contours(&GrayImage::new(0, 0)).is_empty());
    }
}
