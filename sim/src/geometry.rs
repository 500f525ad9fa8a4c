//! Geometry primitives shared by the spatial core.
//!
//! World positions are in pixels; tiles are `TILE_SIZE` pixels square and
//! addressed by signed coordinates so out-of-range requests stay representable.

use serde::{Deserialize, Serialize};

/// Edge length of one map tile in pixels.
pub const TILE_SIZE: f32 = 32.0;

/// Axis-aligned bounding box.
///
/// Containment is half-open: the min edges are inside, the max edges
/// (`right`, `bottom`) are not.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub half_width: f32,
    pub half_height: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub right: f32,
    pub bottom: f32,
}

/// One of the four children of a subdivided box. North is the smaller `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Quadrant {
    /// Test order used when assigning a point to a child.
    pub const ORDER: [Quadrant; 4] = [
        Quadrant::NorthEast,
        Quadrant::NorthWest,
        Quadrant::SouthEast,
        Quadrant::SouthWest,
    ];
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let half_width = width / 2.0;
        let half_height = height / 2.0;
        Self {
            x,
            y,
            width,
            height,
            half_width,
            half_height,
            center_x: x + half_width,
            center_y: y + half_height,
            right: x + width,
            bottom: y + height,
        }
    }

    /// Half-open point containment.
    #[inline]
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.right && py >= self.y && py < self.bottom
    }

    /// Whether a circle overlaps this box. Takes the squared radius.
    #[inline]
    pub fn intersects_circle(&self, cx: f32, cy: f32, radius_sq: f32) -> bool {
        let nearest_x = cx.clamp(self.x, self.right);
        let nearest_y = cy.clamp(self.y, self.bottom);
        let dx = cx - nearest_x;
        let dy = cy - nearest_y;
        dx * dx + dy * dy <= radius_sq
    }

    /// Child box covering one quarter of this box.
    pub fn quadrant(&self, quadrant: Quadrant) -> Aabb {
        let (hw, hh) = (self.half_width, self.half_height);
        match quadrant {
            Quadrant::NorthEast => Aabb::new(self.center_x, self.y, hw, hh),
            Quadrant::NorthWest => Aabb::new(self.x, self.y, hw, hh),
            Quadrant::SouthEast => Aabb::new(self.center_x, self.center_y, hw, hh),
            Quadrant::SouthWest => Aabb::new(self.x, self.center_y, hw, hh),
        }
    }

    /// Quadrant a contained point falls into.
    ///
    /// Equivalent to testing NE, NW, SE, SW children in order with half-open
    /// containment: points on a split line go east and/or south.
    #[inline]
    pub fn quadrant_of(&self, px: f32, py: f32) -> Quadrant {
        let east = px >= self.center_x;
        let south = py >= self.center_y;
        match (east, south) {
            (true, false) => Quadrant::NorthEast,
            (false, false) => Quadrant::NorthWest,
            (true, true) => Quadrant::SouthEast,
            (false, true) => Quadrant::SouthWest,
        }
    }
}

/// Integer tile coordinate on the map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing a world-space point.
    #[inline]
    pub fn from_pixel(px: f32, py: f32) -> Self {
        Self {
            x: (px / TILE_SIZE).floor() as i32,
            y: (py / TILE_SIZE).floor() as i32,
        }
    }

    /// Tile occupied by a tile-sized sprite whose top-left corner is at `(px, py)`.
    #[inline]
    pub fn from_pixel_center(px: f32, py: f32) -> Self {
        Self::from_pixel(px + TILE_SIZE / 2.0, py + TILE_SIZE / 2.0)
    }

    /// Top-left pixel of this tile.
    #[inline]
    pub fn to_pixel(self) -> (f32, f32) {
        (self.x as f32 * TILE_SIZE, self.y as f32 * TILE_SIZE)
    }

    /// Number of king moves between two tiles.
    #[inline]
    pub fn chebyshev(self, other: TileCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Octile distance: diagonal steps cost `sqrt(2)`, straight steps cost 1.
    #[inline]
    pub fn octile(self, other: TileCoord) -> f32 {
        let dx = (self.x - other.x).unsigned_abs() as f32;
        let dy = (self.y - other.y).unsigned_abs() as f32;
        let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
        std::f32::consts::SQRT_2 * lo + (hi - lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_point_half_open() {
        let b = Aabb::new(10.0, 20.0, 30.0, 40.0);
        assert!(b.contains_point(10.0, 20.0));
        assert!(b.contains_point(39.999, 59.999));
        assert!(!b.contains_point(40.0, 30.0));
        assert!(!b.contains_point(20.0, 60.0));
        assert!(!b.contains_point(9.999, 30.0));
    }

    #[test]
    fn test_contains_point_matches_interval_definition() {
        let b = Aabb::new(-8.0, 4.0, 16.0, 12.0);
        for ix in -20..=20 {
            for iy in -10..=30 {
                let (px, py) = (ix as f32, iy as f32);
                let expected = px >= b.x && px < b.x + b.width && py >= b.y && py < b.y + b.height;
                assert_eq!(b.contains_point(px, py), expected, "point ({px}, {py})");
            }
        }
    }

    #[test]
    fn test_intersects_circle_outside_edges_and_corners() {
        let b = Aabb::new(0.0, 0.0, 10.0, 10.0);
        // Centered inside.
        assert!(b.intersects_circle(5.0, 5.0, 1.0));
        // Left of the box, overlapping the edge.
        assert!(b.intersects_circle(-2.0, 5.0, 4.0));
        assert!(!b.intersects_circle(-2.1, 5.0, 4.0));
        // Near the bottom-right corner: distance sqrt(2).
        assert!(b.intersects_circle(11.0, 11.0, 2.0));
        assert!(!b.intersects_circle(11.0, 11.0, 1.9));
    }

    #[test]
    fn test_intersects_circle_agrees_with_clamped_distance() {
        let b = Aabb::new(3.0, -2.0, 7.0, 5.0);
        for ix in -5..=15 {
            for iy in -8..=8 {
                let (cx, cy) = (ix as f32, iy as f32);
                let nx = cx.max(3.0).min(10.0);
                let ny = cy.max(-2.0).min(3.0);
                let d2 = (cx - nx).powi(2) + (cy - ny).powi(2);
                assert_eq!(b.intersects_circle(cx, cy, 9.0), d2 <= 9.0);
            }
        }
    }

    #[test]
    fn test_quadrants_tile_the_parent() {
        let b = Aabb::new(0.0, 0.0, 64.0, 32.0);
        let ne = b.quadrant(Quadrant::NorthEast);
        assert_eq!((ne.x, ne.y, ne.width, ne.height), (32.0, 0.0, 32.0, 16.0));
        let sw = b.quadrant(Quadrant::SouthWest);
        assert_eq!((sw.x, sw.y), (0.0, 16.0));

        // Split-line points land in exactly one child, the first in NE, NW, SE, SW order.
        for &(px, py) in &[(32.0, 16.0), (32.0, 5.0), (5.0, 16.0), (0.0, 0.0)] {
            let owners: Vec<_> = Quadrant::ORDER
                .iter()
                .filter(|q| b.quadrant(**q).contains_point(px, py))
                .collect();
            assert_eq!(owners.len(), 1);
            assert_eq!(*owners[0], b.quadrant_of(px, py));
        }
    }

    #[test]
    fn test_tile_conversions() {
        assert_eq!(TileCoord::from_pixel(0.0, 31.9), TileCoord::new(0, 0));
        assert_eq!(TileCoord::from_pixel(-1.0, 32.0), TileCoord::new(-1, 1));
        assert_eq!(TileCoord::from_pixel_center(64.0, 96.0), TileCoord::new(2, 3));
        assert_eq!(TileCoord::new(2, 3).to_pixel(), (64.0, 96.0));
    }

    #[test]
    fn test_distances() {
        let a = TileCoord::new(2, 2);
        let b = TileCoord::new(5, 6);
        assert_eq!(a.chebyshev(b), 4);
        let expected = 3.0 * std::f32::consts::SQRT_2 + 1.0;
        assert!((a.octile(b) - expected).abs() < 1e-5);
    }
}
