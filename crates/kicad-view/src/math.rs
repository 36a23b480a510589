//! 2D affine transforms for the painter stack and camera.

use std::f64::consts::PI;

use kicad_parse::types::{BBox, Vec2};

pub fn deg2rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Row-vector affine transform: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn translation(offset: Vec2) -> Self {
        Self {
            e: offset.x,
            f: offset.y,
            ..Self::identity()
        }
    }

    /// Rotation in KiCad degrees (counter-clockwise in a y-down plane).
    pub fn rotation_deg(angle_deg: f64) -> Self {
        let rad = -deg2rad(angle_deg);
        Self {
            a: rad.cos(),
            b: rad.sin(),
            c: -rad.sin(),
            d: rad.cos(),
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn scale(s: f64) -> Self {
        Self {
            a: s,
            d: s,
            ..Self::identity()
        }
    }

    /// Mirror across the x axis. Symbol body geometry is stored y-up
    /// relative to its anchor while the sheet plane is y-down.
    pub fn flip_y() -> Self {
        Self {
            d: -1.0,
            ..Self::identity()
        }
    }

    /// Mirror across the y axis.
    pub fn flip_x() -> Self {
        Self {
            a: -1.0,
            ..Self::identity()
        }
    }

    /// Placement transform for an item at `position` rotated by `rotation`
    /// degrees: children are rotated first, then translated.
    pub fn placement(position: Vec2, rotation: f64) -> Self {
        Self::translation(position).multiply(&Self::rotation_deg(rotation))
    }

    /// Composition applying `child` first, then `self`.
    pub fn multiply(&self, child: &Transform) -> Transform {
        Transform {
            a: self.a * child.a + self.c * child.b,
            b: self.b * child.a + self.d * child.b,
            c: self.a * child.c + self.c * child.d,
            d: self.b * child.c + self.d * child.d,
            e: self.a * child.e + self.c * child.f + self.e,
            f: self.b * child.e + self.d * child.f + self.f,
        }
    }

    pub fn apply(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.a * v.x + self.c * v.y + self.e,
            self.b * v.x + self.d * v.y + self.f,
        )
    }

    /// Uniform scale factor, valid for rotate/translate/scale transforms.
    pub fn scale_factor(&self) -> f64 {
        self.a.hypot(self.b)
    }

    pub fn inverse(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Transform {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
            e: (self.c * self.f - self.d * self.e) * inv_det,
            f: (self.b * self.e - self.a * self.f) * inv_det,
        })
    }

    /// Transform all four corners and re-wrap, for axis-aligned results.
    pub fn apply_bbox(&self, bbox: &BBox) -> BBox {
        let mut out = BBox::empty();
        for corner in [
            Vec2::new(bbox.minx, bbox.miny),
            Vec2::new(bbox.minx, bbox.maxy),
            Vec2::new(bbox.maxx, bbox.miny),
            Vec2::new(bbox.maxx, bbox.maxy),
        ] {
            out.expand_vec(self.apply(corner));
        }
        out
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Arc center, radius and angles (degrees) from three points, or `None`
/// when the points are collinear.
pub fn arc_from_three_points(p1: Vec2, p2: Vec2, p3: Vec2) -> Option<(Vec2, f64, f64, f64)> {
    let d = 2.0 * (p1.x * (p2.y - p3.y) + p2.x * (p3.y - p1.y) + p3.x * (p1.y - p2.y));
    if d.abs() < 1e-10 {
        return None;
    }
    let s1 = p1.x * p1.x + p1.y * p1.y;
    let s2 = p2.x * p2.x + p2.y * p2.y;
    let s3 = p3.x * p3.x + p3.y * p3.y;
    let ux = (s1 * (p2.y - p3.y) + s2 * (p3.y - p1.y) + s3 * (p1.y - p2.y)) / d;
    let uy = (s1 * (p3.x - p2.x) + s2 * (p1.x - p3.x) + s3 * (p2.x - p1.x)) / d;
    let center = Vec2::new(ux, uy);
    let radius = center.distance(&p1);
    let start_angle = (p1.y - uy).atan2(p1.x - ux) * 180.0 / PI;
    let end_angle = (p3.y - uy).atan2(p3.x - ux) * 180.0 / PI;
    Some((center, radius, start_angle, end_angle))
}

/// Distance from a point to a segment, for track hit-testing.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = Vec2::new(b.x - a.x, b.y - a.y);
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    let nearest = if len_sq == 0.0 {
        a
    } else {
        let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
        Vec2::new(a.x + t * ab.x, a.y + t * ab.y)
    };
    p.distance(&nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_placement_rotates_then_translates() {
        let t = Transform::placement(Vec2::new(10.0, 10.0), 90.0);
        let p = t.apply(Vec2::new(2.0, 0.0));
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_multiply_order() {
        let parent = Transform::translation(Vec2::new(5.0, 0.0));
        let child = Transform::scale(2.0);
        let combined = parent.multiply(&child);
        let p = combined.apply(Vec2::new(1.0, 1.0));
        assert_relative_eq!(p.x, 7.0);
        assert_relative_eq!(p.y, 2.0);
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform::placement(Vec2::new(3.0, -4.0), 30.0).multiply(&Transform::scale(1.5));
        let inv = t.inverse().unwrap();
        let p = Vec2::new(7.0, 11.0);
        let back = inv.apply(t.apply(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn test_arc_from_three_points() {
        let (center, radius, ..) = arc_from_three_points(
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(center.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(radius, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_collinear_points_have_no_arc() {
        assert!(arc_from_three_points(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 2.0),
        )
        .is_none());
    }

    #[test]
    fn test_point_segment_distance() {
        let d = point_segment_distance(
            Vec2::new(5.0, 3.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
        );
        assert_relative_eq!(d, 3.0);
        // Beyond the endpoint, distance is to the endpoint itself.
        let d = point_segment_distance(
            Vec2::new(13.0, 4.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
        );
        assert_relative_eq!(d, 5.0);
    }
}
