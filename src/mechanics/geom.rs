//! Geometry mechanics over `glam::DVec3` (y is up).

use glam::DVec3;

/// Closest point to `p` on the segment `[a, b]`; `a` when the segment is degenerate.
#[inline]
pub fn closest_point_on_segment(p: DVec3, a: DVec3, b: DVec3) -> DVec3 {
    let ab = b - a;
    let len = ab.length();
    if len <= f64::EPSILON {
        return a;
    }
    let dir = ab / len;
    let t = (p - a).dot(dir).clamp(0.0, len);
    a + dir * t
}

#[inline]
pub fn distance_to_segment(p: DVec3, a: DVec3, b: DVec3) -> f64 {
    p.distance(closest_point_on_segment(p, a, b))
}

/// Unsigned angle between two vectors in degrees; 0 when either is zero.
#[inline]
pub fn angle_deg(u: DVec3, v: DVec3) -> f64 {
    let denom = u.length() * v.length();
    if denom <= 1e-15 {
        return 0.0;
    }
    (u.dot(v) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Circumradius of the triangle (a, b, c) via Heron's formula.
/// `None` when the triangle is degenerate.
pub fn circumradius(a: DVec3, b: DVec3, c: DVec3) -> Option<f64> {
    let ab = a.distance(b);
    let bc = b.distance(c);
    let ca = a.distance(c);
    let s = (ab + bc + ca) * 0.5;
    let area_sq = s * (s - ab) * (s - bc) * (s - ca);
    if !(area_sq > 0.0) {
        return None;
    }
    let area = area_sq.sqrt();
    if area <= 1e-4 {
        return None;
    }
    let r = (ab * bc * ca) / (4.0 * area);
    r.is_finite().then_some(r)
}

/// Horizontal right-hand axis for a travel direction; +X for vertical directions.
#[inline]
pub fn right_axis(forward: DVec3) -> DVec3 {
    forward.cross(DVec3::Y).try_normalize().unwrap_or(DVec3::X)
}

/// Ring helpers for circular waypoint indexing.
#[inline]
pub fn ring_prev(i: usize, n: usize) -> usize {
    (i + n - 1) % n
}

#[inline]
pub fn ring_next(i: usize, n: usize) -> usize {
    (i + 1) % n
}
