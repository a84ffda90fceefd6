//! Obstacle occupancy of a road corridor.

use glam::DVec3;

use crate::mechanics::geom;
use crate::systems::sdk::{Corridor, ObstacleBounds};

/// How much of a segment's corridor is blocked.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Occupancy {
    /// Widest lateral blockage across all merged spans, capped at road width.
    pub width: f64,
    /// Total blocked length along the segment, capped at segment length.
    pub length: f64,
    /// `width / road_width * 100`.
    pub percent: f64,
}

/// Footprint of one obstacle in segment-local coordinates.
#[derive(Clone, Copy, Debug)]
struct Footprint {
    lateral: (f64, f64),
    along: (f64, f64),
}

/// Whether an obstacle's centre lies within the segment (±1 m) and its
/// horizontal footprint reaches inside the road half-width.
pub fn intersects_corridor(c: &Corridor, ob: &ObstacleBounds) -> bool {
    let along = (ob.center - c.start).dot(c.direction);
    if along < -1.0 || along > c.length + 1.0 {
        return false;
    }
    let on_line = c.start + c.direction * along.clamp(0.0, c.length);
    ob.center.distance(on_line) - ob.radius_xz() < c.width / 2.0
}

fn footprint(c: &Corridor, right: DVec3, ob: &ObstacleBounds) -> Footprint {
    let mut lateral = (f64::MAX, f64::MIN);
    let mut along = (f64::MAX, f64::MIN);
    for v in ob.corners() {
        let z = (v - c.start).dot(c.direction);
        let x = (v - (c.start + c.direction * z)).dot(right);
        lateral = (lateral.0.min(x), lateral.1.max(x));
        along = (along.0.min(z), along.1.max(z));
    }
    Footprint { lateral, along }
}

/// Merge overlapping longitudinal spans, then take the lateral extent of
/// every obstacle touching each merged span.
pub fn occupancy(c: &Corridor, obstacles: &[ObstacleBounds]) -> Occupancy {
    let right = geom::right_axis(c.direction);
    let prints: Vec<Footprint> = obstacles
        .iter()
        .filter(|ob| intersects_corridor(c, ob))
        .map(|ob| footprint(c, right, ob))
        .collect();
    if prints.is_empty() {
        return Occupancy::default();
    }

    let mut spans: Vec<(f64, f64)> = prints.iter().map(|p| p.along).collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(spans.len());
    for s in spans {
        match merged.last_mut() {
            Some(cur) if s.0 <= cur.1 => cur.1 = cur.1.max(s.1),
            _ => merged.push(s),
        }
    }

    let road_width = c.width.max(0.1);
    let mut width = 0.0_f64;
    let mut length = 0.0_f64;
    for (lo, hi) in merged {
        let (mut min_x, mut max_x) = (f64::MAX, f64::MIN);
        for p in prints.iter().filter(|p| !(p.along.1 < lo || p.along.0 > hi)) {
            min_x = min_x.min(p.lateral.0);
            max_x = max_x.max(p.lateral.1);
        }
        let w = (max_x - min_x).max(0.0).min(road_width);
        width = width.max(w);
        length += (hi - lo).max(0.0).min(c.length);
    }
    let length = length.min(c.length);

    Occupancy { width, length, percent: width / road_width * 100.0 }
}
