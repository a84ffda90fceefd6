//! Per-segment difficulty: how much skill a segment demands relative to the
//! rest of the track.

use super::Segment;

#[derive(Clone, Copy, Debug)]
enum Attribute {
    Friction,
    Curvature,
    RoadWidth,
    Incline,
    Obstacles,
}

const WEIGHTS: [(Attribute, f64); 5] = [
    (Attribute::Friction, 0.25),
    (Attribute::Curvature, 0.25),
    (Attribute::RoadWidth, 0.15),
    (Attribute::Incline, 0.10),
    (Attribute::Obstacles, 0.25),
];

/// Higher means harder.
fn raw(seg: &Segment, attr: Attribute) -> f64 {
    match attr {
        Attribute::Friction => 1.0 - seg.friction,
        Attribute::Curvature => 1.0 / seg.curve_radius.max(0.1),
        Attribute::RoadWidth => 1.0 / seg.road_width.max(0.1),
        Attribute::Incline => seg.incline_angle.abs(),
        Attribute::Obstacles => seg.obstacle_percent,
    }
}

/// Weighted min–max normalised difficulty in [0, 1] for every segment.
/// An attribute that is equal everywhere contributes its midpoint.
pub fn assess(segments: &[Segment]) -> Vec<f64> {
    let ranges: Vec<(f64, f64)> = WEIGHTS
        .iter()
        .map(|&(attr, _)| {
            segments.iter().map(|s| raw(s, attr)).fold((f64::MAX, f64::MIN), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
        })
        .collect();

    segments
        .iter()
        .map(|seg| {
            WEIGHTS
                .iter()
                .zip(&ranges)
                .map(|(&(attr, w), &(lo, hi))| {
                    let span = hi - lo;
                    let norm = if span.abs() <= 1e-9 {
                        0.5
                    } else {
                        ((raw(seg, attr) - lo) / span).clamp(0.0, 1.0)
                    };
                    norm * w
                })
                .sum::<f64>()
        })
        .collect()
}
