//! Safe-speed calculation and the backward-feasibility speed optimizer.

use tracing::trace;

use super::{Segment, TrackConfig};
use crate::mechanics::{geom, physics};

pub fn max_safe_speed(seg: &Segment, cfg: &TrackConfig) -> f64 {
    physics::safe_speed_kmh(
        seg.incline_angle,
        seg.friction,
        seg.curve_radius,
        seg.road_width,
        seg.obstacle_width,
        cfg.gravity,
        cfg.min_speed_kmh,
        cfg.max_speed_kmh,
    )
}

/// Target traversal time at `speed_kmh`, stretched by the segment's difficulty.
pub fn recommended_time(seg: &Segment, speed_kmh: f64, cfg: &TrackConfig) -> f64 {
    let base = if speed_kmh > 0.0 { seg.length / (speed_kmh / physics::KMH_PER_MS) } else { 0.0 };
    let m = physics::time_multiplier(
        seg.curve_radius,
        seg.incline_angle,
        seg.friction,
        seg.obstacle_percent,
        cfg.min_time_multiplier,
        cfg.max_time_multiplier,
    );
    let t = base * m;
    if t.is_finite() { t.max(cfg.min_recommended_time) } else { cfg.min_recommended_time }
}

/// Fill `max_safe_speed` and the raw `recommended_time` of every segment.
pub fn calculate_safe_speeds(segments: &mut [Segment], cfg: &TrackConfig) {
    for seg in segments.iter_mut() {
        seg.max_safe_speed = max_safe_speed(seg, cfg);
        seg.recommended_time = recommended_time(seg, seg.max_safe_speed, cfg);
    }
}

/// Smooth speeds so that every segment can brake into its successor.
///
/// Starts from each segment's raw safe speed, runs one pass in index order
/// lowering a segment to the feasible entry speed for its slower successor,
/// then re-clamps to each segment's own ceiling (at most `fixer_iterations`
/// rounds, stopping early once nothing changes). Always starts from
/// `max_safe_speed`, so calling it again yields the same result.
pub fn optimize_speeds(segments: &mut [Segment], cfg: &TrackConfig) {
    let n = segments.len();
    if n < 2 {
        for seg in segments.iter_mut() {
            seg.optimized_safe_speed = seg.max_safe_speed;
        }
        return;
    }

    // m/s
    let mut speeds: Vec<f64> = segments
        .iter()
        .map(|s| s.max_safe_speed / physics::KMH_PER_MS)
        .collect();

    for i in 0..n {
        let next = geom::ring_next(i, n);
        let current = speeds[i];
        let target = speeds[next];
        if target >= current {
            continue;
        }
        let seg = &segments[i];
        let decel = physics::incline_deceleration(
            cfg.max_deceleration,
            seg.incline_angle,
            cfg.gravity,
            cfg.incline_effect,
        );
        let ceiling = seg.max_safe_speed / physics::KMH_PER_MS;
        let entry = physics::feasible_entry_speed(target, seg.length, decel, ceiling);
        if current > entry {
            speeds[i] = entry.max(target);
            trace!(segment = i, from = current, to = speeds[i], "entry speed lowered");
        }
    }

    for _ in 0..cfg.fixer_iterations {
        let mut changed = false;
        for (speed, seg) in speeds.iter_mut().zip(segments.iter()) {
            let ceiling = seg.max_safe_speed / physics::KMH_PER_MS;
            if *speed > ceiling {
                *speed = ceiling;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    for (seg, v) in segments.iter_mut().zip(speeds) {
        seg.optimized_safe_speed = (v * physics::KMH_PER_MS).min(seg.max_safe_speed);
        if seg.optimized_safe_speed > 0.0 {
            seg.recommended_time = recommended_time(seg, seg.optimized_safe_speed, cfg);
        }
    }
}
