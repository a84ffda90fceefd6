//! Track analysis: waypoints → segments with curvature, incline, friction,
//! obstacle occupancy, a physically safe speed and an optimized speed/time
//! profile.
//!
//! Segment `i` spans `[waypoint[i], waypoint[i + 1 mod N]]`; the track is a ring.

mod difficulty;
mod obstacles;
mod speed;

pub use obstacles::{intersects_corridor, occupancy, Occupancy};
pub use speed::{calculate_safe_speeds, max_safe_speed, optimize_speeds, recommended_time};

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{BalanceError, Result};
use crate::mechanics::geom;
use crate::systems::sdk::{Corridor, EnvironmentSampler};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub gravity: f64,
    pub default_friction: f64,
    pub default_road_width: f64,
    pub min_curve_radius: f64,
    pub max_curve_radius: f64,
    /// Curvature below this angle (degrees) counts as straight.
    pub min_curve_angle: f64,
    /// Curvature at or above this angle (degrees) counts as degenerate.
    pub max_curve_angle: f64,
    /// Braking capability on flat ground, m/s².
    pub max_deceleration: f64,
    pub incline_effect: f64,
    pub min_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub min_recommended_time: f64,
    pub min_time_multiplier: f64,
    pub max_time_multiplier: f64,
    pub fixer_iterations: usize,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            default_friction: 0.8,
            default_road_width: 8.0,
            min_curve_radius: 1.0,
            max_curve_radius: 1000.0,
            min_curve_angle: 0.1,
            max_curve_angle: 175.0,
            max_deceleration: 4.0,
            incline_effect: 0.3,
            min_speed_kmh: 1.0,
            max_speed_kmh: 250.0,
            min_recommended_time: 0.1,
            min_time_multiplier: 0.8,
            max_time_multiplier: 2.0,
            fixer_iterations: 3,
        }
    }
}

/// A named track marker. The embedded number in `name` orders the lap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub position: DVec3,
    /// Road width at this waypoint; the track default when absent.
    pub road_width: Option<f64>,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, position: DVec3) -> Self {
        Self { name: name.into(), position, road_width: None }
    }

    pub fn with_road_width(mut self, width: f64) -> Self {
        self.road_width = Some(width);
        self
    }
}

/// First run of ASCII digits in `name`, or -1.
fn embedded_number(name: &str) -> i64 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(-1)
}

/// Sort waypoints by their embedded number, then by name.
pub fn order_waypoints(waypoints: &mut [Waypoint]) {
    waypoints.sort_by(|a, b| {
        embedded_number(&a.name)
            .cmp(&embedded_number(&b.name))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// One waypoint's influence region.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start: DVec3,
    pub end: DVec3,
    pub direction: DVec3,
    pub length: f64,
    pub road_width: f64,
    /// Degrees; 0 for straight or degenerate corners.
    pub curve_angle: f64,
    pub curve_radius: f64,
    /// Degrees, positive uphill.
    pub incline_angle: f64,
    pub friction: f64,
    pub obstacle_width: f64,
    pub obstacle_length: f64,
    pub obstacle_percent: f64,
    /// km/h
    pub max_safe_speed: f64,
    /// km/h, never above `max_safe_speed`.
    pub optimized_safe_speed: f64,
    /// Seconds.
    pub recommended_time: f64,
}

impl Segment {
    pub fn corridor(&self) -> Corridor {
        Corridor {
            start: self.start,
            end: self.end,
            direction: self.direction,
            length: self.length,
            width: self.road_width,
        }
    }

    /// Optimized speed, or the raw safe speed before optimization ran.
    pub fn target_speed(&self) -> f64 {
        if self.optimized_safe_speed > 0.0 { self.optimized_safe_speed } else { self.max_safe_speed }
    }
}

/// Analysed track. Segments are rebuilt only by [`Track::reanalyze`].
#[derive(Clone, Debug)]
pub struct Track {
    cfg: TrackConfig,
    waypoints: Vec<Waypoint>,
    segments: Vec<Segment>,
    difficulty: Vec<f64>,
}

impl Track {
    /// Order `waypoints`, build segments and run the full analysis.
    pub fn analyze<E>(mut waypoints: Vec<Waypoint>, cfg: TrackConfig, env: &E) -> Result<Self>
    where
        E: EnvironmentSampler + ?Sized,
    {
        if waypoints.len() < 2 {
            warn!(found = waypoints.len(), "track needs at least 2 waypoints");
            return Err(BalanceError::NotEnoughWaypoints { found: waypoints.len() });
        }
        order_waypoints(&mut waypoints);
        let mut track = Self { cfg, waypoints, segments: Vec::new(), difficulty: Vec::new() };
        track.reanalyze(env);
        Ok(track)
    }

    /// Full re-analysis against the current environment.
    pub fn reanalyze<E>(&mut self, env: &E)
    where
        E: EnvironmentSampler + ?Sized,
    {
        let n = self.waypoints.len();
        let mut segments: Vec<Segment> = (0..n).map(|i| self.build_segment(i, env)).collect();
        speed::calculate_safe_speeds(&mut segments, &self.cfg);
        speed::optimize_speeds(&mut segments, &self.cfg);

        for s in &segments {
            debug!(
                segment = s.index,
                radius = s.curve_radius,
                incline = s.incline_angle,
                friction = s.friction,
                obstacle_pct = s.obstacle_percent,
                safe = s.max_safe_speed,
                optimized = s.optimized_safe_speed,
                time = s.recommended_time,
                "segment analysed"
            );
        }
        self.difficulty = difficulty::assess(&segments);
        self.segments = segments;
        info!(segments = n, lap_time = self.lap_time(), "track analysed");
    }

    fn build_segment<E>(&self, i: usize, env: &E) -> Segment
    where
        E: EnvironmentSampler + ?Sized,
    {
        let n = self.waypoints.len();
        let wp = &self.waypoints[i];
        let start = wp.position;
        let end = self.waypoints[geom::ring_next(i, n)].position;
        let span = end - start;
        let length = span.length();

        let mut seg = Segment {
            index: i,
            start,
            end,
            direction: span.try_normalize().unwrap_or(DVec3::ZERO),
            length,
            road_width: wp.road_width.unwrap_or(self.cfg.default_road_width).max(0.1),
            ..Segment::default()
        };

        let (angle, radius) = self.curvature(i);
        seg.curve_angle = angle;
        seg.curve_radius = radius;

        seg.incline_angle = if length > 0.001 {
            let ratio = (span.y / length).clamp(-1.0, 1.0);
            ratio.asin().to_degrees()
        } else {
            0.0
        };

        seg.friction = env
            .ground_friction(start)
            .filter(|mu| mu.is_finite() && *mu >= 0.0)
            .unwrap_or(self.cfg.default_friction);

        if length > 0.001 {
            let occ = obstacles::occupancy(&seg.corridor(), &env.obstacles_in_corridor(&seg.corridor()));
            seg.obstacle_width = occ.width;
            seg.obstacle_length = occ.length;
            seg.obstacle_percent = occ.percent;
        }
        seg
    }

    /// (angle°, radius) at waypoint `i` from its ring neighbours.
    fn curvature(&self, i: usize) -> (f64, f64) {
        let n = self.waypoints.len();
        let straight = (0.0, self.cfg.max_curve_radius);
        if n < 3 {
            return straight;
        }
        let prev = self.waypoints[geom::ring_prev(i, n)].position;
        let cur = self.waypoints[i].position;
        let next = self.waypoints[geom::ring_next(i, n)].position;

        let angle = geom::angle_deg(cur - prev, next - cur);
        if angle <= self.cfg.min_curve_angle || angle >= self.cfg.max_curve_angle {
            return straight;
        }
        let radius = geom::circumradius(prev, cur, next)
            .unwrap_or(self.cfg.max_curve_radius)
            .clamp(self.cfg.min_curve_radius, self.cfg.max_curve_radius);
        (angle, radius)
    }

    pub fn config(&self) -> &TrackConfig { &self.cfg }
    pub fn waypoints(&self) -> &[Waypoint] { &self.waypoints }
    pub fn segments(&self) -> &[Segment] { &self.segments }
    pub fn segment(&self, index: usize) -> Option<&Segment> { self.segments.get(index) }
    pub fn len(&self) -> usize { self.segments.len() }
    pub fn is_empty(&self) -> bool { self.segments.is_empty() }

    /// Index of the segment whose `[start, end]` is nearest to `pos`
    /// (lowest index wins ties).
    pub fn segment_index_at(&self, pos: DVec3) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for s in &self.segments {
            let d = geom::distance_to_segment(pos, s.start, s.end);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((s.index, d));
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn segment_at_position(&self, pos: DVec3) -> Option<&Segment> {
        self.segment_index_at(pos).and_then(|i| self.segments.get(i))
    }

    pub fn optimized_speed_at(&self, pos: DVec3) -> Option<f64> {
        self.segment_at_position(pos).map(Segment::target_speed)
    }

    /// Required-skill estimate in [0, 1] for a segment.
    pub fn difficulty(&self, index: usize) -> Option<f64> {
        self.difficulty.get(index).copied()
    }

    /// Sum of recommended times over one lap.
    pub fn lap_time(&self) -> f64 {
        self.segments.iter().map(|s| s.recommended_time).sum()
    }
}
