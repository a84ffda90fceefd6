//! Player skill scoring.
//!
//! Each completed segment is scored on collisions, peak speed against the
//! optimized speed and elapsed time against the recommended time. The overall
//! skill is the mean of evaluated segments, with weak segments discounted.
//!
//! Segment completion is detected by [`SegmentEvaluator`]: whenever the
//! player's current segment changes, the previous one is closed out exactly
//! once with its peak speed and elapsed time.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mechanics::control::clamp01;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    pub collision_weight: f64,
    pub speed_weight: f64,
    pub time_weight: f64,
    /// Collisions at which the collision score reaches 0. 0 disables it.
    pub max_allowed_collisions: u32,
    /// Weight of an opponent collision relative to any other collision.
    pub opponent_multiplier: f64,
    pub speed_tolerance: f64,
    /// Time ratio beyond which the time score is 0.
    pub max_time_factor: f64,
    pub weak_segment_threshold: f64,
    pub weak_segment_factor: f64,
    /// A colliding segment with a time score below this is penalised.
    pub reckless_time_threshold: f64,
    pub reckless_penalty: f64,
    pub initial_skill: f64,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            collision_weight: 0.45,
            speed_weight: 0.20,
            time_weight: 0.35,
            max_allowed_collisions: 1,
            opponent_multiplier: 1.5,
            speed_tolerance: 0.15,
            max_time_factor: 2.0,
            weak_segment_threshold: 0.5,
            weak_segment_factor: 0.3,
            reckless_time_threshold: 0.5,
            reckless_penalty: 0.5,
            initial_skill: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    Opponent,
    Obstacle,
    Wall,
}

/// What the player should have achieved on a segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentTarget {
    pub index: usize,
    /// km/h
    pub optimized_speed: f64,
    /// Seconds.
    pub recommended_time: f64,
}

/// What the player actually did on a segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentRun {
    /// km/h
    pub max_speed: f64,
    /// Seconds.
    pub elapsed: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentScores {
    pub index: usize,
    pub collision: f64,
    pub speed: f64,
    pub time: f64,
    pub skill: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillMetrics {
    pub overall_skill: f64,
    /// One entry per track segment, same indexing as the track.
    pub segment_skills: Vec<f64>,
    pub evaluated: Vec<bool>,
    /// Collisions since the last segment evaluation.
    pub total_collisions: u32,
    pub opponent_collisions: u32,
    pub evaluated_segments: usize,
    pub total_segment_time: f64,
}

impl SkillMetrics {
    fn new(segments: usize, initial: f64) -> Self {
        Self {
            overall_skill: clamp01(initial),
            segment_skills: vec![0.5; segments],
            evaluated: vec![false; segments],
            total_collisions: 0,
            opponent_collisions: 0,
            evaluated_segments: 0,
            total_segment_time: 0.0,
        }
    }
}

/// 1 inside the tolerance band, then a linear decay with the excess ratio.
pub fn speed_score(max_speed: f64, optimized_speed: f64, tolerance: f64) -> f64 {
    if optimized_speed <= 0.0 {
        return 1.0;
    }
    let diff = (max_speed / optimized_speed - 1.0).abs();
    if diff <= tolerance {
        1.0
    } else {
        clamp01(1.0 - (diff - tolerance))
    }
}

fn descend(r: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    if x1 - x0 <= 1e-9 {
        return y1;
    }
    y0 + (y1 - y0) * ((r - x0) / (x1 - x0))
}

/// 1 when on time; otherwise a three-piece decreasing function of the time
/// ratio: steep to 0.6 at `0.6 * max_factor`, shallower to 0.1 at
/// `0.75 * max_factor`, a near-zero tail to 0 at `max_factor`, 0 beyond.
///
/// Each piece starts where the previous one ends, so the middle piece is the
/// line through (0.6·mtf, 0.6) and (0.75·mtf, 0.1) rather than a fixed slope
/// of 2, and the score never jumps to 0 at `0.75 * max_factor`.
pub fn time_score(actual: f64, target: f64, max_factor: f64) -> f64 {
    if target <= 0.0 || actual <= target * (1.0 + 1e-9) {
        return 1.0;
    }
    let r = actual / target;
    let steep_end = max_factor * 0.6;
    let shallow_end = max_factor * 0.75;
    let score = if r <= steep_end {
        descend(r, 1.0, 1.0, steep_end, 0.6)
    } else if r <= shallow_end {
        descend(r, steep_end.max(1.0), 0.6, shallow_end, 0.1)
    } else if r <= max_factor {
        descend(r, shallow_end.max(1.0), 0.1, max_factor, 0.0)
    } else {
        0.0
    };
    clamp01(score)
}

#[derive(Clone, Copy, Debug)]
struct ActiveSegment {
    target: SegmentTarget,
    started_at: f64,
    max_speed: f64,
}

/// Detects segment transitions and measures each occupancy.
#[derive(Clone, Debug, Default)]
pub struct SegmentEvaluator {
    active: Option<ActiveSegment>,
}

impl SegmentEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the player's current segment and speed. Returns the finished
    /// segment when the player just moved into a different one.
    pub fn observe(
        &mut self,
        now: f64,
        current: Option<SegmentTarget>,
        speed: f64,
    ) -> Option<(SegmentTarget, SegmentRun)> {
        let current = current?;
        let mut completed = None;

        match self.active.as_mut() {
            Some(a) if a.target.index == current.index => {
                if speed.is_finite() && speed > a.max_speed {
                    a.max_speed = speed;
                }
                return None;
            }
            Some(a) => {
                let run = SegmentRun { max_speed: a.max_speed, elapsed: (now - a.started_at).max(0.0) };
                completed = Some((a.target, run));
            }
            None => {}
        }

        self.active = Some(ActiveSegment {
            target: current,
            started_at: now,
            max_speed: if speed.is_finite() { speed.max(0.0) } else { 0.0 },
        });
        completed
    }

    pub fn current_index(&self) -> Option<usize> {
        self.active.map(|a| a.target.index)
    }

    pub fn elapsed(&self, now: f64) -> Option<f64> {
        self.active.map(|a| (now - a.started_at).max(0.0))
    }

    pub fn reset(&mut self) {
        self.active = None;
    }
}

#[derive(Clone, Debug)]
pub struct SkillScorer {
    cfg: SkillConfig,
    metrics: SkillMetrics,
    evaluator: SegmentEvaluator,
}

impl SkillScorer {
    pub fn new(cfg: SkillConfig, segments: usize) -> Self {
        Self { cfg, metrics: SkillMetrics::new(segments, cfg.initial_skill), evaluator: SegmentEvaluator::new() }
    }

    pub fn config(&self) -> &SkillConfig { &self.cfg }
    pub fn metrics(&self) -> &SkillMetrics { &self.metrics }
    pub fn overall_skill(&self) -> f64 { self.metrics.overall_skill }
    pub fn evaluator(&self) -> &SegmentEvaluator { &self.evaluator }

    pub fn register_collision(&mut self, kind: CollisionKind) {
        self.metrics.total_collisions += 1;
        if kind == CollisionKind::Opponent {
            self.metrics.opponent_collisions += 1;
        }
    }

    /// Advance segment tracking; scores the previous segment on a transition.
    pub fn track(&mut self, now: f64, current: Option<SegmentTarget>, speed: f64) -> Option<SegmentScores> {
        let (target, run) = self.evaluator.observe(now, current, speed)?;
        self.evaluate_segment(target, run)
    }

    pub fn collision_score(&self) -> f64 {
        let max = self.cfg.max_allowed_collisions;
        if max == 0 {
            return 1.0;
        }
        let total = self.metrics.total_collisions;
        if total >= max {
            return 0.0;
        }
        let effective = total as f64
            + self.metrics.opponent_collisions as f64 * (self.cfg.opponent_multiplier - 1.0);
        clamp01(1.0 - effective / max as f64)
    }

    /// Score a finished segment, fold it into the overall skill and clear the
    /// rolling collision counters.
    pub fn evaluate_segment(&mut self, target: SegmentTarget, run: SegmentRun) -> Option<SegmentScores> {
        let i = target.index;
        if i >= self.metrics.segment_skills.len() {
            warn!(segment = i, segments = self.metrics.segment_skills.len(), "segment outside skill table");
            return None;
        }

        let c = &self.cfg;
        let collision = self.collision_score();
        let speed = speed_score(run.max_speed, target.optimized_speed, c.speed_tolerance);
        let time = time_score(run.elapsed, target.recommended_time, c.max_time_factor);

        let weight_sum = c.collision_weight + c.speed_weight + c.time_weight;
        let mut skill = if weight_sum > 0.0 {
            (collision * c.collision_weight + speed * c.speed_weight + time * c.time_weight) / weight_sum
        } else {
            0.0
        };
        if self.metrics.total_collisions > 0 && time < c.reckless_time_threshold {
            skill *= c.reckless_penalty;
        }
        let skill = clamp01(skill);

        self.metrics.segment_skills[i] = skill;
        self.metrics.evaluated[i] = true;
        self.metrics.evaluated_segments += 1;
        if target.recommended_time > 0.0 {
            self.metrics.total_segment_time += run.elapsed;
        }
        self.update_overall();

        debug!(
            segment = i,
            collision,
            speed,
            time,
            skill,
            overall = self.metrics.overall_skill,
            "segment evaluated"
        );

        self.metrics.total_collisions = 0;
        self.metrics.opponent_collisions = 0;
        Some(SegmentScores { index: i, collision, speed, time, skill })
    }

    fn update_overall(&mut self) {
        let m = &mut self.metrics;
        let mut total = 0.0;
        let mut count = 0usize;
        for (s, _) in m.segment_skills.iter().zip(&m.evaluated).filter(|(_, e)| **e) {
            total += if *s < self.cfg.weak_segment_threshold { s * self.cfg.weak_segment_factor } else { *s };
            count += 1;
        }
        if count > 0 {
            m.overall_skill = clamp01(total / count as f64);
        }
    }

    /// Rebuild the per-segment table for a re-analysed track.
    pub fn resize(&mut self, segments: usize) {
        self.metrics.segment_skills.resize(segments, 0.5);
        self.metrics.evaluated.resize(segments, false);
        self.evaluator.reset();
        self.update_overall();
    }

    pub fn reset(&mut self) {
        let n = self.metrics.segment_skills.len();
        self.metrics = SkillMetrics::new(n, self.cfg.initial_skill);
        self.evaluator.reset();
    }
}
