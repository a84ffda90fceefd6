//! Behavioural correlation between the player and the opponent.
//!
//! Paired samples (position, speed, steering, heading) are taken on a fixed
//! cadence into a sliding window. Once the window is full, every new sample
//! triggers an analysis: shifted Pearson correlation of the steering, speed
//! and trajectory series, with trajectory discounted by how far apart and
//! how divergently the two agents travel.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::mechanics::control::clamp01;
use crate::mechanics::stats::{best_shifted_correlation, mean, recent_abs_delta_sum};
use crate::mechanics::window::{History, SlidingWindow};
use crate::systems::sdk::{AgentState, Cadence};

/// Correlation reported before the first analysis, or without an opponent.
pub const NEUTRAL_CORRELATION: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Samples per analysis window.
    pub window: usize,
    /// Seconds between paired samples.
    pub sample_interval: f64,
    pub max_shift: usize,
    /// Seconds between match records.
    pub integration_interval: f64,
    /// Metres. Beyond this, trajectories are not comparable.
    pub max_valid_distance: f64,
    pub history_capacity: usize,
    pub match_history_capacity: usize,
    /// Correlation-history entries considered for stability.
    pub stability_span: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            window: 100,
            sample_interval: 0.1,
            max_shift: 20,
            integration_interval: 2.0,
            max_valid_distance: 50.0,
            history_capacity: 100,
            match_history_capacity: 100,
            stability_span: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct AgentSample {
    position: DVec3,
    speed: f64,
    steering: f64,
    heading: DVec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PairSample {
    player: AgentSample,
    opponent: AgentSample,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMetrics {
    pub steering: f64,
    pub speed: f64,
    /// Already discounted by distance and direction.
    pub trajectory: f64,
    pub overall: f64,
    /// Integer mean of the three best shifts, in samples.
    pub optimal_shift: i32,
    pub confidence: f64,
    pub distance_factor: f64,
    pub direction_factor: f64,
}

/// Pairs a correlation reading with the player's skill at the same moment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub time: f64,
    pub skill: f64,
    pub correlation: f64,
    pub match_score: f64,
    pub distance: f64,
    pub direction_dot: f64,
}

impl MatchRecord {
    pub fn new(time: f64, skill: f64, correlation: f64, distance: f64, direction_dot: f64) -> Self {
        Self {
            time,
            skill,
            correlation,
            match_score: clamp01(1.0 - (skill - correlation).abs()),
            distance,
            direction_dot,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CorrelationEngine {
    cfg: CorrelationConfig,
    samples: SlidingWindow<PairSample>,
    sampling: Cadence,
    integration: Cadence,
    metrics: Option<CorrelationMetrics>,
    history: History<f64>,
    matches: History<MatchRecord>,
    distance: f64,
    direction_dot: f64,
    agents_missing: bool,
}

impl CorrelationEngine {
    pub fn new(cfg: CorrelationConfig) -> Self {
        Self {
            cfg,
            samples: SlidingWindow::new(cfg.window),
            sampling: Cadence::new(cfg.sample_interval),
            integration: Cadence::new(cfg.integration_interval),
            metrics: None,
            history: History::new(cfg.history_capacity),
            matches: History::new(cfg.match_history_capacity),
            distance: 0.0,
            direction_dot: 1.0,
            agents_missing: false,
        }
    }

    pub fn config(&self) -> &CorrelationConfig { &self.cfg }
    pub fn metrics(&self) -> Option<&CorrelationMetrics> { self.metrics.as_ref() }
    pub fn sample_count(&self) -> usize { self.samples.len() }
    pub fn history(&self) -> &History<f64> { &self.history }
    pub fn matches(&self) -> &History<MatchRecord> { &self.matches }
    pub fn distance(&self) -> f64 { self.distance }
    pub fn direction_dot(&self) -> f64 { self.direction_dot }
    /// True while the last tick lacked either agent state.
    pub fn agents_missing(&self) -> bool { self.agents_missing }

    /// Latest overall correlation, or the neutral 0.5 before any analysis.
    pub fn overall_or_neutral(&self) -> f64 {
        self.metrics.map_or(NEUTRAL_CORRELATION, |m| m.overall)
    }

    /// Advance one frame. Returns the fresh metrics when an analysis ran.
    pub fn tick(
        &mut self,
        now: f64,
        player: Option<AgentState>,
        opponent: Option<AgentState>,
        skill: f64,
    ) -> Option<CorrelationMetrics> {
        let (Some(player), Some(opponent)) = (player, opponent) else {
            // Warn on the transition only.
            if self.agents_missing {
                trace!(player = player.is_some(), opponent = opponent.is_some(), "correlation skipped");
            } else {
                warn!(player = player.is_some(), opponent = opponent.is_some(), "correlation skipped: agent state unavailable");
            }
            self.agents_missing = true;
            return None;
        };
        if std::mem::take(&mut self.agents_missing) {
            debug!("correlation resumed: both agent states available");
        }

        let mut analysed = None;
        if self.sampling.ready(now) {
            self.record(player, opponent);
            if self.samples.is_full() {
                analysed = self.analyse();
            }
        }

        if self.integration.ready(now) {
            let record = MatchRecord::new(now, skill, self.overall_or_neutral(), self.distance, self.direction_dot);
            trace!(score = record.match_score, "match record");
            self.matches.push(record);
        }

        analysed
    }

    fn record(&mut self, player: AgentState, opponent: AgentState) {
        let prev = self.samples.last().copied();
        let player = sample_of(player, prev.map(|p| p.player.position));
        let opponent = sample_of(opponent, prev.map(|p| p.opponent.position));
        self.samples.push(PairSample { player, opponent });
    }

    fn analyse(&mut self) -> Option<CorrelationMetrics> {
        let window: Vec<PairSample> = self.samples.recent().copied().collect();
        let last = window.last()?;

        self.distance = last.player.position.distance(last.opponent.position);
        self.direction_dot = last.player.heading.dot(last.opponent.heading);

        let distance_factor = self.distance_factor();
        let direction_factor = {
            let dots: Vec<f64> = window.iter().map(|s| s.player.heading.dot(s.opponent.heading)).collect();
            clamp01((mean(&dots).unwrap_or(1.0) + 1.0) / 2.0)
        };

        let (ps, os) = split(&window, |a| a.steering);
        let (pv, ov) = split(&window, |a| a.speed);
        let (px, ox) = split(&window, |a| a.position.x);

        let steer = best_shifted_correlation(&ps, &os, self.cfg.max_shift);
        let speed = best_shifted_correlation(&pv, &ov, self.cfg.max_shift);
        let traj = best_shifted_correlation(&px, &ox, self.cfg.max_shift);
        let trajectory = traj.value * distance_factor * direction_factor;

        let overall = ((steer.value + speed.value + trajectory) / 3.0).clamp(-1.0, 1.0);
        let confidence = self.confidence(window.len(), distance_factor);

        let metrics = CorrelationMetrics {
            steering: steer.value,
            speed: speed.value,
            trajectory,
            overall,
            optimal_shift: (steer.shift + speed.shift + traj.shift) / 3,
            confidence,
            distance_factor,
            direction_factor,
        };
        self.history.push(overall);
        self.metrics = Some(metrics);

        debug!(
            steering = metrics.steering,
            speed = metrics.speed,
            trajectory = metrics.trajectory,
            overall,
            shift = metrics.optimal_shift,
            confidence,
            "correlation analysed"
        );
        Some(metrics)
    }

    fn distance_factor(&self) -> f64 {
        let max = self.cfg.max_valid_distance;
        if max <= 0.0 || self.distance > max {
            return 0.0;
        }
        clamp01(1.0 - self.distance / max)
    }

    /// Sample fraction × stability × distance confidence. Stability is taken
    /// from the history before the current value is appended.
    fn confidence(&self, samples: usize, distance_factor: f64) -> f64 {
        let fraction = clamp01(samples as f64 / self.cfg.window.max(1) as f64);
        let span = self.cfg.stability_span;
        let stability = if span > 0 && self.history.len() >= span {
            let h = self.history.to_vec();
            clamp01(1.0 - recent_abs_delta_sum(&h, span) / span as f64)
        } else {
            1.0
        };
        fraction * stability * distance_factor
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.sampling.reset();
        self.integration.reset();
        self.metrics = None;
        self.history.clear();
        self.matches.clear();
        self.distance = 0.0;
        self.direction_dot = 1.0;
        self.agents_missing = false;
    }
}

fn split(window: &[PairSample], f: impl Fn(&AgentSample) -> f64) -> (Vec<f64>, Vec<f64>) {
    window.iter().map(|s| (f(&s.player), f(&s.opponent))).unzip()
}

fn sample_of(state: AgentState, prev_position: Option<DVec3>) -> AgentSample {
    let forward = state.forward.try_normalize().unwrap_or(DVec3::Z);
    let heading = prev_position
        .and_then(|p| (state.position - p).try_normalize())
        .unwrap_or(forward);
    AgentSample {
        position: state.position,
        speed: if state.speed.is_finite() { state.speed } else { 0.0 },
        steering: if state.steering.is_finite() { state.steering.clamp(-1.0, 1.0) } else { 0.0 },
        heading,
    }
}
