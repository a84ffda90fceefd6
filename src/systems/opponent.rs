//! Adaptive opponent.
//!
//! Two chromosomes evolve side by side. Every tuning tick the one matching
//! the agent that gained more race score is reinforced, both receive mutation
//! noise, and one of them is chosen from the race standings and pushed onto
//! the opponent's controller.

use bevy_prng::WyRand;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::mechanics::stoch::{jitter, seeded};
use crate::mechanics::window::History;
use crate::systems::sdk::{Cadence, OpponentParam, ParameterSink, apply_parameters};

/// Six scaling factors shaping how the opponent drives.
///
/// Unset genes default to the neutral factor 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chromosome {
    pub speed: f64,
    pub steering: f64,
    pub braking: f64,
    pub caution: f64,
    pub lateral_wander: f64,
    pub accel_wander: f64,
}

impl Default for Chromosome {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl Chromosome {
    pub const fn new(speed: f64, steering: f64, braking: f64, caution: f64, lateral_wander: f64, accel_wander: f64) -> Self {
        Self { speed, steering, braking, caution, lateral_wander, accel_wander }
    }

    pub const NEUTRAL: Self = Self::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0);
    pub const WINNING: Self = Self::new(1.3, 1.2, 1.4, 0.7, 0.6, 0.5);
    pub const LOSING: Self = Self::new(0.7, 0.9, 0.6, 1.3, 1.4, 1.5);

    fn genes_mut(&mut self) -> [&mut f64; 6] {
        [
            &mut self.speed,
            &mut self.steering,
            &mut self.braking,
            &mut self.caution,
            &mut self.lateral_wander,
            &mut self.accel_wander,
        ]
    }

    pub fn genes(&self) -> [f64; 6] {
        [self.speed, self.steering, self.braking, self.caution, self.lateral_wander, self.accel_wander]
    }

    /// Add independent noise in `[-noise, noise)` to every factor, then clamp.
    pub fn mutate(&mut self, rng: &mut WyRand, noise: f64, lo: f64, hi: f64) {
        for g in self.genes_mut() {
            *g += jitter(rng, noise);
        }
        self.clamp(lo, hi);
    }

    pub fn clamp(&mut self, lo: f64, hi: f64) {
        for g in self.genes_mut() {
            *g = if g.is_finite() { g.clamp(lo, hi) } else { lo };
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveChromosome {
    Winning,
    Losing,
}

/// Which chromosome the opponent runs when the player is behind or ahead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Player behind: losing chromosome. Player ahead: winning chromosome.
    #[default]
    YieldToTrailingPlayer,
    /// Player behind: winning chromosome. Player ahead: losing chromosome.
    ChallengeTrailingPlayer,
}

/// Base values the chromosome factors multiply.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseMultipliers {
    pub steer_sensitivity: f64,
    pub accel_sensitivity: f64,
    pub brake_sensitivity: f64,
    pub cautious_speed_factor: f64,
    pub lateral_wander_distance: f64,
    pub accel_wander_amount: f64,
}

impl Default for BaseMultipliers {
    fn default() -> Self {
        Self {
            steer_sensitivity: 0.05,
            accel_sensitivity: 0.04,
            brake_sensitivity: 1.0,
            cautious_speed_factor: 0.05,
            lateral_wander_distance: 3.0,
            accel_wander_amount: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentConfig {
    /// Seconds between tuning ticks.
    pub tuning_interval: f64,
    pub mutation_noise: f64,
    pub factor_min: f64,
    pub factor_max: f64,
    pub score_history: usize,
    pub selection_history: usize,
    pub low_correlation: f64,
    pub high_correlation: f64,
    pub policy: SelectionPolicy,
    pub base: BaseMultipliers,
    pub initial_winning: Chromosome,
    pub initial_losing: Chromosome,
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            tuning_interval: 2.0,
            mutation_noise: 0.05,
            factor_min: 0.1,
            factor_max: 3.0,
            score_history: 50,
            selection_history: 50,
            low_correlation: 0.3,
            high_correlation: 0.7,
            policy: SelectionPolicy::default(),
            base: BaseMultipliers::default(),
            initial_winning: Chromosome::WINNING,
            initial_losing: Chromosome::LOSING,
        }
    }
}

/// Race standings as seen on a tuning tick. Missing ranks count as 1.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OpponentInputs {
    pub player_rank: Option<u32>,
    pub opponent_rank: Option<u32>,
    pub player_score: Option<f64>,
    pub opponent_score: Option<f64>,
    pub correlation: f64,
}

#[derive(Clone, Debug)]
pub struct AdaptiveOpponent {
    cfg: OpponentConfig,
    seed: u64,
    rng: WyRand,
    winning: Chromosome,
    losing: Chromosome,
    active: ActiveChromosome,
    scores: History<(f64, f64)>,
    selections: History<ActiveChromosome>,
    tuning: Cadence,
}

impl AdaptiveOpponent {
    pub fn new(cfg: OpponentConfig, seed: u64) -> Self {
        let mut winning = cfg.initial_winning;
        let mut losing = cfg.initial_losing;
        winning.clamp(cfg.factor_min, cfg.factor_max);
        losing.clamp(cfg.factor_min, cfg.factor_max);
        Self {
            cfg,
            seed,
            rng: seeded(seed),
            winning,
            losing,
            active: ActiveChromosome::Winning,
            scores: History::new(cfg.score_history),
            selections: History::new(cfg.selection_history),
            tuning: Cadence::new(cfg.tuning_interval),
        }
    }

    pub fn config(&self) -> &OpponentConfig { &self.cfg }
    pub fn winning(&self) -> &Chromosome { &self.winning }
    pub fn losing(&self) -> &Chromosome { &self.losing }
    pub fn active(&self) -> ActiveChromosome { self.active }

    pub fn active_chromosome(&self) -> &Chromosome {
        match self.active {
            ActiveChromosome::Winning => &self.winning,
            ActiveChromosome::Losing => &self.losing,
        }
    }

    /// Share of recent tuning ticks that selected the losing chromosome;
    /// 0.5 before the first selection.
    pub fn losing_frequency(&self) -> f64 {
        if self.selections.is_empty() {
            return 0.5;
        }
        let losing = self.selections.iter().filter(|s| **s == ActiveChromosome::Losing).count();
        losing as f64 / self.selections.len() as f64
    }

    /// Controller values for the active chromosome.
    pub fn parameters(&self) -> [(OpponentParam, f64); 6] {
        let c = self.active_chromosome();
        let b = &self.cfg.base;
        [
            (OpponentParam::SteerSensitivity, b.steer_sensitivity * c.steering),
            (OpponentParam::AccelSensitivity, b.accel_sensitivity * c.speed),
            (OpponentParam::BrakeSensitivity, b.brake_sensitivity * c.braking),
            (OpponentParam::CautiousSpeedFactor, b.cautious_speed_factor * c.caution),
            (OpponentParam::LateralWanderDistance, b.lateral_wander_distance * c.lateral_wander),
            (OpponentParam::AccelWanderAmount, b.accel_wander_amount * c.accel_wander),
        ]
    }

    /// Advance one frame. On a tuning tick: record scores, reinforce, mutate,
    /// select and apply. Returns the selection when a tuning tick ran.
    pub fn tick<S>(&mut self, now: f64, inputs: OpponentInputs, sink: &mut S) -> Option<ActiveChromosome>
    where
        S: ParameterSink<OpponentParam> + ?Sized,
    {
        if !self.tuning.ready(now) {
            return None;
        }

        if let (Some(p), Some(o)) = (inputs.player_score, inputs.opponent_score) {
            if p.is_finite() && o.is_finite() {
                self.scores.push((p, o));
            }
        }
        self.reinforce(inputs.correlation);

        let (lo, hi) = (self.cfg.factor_min, self.cfg.factor_max);
        let noise = self.cfg.mutation_noise;
        self.winning.mutate(&mut self.rng, noise, lo, hi);
        self.losing.mutate(&mut self.rng, noise, lo, hi);

        let next = self.select(inputs.player_rank.unwrap_or(1), inputs.opponent_rank.unwrap_or(1), inputs.correlation);
        if next != self.active {
            info!(from = ?self.active, to = ?next, "opponent chromosome switched");
        }
        self.active = next;
        self.selections.push(next);

        let applied = apply_parameters(sink, &self.parameters());
        debug!(active = ?next, applied, losing_frequency = self.losing_frequency(), "opponent tuned");
        Some(next)
    }

    fn reinforce(&mut self, correlation: f64) {
        let Some((&(p0, o0), &(p1, o1))) = self.scores.last_two() else {
            return;
        };
        let player_gain = p1 - p0;
        let opponent_gain = o1 - o0;

        if opponent_gain > player_gain {
            let w = &mut self.winning;
            if correlation < self.cfg.low_correlation {
                w.speed *= 0.95;
                w.braking *= 0.9;
                w.caution *= 1.1;
                w.lateral_wander *= 1.05;
            } else {
                w.speed *= 1.05;
                w.steering *= 1.03;
            }
        } else {
            let l = &mut self.losing;
            if correlation > self.cfg.high_correlation {
                l.speed *= 1.05;
                l.braking *= 1.03;
            } else {
                l.speed *= 0.9;
                l.braking *= 0.85;
                l.caution *= 1.15;
                l.lateral_wander *= 1.1;
            }
        }
    }

    /// Rank 1 leads, so a larger player rank means the player is behind.
    pub fn select(&self, player_rank: u32, opponent_rank: u32, correlation: f64) -> ActiveChromosome {
        use ActiveChromosome::{Losing, Winning};
        use std::cmp::Ordering::*;

        let (behind, ahead) = match self.cfg.policy {
            SelectionPolicy::YieldToTrailingPlayer => (Losing, Winning),
            SelectionPolicy::ChallengeTrailingPlayer => (Winning, Losing),
        };
        match player_rank.cmp(&opponent_rank) {
            Greater => behind,
            Less => ahead,
            Equal if correlation < self.cfg.low_correlation => Losing,
            Equal => Winning,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.cfg, self.seed);
    }
}
