//! Complexity coordinator.
//!
//! Blends a track-derived complexity (the rubber-band error) with an
//! opponent-derived complexity (how often the opponent runs its losing
//! chromosome) through an adaptive weight `alpha`, and steers `alpha` so the
//! blend stays inside a hysteresis band around a slowly rising target.

use bevy_prng::WyRand;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::mechanics::control::{bounded_step, clamp01, lag, lerp};
use crate::mechanics::stoch::{jitter, seeded};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub start_complexity: f64,
    pub end_complexity: f64,
    /// Target increase per second.
    pub growth_rate: f64,
    /// Width of the band centred on the target.
    pub band_range: f64,
    pub initial_alpha: f64,
    /// Rate for band smoothing, alpha chasing and band correction.
    pub adjustment_speed: f64,
    pub alpha_min: f64,
    pub alpha_max: f64,
    /// In-band alpha noise amplitude.
    pub alpha_jitter: f64,
    /// Opponent complexity at losing frequency 0 and 1.
    pub ai_complexity_low: f64,
    pub ai_complexity_high: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            start_complexity: 0.3,
            end_complexity: 0.7,
            growth_rate: 0.001,
            band_range: 0.2,
            initial_alpha: 0.5,
            adjustment_speed: 0.5,
            alpha_min: 0.1,
            alpha_max: 0.9,
            alpha_jitter: 0.005,
            ai_complexity_low: 0.3,
            ai_complexity_high: 0.7,
        }
    }
}

/// Per-tick inputs, computed by the caller from the other systems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinatorInputs {
    pub skill: f64,
    /// Rubber-band error at the player's segment; `None` off-track.
    pub delta_p: Option<f64>,
    /// Opponent's losing-chromosome selection frequency; `None` without one.
    pub losing_frequency: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandPosition {
    Below,
    Inside,
    Above,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorState {
    pub target: f64,
    /// Active band, lagging behind the target band.
    pub band_min: f64,
    pub band_max: f64,
    pub alpha: f64,
    pub track_complexity: f64,
    pub ai_complexity: f64,
    pub overall_complexity: f64,
    pub band: BandPosition,
}

fn target_band(target: f64, range: f64) -> (f64, f64) {
    (clamp01(target - range / 2.0), clamp01(target + range / 2.0))
}

#[derive(Clone, Debug)]
pub struct ComplexityCoordinator {
    cfg: CoordinatorConfig,
    seed: u64,
    rng: WyRand,
    state: CoordinatorState,
}

impl ComplexityCoordinator {
    pub fn new(cfg: CoordinatorConfig, seed: u64) -> Self {
        Self { cfg, seed, rng: seeded(seed), state: Self::initial(&cfg) }
    }

    fn initial(cfg: &CoordinatorConfig) -> CoordinatorState {
        let (band_min, band_max) = target_band(cfg.start_complexity, cfg.band_range);
        CoordinatorState {
            target: cfg.start_complexity,
            band_min,
            band_max,
            alpha: cfg.initial_alpha.clamp(cfg.alpha_min, cfg.alpha_max),
            track_complexity: 0.5,
            ai_complexity: 0.5,
            overall_complexity: 0.5,
            band: BandPosition::Inside,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig { &self.cfg }
    pub fn state(&self) -> &CoordinatorState { &self.state }
    pub fn alpha(&self) -> f64 { self.state.alpha }

    pub fn update(&mut self, dt: f64, inputs: CoordinatorInputs) -> CoordinatorState {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let c = self.cfg;
        let s = &mut self.state;

        s.target = (s.target + c.growth_rate * dt).min(c.end_complexity);
        let (tmin, tmax) = target_band(s.target, c.band_range);
        s.band_min = lag(s.band_min, tmin, c.adjustment_speed, dt);
        s.band_max = lag(s.band_max, tmax, c.adjustment_speed, dt);

        let Some(delta_p) = inputs.delta_p.filter(|d| d.is_finite()) else {
            return *s;
        };

        s.track_complexity = delta_p.abs().min(1.0);
        s.ai_complexity = lerp(c.ai_complexity_low, c.ai_complexity_high, inputs.losing_frequency.map_or(0.5, clamp01));

        let skill = if inputs.skill.is_finite() { clamp01(inputs.skill) } else { 0.5 };
        let skill_alpha = lerp(c.alpha_max, c.alpha_min, skill).clamp(c.alpha_min, c.alpha_max);
        s.alpha = lag(s.alpha, skill_alpha, c.adjustment_speed, dt);

        s.overall_complexity = s.alpha * s.track_complexity + (1.0 - s.alpha) * s.ai_complexity;

        let track_share = s.alpha * s.track_complexity;
        let ai_share = (1.0 - s.alpha) * s.ai_complexity;
        let factor = ((s.overall_complexity - s.target).abs() * 2.0).clamp(0.1, 1.0);
        let max_step = c.adjustment_speed * dt;
        let step = max_step * factor;

        let nudge = if s.overall_complexity < s.band_min {
            s.band = BandPosition::Below;
            if track_share < ai_share { step } else { -step }
        } else if s.overall_complexity > s.band_max {
            s.band = BandPosition::Above;
            if track_share > ai_share { -step } else { step }
        } else {
            s.band = BandPosition::Inside;
            jitter(&mut self.rng, c.alpha_jitter)
        };
        s.alpha = if s.band == BandPosition::Inside {
            (s.alpha + nudge).clamp(c.alpha_min, c.alpha_max)
        } else {
            bounded_step(s.alpha, nudge, max_step, c.alpha_min, c.alpha_max)
        };

        trace!(
            alpha = s.alpha,
            track = s.track_complexity,
            ai = s.ai_complexity,
            overall = s.overall_complexity,
            target = s.target,
            "complexity update"
        );
        *s
    }

    pub fn reset(&mut self) {
        self.rng = seeded(self.seed);
        self.state = Self::initial(&self.cfg);
    }
}
