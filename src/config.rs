//! Aggregated configuration for a full racing session.
//!
//! Every section defaults to the tuned constants, so a JSON document only
//! needs the values it overrides, at any depth:
//!
//! ```json
//! { "seed": 7, "adjuster": { "steering": { "max": 40.0 } } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BalanceError, Result};
use crate::systems::adjuster::{AdjusterConfig, FieldRule};
use crate::systems::coordinator::CoordinatorConfig;
use crate::systems::correlation::CorrelationConfig;
use crate::systems::opponent::OpponentConfig;
use crate::systems::skill::SkillConfig;
use crate::systems::track::TrackConfig;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub track: TrackConfig,
    pub skill: SkillConfig,
    pub correlation: CorrelationConfig,
    pub coordinator: CoordinatorConfig,
    pub opponent: OpponentConfig,
    pub adjuster: AdjusterConfig,
    /// Seeds the coordinator and opponent generators.
    pub seed: u64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            track: TrackConfig::default(),
            skill: SkillConfig::default(),
            correlation: CorrelationConfig::default(),
            coordinator: CoordinatorConfig::default(),
            opponent: OpponentConfig::default(),
            adjuster: AdjusterConfig::default(),
            seed: 0x5EED,
        }
    }
}

fn check(ok: bool, what: &str) -> Result<()> {
    if ok { Ok(()) } else { Err(BalanceError::InvalidConfig(what.to_string())) }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn ordered(lo: f64, hi: f64) -> bool {
    lo.is_finite() && hi.is_finite() && lo <= hi
}

/// Overlay `patch` onto `base`, descending into objects present in both.
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn check_rule(rule: &FieldRule, name: &str) -> Result<()> {
    check(ordered(rule.min, rule.max) && rule.min > 0.0, &format!("adjuster.{name} bounds must be positive and ordered"))?;
    check(rule.gain.is_finite(), &format!("adjuster.{name}.gain must be finite"))
}

impl BalanceConfig {
    /// Parse over the defaults and validate.
    ///
    /// Nested sections keep their own defaults for the fields a document
    /// leaves out, so `{"adjuster":{"steering":{"max":40.0}}}` only moves
    /// the steering ceiling.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let patch: Value = serde_json::from_str(s)?;
        let mut doc = serde_json::to_value(Self::default())?;
        merge(&mut doc, patch);
        let cfg: Self = serde_json::from_value(doc)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.track;
        check(positive(t.gravity), "track.gravity must be positive")?;
        check(t.default_friction.is_finite() && t.default_friction >= 0.0, "track.default_friction must be non-negative")?;
        check(positive(t.default_road_width), "track.default_road_width must be positive")?;
        check(positive(t.min_curve_radius) && ordered(t.min_curve_radius, t.max_curve_radius), "track curve radius bounds must be positive and ordered")?;
        check(ordered(t.min_curve_angle, t.max_curve_angle), "track curve angle bounds must be ordered")?;
        check(positive(t.max_deceleration), "track.max_deceleration must be positive")?;
        check(positive(t.min_speed_kmh) && ordered(t.min_speed_kmh, t.max_speed_kmh), "track speed bounds must be positive and ordered")?;
        check(positive(t.min_time_multiplier) && ordered(t.min_time_multiplier, t.max_time_multiplier), "track time multiplier bounds must be positive and ordered")?;

        let s = &self.skill;
        let weights = [s.collision_weight, s.speed_weight, s.time_weight];
        check(weights.iter().all(|w| w.is_finite() && *w >= 0.0) && weights.iter().sum::<f64>() > 0.0, "skill weights must be non-negative with a positive sum")?;
        check(s.speed_tolerance.is_finite() && s.speed_tolerance >= 0.0, "skill.speed_tolerance must be non-negative")?;
        check(s.max_time_factor.is_finite() && s.max_time_factor > 1.0, "skill.max_time_factor must exceed 1")?;
        check(s.opponent_multiplier.is_finite() && s.opponent_multiplier >= 1.0, "skill.opponent_multiplier must be at least 1")?;

        let c = &self.correlation;
        check(c.window >= 2, "correlation.window must be at least 2")?;
        check(positive(c.sample_interval), "correlation.sample_interval must be positive")?;
        check(positive(c.integration_interval), "correlation.integration_interval must be positive")?;
        check(positive(c.max_valid_distance), "correlation.max_valid_distance must be positive")?;
        check(c.history_capacity >= 1 && c.match_history_capacity >= 1, "correlation history capacities must be at least 1")?;

        let k = &self.coordinator;
        check(ordered(k.start_complexity, k.end_complexity), "coordinator start/end complexity must be ordered")?;
        check(k.growth_rate.is_finite() && k.growth_rate >= 0.0, "coordinator.growth_rate must be non-negative")?;
        check(positive(k.adjustment_speed), "coordinator.adjustment_speed must be positive")?;
        check(ordered(k.alpha_min, k.alpha_max) && k.alpha_min >= 0.0 && k.alpha_max <= 1.0, "coordinator alpha bounds must be ordered within [0, 1]")?;
        check(ordered(k.ai_complexity_low, k.ai_complexity_high), "coordinator ai complexity bounds must be ordered")?;

        let o = &self.opponent;
        check(positive(o.tuning_interval), "opponent.tuning_interval must be positive")?;
        check(positive(o.factor_min) && ordered(o.factor_min, o.factor_max), "opponent factor bounds must be positive and ordered")?;
        check(o.mutation_noise.is_finite() && o.mutation_noise >= 0.0, "opponent.mutation_noise must be non-negative")?;
        check(o.score_history >= 2, "opponent.score_history must be at least 2")?;
        check(o.selection_history >= 1, "opponent.selection_history must be at least 1")?;
        check(ordered(o.low_correlation, o.high_correlation), "opponent correlation thresholds must be ordered")?;

        let a = &self.adjuster;
        check(a.adjustment_speed.is_finite() && a.adjustment_speed >= 0.0, "adjuster.adjustment_speed must be non-negative")?;
        check(a.max_delta.is_finite() && a.max_delta >= 0.0, "adjuster.max_delta must be non-negative")?;
        check_rule(&a.steering, "steering")?;
        check_rule(&a.torque, "torque")?;
        check_rule(&a.brake, "brake")?;
        Ok(())
    }
}
