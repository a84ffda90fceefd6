//! Player parameter adjuster (rubber-banding).
//!
//! Nudges the player vehicle's steering-angle, torque and brake-torque limits
//! by the rubber-band error, scaled by the coordinator's `alpha` and limited
//! to a small multiplicative change per tick.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::systems::sdk::{ParameterSink, PlayerParam, TunableField};

/// Bounds and per-unit-delta gain of one adjusted field.
///
/// The default rule is disabled and pins the multiplier at 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRule {
    pub enabled: bool,
    pub min: f64,
    pub max: f64,
    /// Multiplier is `1 + gain * delta`.
    pub gain: f64,
}

impl Default for FieldRule {
    fn default() -> Self {
        Self { enabled: false, min: 1.0, max: 1.0, gain: 0.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjusterConfig {
    pub adjustment_speed: f64,
    /// Largest per-tick delta fed into the multipliers.
    pub max_delta: f64,
    pub steering: FieldRule,
    pub torque: FieldRule,
    pub brake: FieldRule,
}

impl Default for AdjusterConfig {
    fn default() -> Self {
        Self {
            adjustment_speed: 2.0,
            max_delta: 0.1,
            steering: FieldRule { enabled: true, min: 15.0, max: 30.0, gain: 0.5 },
            torque: FieldRule { enabled: true, min: 100.0, max: 1000.0, gain: 0.3 },
            // Braking eases off as the player falls behind.
            brake: FieldRule { enabled: true, min: 100.0, max: 500.0, gain: -0.2 },
        }
    }
}

impl AdjusterConfig {
    pub fn rule(&self, field: PlayerParam) -> &FieldRule {
        match field {
            PlayerParam::MaxSteerAngle => &self.steering,
            PlayerParam::FullTorque => &self.torque,
            PlayerParam::BrakeTorque => &self.brake,
        }
    }
}

/// What one adjustment pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Adjustment {
    /// The bounded delta that drove the multipliers.
    pub delta: f64,
    pub written: usize,
    pub skipped: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ParameterAdjuster {
    cfg: AdjusterConfig,
}

impl ParameterAdjuster {
    pub fn new(cfg: AdjusterConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &AdjusterConfig { &self.cfg }

    /// `clamp(delta_p * adjustment_speed * alpha * dt, ±max_delta)`; a missing
    /// `alpha` counts as 1.
    pub fn smooth_delta(&self, delta_p: f64, alpha: Option<f64>, dt: f64) -> f64 {
        let speed = self.cfg.adjustment_speed * alpha.unwrap_or(1.0);
        let d = delta_p * speed * dt;
        let m = self.cfg.max_delta.abs();
        if d.is_finite() { d.clamp(-m, m) } else { 0.0 }
    }

    /// Apply one tick of rubber-banding to the player's vehicle.
    pub fn adjust<S>(&self, delta_p: f64, alpha: Option<f64>, dt: f64, sink: &mut S) -> Adjustment
    where
        S: ParameterSink<PlayerParam> + ?Sized,
    {
        let delta = self.smooth_delta(delta_p, alpha, dt);
        let mut out = Adjustment { delta, ..Adjustment::default() };

        for field in [PlayerParam::MaxSteerAngle, PlayerParam::FullTorque, PlayerParam::BrakeTorque] {
            let rule = self.cfg.rule(field);
            if !rule.enabled {
                continue;
            }
            let Some(current) = sink.read(field).filter(|v| v.is_finite() && *v > 0.0) else {
                out.skipped += 1;
                continue;
            };
            let next = (current * (1.0 + delta * rule.gain)).clamp(rule.min, rule.max);
            match sink.write(field, next) {
                Ok(()) => out.written += 1,
                Err(e) => {
                    warn!(field = field.name(), error = %e, "player parameter write skipped");
                    out.skipped += 1;
                }
            }
        }

        trace!(delta_p, delta, written = out.written, skipped = out.skipped, "player parameters adjusted");
        out
    }
}
