// src/systems/sdk.rs

//! # Systems SDK
//!
//! Shared protocol for the balancing **systems** (track analysis, skill
//! scoring, correlation, complexity coordination, opponent tuning, parameter
//! adjustment). A *system* owns its own state and configuration and is advanced
//! by its caller with plain inputs; systems never reach into each other.
//!
//! ## Collaborators
//! Everything the core needs from the surrounding game is expressed as a trait:
//!
//! - [`EnvironmentSampler`]: ground friction under a point, obstacles inside a
//!   road corridor, and the live state of an agent.
//! - [`RaceStandings`]: race rank and accumulated progress score per agent.
//! - [`ParameterSink`]: typed write access to a vehicle's tunable fields.
//!
//! Implement them over your engine for production, or over plain structs in
//! tests. A collaborator that cannot answer returns `None`; systems treat that
//! as "keep the previous value" or fall back to a neutral default.
//!
//! ## Cadence
//! Sub-cadences (sampling, analysis, tuning) are "next eligible timestamp"
//! checks ([`Cadence`]), not timers. A tick that arrives early is a no-op for
//! that cadence.
//!
//! ## Determinism
//! Systems that need noise own a seeded `WyRand`; same seed, same session.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BalanceError, Result};

/// Opaque id the environment uses to resolve an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentHandle(pub u32);

/// Live kinematic state of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: DVec3,
    /// Scalar speed in km/h.
    pub speed: f64,
    /// Steering ratio in [-1, 1].
    pub steering: f64,
    /// Unit forward axis of the vehicle body.
    pub forward: DVec3,
}

/// Road corridor of one segment, used for obstacle queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corridor {
    pub start: DVec3,
    pub end: DVec3,
    pub direction: DVec3,
    pub length: f64,
    pub width: f64,
}

/// Axis-aligned obstacle bounds in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleBounds {
    pub center: DVec3,
    pub half_extents: DVec3,
}

impl ObstacleBounds {
    pub fn corners(&self) -> [DVec3; 8] {
        let c = self.center;
        let e = self.half_extents.abs();
        let mut out = [DVec3::ZERO; 8];
        for (i, v) in out.iter_mut().enumerate() {
            let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
            let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
            let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
            *v = c + DVec3::new(sx * e.x, sy * e.y, sz * e.z);
        }
        out
    }

    /// Horizontal footprint radius.
    pub fn radius_xz(&self) -> f64 {
        self.half_extents.x.abs().max(self.half_extents.z.abs())
    }
}

pub trait EnvironmentSampler {
    /// Friction coefficient of the surface under `point`, `None` without a surface
    /// or physical material.
    fn ground_friction(&self, point: DVec3) -> Option<f64>;

    /// Obstacles that may intersect the corridor (the core filters them again).
    fn obstacles_in_corridor(&self, corridor: &Corridor) -> Vec<ObstacleBounds>;

    fn agent_state(&self, agent: AgentHandle) -> Option<AgentState>;
}

pub trait RaceStandings {
    /// 1 = leading.
    fn rank(&self, agent: AgentHandle) -> Option<u32>;

    /// Monotonic race-progress score (checkpoints, distance, ...).
    fn progress_score(&self, agent: AgentHandle) -> Option<f64>;
}

/// Named tunable field of a vehicle controller.
pub trait TunableField: Copy + std::fmt::Debug {
    fn name(self) -> &'static str;
}

/// Typed write access to a vehicle controller's tunable fields.
pub trait ParameterSink<F: TunableField> {
    fn read(&self, field: F) -> Option<f64>;
    fn write(&mut self, field: F, value: f64) -> Result<()>;
}

/// Opponent control parameters driven by the active chromosome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpponentParam {
    SteerSensitivity,
    AccelSensitivity,
    BrakeSensitivity,
    CautiousSpeedFactor,
    LateralWanderDistance,
    AccelWanderAmount,
}

impl TunableField for OpponentParam {
    fn name(self) -> &'static str {
        match self {
            OpponentParam::SteerSensitivity => "steer_sensitivity",
            OpponentParam::AccelSensitivity => "accel_sensitivity",
            OpponentParam::BrakeSensitivity => "brake_sensitivity",
            OpponentParam::CautiousSpeedFactor => "cautious_speed_factor",
            OpponentParam::LateralWanderDistance => "lateral_wander_distance",
            OpponentParam::AccelWanderAmount => "accel_wander_amount",
        }
    }
}

/// Player vehicle limits nudged by rubber-banding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerParam {
    MaxSteerAngle,
    FullTorque,
    BrakeTorque,
}

impl TunableField for PlayerParam {
    fn name(self) -> &'static str {
        match self {
            PlayerParam::MaxSteerAngle => "max_steer_angle",
            PlayerParam::FullTorque => "full_torque",
            PlayerParam::BrakeTorque => "brake_torque",
        }
    }
}

/// Write each value, skipping (and logging) fields the sink rejects.
/// Returns how many writes succeeded.
pub fn apply_parameters<F, S>(sink: &mut S, values: &[(F, f64)]) -> usize
where
    F: TunableField,
    S: ParameterSink<F> + ?Sized,
{
    let mut applied = 0;
    for &(field, value) in values {
        if !value.is_finite() {
            warn!(field = field.name(), "skipping non-finite parameter value");
            continue;
        }
        match sink.write(field, value) {
            Ok(()) => applied += 1,
            Err(e) => warn!(field = field.name(), error = %e, "parameter write skipped"),
        }
    }
    applied
}

/// Helper for sinks backed by optional fields.
pub fn missing<F: TunableField>(field: F) -> BalanceError {
    BalanceError::MissingField(field.name())
}

/// "Next eligible timestamp" gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cadence {
    interval: f64,
    next_at: f64,
}

impl Cadence {
    pub fn new(interval: f64) -> Self {
        Self { interval: interval.max(0.0), next_at: f64::NEG_INFINITY }
    }

    /// True (and re-armed for `now + interval`) when `now` reached the next slot.
    pub fn ready(&mut self, now: f64) -> bool {
        if now < self.next_at {
            return false;
        }
        self.next_at = now + self.interval;
        true
    }

    pub fn interval(&self) -> f64 { self.interval }

    pub fn reset(&mut self) {
        self.next_at = f64::NEG_INFINITY;
    }
}
