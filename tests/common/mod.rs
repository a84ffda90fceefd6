// tests/common/mod.rs
#![allow(dead_code)]

//! Deterministic fakes for the collaborator traits.

use std::collections::HashMap;

use glam::DVec3;
use race_balance::systems::sdk::{
    AgentHandle, AgentState, Corridor, EnvironmentSampler, ObstacleBounds, OpponentParam, ParameterSink,
    PlayerParam, RaceStandings, missing,
};
use race_balance::Result;

pub const PLAYER: AgentHandle = AgentHandle(0);
pub const RIVAL: AgentHandle = AgentHandle(1);

#[derive(Clone, Debug, Default)]
pub struct FakeEnv {
    pub friction: Option<f64>,
    pub obstacles: Vec<ObstacleBounds>,
    pub agents: HashMap<AgentHandle, AgentState>,
}

impl FakeEnv {
    pub fn with_friction(mu: f64) -> Self {
        Self { friction: Some(mu), ..Self::default() }
    }

    pub fn place(&mut self, agent: AgentHandle, position: DVec3, speed: f64, steering: f64) {
        self.agents.insert(agent, AgentState { position, speed, steering, forward: DVec3::X });
    }
}

impl EnvironmentSampler for FakeEnv {
    fn ground_friction(&self, _point: DVec3) -> Option<f64> {
        self.friction
    }

    fn obstacles_in_corridor(&self, _corridor: &Corridor) -> Vec<ObstacleBounds> {
        self.obstacles.clone()
    }

    fn agent_state(&self, agent: AgentHandle) -> Option<AgentState> {
        self.agents.get(&agent).copied()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeStandings {
    pub ranks: HashMap<AgentHandle, u32>,
    pub scores: HashMap<AgentHandle, f64>,
}

impl FakeStandings {
    pub fn set(&mut self, agent: AgentHandle, rank: u32, score: f64) {
        self.ranks.insert(agent, rank);
        self.scores.insert(agent, score);
    }
}

impl RaceStandings for FakeStandings {
    fn rank(&self, agent: AgentHandle) -> Option<u32> {
        self.ranks.get(&agent).copied()
    }

    fn progress_score(&self, agent: AgentHandle) -> Option<f64> {
        self.scores.get(&agent).copied()
    }
}

/// Player vehicle limits; a `None` field does not exist on this vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerCar {
    pub max_steer_angle: Option<f64>,
    pub full_torque: Option<f64>,
    pub brake_torque: Option<f64>,
}

impl Default for PlayerCar {
    fn default() -> Self {
        Self { max_steer_angle: Some(25.0), full_torque: Some(500.0), brake_torque: Some(300.0) }
    }
}

impl PlayerCar {
    fn slot(&mut self, field: PlayerParam) -> &mut Option<f64> {
        match field {
            PlayerParam::MaxSteerAngle => &mut self.max_steer_angle,
            PlayerParam::FullTorque => &mut self.full_torque,
            PlayerParam::BrakeTorque => &mut self.brake_torque,
        }
    }
}

impl ParameterSink<PlayerParam> for PlayerCar {
    fn read(&self, field: PlayerParam) -> Option<f64> {
        match field {
            PlayerParam::MaxSteerAngle => self.max_steer_angle,
            PlayerParam::FullTorque => self.full_torque,
            PlayerParam::BrakeTorque => self.brake_torque,
        }
    }

    fn write(&mut self, field: PlayerParam, value: f64) -> Result<()> {
        let slot = self.slot(field);
        match slot {
            Some(v) => {
                *v = value;
                Ok(())
            }
            None => Err(missing(field)),
        }
    }
}

/// Opponent controller that records writes and lacks the `absent` fields.
#[derive(Clone, Debug, Default)]
pub struct OpponentCar {
    pub values: HashMap<OpponentParam, f64>,
    pub absent: Vec<OpponentParam>,
    pub writes: usize,
}

impl ParameterSink<OpponentParam> for OpponentCar {
    fn read(&self, field: OpponentParam) -> Option<f64> {
        self.values.get(&field).copied()
    }

    fn write(&mut self, field: OpponentParam, value: f64) -> Result<()> {
        if self.absent.contains(&field) {
            return Err(missing(field));
        }
        self.values.insert(field, value);
        self.writes += 1;
        Ok(())
    }
}

/// Closed rectangle loop on flat ground, listed out of lap order.
#[cfg(feature = "system-track")]
pub fn rectangle(width: f64, depth: f64) -> Vec<race_balance::systems::track::Waypoint> {
    use race_balance::systems::track::Waypoint;
    vec![
        Waypoint::new("WP 3", DVec3::new(width, 0.0, depth)),
        Waypoint::new("WP 1", DVec3::new(0.0, 0.0, 0.0)),
        Waypoint::new("WP 4", DVec3::new(0.0, 0.0, depth)),
        Waypoint::new("WP 2", DVec3::new(width, 0.0, 0.0)),
    ]
}
