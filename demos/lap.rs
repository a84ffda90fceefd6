// demos/lap.rs
// Run with:
//   RUST_LOG=race_balance=debug cargo run --example lap

use std::collections::HashMap;

use glam::DVec3;
use race_balance::systems::sdk::{
    AgentHandle, AgentState, Corridor, EnvironmentSampler, ObstacleBounds, OpponentParam, ParameterSink,
    PlayerParam, RaceStandings, TunableField,
};
use race_balance::systems::skill::CollisionKind;
use race_balance::systems::track::Waypoint;
use race_balance::{BalanceConfig, Collaborators, RaceSession};

const PLAYER: AgentHandle = AgentHandle(0);
const RIVAL: AgentHandle = AgentHandle(1);

/// Flat asphalt with one crate on the back straight.
#[derive(Default)]
struct World {
    agents: HashMap<AgentHandle, AgentState>,
}

impl EnvironmentSampler for World {
    fn ground_friction(&self, _point: DVec3) -> Option<f64> {
        Some(0.9)
    }

    fn obstacles_in_corridor(&self, corridor: &Corridor) -> Vec<ObstacleBounds> {
        let crate_box = ObstacleBounds { center: DVec3::new(0.0, 0.5, -118.0), half_extents: DVec3::splat(1.5) };
        let mid = (corridor.start + corridor.end) * 0.5;
        if mid.distance(crate_box.center) < corridor.length {
            vec![crate_box]
        } else {
            Vec::new()
        }
    }

    fn agent_state(&self, agent: AgentHandle) -> Option<AgentState> {
        self.agents.get(&agent).copied()
    }
}

#[derive(Default)]
struct Standings {
    progress: HashMap<AgentHandle, f64>,
}

impl RaceStandings for Standings {
    fn rank(&self, agent: AgentHandle) -> Option<u32> {
        let mine = *self.progress.get(&agent)?;
        Some(1 + self.progress.values().filter(|p| **p > mine).count() as u32)
    }

    fn progress_score(&self, agent: AgentHandle) -> Option<f64> {
        self.progress.get(&agent).copied()
    }
}

#[derive(Default)]
struct Tunables(HashMap<&'static str, f64>);

impl ParameterSink<PlayerParam> for Tunables {
    fn read(&self, field: PlayerParam) -> Option<f64> {
        self.0.get(field.name()).copied()
    }

    fn write(&mut self, field: PlayerParam, value: f64) -> race_balance::Result<()> {
        self.0.insert(field.name(), value);
        Ok(())
    }
}

impl ParameterSink<OpponentParam> for Tunables {
    fn read(&self, field: OpponentParam) -> Option<f64> {
        self.0.get(field.name()).copied()
    }

    fn write(&mut self, field: OpponentParam, value: f64) -> race_balance::Result<()> {
        self.0.insert(field.name(), value);
        Ok(())
    }
}

/// Oval of `n` waypoints, 240 m by 120 m.
fn oval(n: usize) -> Vec<Waypoint> {
    (0..n)
        .map(|i| {
            let a = i as f64 * std::f64::consts::TAU / n as f64;
            Waypoint::new(format!("WP {}", i + 1), DVec3::new(120.0 * a.cos(), 0.0, 60.0 * a.sin()))
        })
        .collect()
}

/// Position `distance` metres along the closed polyline through `points`.
fn along(points: &[DVec3], mut distance: f64) -> (DVec3, DVec3) {
    let lap: f64 = (0..points.len()).map(|i| points[i].distance(points[(i + 1) % points.len()])).sum();
    distance = distance.rem_euclid(lap);
    for i in 0..points.len() {
        let (a, b) = (points[i], points[(i + 1) % points.len()]);
        let len = a.distance(b);
        if distance <= len {
            return (a.lerp(b, distance / len), (b - a).normalize_or_zero());
        }
        distance -= len;
    }
    (points[0], DVec3::X)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "race_balance=info".into()),
        )
        .init();

    let mut player_car = Tunables::default();
    player_car.0.insert(PlayerParam::MaxSteerAngle.name(), 25.0);
    player_car.0.insert(PlayerParam::FullTorque.name(), 450.0);
    player_car.0.insert(PlayerParam::BrakeTorque.name(), 300.0);

    let io = Collaborators {
        env: World::default(),
        standings: Standings::default(),
        player_vehicle: player_car,
        opponent_vehicle: Tunables::default(),
        player: PLAYER,
        opponent: Some(RIVAL),
    };

    let mut session = match RaceSession::new(BalanceConfig::default(), oval(12), io) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cannot start session: {e}");
            return;
        }
    };

    let line: Vec<DVec3> = session.track().waypoints().iter().map(|w| w.position).collect();
    let lap_time = session.track().lap_time();
    println!("== Track ==");
    for s in session.track().segments() {
        println!(
            "seg {:>2}  r={:>7.1}m  safe={:>6.1}  opt={:>6.1} km/h  t={:>5.2}s  difficulty={:.2}",
            s.index,
            s.curve_radius,
            s.max_safe_speed,
            s.optimized_safe_speed,
            s.recommended_time,
            session.track().difficulty(s.index).unwrap_or(0.0),
        );
    }
    println!("ideal lap: {lap_time:.2}s");

    let dt = 1.0 / 30.0;
    let (mut player_dist, mut rival_dist) = (0.0, -8.0);
    let mut t = 0.0;
    for lap in 1..=4 {
        // The player improves every lap; the rival shadows them with a lag.
        let pace = 0.6 + 0.1 * lap as f64;
        let end = t + lap_time / pace;
        while t < end {
            let (pp, pf) = along(&line, player_dist);
            let (rp, rf) = along(&line, rival_dist);
            let ideal = session.track().optimized_speed_at(pp).unwrap_or(60.0);
            let v = ideal * pace;
            let steer = (t * 0.9).sin() * 0.4;

            let io = session.collaborators_mut();
            io.env.agents.insert(PLAYER, AgentState { position: pp, speed: v, steering: steer, forward: pf });
            io.env.agents.insert(RIVAL, AgentState { position: rp, speed: v, steering: steer * 0.8, forward: rf });
            io.standings.progress.insert(PLAYER, player_dist);
            io.standings.progress.insert(RIVAL, rival_dist);

            session.tick(t, dt);
            player_dist += v / 3.6 * dt;
            rival_dist += v / 3.6 * dt * 0.98;
            t += dt;
        }
        if lap == 2 {
            session.register_collision(CollisionKind::Wall);
        }

        let snap = session.snapshot();
        println!(
            "lap {lap}: skill={:.3} alpha={:.3} corr={} active={:?} losing_freq={:.2}",
            snap.overall_skill,
            snap.coordinator.alpha,
            snap.correlation.map_or("-".into(), |c| format!("{:.3}", c.overall)),
            snap.active_chromosome,
            snap.losing_frequency,
        );
    }

    println!("== Final snapshot ==");
    match serde_json::to_string_pretty(&session.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("snapshot not serialisable: {e}"),
    }
}
