// tests/session.rs
#![cfg(feature = "genre-racing")]

mod common;

use common::{FakeEnv, FakeStandings, OpponentCar, PlayerCar, PLAYER, RIVAL, rectangle};
use std::io;
use std::sync::{Arc, Mutex};

use glam::DVec3;
use race_balance::genres::run_ticks;
use race_balance::systems::skill::CollisionKind;
use race_balance::systems::track::Track;
use race_balance::{BalanceConfig, BalanceError, Collaborators, RaceSession, SessionSnapshot};

type Session = RaceSession<FakeEnv, FakeStandings, PlayerCar, OpponentCar>;

fn collaborators(opponent: bool) -> Collaborators<FakeEnv, FakeStandings, PlayerCar, OpponentCar> {
    Collaborators {
        env: FakeEnv::default(),
        standings: FakeStandings::default(),
        player_vehicle: PlayerCar::default(),
        opponent_vehicle: OpponentCar::default(),
        player: PLAYER,
        opponent: opponent.then_some(RIVAL),
    }
}

fn session(opponent: bool) -> Session {
    RaceSession::new(BalanceConfig::default(), rectangle(200.0, 100.0), collaborators(opponent)).unwrap()
}

/// One frame of a scripted drive.
#[derive(Clone, Copy, Debug)]
struct Frame {
    time: f64,
    position: DVec3,
    speed: f64,
}

/// A lap driven exactly on the ideal profile: each segment is entered at the
/// cumulative recommended time and driven at its optimized speed, with
/// `per_segment` frames inside it. Ends with one frame back in segment 0.
fn perfect_lap(track: &Track, start: f64, per_segment: usize) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut t = start;
    for s in track.segments() {
        for k in 0..per_segment {
            let f = 0.1 + 0.8 * k as f64 / per_segment as f64;
            frames.push(Frame {
                time: t + s.recommended_time * k as f64 / per_segment as f64,
                position: s.start.lerp(s.end, f),
                speed: s.optimized_safe_speed,
            });
        }
        t += s.recommended_time;
    }
    let first = &track.segments()[0];
    frames.push(Frame { time: t, position: first.start.lerp(first.end, 0.1), speed: first.optimized_safe_speed });
    frames
}

fn play(session: &mut Session, frames: &[Frame], mut prev: f64) -> f64 {
    for f in frames {
        let env = &mut session.collaborators_mut().env;
        env.place(PLAYER, f.position, f.speed, (f.time * 0.7).sin());
        env.place(RIVAL, f.position, f.speed, (f.time * 0.7).sin());
        session.tick(f.time, f.time - prev);
        prev = f.time;
    }
    prev
}

/* ──────────────────────────────────────────────────────────────────────────
1) Construction
────────────────────────────────────────────────────────────────────────── */

#[test]
fn construction_validates_config_and_track() {
    let mut cfg = BalanceConfig::default();
    cfg.correlation.window = 1;
    let err = RaceSession::new(cfg, rectangle(200.0, 100.0), collaborators(true)).err();
    assert!(matches!(err, Some(BalanceError::InvalidConfig(_))));

    let one = rectangle(200.0, 100.0).into_iter().take(1).collect();
    let err = RaceSession::new(BalanceConfig::default(), one, collaborators(true)).err();
    assert!(matches!(err, Some(BalanceError::NotEnoughWaypoints { found: 1 })));
}

/* ──────────────────────────────────────────────────────────────────────────
2) End to end
────────────────────────────────────────────────────────────────────────── */

#[test]
fn perfect_lap_scores_one_and_pulls_alpha_down() {
    let mut s = session(false);
    let frames = perfect_lap(s.track(), 0.5, 10);
    play(&mut s, &frames, 0.5);

    let m = s.skill().metrics();
    assert_eq!(m.evaluated_segments, 4);
    assert!(m.segment_skills.iter().all(|k| *k == 1.0), "{:?}", m.segment_skills);
    assert_eq!(s.skill().overall_skill(), 1.0);

    assert!(s.coordinator().alpha() < 0.3, "alpha {}", s.coordinator().alpha());
    assert_eq!(s.signals().delta_p, Some(0.0));
    assert_eq!(s.signals().segment, Some(0));
    // A solo session never touches the opponent.
    assert_eq!(s.collaborators().opponent_vehicle.writes, 0);
    assert!(s.correlation().metrics().is_none());
}

#[test]
fn collision_costs_the_segment_it_happened_in() {
    let mut s = session(false);
    let frames = perfect_lap(s.track(), 0.0, 4);
    play(&mut s, &frames[..2], 0.0);
    s.register_collision(CollisionKind::Wall);
    play(&mut s, &frames[2..], frames[1].time);

    let m = s.skill().metrics();
    assert!((m.segment_skills[0] - 0.55).abs() < 1e-9);
    assert_eq!(m.segment_skills[1], 1.0);
    assert!((s.skill().overall_skill() - (0.55 + 3.0) / 4.0).abs() < 1e-9);
}

#[test]
fn opponent_is_tuned_and_correlated() {
    let mut s = session(true);
    s.collaborators_mut().standings.set(PLAYER, 1, 0.0);
    s.collaborators_mut().standings.set(RIVAL, 2, 0.0);

    let mut prev = 0.0;
    for lap in 0..3 {
        let start = prev + 0.1;
        let frames = perfect_lap(s.track(), start, 40);
        prev = play(&mut s, &frames, prev);
        s.collaborators_mut().standings.set(PLAYER, 1, (lap + 1) as f64 * 10.0);
    }

    // Both cars drive the same line; speed is flat on this track so only
    // steering and trajectory carry signal.
    let m = s.correlation().metrics().copied().expect("window filled");
    assert!(m.steering > 0.99, "{m:?}");
    assert!(m.trajectory > 0.99, "{m:?}");
    assert!(m.overall > 0.6, "{m:?}");
    assert!(s.correlation().matches().len() > 5);

    // Player leads, so the default policy keeps the opponent on its winning set.
    let snap = s.snapshot();
    assert_eq!(snap.active_chromosome, race_balance::systems::opponent::ActiveChromosome::Winning);
    assert_eq!(snap.losing_frequency, 0.0);
    let car = &s.collaborators().opponent_vehicle;
    assert!(car.writes >= 6 * 10);
    let steer = car.values[&race_balance::systems::sdk::OpponentParam::SteerSensitivity];
    assert!((steer - 0.05 * snap.chromosome.steering).abs() < 1e-12);
}

#[test]
fn slow_player_is_rubber_banded() {
    let mut s = session(false);
    let seg = s.track().segments()[0].clone();
    let before = s.collaborators().player_vehicle;
    let (last, reports) = run_ticks(s.signals(), 0.0, 0.1, 20, |now, _| {
        s.collaborators_mut().env.place(PLAYER, seg.start.lerp(seg.end, 0.5), seg.optimized_safe_speed * 0.5, 0.0);
        let report = s.tick(now, 0.1);
        (report.signals, report)
    });
    assert!(reports.iter().all(|r| r.signals.delta_p.is_some_and(|d| d > 0.0)));
    assert!(reports.iter().all(|r| r.adjustment.is_some_and(|a| a.written == 3)));
    assert_eq!(last.segment, Some(0));
    let after = s.collaborators().player_vehicle;
    assert!(after.max_steer_angle > before.max_steer_angle);
    assert!(after.full_torque > before.full_torque);
    assert!(after.brake_torque < before.brake_torque);
}

#[test]
fn missing_player_degrades_quietly() {
    let mut s = session(true);
    let report = s.tick(0.0, 0.0);
    assert_eq!(report.signals.delta_p, None);
    assert_eq!(report.signals.segment, None);
    assert_eq!(report.signals.skill, 0.5);
    assert_eq!(report.signals.correlation, 0.5);
    assert!(report.adjustment.is_none());
    assert_eq!(s.collaborators().player_vehicle, PlayerCar::default());
}

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[test]
fn missing_player_warns_once_per_outage() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let mut s = session(true);
    let start = s.track().segments()[0].start.lerp(s.track().segments()[0].end, 0.2);
    tracing::subscriber::with_default(subscriber, || {
        s.collaborators_mut().env.place(RIVAL, start, 60.0, 0.0);
        for i in 0..30 {
            s.tick(i as f64 * 0.1, 0.1);
        }
        assert!(s.player_missing());

        s.collaborators_mut().env.place(PLAYER, start, 60.0, 0.0);
        s.tick(3.0, 0.1);
        assert!(!s.player_missing());
        assert!(!s.correlation().agents_missing());

        s.collaborators_mut().env.agents.remove(&PLAYER);
        for i in 0..10 {
            s.tick(3.1 + i as f64 * 0.1, 0.1);
        }
    });

    let text = logs.text();
    assert_eq!(text.matches("player state unavailable").count(), 2, "{text}");
    assert_eq!(text.matches("correlation skipped").count(), 0, "{text}");

    s.reset();
    assert!(!s.player_missing());
}

/* ──────────────────────────────────────────────────────────────────────────
3) Snapshot, re-analysis and reset
────────────────────────────────────────────────────────────────────────── */

#[test]
fn snapshot_serialises() {
    let mut s = session(true);
    let frames = perfect_lap(s.track(), 0.0, 5);
    play(&mut s, &frames, 0.0);
    let snap = s.snapshot();
    assert_eq!(snap.segment, Some(0));
    assert!(snap.segment_difficulty.is_some());

    let json: serde_json::Value = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["segment"], 0);
    assert_eq!(json["evaluated_segments"], snap.evaluated_segments);
    assert_eq!(json["active_chromosome"], "Winning");
    assert!(json["coordinator"]["alpha"].is_f64());
    assert!(json["chromosome"]["speed"].is_f64());

    let back: SessionSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back.segment, snap.segment);
    assert_eq!(back.active_chromosome, snap.active_chromosome);
}

#[test]
fn reanalyze_follows_the_environment() {
    let mut s = session(false);
    let before = s.track().segments()[0].max_safe_speed;
    s.collaborators_mut().env.friction = Some(0.3);
    s.reanalyze();
    assert!(s.track().segments()[0].max_safe_speed < before);
    assert_eq!(s.skill().metrics().segment_skills.len(), s.track().len());
}

#[test]
fn reset_starts_over() {
    let mut s = session(true);
    let frames = perfect_lap(s.track(), 0.0, 30);
    play(&mut s, &frames, 0.0);
    assert_eq!(s.skill().overall_skill(), 1.0);

    s.reset();
    let snap = s.snapshot();
    assert_eq!(snap.overall_skill, 0.5);
    assert_eq!(snap.evaluated_segments, 0);
    assert!(snap.correlation.is_none());
    assert_eq!(snap.coordinator.alpha, 0.5);
    assert_eq!(snap.losing_frequency, 0.5);
    assert_eq!(snap.chromosome, race_balance::systems::opponent::Chromosome::WINNING);
    assert!(s.correlation().matches().is_empty());
}
