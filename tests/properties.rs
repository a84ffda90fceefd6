// tests/properties.rs
#![cfg(feature = "genre-racing")]

mod common;

use common::{FakeEnv, OpponentCar};
use glam::DVec3;
use proptest::prelude::*;
use race_balance::mechanics::{physics, stats};
use race_balance::systems::coordinator::{ComplexityCoordinator, CoordinatorConfig, CoordinatorInputs};
use race_balance::systems::opponent::{AdaptiveOpponent, OpponentConfig, OpponentInputs};
use race_balance::systems::skill::{SegmentRun, SegmentTarget, SkillConfig, SkillScorer, CollisionKind};
use race_balance::systems::track::{Track, TrackConfig, Waypoint};

/// Star-shaped loop: increasing angles, random radii, so no two waypoints meet.
fn polygon() -> impl Strategy<Value = Vec<Waypoint>> {
    prop::collection::vec((60.0f64..300.0, -0.2f64..0.2, -3.0f64..3.0), 3..9).prop_map(|pts| {
        let n = pts.len() as f64;
        pts.iter()
            .enumerate()
            .map(|(i, (r, wobble, y))| {
                let a = (i as f64 + *wobble) * std::f64::consts::TAU / n;
                Waypoint::new(format!("WP {}", i + 1), DVec3::new(r * a.cos(), *y, r * a.sin()))
            })
            .collect()
    })
}

/* ──────────────────────────────────────────────────────────────────────────
1) Track physics
────────────────────────────────────────────────────────────────────────── */

proptest! {
    #[test]
    fn flat_safe_speed_follows_friction_circle(mu in 0.05f64..=1.0, r in 1.0f64..500.0) {
        let cfg = TrackConfig::default();
        let v = physics::safe_speed_kmh(0.0, mu, r, 10.0, 0.0, cfg.gravity, 0.0, f64::MAX);
        let expected = (mu * r * cfg.gravity).sqrt() * physics::KMH_PER_MS;
        prop_assert!((v - expected).abs() <= expected * 1e-9);

        let clamped = physics::safe_speed_kmh(0.0, mu, r, 10.0, 0.0, cfg.gravity, cfg.min_speed_kmh, cfg.max_speed_kmh);
        prop_assert!(clamped >= cfg.min_speed_kmh && clamped <= cfg.max_speed_kmh);
    }

    #[test]
    fn optimized_profile_never_exceeds_safe_speed(waypoints in polygon(), mu in 0.2f64..=1.0) {
        let env = FakeEnv::with_friction(mu);
        let mut track = Track::analyze(waypoints, TrackConfig::default(), &env).unwrap();
        let first: Vec<f64> = track.segments().iter().map(|s| s.optimized_safe_speed).collect();
        for s in track.segments() {
            prop_assert!(s.optimized_safe_speed.is_finite());
            prop_assert!(s.optimized_safe_speed <= s.max_safe_speed + 1e-9);
            prop_assert!(s.recommended_time >= track.config().min_recommended_time);
        }
        for i in 0..track.len() {
            let d = track.difficulty(i).unwrap();
            prop_assert!((0.0..=1.0).contains(&d));
        }

        track.reanalyze(&env);
        let again: Vec<f64> = track.segments().iter().map(|s| s.optimized_safe_speed).collect();
        prop_assert_eq!(first, again);
    }
}

/* ──────────────────────────────────────────────────────────────────────────
2) Scores stay in range
────────────────────────────────────────────────────────────────────────── */

proptest! {
    #[test]
    fn segment_skill_is_a_unit_score(
        collisions in 0u32..4,
        max_speed in 0.0f64..400.0,
        optimized in 1.0f64..300.0,
        elapsed in 0.0f64..60.0,
        recommended in 0.1f64..20.0,
    ) {
        let mut scorer = SkillScorer::new(SkillConfig::default(), 3);
        for _ in 0..collisions {
            scorer.register_collision(CollisionKind::Opponent);
        }
        let target = SegmentTarget { index: 1, optimized_speed: optimized, recommended_time: recommended };
        let scores = scorer.evaluate_segment(target, SegmentRun { max_speed, elapsed }).unwrap();
        for v in [scores.collision, scores.speed, scores.time, scores.skill, scorer.overall_skill()] {
            prop_assert!((0.0..=1.0).contains(&v), "{:?}", scores);
        }
    }

    #[test]
    fn shifted_correlation_is_bounded(
        pair in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 2..80),
        max_shift in 0usize..30,
    ) {
        let (x, y): (Vec<f64>, Vec<f64>) = pair.into_iter().unzip();
        let c = stats::best_shifted_correlation(&x, &y, max_shift);
        prop_assert!((-1.0..=1.0).contains(&c.value));
        prop_assert!(c.shift.unsigned_abs() as usize <= max_shift);
    }
}

/* ──────────────────────────────────────────────────────────────────────────
3) Controllers stay inside their bounds
────────────────────────────────────────────────────────────────────────── */

proptest! {
    #[test]
    fn alpha_stays_in_band(
        seed in any::<u64>(),
        steps in prop::collection::vec(
            (0.0f64..0.5, -0.2f64..1.2, prop::option::of(-2.0f64..2.0), prop::option::of(0.0f64..1.0)),
            1..200,
        ),
    ) {
        let cfg = CoordinatorConfig::default();
        let mut c = ComplexityCoordinator::new(cfg, seed);
        for (dt, skill, delta_p, losing_frequency) in steps {
            let s = c.update(dt, CoordinatorInputs { skill, delta_p, losing_frequency });
            prop_assert!(s.alpha >= cfg.alpha_min && s.alpha <= cfg.alpha_max);
            prop_assert!(s.target <= cfg.end_complexity + 1e-12);
        }
    }

    #[test]
    fn chromosome_genes_stay_in_range(
        seed in any::<u64>(),
        frames in prop::collection::vec((1u32..5, 1u32..5, 0.0f64..100.0, 0.0f64..100.0, -1.0f64..1.0), 1..60),
    ) {
        let cfg = OpponentConfig::default();
        let mut opp = AdaptiveOpponent::new(cfg, seed);
        let mut car = OpponentCar::default();
        for (i, (pr, or, ps, os, corr)) in frames.into_iter().enumerate() {
            let inputs = OpponentInputs {
                player_rank: Some(pr),
                opponent_rank: Some(or),
                player_score: Some(ps),
                opponent_score: Some(os),
                correlation: corr,
            };
            opp.tick(i as f64 * cfg.tuning_interval, inputs, &mut car);
            for g in opp.winning().genes().into_iter().chain(opp.losing().genes()) {
                prop_assert!(g >= cfg.factor_min && g <= cfg.factor_max);
            }
            prop_assert!((0.0..=1.0).contains(&opp.losing_frequency()));
        }
    }
}
