// src/genres/racing.rs
#![cfg(feature = "genre-racing")]

//! Racing genre orchestrator.
//!
//! [`RaceSession`] owns the analysed track and one instance of every system,
//! and advances them once per frame in dependency order (see
//! [`crate::genres::sdk`]). Everything it needs from the game comes through
//! [`Collaborators`]; nothing is discovered at runtime.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::BalanceConfig;
use crate::error::Result;
use crate::genres::sdk::Signals;
use crate::mechanics::control::rubber_band_error;
use crate::systems::adjuster::{Adjustment, ParameterAdjuster};
use crate::systems::coordinator::{ComplexityCoordinator, CoordinatorInputs, CoordinatorState};
use crate::systems::correlation::{CorrelationEngine, CorrelationMetrics};
use crate::systems::opponent::{ActiveChromosome, AdaptiveOpponent, Chromosome, OpponentInputs};
use crate::systems::sdk::{
    AgentHandle, AgentState, EnvironmentSampler, OpponentParam, ParameterSink, PlayerParam, RaceStandings,
};
use crate::systems::skill::{CollisionKind, SegmentScores, SegmentTarget, SkillScorer};
use crate::systems::track::{Track, Waypoint};

/// Everything the session talks to.
pub struct Collaborators<E, R, P, O> {
    pub env: E,
    pub standings: R,
    /// Tunable limits of the player's vehicle.
    pub player_vehicle: P,
    /// Tunable controller of the opponent.
    pub opponent_vehicle: O,
    pub player: AgentHandle,
    /// `None` for a solo session: correlation and opponent tuning idle.
    pub opponent: Option<AgentHandle>,
}

/// Serialisable view of the session for overlays and logs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub time: f64,
    pub overall_skill: f64,
    pub evaluated_segments: usize,
    pub correlation: Option<CorrelationMetrics>,
    pub coordinator: CoordinatorState,
    pub active_chromosome: ActiveChromosome,
    pub chromosome: Chromosome,
    pub losing_frequency: f64,
    pub segment: Option<usize>,
    pub segment_difficulty: Option<f64>,
}

/// What happened during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    pub signals: Signals,
    pub evaluated: Option<SegmentScores>,
    pub correlation: Option<CorrelationMetrics>,
    pub selection: Option<ActiveChromosome>,
    pub adjustment: Option<Adjustment>,
}

pub struct RaceSession<E, R, P, O> {
    cfg: BalanceConfig,
    track: Track,
    skill: SkillScorer,
    correlation: CorrelationEngine,
    coordinator: ComplexityCoordinator,
    opponent: AdaptiveOpponent,
    adjuster: ParameterAdjuster,
    io: Collaborators<E, R, P, O>,
    signals: Signals,
    player_missing: bool,
}

impl<E, R, P, O> RaceSession<E, R, P, O>
where
    E: EnvironmentSampler,
    R: RaceStandings,
    P: ParameterSink<PlayerParam>,
    O: ParameterSink<OpponentParam>,
{
    /// Validate the configuration, analyse the track and build every system.
    pub fn new(cfg: BalanceConfig, waypoints: Vec<Waypoint>, io: Collaborators<E, R, P, O>) -> Result<Self> {
        cfg.validate()?;
        let track = Track::analyze(waypoints, cfg.track, &io.env)?;
        let skill = SkillScorer::new(cfg.skill, track.len());
        info!(segments = track.len(), seed = cfg.seed, solo = io.opponent.is_none(), "race session ready");
        Ok(Self {
            cfg,
            skill,
            track,
            correlation: CorrelationEngine::new(cfg.correlation),
            coordinator: ComplexityCoordinator::new(cfg.coordinator, cfg.seed),
            opponent: AdaptiveOpponent::new(cfg.opponent, cfg.seed.wrapping_add(1)),
            adjuster: ParameterAdjuster::new(cfg.adjuster),
            io,
            signals: Signals::default(),
            player_missing: false,
        })
    }

    pub fn config(&self) -> &BalanceConfig { &self.cfg }
    pub fn track(&self) -> &Track { &self.track }
    pub fn skill(&self) -> &SkillScorer { &self.skill }
    pub fn correlation(&self) -> &CorrelationEngine { &self.correlation }
    pub fn coordinator(&self) -> &ComplexityCoordinator { &self.coordinator }
    pub fn opponent(&self) -> &AdaptiveOpponent { &self.opponent }
    pub fn adjuster(&self) -> &ParameterAdjuster { &self.adjuster }
    pub fn signals(&self) -> Signals { self.signals }
    /// True while the environment has no state for the player.
    pub fn player_missing(&self) -> bool { self.player_missing }
    pub fn collaborators(&self) -> &Collaborators<E, R, P, O> { &self.io }
    pub fn collaborators_mut(&mut self) -> &mut Collaborators<E, R, P, O> { &mut self.io }

    /// Collision events from the physics layer.
    pub fn register_collision(&mut self, kind: CollisionKind) {
        self.skill.register_collision(kind);
    }

    /// Advance every system by one frame at time `now` (seconds), `dt` after
    /// the previous frame.
    pub fn tick(&mut self, now: f64, dt: f64) -> TickReport {
        let mut report = TickReport::default();
        let player = self.io.env.agent_state(self.io.player);
        match (player.is_some(), self.player_missing) {
            (false, false) => warn!(agent = self.io.player.0, "player state unavailable"),
            (false, true) => trace!(agent = self.io.player.0, "player still unavailable"),
            (true, true) => debug!(agent = self.io.player.0, "player state available again"),
            (true, false) => {}
        }
        self.player_missing = player.is_none();

        // 1. where is the player
        let segment = player.and_then(|p| self.track.segment_at_position(p.position));
        let target = segment.map(|s| SegmentTarget {
            index: s.index,
            optimized_speed: s.target_speed(),
            recommended_time: s.recommended_time,
        });

        // 2. skill
        if let (Some(p), Some(t)) = (player, target) {
            report.evaluated = self.skill.track(now, Some(t), p.speed);
        }
        let skill = self.skill.overall_skill();

        // 3. correlation; a missing player is already reported above
        let opponent_state = self.io.opponent.and_then(|h| self.io.env.agent_state(h));
        if self.io.opponent.is_some() && player.is_some() {
            report.correlation = self.correlation.tick(now, player, opponent_state, skill);
        }
        let correlation = self.correlation.overall_or_neutral();

        // 4. coordinator
        let delta_p = player
            .zip(target)
            .map(|(p, t): (AgentState, SegmentTarget)| rubber_band_error(skill, t.optimized_speed, p.speed));
        let losing_frequency = self.io.opponent.map(|_| self.opponent.losing_frequency());
        let state = self.coordinator.update(dt, CoordinatorInputs { skill, delta_p, losing_frequency });

        // 5. opponent and player tuning
        if let Some(handle) = self.io.opponent {
            let inputs = OpponentInputs {
                player_rank: self.io.standings.rank(self.io.player),
                opponent_rank: self.io.standings.rank(handle),
                player_score: self.io.standings.progress_score(self.io.player),
                opponent_score: self.io.standings.progress_score(handle),
                correlation,
            };
            report.selection = self.opponent.tick(now, inputs, &mut self.io.opponent_vehicle);
        }
        if let Some(dp) = delta_p {
            report.adjustment = Some(self.adjuster.adjust(dp, Some(state.alpha), dt, &mut self.io.player_vehicle));
        }

        self.signals = Signals {
            now,
            skill,
            correlation,
            losing_frequency: losing_frequency.unwrap_or(0.5),
            alpha: state.alpha,
            delta_p,
            segment: target.map(|t| t.index),
        };
        report.signals = self.signals;
        report
    }

    /// Rebuild the track from the current environment (e.g. after obstacles
    /// moved). Per-segment skill is kept for segments that still exist.
    pub fn reanalyze(&mut self) {
        self.track.reanalyze(&self.io.env);
        self.skill.resize(self.track.len());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let metrics = self.skill.metrics();
        SessionSnapshot {
            time: self.signals.now,
            overall_skill: metrics.overall_skill,
            evaluated_segments: metrics.evaluated_segments,
            correlation: self.correlation.metrics().copied(),
            coordinator: *self.coordinator.state(),
            active_chromosome: self.opponent.active(),
            chromosome: *self.opponent.active_chromosome(),
            losing_frequency: self.opponent.losing_frequency(),
            segment: self.signals.segment,
            segment_difficulty: self.signals.segment.and_then(|i| self.track.difficulty(i)),
        }
    }

    /// Clear all histories and metrics and restore both chromosomes. The
    /// track is kept.
    pub fn reset(&mut self) {
        self.skill.reset();
        self.correlation.reset();
        self.coordinator.reset();
        self.opponent.reset();
        self.signals = Signals::default();
        self.player_missing = false;
        info!("race session reset");
    }
}
