//! Headless arena loop.
//!
//! Runs a session against in-memory collaborators. A scripted player fires
//! at a random droid on a fixed interval and scores one point per hit.

use anyhow::Result;
use droidfall_common::{AgentId, Countdown};
use droidfall_gameplay::{
    EventBus, FixedHead, GameState, HeadlessScene, Host, ScoreBoard, Session,
    SilentBackend, SimEvent, DROID_BODY,
};
use glam::Vec3;
use std::f32::consts::TAU;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::timing::FixedStep;

/// Height of the player's head above the arena floor.
const HEAD_HEIGHT: f32 = 1.6;

/// Totals of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks simulated
    pub ticks: u64,
    /// Simulated milliseconds
    pub sim_ms: u64,
    /// Projectiles fired by droids
    pub droid_shots: u32,
    /// Hits landed by the player
    pub hits: u32,
    /// Droids whose explosion finished
    pub kills: u32,
    /// Droids spawned, replacements included
    pub spawned: u64,
    /// Final score
    pub points: u32,
    /// Whether the run ended on game over
    pub game_over: bool,
}

/// Local offsets of `count` body parts.
///
/// The stock body is used when it has the requested size; other counts are
/// laid out on a ring.
#[must_use]
pub fn body_offsets(count: usize) -> Vec<Vec3> {
    if count == DROID_BODY.len() {
        return DROID_BODY.to_vec();
    }
    (0..count)
        .map(|i| {
            let angle = i as f32 * TAU / count as f32;
            Vec3::new(angle.cos() * 0.5, 0.0, angle.sin() * 0.5)
        })
        .collect()
}

/// Session plus headless collaborators.
#[derive(Debug)]
pub struct Arena {
    session: Session<SilentBackend>,
    scene: HeadlessScene,
    board: ScoreBoard,
    head: FixedHead,
    bus: EventBus,
    clock: FixedStep,
    trigger: Option<Countdown>,
    rng: fastrand::Rng,
    duration_ms: f64,
    game_over_points: u32,
    realtime: bool,
    summary: RunSummary,
}

impl Arena {
    /// Builds the arena; fails on invalid droid tuning.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let seed = config.resolve_seed();
        info!(seed, tick_rate = config.tick_rate, "arena seed");

        let session = Session::with_tuning(
            config.spawn.clone(),
            config.timings.clone(),
            seed,
            SilentBackend::default(),
        )?;

        Ok(Self {
            session,
            scene: HeadlessScene::with_body(body_offsets(config.fragments_per_droid)),
            board: ScoreBoard::default(),
            head: FixedHead::new(Vec3::new(0.0, HEAD_HEIGHT, 0.0)),
            bus: EventBus::default(),
            clock: FixedStep::new(config.tick_rate),
            trigger: (config.fire_interval_ms > 0.0).then(|| Countdown::new(config.fire_interval_ms)),
            rng: fastrand::Rng::with_seed(seed.wrapping_add(1)),
            duration_ms: config.duration_secs * 1000.0,
            game_over_points: config.game_over_points,
            realtime: config.realtime,
            summary: RunSummary::default(),
        })
    }

    /// The session being driven.
    #[must_use]
    pub fn session(&self) -> &Session<SilentBackend> {
        &self.session
    }

    /// Totals so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Spawns the initial droids.
    pub fn start(&mut self) -> Result<()> {
        let mut projectiles = self.bus.sender();
        let mut host = Host::new(&self.board, &self.head, &mut self.scene, &mut projectiles);
        self.session.start(self.clock.now_ms(), &mut host)?;
        self.summary.spawned = self.session.director().total_spawned();
        Ok(())
    }

    /// Simulates one tick. Returns `false` once the run is over.
    pub fn step(&mut self) -> Result<bool> {
        let tick = self.clock.advance();
        let report = {
            let mut projectiles = self.bus.sender();
            let mut host = Host::new(&self.board, &self.head, &mut self.scene, &mut projectiles);
            self.session.tick(tick, &mut host)?
        };

        self.summary.ticks += 1;
        self.summary.sim_ms = tick.time as u64;
        self.summary.kills += report.deaths.len() as u32;
        self.summary.spawned = self.session.director().total_spawned();
        self.summary.droid_shots += self
            .bus
            .drain()
            .iter()
            .filter(|event| matches!(event, SimEvent::ProjectileRequested(_)))
            .count() as u32;

        let armed = !self.board.is_game_over();
        if armed && self.trigger.as_mut().is_some_and(|t| t.advance(tick.delta)) {
            self.fire();
        }

        if self.game_over_points > 0
            && self.board.points() >= self.game_over_points
            && !self.board.is_game_over()
        {
            info!(points = self.board.points(), "score limit reached");
            self.board.end_game();
        }

        Ok(!self.session.is_over() && tick.time < self.duration_ms)
    }

    /// Runs until game over or the configured duration.
    pub fn run(mut self) -> Result<RunSummary> {
        self.start()?;
        self.clock.reset();

        'run: loop {
            let due = if self.realtime { self.clock.frame() } else { 1 };
            for _ in 0..due {
                if !self.step()? {
                    break 'run;
                }
            }
            if self.realtime {
                self.clock.sleep_remainder();
            }
        }

        self.summary.points = self.board.points();
        self.summary.game_over = self.session.is_over();
        Ok(self.summary)
    }

    fn fire(&mut self) {
        let targets: Vec<AgentId> = self
            .session
            .director()
            .agents()
            .iter()
            .filter(|agent| agent.state().is_hittable())
            .map(|agent| agent.id())
            .collect();
        if targets.is_empty() {
            return;
        }

        let target = targets[self.rng.usize(..targets.len())];
        let mut projectiles = self.bus.sender();
        let mut host = Host::new(&self.board, &self.head, &mut self.scene, &mut projectiles);
        if self.session.hit(target, &mut host) {
            self.board.award(1);
            self.summary.hits += 1;
            debug!(agent = %target, points = self.board.points(), "player hit");
        }
    }
}

/// Runs a headless arena with `config`.
pub fn run(config: &EngineConfig) -> Result<RunSummary> {
    let summary = Arena::new(config)?.run()?;
    info!(
        ticks = summary.ticks,
        seconds = summary.sim_ms as f64 / 1000.0,
        droid_shots = summary.droid_shots,
        hits = summary.hits,
        kills = summary.kills,
        spawned = summary.spawned,
        points = summary.points,
        game_over = summary.game_over,
        "arena finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig {
            tick_rate: 50,
            duration_secs: 30.0,
            seed: Some(99),
            fire_interval_ms: 0.0,
            game_over_points: 0,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_body_offsets() {
        assert_eq!(body_offsets(4), DROID_BODY.to_vec());
        let ring = body_offsets(6);
        assert_eq!(ring.len(), 6);
        assert!(ring.iter().all(|p| (p.length() - 0.5).abs() < 1e-5));
    }

    #[test]
    fn test_run_without_player() {
        let summary = run(&config()).expect("run");
        assert_eq!(summary.ticks, 1500);
        assert_eq!(summary.sim_ms, 30_000);
        assert_eq!(summary.hits, 0);
        assert_eq!(summary.kills, 0);
        assert_eq!(summary.spawned, 3);
        assert!(summary.droid_shots >= 3);
        assert!(!summary.game_over);
    }

    #[test]
    fn test_every_kill_is_replaced() {
        let config = EngineConfig {
            fire_interval_ms: 1000.0,
            ..config()
        };
        let summary = run(&config).expect("run");
        assert!(summary.hits > 0);
        assert!(summary.kills > 0);
        assert!(summary.kills <= summary.hits);
        assert_eq!(summary.spawned, 3 + u64::from(summary.kills));
        assert_eq!(summary.points, summary.hits);
    }

    #[test]
    fn test_score_limit_ends_run() {
        let config = EngineConfig {
            fire_interval_ms: 500.0,
            game_over_points: 2,
            duration_secs: 600.0,
            ..config()
        };
        let summary = run(&config).expect("run");
        assert!(summary.game_over);
        assert_eq!(summary.points, 2);
        assert!(summary.sim_ms < 600_000);
    }

    #[test]
    fn test_arena_keeps_population() {
        let config = EngineConfig {
            fire_interval_ms: 200.0,
            ..config()
        };
        let mut arena = Arena::new(&config).expect("arena");
        arena.start().expect("start");
        while arena.step().expect("step") {
            assert_eq!(arena.session().director().population(), 3);
        }
    }

    #[test]
    fn test_invalid_tuning_is_rejected() {
        let mut config = config();
        config.spawn.points_per_level = 0;
        assert!(Arena::new(&config).is_err());
    }
}
