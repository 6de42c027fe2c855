//! Droid behavior state machine.
//!
//! A droid rises out of the floor, then loops between charging and shooting
//! until it is hit. A hit preempts whatever it was doing and starts a
//! fragment explosion; when that finishes the droid reports [`TickOutcome::Died`]
//! and the spawn director tears it down.
//!
//! ```text
//! Appearing ──▶ Charging ──▶ Shooting ─┐
//!                   ▲                  │ waiting time elapsed
//!                   └──────────────────┘
//!   (any of the above) ──hit──▶ Exploding ──▶ Dead
//! ```
//!
//! All motion is a pure function of `now - state entry time`, so the same
//! tick timestamps always produce the same transforms.

use std::f32::consts::PI;

use droidfall_common::{
    direction_to, require_positive, AgentId, ConfigError, Countdown, Easing, NodeRef, StateClock,
    Tick,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::collaborators::{Collaborators, ProjectileRequest};
use crate::cues::Cue;
use crate::fragment::ExplosionFragment;
use crate::spawn::AgentParams;

/// Behavior state of a droid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Rising from the spawn point to the resting point.
    Appearing,
    /// Swelling up before a shot.
    Charging,
    /// Recoiling after a shot and waiting for the next charge.
    Shooting,
    /// Hit; body parts flying apart.
    Exploding,
    /// Torn down.
    Dead,
}

impl AgentState {
    /// Whether the droid can still be hit.
    #[must_use]
    pub const fn is_hittable(self) -> bool {
        matches!(self, Self::Appearing | Self::Charging | Self::Shooting)
    }
}

/// Result of advancing a droid by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing happened: game over or droid already dead.
    Idle,
    /// The droid advanced.
    Running,
    /// The explosion finished on this tick.
    Died,
}

/// Animation timings shared by every droid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentTimings {
    /// Duration of the rise out of the floor (ms).
    pub appear_ms: f64,
    /// Duration of the recoil after a shot (ms).
    pub recoil_ms: f64,
    /// Duration of the explosion (ms).
    pub explosion_ms: f64,
    /// Distance each fragment travels.
    pub explosion_distance: f32,
    /// Resting position multiplier at the peak of the recoil.
    pub recoil_push: f32,
    /// Upper bound of the random scale jitter while charging.
    pub charge_jitter: f32,
}

impl Default for AgentTimings {
    fn default() -> Self {
        Self {
            appear_ms: 2000.0,
            recoil_ms: 1000.0,
            explosion_ms: 3000.0,
            explosion_distance: 3.0,
            recoil_push: 1.1,
            charge_jitter: 0.1,
        }
    }
}

impl AgentTimings {
    /// Rejects non-positive durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("appear_ms", self.appear_ms)?;
        require_positive("recoil_ms", self.recoil_ms)?;
        require_positive("explosion_ms", self.explosion_ms)?;
        require_positive("explosion_distance", f64::from(self.explosion_distance))?;
        require_positive("recoil_push", f64::from(self.recoil_push))?;
        if !self.charge_jitter.is_finite() || self.charge_jitter < 0.0 {
            return Err(ConfigError::invalid(
                "charge_jitter",
                self.charge_jitter,
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// One hostile droid.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    params: AgentParams,
    timings: AgentTimings,
    behavior: AgentState,
    clock: StateClock,
    waiting: Countdown,
    alive: bool,
    exploding: bool,
    exploding_time: Option<f64>,
    current_scale: f32,
    shooting_back_position: Vec3,
    position: Vec3,
    scale: f32,
    fragments: Vec<ExplosionFragment>,
    shots_fired: u32,
    rng: fastrand::Rng,
}

impl Agent {
    /// Creates a droid in the `Appearing` state at its spawn point.
    #[must_use]
    pub fn new(params: AgentParams, timings: AgentTimings, now: f64, rng: fastrand::Rng) -> Self {
        Self {
            id: AgentId::new(),
            params,
            timings,
            behavior: AgentState::Appearing,
            clock: StateClock::started_at(now),
            waiting: Countdown::new(params.waiting_time_ms),
            alive: true,
            exploding: false,
            exploding_time: None,
            current_scale: 1.0,
            shooting_back_position: params.end_position,
            position: params.start_position,
            scale: 1.0,
            fragments: Vec::new(),
            shots_fired: 0,
            rng,
        }
    }

    /// Droid ID.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Spawn parameters.
    #[must_use]
    pub fn params(&self) -> &AgentParams {
        &self.params
    }

    /// Current state, including the explosion and death overlays.
    #[must_use]
    pub fn state(&self) -> AgentState {
        if !self.alive {
            AgentState::Dead
        } else if self.exploding {
            AgentState::Exploding
        } else {
            self.behavior
        }
    }

    /// State that was active when the droid was hit, or the current one.
    #[must_use]
    pub fn behavior(&self) -> AgentState {
        self.behavior
    }

    /// Whether the droid has not been torn down yet.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the droid has been hit.
    #[must_use]
    pub fn is_exploding(&self) -> bool {
        self.exploding
    }

    /// Timestamp of the last state change.
    #[must_use]
    pub fn status_change_time(&self) -> f64 {
        self.clock.changed_at()
    }

    /// Time left before the next charge while shooting.
    #[must_use]
    pub fn waiting_time(&self) -> f64 {
        self.waiting.remaining()
    }

    /// Baseline of the explosion, once the first exploding tick ran.
    #[must_use]
    pub fn exploding_time(&self) -> Option<f64> {
        self.exploding_time
    }

    /// Last position written to the scene.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Last uniform scale written to the scene.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Scale the charge reached before the last shot.
    #[must_use]
    pub fn current_scale(&self) -> f32 {
        self.current_scale
    }

    /// Peak of the recoil animation.
    #[must_use]
    pub fn shooting_back_position(&self) -> Vec3 {
        self.shooting_back_position
    }

    /// Stored lifespan.
    #[must_use]
    pub fn lifespan(&self) -> f32 {
        self.params.lifespan
    }

    /// Fragments scattered by the hit.
    #[must_use]
    pub fn fragments(&self) -> &[ExplosionFragment] {
        &self.fragments
    }

    /// Projectiles requested so far, including the one fired on hit.
    #[must_use]
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    /// Advances the state machine.
    ///
    /// `head` is the head position sampled once for the whole tick.
    pub fn tick(&mut self, tick: Tick, head: Vec3, collab: &mut Collaborators<'_>) -> TickOutcome {
        if collab.game.is_game_over() || !self.alive {
            return TickOutcome::Idle;
        }

        if self.exploding {
            return self.tick_explosion(tick, collab);
        }

        let elapsed = self.clock.elapsed(tick.time);
        match self.behavior {
            AgentState::Appearing => self.tick_appearing(tick, elapsed, collab),
            AgentState::Charging => self.tick_charging(tick, elapsed, head, collab),
            AgentState::Shooting => self.tick_shooting(tick, elapsed, collab),
            AgentState::Exploding | AgentState::Dead => {}
        }

        collab.scene.look_at(self.id, head);
        TickOutcome::Running
    }

    /// Handles a hit.
    ///
    /// Returns `false` when the droid was already exploding or dead.
    pub fn collided(&mut self, head: Vec3, collab: &mut Collaborators<'_>) -> bool {
        if self.exploding || !self.alive {
            trace!(agent = %self.id, "ignoring hit on exploding droid");
            return false;
        }

        debug!(agent = %self.id, state = ?self.behavior, "droid hit");
        collab.audio.emit_cue(Cue::EnemyHit, self.id);
        self.shoot(head, collab);

        let distance = self.timings.explosion_distance;
        let starts = collab.scene.fragment_positions(self.id);
        self.fragments = starts
            .into_iter()
            .map(|start| ExplosionFragment::scatter(start, distance, &mut self.rng))
            .collect();
        self.exploding = true;
        true
    }

    fn tick_appearing(&mut self, tick: Tick, elapsed: f64, collab: &mut Collaborators<'_>) {
        let t = Easing::BackOut.apply((elapsed / self.timings.appear_ms) as f32);
        self.position = self
            .params
            .start_position
            .lerp(self.params.end_position, t);
        collab.scene.set_position(NodeRef::Agent(self.id), self.position);

        if elapsed >= self.timings.appear_ms {
            self.charge(tick.time, collab);
        }
    }

    fn tick_charging(
        &mut self,
        tick: Tick,
        elapsed: f64,
        head: Vec3,
        collab: &mut Collaborators<'_>,
    ) {
        let offset = (elapsed / self.params.charging_duration_ms) as f32;
        let jitter = self.rng.f32() * self.timings.charge_jitter;
        self.scale = offset / 2.0 + 1.0 + jitter;
        collab
            .scene
            .set_scale(NodeRef::Agent(self.id), Vec3::splat(self.scale));

        if elapsed >= self.params.charging_duration_ms {
            self.behavior = AgentState::Shooting;
            self.current_scale = self.scale;
            self.shooting_back_position = self.params.end_position * self.timings.recoil_push;
            self.clock.restart(tick.time);
            debug!(agent = %self.id, time = tick.time, "droid shooting");
            self.shoot(head, collab);
        }
    }

    fn tick_shooting(&mut self, tick: Tick, elapsed: f64, collab: &mut Collaborators<'_>) {
        let offset = elapsed / self.timings.recoil_ms;
        if offset <= 1.0 {
            self.scale = 1.0;
            collab
                .scene
                .set_scale(NodeRef::Agent(self.id), Vec3::splat(self.scale));

            let eased = Easing::ExponentialOut.apply(offset as f32);
            let back = 1.0 - (eased * PI).sin();
            self.position = self
                .shooting_back_position
                .lerp(self.params.end_position, back);
            collab.scene.set_position(NodeRef::Agent(self.id), self.position);
        }

        if self.waiting.advance(tick.delta) {
            self.charge(tick.time, collab);
        }
    }

    fn tick_explosion(&mut self, tick: Tick, collab: &mut Collaborators<'_>) -> TickOutcome {
        let started = *self.exploding_time.get_or_insert(tick.time);
        let t0 = (tick.time - started) / self.timings.explosion_ms;
        let t = Easing::ExponentialOut.apply(t0 as f32);
        let shrink = Vec3::splat((1.0 - t).max(0.0));
        let opacity = (1.0 - t0 as f32).clamp(0.0, 1.0);

        for (index, fragment) in self.fragments.iter().enumerate() {
            let node = NodeRef::Fragment {
                agent: self.id,
                index,
            };
            collab.scene.set_position(node, fragment.position_at(t));
            collab.scene.set_scale(node, shrink);
            collab.scene.set_opacity(node, opacity);
        }

        if t0 >= 1.0 {
            self.alive = false;
            debug!(agent = %self.id, "droid explosion finished");
            return TickOutcome::Died;
        }
        TickOutcome::Running
    }

    fn charge(&mut self, time: f64, collab: &mut Collaborators<'_>) {
        self.clock.restart(time);
        self.behavior = AgentState::Charging;
        debug!(agent = %self.id, time, "droid charging");
        collab.audio.emit_cue(Cue::Charging, self.id);
    }

    fn shoot(&mut self, head: Vec3, collab: &mut Collaborators<'_>) {
        collab.audio.emit_cue(Cue::Shooting, self.id);
        let direction = direction_to(self.position, head, Vec3::NEG_Y);
        collab.projectiles.spawn(ProjectileRequest {
            shooter: self.id,
            origin: self.position,
            direction,
            speed: self.params.bullet_speed,
        });
        self.shots_fired += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::SceneSink;
    use crate::events::{EventBus, SimEvent};
    use crate::headless::{FixedHead, HeadlessScene, ScoreBoard};

    const HEAD: Vec3 = Vec3::new(0.0, 1.6, 0.0);

    struct Rig {
        game: ScoreBoard,
        head: FixedHead,
        scene: HeadlessScene,
        bus: EventBus,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                game: ScoreBoard::default(),
                head: FixedHead::new(HEAD),
                scene: HeadlessScene::default(),
                bus: EventBus::new(4096),
            }
        }

        fn spawn(&mut self, charging_ms: f64, waiting_ms: f64) -> Agent {
            let params = AgentParams::builder()
                .start_position(Vec3::new(3.0, -10.0, 4.0))
                .end_position(Vec3::new(3.0, 12.0, 4.0))
                .waiting_time_ms(waiting_ms)
                .bullet_speed(6.5)
                .charging_duration_ms(charging_ms)
                .lifespan(2.0)
                .build()
                .expect("valid params");
            let agent = Agent::new(params, AgentTimings::default(), 0.0, fastrand::Rng::with_seed(1));
            self.scene.instantiate(agent.id(), params.start_position);
            agent
        }

        fn tick(&mut self, agent: &mut Agent, time: f64, delta: f64) -> TickOutcome {
            let mut audio = self.bus.sender();
            let mut projectiles = self.bus.sender();
            let mut collab = Collaborators::new(
                &self.game,
                &self.head,
                &mut self.scene,
                &mut audio,
                &mut projectiles,
            );
            agent.tick(Tick::new(time, delta), HEAD, &mut collab)
        }

        fn hit(&mut self, agent: &mut Agent) -> bool {
            let mut audio = self.bus.sender();
            let mut projectiles = self.bus.sender();
            let mut collab = Collaborators::new(
                &self.game,
                &self.head,
                &mut self.scene,
                &mut audio,
                &mut projectiles,
            );
            agent.collided(HEAD, &mut collab)
        }

        fn projectiles(&self) -> Vec<ProjectileRequest> {
            self.bus
                .drain()
                .into_iter()
                .filter_map(|event| match event {
                    SimEvent::ProjectileRequested(request) => Some(request),
                    _ => None,
                })
                .collect()
        }
    }

    /// Ticks at 10ms steps from `from` (exclusive) to `to` (inclusive).
    fn run(rig: &mut Rig, agent: &mut Agent, from: f64, to: f64) {
        let mut time = from;
        while time < to {
            let next = (time + 10.0).min(to);
            rig.tick(agent, next, next - time);
            time = next;
        }
    }

    #[test]
    fn test_appearing_rises_and_enters_charging() {
        let mut rig = Rig::new();
        let mut agent = rig.spawn(4000.0, 3000.0);

        rig.tick(&mut agent, 1000.0, 1000.0);
        assert_eq!(agent.state(), AgentState::Appearing);
        assert!(agent.position().y > 1.0, "back-out is past halfway at t=0.5");

        rig.tick(&mut agent, 1999.0, 999.0);
        assert_eq!(agent.state(), AgentState::Appearing);

        rig.tick(&mut agent, 2000.0, 1.0);
        assert_eq!(agent.state(), AgentState::Charging);
        assert_eq!(agent.status_change_time(), 2000.0);
        assert_eq!(agent.position(), agent.params().end_position);
        assert_eq!(rig.scene.facing(agent.id()), Some(HEAD));
    }

    #[test]
    fn test_charge_boundary_is_inclusive() {
        let mut rig = Rig::new();
        let mut agent = rig.spawn(4000.0, 3000.0);
        rig.tick(&mut agent, 2000.0, 2000.0);
        assert_eq!(agent.state(), AgentState::Charging);

        rig.tick(&mut agent, 5999.0, 3999.0);
        assert_eq!(agent.state(), AgentState::Charging);
        assert!(agent.scale() >= 1.0 + 3999.0 / 8000.0 - 1e-4);
        assert!(rig.projectiles().is_empty());

        rig.tick(&mut agent, 6000.0, 1.0);
        assert_eq!(agent.state(), AgentState::Shooting);
        assert_eq!(agent.status_change_time(), 6000.0);
        assert!(agent.current_scale() >= 1.5);
        assert_eq!(
            agent.shooting_back_position(),
            agent.params().end_position * 1.1
        );

        let shots = rig.projectiles();
        assert_eq!(shots.len(), 1);
        let expected = (HEAD - agent.position()).normalize();
        assert!((shots[0].direction - expected).length() < 1e-5);
        assert_eq!(shots[0].speed, 6.5);
        assert_eq!(shots[0].origin, agent.position());
    }

    #[test]
    fn test_recoil_returns_to_rest() {
        let mut rig = Rig::new();
        let mut agent = rig.spawn(4000.0, 3000.0);
        rig.tick(&mut agent, 2000.0, 2000.0);
        rig.tick(&mut agent, 6000.0, 4000.0);
        assert_eq!(agent.state(), AgentState::Shooting);

        rig.tick(&mut agent, 6070.0, 70.0);
        assert_eq!(agent.scale(), 1.0);
        let pushed = agent.position().distance(agent.params().end_position);
        assert!(pushed > 0.5, "droid is pushed back mid-recoil");

        rig.tick(&mut agent, 7000.0, 930.0);
        let rest = agent.position().distance(agent.params().end_position);
        assert!(rest < 1e-3);
    }

    #[test]
    fn test_shooting_recharges_after_waiting_time() {
        let mut rig = Rig::new();
        let mut agent = rig.spawn(4000.0, 2500.0);
        rig.tick(&mut agent, 2000.0, 2000.0);
        rig.tick(&mut agent, 6000.0, 4000.0);
        assert_eq!(agent.state(), AgentState::Shooting);

        run(&mut rig, &mut agent, 6000.0, 8490.0);
        assert_eq!(agent.state(), AgentState::Shooting);

        rig.tick(&mut agent, 8500.0, 10.0);
        assert_eq!(agent.state(), AgentState::Charging);
        assert_eq!(agent.status_change_time(), 8500.0);
        assert_eq!(agent.waiting_time(), 2500.0);

        // Second full cycle.
        run(&mut rig, &mut agent, 8500.0, 12_500.0);
        assert_eq!(agent.state(), AgentState::Shooting);
        assert_eq!(agent.shots_fired(), 2);
    }

    #[test]
    fn test_cycle_cues() {
        let mut rig = Rig::new();
        let mut agent = rig.spawn(4000.0, 2500.0);
        run(&mut rig, &mut agent, 0.0, 6000.0);

        let cues: Vec<Cue> = rig
            .bus
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                SimEvent::CueEmitted { cue, .. } => Some(cue),
                _ => None,
            })
            .collect();
        assert_eq!(cues, vec![Cue::Charging, Cue::Shooting]);
    }

    #[test]
    fn test_double_hit_is_idempotent() {
        let mut rig = Rig::new();
        let mut agent = rig.spawn(4000.0, 3000.0);
        rig.tick(&mut agent, 2500.0, 2500.0);
        assert_eq!(agent.state(), AgentState::Charging);

        assert!(rig.hit(&mut agent));
        assert!(!rig.hit(&mut agent));

        assert_eq!(agent.state(), AgentState::Exploding);
        assert_eq!(agent.behavior(), AgentState::Charging);
        assert_eq!(agent.fragments().len(), rig.scene.fragment_positions(agent.id()).len());
        assert_eq!(rig.projectiles().len(), 1);
    }

    #[test]
    fn test_explosion_baseline_is_lazy() {
        let mut rig = Rig::new();
        let mut agent = rig.spawn(4000.0, 3000.0);
        rig.tick(&mut agent, 1000.0, 1000.0);
        assert!(rig.hit(&mut agent));
        assert_eq!(agent.exploding_time(), None);

        assert_eq!(rig.tick(&mut agent, 2500.0, 1500.0), TickOutcome::Running);
        assert_eq!(agent.exploding_time(), Some(2500.0));

        assert_eq!(rig.tick(&mut agent, 4000.0, 1500.0), TickOutcome::Running);
        let node = NodeRef::Fragment {
            agent: agent.id(),
            index: 0,
        };
        let opacity = rig.scene.opacity(node).expect("fragment exists");
        assert!((opacity - 0.5).abs() < 1e-5);

        assert_eq!(rig.tick(&mut agent, 5499.0, 1499.0), TickOutcome::Running);
        assert_eq!(rig.tick(&mut agent, 5500.0, 1.0), TickOutcome::Died);
        assert_eq!(agent.state(), AgentState::Dead);

        let end = agent.fragments()[0].end_position;
        assert!(rig.scene.position(node).expect("fragment exists").distance(end) < 1e-5);
        assert_eq!(rig.scene.opacity(node), Some(0.0));
    }

    #[test]
    fn test_hit_preempts_every_active_state() {
        for (time, expected) in [
            (500.0, AgentState::Appearing),
            (3000.0, AgentState::Charging),
            (6500.0, AgentState::Shooting),
        ] {
            let mut rig = Rig::new();
            let mut agent = rig.spawn(4000.0, 3000.0);
            run(&mut rig, &mut agent, 0.0, time);
            assert_eq!(agent.state(), expected);

            assert!(rig.hit(&mut agent));
            let mut outcome = TickOutcome::Running;
            let mut now = time;
            while outcome == TickOutcome::Running {
                now += 100.0;
                outcome = rig.tick(&mut agent, now, 100.0);
                assert_ne!(agent.state(), expected);
            }
            assert_eq!(outcome, TickOutcome::Died);
            assert_eq!(now, time + 3100.0);
        }
    }

    #[test]
    fn test_dead_and_game_over_ticks_are_noops() {
        let mut rig = Rig::new();
        let mut agent = rig.spawn(4000.0, 3000.0);
        rig.game.end_game();
        assert_eq!(rig.tick(&mut agent, 5000.0, 5000.0), TickOutcome::Idle);
        assert_eq!(agent.state(), AgentState::Appearing);
        assert_eq!(agent.position(), agent.params().start_position);

        rig.game.resume();
        assert!(rig.hit(&mut agent));
        rig.tick(&mut agent, 5000.0, 0.0);
        assert_eq!(rig.tick(&mut agent, 8000.0, 3000.0), TickOutcome::Died);
        assert_eq!(rig.tick(&mut agent, 9000.0, 1000.0), TickOutcome::Idle);
        assert!(!rig.hit(&mut agent));
    }

    #[test]
    fn test_timings_validation() {
        assert!(AgentTimings::default().validate().is_ok());
        let bad = AgentTimings {
            explosion_ms: 0.0,
            ..AgentTimings::default()
        };
        assert!(bad.validate().is_err());
    }
}
