//! Play session: the spawn director wired to a sound board.
//!
//! The session owns the audio listener. It is created on the first call and
//! follows the player's head on every tick.

use droidfall_common::{AgentId, ConfigError, TeardownError, Tick};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::AgentTimings;
use crate::collaborators::{
    AudioCueSink, Collaborators, GameState, HeadTracker, ProjectileFactory, SceneSink,
};
use crate::cues::Cue;
use crate::director::{SpawnDirector, TickReport};
use crate::sound::{AudioBackend, ListenerHandle, ListenerSlot, SoundBoard};
use crate::spawn::SpawnTuning;

// ============================================================================
// Session phase
// ============================================================================

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Created, no droids yet.
    #[default]
    Idle,
    /// Droids are live.
    Running,
    /// The game is over and droids are frozen.
    Over,
}

impl SessionPhase {
    /// Whether droids are being simulated.
    #[must_use]
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

// ============================================================================
// Host collaborators
// ============================================================================

/// Collaborators supplied by the host; audio is handled by the session.
pub struct Host<'a> {
    /// Score and phase.
    pub game: &'a dyn GameState,
    /// Head position source.
    pub head: &'a dyn HeadTracker,
    /// Transform sink and scene lifecycle.
    pub scene: &'a mut dyn SceneSink,
    /// Projectile factory.
    pub projectiles: &'a mut dyn ProjectileFactory,
}

impl<'a> Host<'a> {
    /// Bundles the host collaborators.
    pub fn new(
        game: &'a dyn GameState,
        head: &'a dyn HeadTracker,
        scene: &'a mut dyn SceneSink,
        projectiles: &'a mut dyn ProjectileFactory,
    ) -> Self {
        Self {
            game,
            head,
            scene,
            projectiles,
        }
    }
}

struct CueRouter<'s, B: AudioBackend> {
    board: &'s mut SoundBoard<B>,
    listener: ListenerHandle,
}

impl<B: AudioBackend> AudioCueSink for CueRouter<'_, B> {
    fn emit_cue(&mut self, cue: Cue, agent: AgentId) {
        self.board.dispatch(cue, agent, self.listener);
    }

    fn release(&mut self, agent: AgentId) -> Result<(), TeardownError> {
        self.board.release(agent)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Director, sound board and listener for one game.
#[derive(Debug)]
pub struct Session<B: AudioBackend> {
    director: SpawnDirector,
    sounds: SoundBoard<B>,
    listener: ListenerSlot,
    phase: SessionPhase,
}

impl<B: AudioBackend> Session<B> {
    /// Creates a session from its parts.
    pub fn new(director: SpawnDirector, sounds: SoundBoard<B>) -> Self {
        Self {
            director,
            sounds,
            listener: ListenerSlot::default(),
            phase: SessionPhase::Idle,
        }
    }

    /// Creates a session with the stock droid sounds.
    pub fn with_tuning(
        tuning: SpawnTuning,
        timings: AgentTimings,
        seed: u64,
        backend: B,
    ) -> Result<Self, ConfigError> {
        let director = SpawnDirector::new(tuning, timings, seed)?;
        Ok(Self::new(director, SoundBoard::with_droid_sounds(backend)))
    }

    /// Spawn director.
    #[must_use]
    pub fn director(&self) -> &SpawnDirector {
        &self.director
    }

    /// Sound board.
    #[must_use]
    pub fn sounds(&self) -> &SoundBoard<B> {
        &self.sounds
    }

    /// Audio listener, once created.
    #[must_use]
    pub fn listener(&self) -> Option<ListenerHandle> {
        self.listener.get()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the session has seen the game end.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::Over
    }

    /// Spawns the initial droids.
    pub fn start(&mut self, now: f64, host: &mut Host<'_>) -> Result<Vec<AgentId>, ConfigError> {
        let ids = self.route(host, |director, collab| director.start(now, collab))?;
        self.phase = SessionPhase::Running;
        Ok(ids)
    }

    /// Advances every droid by one tick.
    pub fn tick(&mut self, tick: Tick, host: &mut Host<'_>) -> Result<TickReport, ConfigError> {
        let listener = self.listener.get_or_init(self.sounds.backend_mut());
        let head = host.head.head_position();
        self.sounds.backend_mut().set_listener_position(listener, head);

        let report = self.route(host, |director, collab| director.tick(tick, collab))?;

        match (self.phase, report.frozen) {
            (SessionPhase::Running, true) => {
                info!(
                    points = host.game.points(),
                    spawned = self.director.total_spawned(),
                    destroyed = self.director.total_deaths(),
                    "session over"
                );
                self.phase = SessionPhase::Over;
            },
            (SessionPhase::Over, false) => self.phase = SessionPhase::Running,
            _ => {},
        }
        Ok(report)
    }

    /// Delivers a hit to a droid.
    pub fn hit(&mut self, agent: AgentId, host: &mut Host<'_>) -> bool {
        self.route(host, |director, collab| director.hit(agent, collab))
    }

    fn route<R>(
        &mut self,
        host: &mut Host<'_>,
        f: impl FnOnce(&mut SpawnDirector, &mut Collaborators<'_>) -> R,
    ) -> R {
        let listener = self.listener.get_or_init(self.sounds.backend_mut());
        let mut router = CueRouter {
            board: &mut self.sounds,
            listener,
        };
        let mut collab = Collaborators::new(
            host.game,
            host.head,
            &mut *host.scene,
            &mut router,
            &mut *host.projectiles,
        );
        f(&mut self.director, &mut collab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::headless::{FixedHead, HeadlessScene, ScoreBoard};
    use crate::sound::SilentBackend;
    use glam::Vec3;

    fn session() -> Session<SilentBackend> {
        Session::with_tuning(
            SpawnTuning::default(),
            AgentTimings::default(),
            9,
            SilentBackend::default(),
        )
        .expect("default tuning is valid")
    }

    #[test]
    fn test_start_plays_appearing_sounds() {
        let game = ScoreBoard::default();
        let head = FixedHead::new(Vec3::new(0.0, 1.6, 0.0));
        let mut scene = HeadlessScene::default();
        let mut projectiles = EventBus::default().sender();
        let mut session = session();

        let ids = session
            .start(0.0, &mut Host::new(&game, &head, &mut scene, &mut projectiles))
            .expect("start");
        assert_eq!(ids.len(), 3);
        assert!(session.phase().is_running());
        assert_eq!(session.sounds().active_count(), 3);
        assert_eq!(session.sounds().backend().playing_count("robots0.ogg"), 3);
        assert_eq!(session.sounds().backend().listener_count(), 1);
    }

    #[test]
    fn test_listener_follows_head() {
        let game = ScoreBoard::default();
        let mut head = FixedHead::new(Vec3::new(0.0, 1.6, 0.0));
        let mut scene = HeadlessScene::default();
        let mut projectiles = EventBus::default().sender();
        let mut session = session();

        session
            .start(0.0, &mut Host::new(&game, &head, &mut scene, &mut projectiles))
            .expect("start");
        head.set(Vec3::new(1.0, 1.7, -0.5));
        session
            .tick(
                Tick::new(16.0, 16.0),
                &mut Host::new(&game, &head, &mut scene, &mut projectiles),
            )
            .expect("tick");

        let listener = session.listener().expect("listener created");
        assert_eq!(
            session.sounds().backend().listener_position(listener),
            Some(Vec3::new(1.0, 1.7, -0.5))
        );
        assert_eq!(session.sounds().backend().listener_count(), 1);
    }

    #[test]
    fn test_death_releases_sounds() {
        let game = ScoreBoard::default();
        let head = FixedHead::new(Vec3::new(0.0, 1.6, 0.0));
        let mut scene = HeadlessScene::default();
        let mut projectiles = EventBus::default().sender();
        let mut session = session();

        session
            .start(0.0, &mut Host::new(&game, &head, &mut scene, &mut projectiles))
            .expect("start");
        let victim = session.director().agents()[0].id();
        assert!(session.hit(victim, &mut Host::new(&game, &head, &mut scene, &mut projectiles)));
        assert_eq!(session.sounds().backend().play_count("explosion0.ogg"), 1);

        for time in [1000.0, 4000.0] {
            session
                .tick(
                    Tick::new(time, 1000.0),
                    &mut Host::new(&game, &head, &mut scene, &mut projectiles),
                )
                .expect("tick");
        }
        assert!(session.sounds().emitters(victim).is_none());
        assert_eq!(session.sounds().active_count(), 3);
        assert_eq!(session.sounds().backend().source_count(), 12);
    }

    #[test]
    fn test_game_over_is_noticed_once() {
        let mut game = ScoreBoard::default();
        let head = FixedHead::default();
        let mut scene = HeadlessScene::default();
        let mut projectiles = EventBus::default().sender();
        let mut session = session();

        session
            .start(0.0, &mut Host::new(&game, &head, &mut scene, &mut projectiles))
            .expect("start");
        game.end_game();
        for step in 1..=3 {
            let report = session
                .tick(
                    Tick::new(f64::from(step) * 100.0, 100.0),
                    &mut Host::new(&game, &head, &mut scene, &mut projectiles),
                )
                .expect("tick");
            assert!(report.frozen);
        }
        assert!(session.is_over());

        game.resume();
        session
            .tick(
                Tick::new(400.0, 100.0),
                &mut Host::new(&game, &head, &mut scene, &mut projectiles),
            )
            .expect("tick");
        assert_eq!(session.phase(), SessionPhase::Running);
    }
}
