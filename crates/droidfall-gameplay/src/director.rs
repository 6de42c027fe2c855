//! Spawn director: owns the live droids and keeps their number constant.
//!
//! Every droid whose explosion finishes is removed, torn down and replaced
//! inside the same tick.

use droidfall_common::{AgentId, ConfigError, Tick};
use tracing::{debug, info, trace, warn};

use crate::agent::{Agent, AgentTimings};
use crate::collaborators::Collaborators;
use crate::cues::Cue;
use crate::spawn::{AgentParams, SpawnTuning};

/// What a director tick changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Droids whose explosion finished.
    pub deaths: Vec<AgentId>,
    /// Replacements spawned for them.
    pub spawned: Vec<AgentId>,
    /// Whether the tick was skipped because the game is over.
    pub frozen: bool,
}

/// Registry of live droids.
#[derive(Debug)]
pub struct SpawnDirector {
    agents: Vec<Agent>,
    tuning: SpawnTuning,
    timings: AgentTimings,
    rng: fastrand::Rng,
    now: f64,
    total_spawned: u64,
    total_deaths: u64,
    frozen: bool,
}

impl SpawnDirector {
    /// Creates an empty director.
    pub fn new(tuning: SpawnTuning, timings: AgentTimings, seed: u64) -> Result<Self, ConfigError> {
        tuning.validate()?;
        timings.validate()?;
        Ok(Self {
            agents: Vec::new(),
            tuning,
            timings,
            rng: fastrand::Rng::with_seed(seed),
            now: 0.0,
            total_spawned: 0,
            total_deaths: 0,
            frozen: false,
        })
    }

    /// Spawn tuning in use.
    #[must_use]
    pub fn tuning(&self) -> &SpawnTuning {
        &self.tuning
    }

    /// Live droids, in no particular order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Looks up a live droid.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    /// Number of live droids.
    #[must_use]
    pub fn population(&self) -> usize {
        self.agents.len()
    }

    /// Droids spawned since creation, replacements included.
    #[must_use]
    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    /// Droids torn down since creation.
    #[must_use]
    pub fn total_deaths(&self) -> u64 {
        self.total_deaths
    }

    /// Spawns the initial population at `now`.
    pub fn start(
        &mut self,
        now: f64,
        collab: &mut Collaborators<'_>,
    ) -> Result<Vec<AgentId>, ConfigError> {
        self.now = now;
        let ids = (0..self.tuning.initial_population)
            .map(|_| self.spawn(collab))
            .collect::<Result<Vec<_>, _>>()?;
        info!(population = self.agents.len(), "droids deployed");
        Ok(ids)
    }

    /// Creates one droid with fresh random parameters.
    pub fn spawn(&mut self, collab: &mut Collaborators<'_>) -> Result<AgentId, ConfigError> {
        let points = collab.game.points();
        let params = self.tuning.roll(points, &mut self.rng)?;
        Ok(self.place(params, points, collab))
    }

    fn place(&mut self, params: AgentParams, points: u32, collab: &mut Collaborators<'_>) -> AgentId {
        let agent_rng = fastrand::Rng::with_seed(self.rng.u64(..));
        let agent = Agent::new(params, self.timings.clone(), self.now, agent_rng);
        let id = agent.id();

        debug!(
            agent = %id,
            level = self.tuning.level(points),
            waiting_ms = params.waiting_time_ms,
            bullet_speed = params.bullet_speed,
            charging_ms = params.charging_duration_ms,
            lifespan = params.lifespan,
            "droid spawned"
        );

        collab.scene.instantiate(id, params.start_position);
        self.agents.push(agent);
        self.total_spawned += 1;
        collab.audio.emit_cue(Cue::Appearing, id);
        id
    }

    /// Advances every droid and replaces the ones that died.
    pub fn tick(
        &mut self,
        tick: Tick,
        collab: &mut Collaborators<'_>,
    ) -> Result<TickReport, ConfigError> {
        self.now = tick.time;

        if collab.game.is_game_over() {
            if !self.frozen {
                info!(time = tick.time, "game over, droids frozen");
                self.frozen = true;
            }
            return Ok(TickReport {
                frozen: true,
                ..TickReport::default()
            });
        }
        if self.frozen {
            info!(time = tick.time, "droids resumed");
            self.frozen = false;
        }

        let head = collab.head.head_position();
        for agent in &mut self.agents {
            agent.tick(tick, head, collab);
        }

        // Dead droids stay registered until their replacement is rolled.
        let dead: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|agent| !agent.is_alive())
            .map(Agent::id)
            .collect();
        let points = collab.game.points();
        let replacements = dead
            .iter()
            .map(|_| self.tuning.roll(points, &mut self.rng))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = TickReport::default();
        for (id, params) in dead.into_iter().zip(replacements) {
            self.retire(id, collab);
            report.deaths.push(id);
            report.spawned.push(self.place(params, points, collab));
        }
        Ok(report)
    }

    /// Delivers a hit to a droid.
    ///
    /// Returns `false` for unknown droids and droids already exploding.
    pub fn hit(&mut self, id: AgentId, collab: &mut Collaborators<'_>) -> bool {
        let head = collab.head.head_position();
        match self.agents.iter_mut().find(|agent| agent.id() == id) {
            Some(agent) => agent.collided(head, collab),
            None => {
                trace!(agent = %id, "hit on unknown droid ignored");
                false
            },
        }
    }

    fn retire(&mut self, id: AgentId, collab: &mut Collaborators<'_>) {
        if let Some(index) = self.agents.iter().position(|agent| agent.id() == id) {
            self.agents.swap_remove(index);
        }
        self.total_deaths += 1;

        if let Err(e) = collab.scene.destroy(id) {
            warn!(agent = %id, "scene teardown failed: {e}");
        }
        if let Err(e) = collab.audio.release(id) {
            warn!(agent = %id, "audio teardown failed: {e}");
        }
        debug!(agent = %id, "droid removed");
    }
}
