//! End-to-end runs of a session against the headless collaborators.

use droidfall_common::Tick;
use droidfall_gameplay::prelude::*;
use glam::Vec3;

const STEP_MS: f64 = 50.0;

struct Arena {
    game: ScoreBoard,
    head: FixedHead,
    scene: HeadlessScene,
    bus: EventBus,
    session: Session<SilentBackend>,
    time: f64,
}

impl Arena {
    fn new(seed: u64) -> Self {
        let session = Session::with_tuning(
            SpawnTuning::default(),
            AgentTimings::default(),
            seed,
            SilentBackend::default(),
        )
        .expect("default tuning is valid");
        Self {
            game: ScoreBoard::default(),
            head: FixedHead::new(Vec3::new(0.0, 1.6, 0.0)),
            scene: HeadlessScene::default(),
            bus: EventBus::new(4096),
            session,
            time: 0.0,
        }
    }

    fn start(&mut self) {
        let mut projectiles = self.bus.sender();
        let mut host = Host::new(&self.game, &self.head, &mut self.scene, &mut projectiles);
        self.session.start(self.time, &mut host).expect("start");
    }

    fn step(&mut self) -> TickReport {
        self.time += STEP_MS;
        let mut projectiles = self.bus.sender();
        let mut host = Host::new(&self.game, &self.head, &mut self.scene, &mut projectiles);
        self.session
            .tick(Tick::new(self.time, STEP_MS), &mut host)
            .expect("tick")
    }

    fn hit(&mut self, agent: droidfall_common::AgentId) -> bool {
        let mut projectiles = self.bus.sender();
        let mut host = Host::new(&self.game, &self.head, &mut self.scene, &mut projectiles);
        self.session.hit(agent, &mut host)
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

#[test]
fn droids_cycle_and_fire_at_the_head() {
    let mut arena = Arena::new(11);
    arena.start();

    // 2000 ms appearing, 6000 ms charging.
    while arena.time < 8000.0 {
        arena.step();
    }
    let shots = arena.projectiles();
    assert_eq!(shots.len(), 3);
    for shot in &shots {
        assert!((shot.direction.length() - 1.0).abs() < 1e-4);
        let shooter = arena.session.director().agent(shot.shooter).expect("live");
        assert_eq!(shooter.state(), AgentState::Shooting);
        let aim = (arena.head.head_position() - shot.origin).normalize();
        assert!(aim.dot(shot.direction) > 0.999);
        assert!((6.0..=8.0).contains(&shot.speed));
    }

    // Waiting 5000 ms at most, then another full charge.
    while arena.time < 8000.0 + 5000.0 + 6000.0 {
        arena.step();
    }
    assert_eq!(arena.projectiles().len(), 3);
}

#[test]
fn every_kill_is_replaced() {
    let mut arena = Arena::new(23);
    arena.start();

    for round in 0..5 {
        let target = arena.session.director().agents()[0].id();
        assert!(arena.hit(target));
        arena.game.award(1);

        let mut deaths = Vec::new();
        for _ in 0..70 {
            deaths.extend(arena.step().deaths);
        }
        assert_eq!(deaths, vec![target], "round {round}");
        assert_eq!(arena.session.director().population(), 3);
        assert_eq!(arena.scene.len(), 3);
    }

    assert_eq!(arena.session.director().total_spawned(), 8);
    assert_eq!(arena.scene.destroyed_count(), 5);
    assert_eq!(arena.session.sounds().active_count(), 3);
    assert_eq!(arena.session.sounds().backend().source_count(), 12);
}

#[test]
fn game_over_freezes_the_arena() {
    let mut arena = Arena::new(5);
    arena.start();
    for _ in 0..10 {
        arena.step();
    }
    let before: Vec<_> = arena
        .session
        .director()
        .agents()
        .iter()
        .map(|agent| (agent.id(), agent.position()))
        .collect();

    arena.game.end_game();
    for _ in 0..200 {
        assert!(arena.step().frozen);
    }
    assert!(arena.session.is_over());
    assert!(arena.projectiles().is_empty());

    let after: Vec<_> = arena
        .session
        .director()
        .agents()
        .iter()
        .map(|agent| (agent.id(), agent.position()))
        .collect();
    assert_eq!(before, after);
}
