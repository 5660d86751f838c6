//! Run state
//!
//! Everything one run owns: the track generator (the only writer of the curve),
//! the runner, the spawners, health, and the events produced since the host last
//! drained them.

use super::generator::TrackGenerator;
use super::health::PlayerHealth;
use super::runner::TrackRunner;
use super::spawner::{ItemKind, TrackSpawner};
use crate::config::GameConfig;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Running,
    /// Health ran out; only a reset restarts the run
    GameOver,
}

/// Something the host may want to react to (sound, UI, score)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunEvent {
    RunStarted { seed: u64 },
    LaneChanged { lane: usize },
    Jumped,
    Landed,
    ObstacleHit { id: u32, s_global: f32 },
    PointCollected { id: u32, s_global: f32 },
    Damaged { current: u32, max: u32 },
    RegenCompleted { current: u32, max: u32 },
    Died { distance: f32 },
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct RunState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub config: GameConfig,
    pub generator: TrackGenerator,
    pub runner: TrackRunner,
    pub obstacles: TrackSpawner,
    pub points: TrackSpawner,
    pub bubbles: TrackSpawner,
    pub fish: TrackSpawner,
    pub health: PlayerHealth,
    pub phase: RunPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events since the last `dispatch_events`
    pub events: Vec<RunEvent>,
}

impl RunState {
    /// Create a new run with the given seed
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let generator = TrackGenerator::new(config.track.clone(), seed);
        let runner = TrackRunner::new(config.runner.clone());
        let [s1, s2, s3, s4] = spawner_seeds(seed);
        let looping = config.runner.loop_if_closed;
        let obstacles =
            TrackSpawner::lanes(ItemKind::Obstacle, &config.obstacles, &config.runner, s1);
        let points = TrackSpawner::lanes(ItemKind::Point, &config.points, &config.runner, s2);
        let bubbles =
            TrackSpawner::ring(ItemKind::Bubble, &config.bubbles, s3).with_looping(looping);
        let fish = TrackSpawner::ring(ItemKind::Fish, &config.fish, s4).with_looping(looping);
        let health = PlayerHealth::new(&config.health);

        let mut state = Self {
            seed,
            config,
            generator,
            runner,
            obstacles,
            points,
            bubbles,
            fish,
            health,
            phase: RunPhase::Running,
            time_ticks: 0,
            events: Vec::new(),
        };
        state.reset_run();
        state
    }

    /// Put every part of the run back to its starting state.
    ///
    /// Order matters: the track is rebuilt first so the runner can snap onto it
    /// and the spawners restart against the fresh window. Calling this twice in a
    /// row is the same as calling it once.
    pub fn reset_run(&mut self) {
        self.generator.reset();
        self.runner.reset_run();
        self.generator.update(self.runner.distance_on_track());
        self.runner.snap_to_start(self.generator.curve());

        let start = self.runner.distance_on_track();
        for spawner in [&mut self.obstacles, &mut self.points, &mut self.bubbles, &mut self.fish] {
            spawner.reset(start);
        }

        self.health.reset();
        self.phase = RunPhase::Running;
        self.time_ticks = 0;
        self.events.clear();
        self.events.push(RunEvent::RunStarted { seed: self.seed });

        log::info!("Run reset (seed {})", self.seed);
    }

    /// Start a fresh run on a different track and layout
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.generator.reseed(seed);
        let spawners = [&mut self.obstacles, &mut self.points, &mut self.bubbles, &mut self.fish];
        for (spawner, s) in spawners.into_iter().zip(spawner_seeds(seed)) {
            spawner.reseed(s);
        }
        self.reset_run();
    }

    /// All spawners in update order
    pub fn spawners(&self) -> [&TrackSpawner; 4] {
        [&self.obstacles, &self.points, &self.bubbles, &self.fish]
    }

    /// Global distance the runner has covered
    #[inline]
    pub fn distance(&self) -> f32 {
        self.runner.distance_on_track()
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.phase == RunPhase::GameOver
    }
}

/// Spawner seeds derived from a run seed, in update order
fn spawner_seeds(seed: u64) -> [u64; 4] {
    [1, 2, 3, 4].map(|i| seed.wrapping_add(i))
}
