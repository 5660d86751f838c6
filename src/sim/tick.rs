//! Fixed timestep simulation tick
//!
//! Advances one run deterministically. Per tick, in order: reset request, runner
//! distance, track extension and trim, runner pose, spawners, hit tests, health.

use super::health::{DamageOutcome, HealthEvent};
use super::runner::{LaneChange, RunnerInput};
use super::spawner::{Slot, TrackItem, TrackSpawner};
use super::state::{RunEvent, RunPhase, RunState};

/// How far ahead (in track distance) the autopilot looks for obstacles
const AUTOPILOT_RANGE: f32 = 30.0;
/// How much longer a lane must stay clear than the current one to switch to it
const AUTOPILOT_CLEAR_GAP: f32 = 8.0;
/// Seconds of travel before an unavoidable obstacle at which the autopilot jumps
const AUTOPILOT_JUMP_LEAD: f32 = 0.3;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub lane_change: Option<LaneChange>,
    pub jump: bool,
    /// Restart the run before ticking
    pub reset: bool,
    /// Let the autopilot steer and jump
    pub autopilot: bool,
}

/// Receives run events, e.g. for sound or UI
pub trait RunObserver {
    fn on_event(&mut self, event: &RunEvent);
}

impl RunObserver for Vec<RunEvent> {
    fn on_event(&mut self, event: &RunEvent) {
        self.push(*event);
    }
}

/// Hand every pending event to `observer`, oldest first, and clear the queue
pub fn dispatch_events(state: &mut RunState, observer: &mut impl RunObserver) {
    for event in state.events.drain(..) {
        observer.on_event(&event);
    }
}

/// Advance the run by one fixed timestep
pub fn tick(state: &mut RunState, input: &TickInput, dt: f32) {
    if input.reset {
        state.reset_run();
    }

    if state.phase == RunPhase::GameOver {
        return;
    }

    let mut input = input.clone();
    if input.autopilot {
        let pilot = autopilot(state);
        input.lane_change = pilot.lane_change.or(input.lane_change);
        input.jump |= pilot.jump;
    }

    state.time_ticks += 1;

    // The runner moves first so the generator extends against its new distance
    state.runner.advance(dt, state.generator.curve());
    state.generator.update(state.runner.distance_on_track());

    let runner_input = RunnerInput {
        lane_change: input.lane_change,
        jump: input.jump,
    };
    let step = state.runner.update_pose(dt, state.generator.curve(), &runner_input);
    if step.lane_changed {
        state.events.push(RunEvent::LaneChanged {
            lane: state.runner.lane(),
        });
    }
    if step.jumped {
        state.events.push(RunEvent::Jumped);
    }
    if step.landed {
        state.events.push(RunEvent::Landed);
    }

    let player = state.runner.distance_on_track();
    let policy = *state.generator.policy();
    let curve = state.generator.curve();
    for spawner in [&mut state.obstacles, &mut state.points, &mut state.bubbles, &mut state.fish] {
        spawner.update(player, curve, &policy);
    }

    check_obstacles(state);
    check_points(state);

    if let Some(HealthEvent::RegenCompleted) = state.health.tick(dt) {
        state.events.push(RunEvent::RegenCompleted {
            current: state.health.current(),
            max: state.health.max(),
        });
    }
}

/// True if an obstacle in `item`'s lane overlaps the runner's lateral offset
fn in_runner_lane(spawner: &TrackSpawner, item: &TrackItem, lateral: f32, lane_width: f32) -> bool {
    match item.slot {
        Slot::Lane(lane) => (lateral - spawner.lane_offset(lane)).abs() < lane_width * 0.5,
        Slot::Ring { .. } => false,
    }
}

fn check_obstacles(state: &mut RunState) {
    let s = state.runner.distance_on_track();
    let lateral = state.runner.lateral_offset();
    let lane_width = state.runner.config().lane_width;
    let cleared = state.runner.jump_offset() >= state.config.health.obstacle_clearance;
    let hit_depth = state.config.health.hit_depth;

    let mut hits = Vec::new();
    for i in 0..state.obstacles.items().len() {
        let item = &state.obstacles.items()[i];
        if item.collected || cleared || (item.s_global - s).abs() > hit_depth {
            continue;
        }
        if in_runner_lane(&state.obstacles, item, lateral, lane_width) {
            hits.push(i);
        }
    }

    for i in hits {
        let item = &mut state.obstacles.items_mut()[i];
        item.collected = true;
        let (id, s_global) = (item.id, item.s_global);
        state.events.push(RunEvent::ObstacleHit { id, s_global });

        match state.health.take_damage(1) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Damaged => state.events.push(RunEvent::Damaged {
                current: state.health.current(),
                max: state.health.max(),
            }),
            DamageOutcome::Died => {
                state.events.push(RunEvent::Died { distance: s });
                state.phase = RunPhase::GameOver;
                log::info!("Game over at distance {:.1} after {} ticks", s, state.time_ticks);
                return;
            }
        }
    }
}

fn check_points(state: &mut RunState) {
    let position = state.runner.position();
    let radius_sq = state.config.health.pickup_radius.powi(2);

    for item in state.points.items_mut() {
        if !item.collected && item.position.distance_squared(position) <= radius_sq {
            item.collected = true;
            state.events.push(RunEvent::PointCollected {
                id: item.id,
                s_global: item.s_global,
            });
        }
    }
}

/// Distance to the nearest obstacle in `lane` that can still hit the runner.
///
/// Obstacles the runner is passing count as zero; a clear lane is infinitely far.
fn lane_clearance(state: &RunState, lane: usize, s: f32) -> f32 {
    let behind = state.config.health.hit_depth;
    state
        .obstacles
        .items()
        .iter()
        .filter(|item| !item.collected && item.slot == Slot::Lane(lane))
        .map(|item| item.s_global - s)
        .filter(|&ahead| ahead >= -behind && ahead < AUTOPILOT_RANGE)
        .fold(f32::INFINITY, |nearest, ahead| nearest.min(ahead.max(0.0)))
}

/// Demo driver: dodge to a free lane, jump when boxed in, drift toward points.
///
/// A lane is free when it stays clear at least `AUTOPILOT_CLEAR_GAP` past the
/// current lane's nearest obstacle, so a switch is never undone on the next tick.
pub fn autopilot(state: &RunState) -> TickInput {
    let runner = &state.runner;
    let s = runner.distance_on_track();
    let lane = runner.lane();
    let clearance: Vec<f32> = (0..runner.config().lane_count())
        .map(|l| lane_clearance(state, l, s))
        .collect();
    let current = clearance[lane];
    let free = |l: usize| l != lane && clearance[l] >= current + AUTOPILOT_CLEAR_GAP;

    let mut input = TickInput::default();

    if current.is_finite() {
        // Clearest free lane wins, then the closest one
        let target = (0..clearance.len()).filter(|&l| free(l)).max_by(|&a, &b| {
            clearance[a]
                .total_cmp(&clearance[b])
                .then(b.abs_diff(lane).cmp(&a.abs_diff(lane)))
        });

        match target {
            Some(l) => input.lane_change = Some(LaneChange::To(l)),
            None => {
                if current < runner.speed() * AUTOPILOT_JUMP_LEAD + state.config.health.hit_depth {
                    input.jump = true;
                }
            }
        }
        return input;
    }

    // Nothing to dodge: go after the nearest point in a lane that is just as clear
    let target = state
        .points
        .items()
        .iter()
        .filter(|item| !item.collected && item.s_global > s && item.s_global - s < AUTOPILOT_RANGE)
        .min_by(|a, b| a.s_global.total_cmp(&b.s_global))
        .and_then(|item| match item.slot {
            Slot::Lane(l) if free(l) => Some(l),
            _ => None,
        });
    if let Some(l) = target {
        input.lane_change = Some(LaneChange::To(l));
    }

    input
}
