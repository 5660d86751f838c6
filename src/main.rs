//! Voidwave entry point
//!
//! Runs the simulation headless on the autopilot: `voidwave [config.json] [seconds] [seed]`.
//! Frames are fed to a fixed-timestep accumulator the same way a windowed host would.

use anyhow::{Context, Result, bail};

use voidwave::GameConfig;
use voidwave::consts::{MAX_SUBSTEPS, SIM_DT};
use voidwave::sim::{RunEvent, RunObserver, RunState, TickInput, dispatch_events, tick};

/// Host frame time for the headless loop (60 Hz display)
const FRAME_DT: f32 = 1.0 / 60.0;
const DEFAULT_SECONDS: f32 = 60.0;
const DEFAULT_SEED: u64 = 1;

/// Logs events and keeps a tally for the summary
#[derive(Debug, Default)]
struct EventLog {
    runs: u32,
    deaths: u32,
    hits: u32,
    points: u32,
    jumps: u32,
    lane_changes: u32,
    best_distance: f32,
}

impl RunObserver for EventLog {
    fn on_event(&mut self, event: &RunEvent) {
        match *event {
            RunEvent::RunStarted { seed } => {
                self.runs += 1;
                log::info!("Run {} started (seed {})", self.runs, seed);
            }
            RunEvent::LaneChanged { lane } => {
                self.lane_changes += 1;
                log::trace!("Lane -> {}", lane);
            }
            RunEvent::Jumped => {
                self.jumps += 1;
                log::trace!("Jump");
            }
            RunEvent::Landed => log::trace!("Landed"),
            RunEvent::ObstacleHit { id, s_global } => {
                self.hits += 1;
                log::debug!("Hit obstacle {} at s={:.1}", id, s_global);
            }
            RunEvent::PointCollected { id, s_global } => {
                self.points += 1;
                log::debug!("Collected point {} at s={:.1}", id, s_global);
            }
            RunEvent::Damaged { current, max } => log::info!("Damaged: {}/{}", current, max),
            RunEvent::RegenCompleted { current, max } => {
                log::info!("Regenerated: {}/{}", current, max)
            }
            RunEvent::Died { distance } => {
                self.deaths += 1;
                self.best_distance = self.best_distance.max(distance);
                log::info!("Died at distance {:.1}", distance);
            }
        }
    }
}

/// Headless host holding the run and the frame accumulator
struct Game {
    state: RunState,
    accumulator: f32,
    input: TickInput,
}

impl Game {
    fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            state: RunState::new(config, seed),
            accumulator: 0.0,
            input: TickInput {
                autopilot: true,
                ..Default::default()
            },
        }
    }

    /// Run simulation ticks for one host frame
    fn update(&mut self, dt: f32) {
        // Demo mode: start over on a new track once the last frame's events are out
        if self.state.is_over() {
            let next = self.state.seed.wrapping_add(1);
            self.state.reseed(next);
        }

        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.jump = false;
            self.input.lane_change = None;
        }
    }
}

/// Simulated duration from the command line
fn parse_seconds(arg: Option<String>) -> Result<f32> {
    let Some(arg) = arg else {
        return Ok(DEFAULT_SECONDS);
    };
    let seconds = arg
        .parse::<f32>()
        .with_context(|| format!("Invalid duration '{}'", arg))?;
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("Duration must be a finite, non-negative number of seconds, got '{}'", arg);
    }
    Ok(seconds)
}

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Voidwave (headless) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) if path != "-" => GameConfig::load_or_default(&path),
        _ => GameConfig::default(),
    };
    let seconds = parse_seconds(args.next())?;
    let seed = match args.next() {
        Some(s) => s.parse::<u64>().with_context(|| format!("Invalid seed '{}'", s))?,
        None => DEFAULT_SEED,
    };

    let mut game = Game::new(config, seed);
    let mut events = EventLog::default();
    let frames = (seconds / FRAME_DT).round() as u64;

    for _ in 0..frames {
        game.update(FRAME_DT);
        dispatch_events(&mut game.state, &mut events);
    }

    let state = &game.state;
    events.best_distance = events.best_distance.max(state.distance());
    println!(
        "Simulated {:.1}s ({} frames, first seed {}, last seed {})",
        seconds, frames, seed, state.seed
    );
    println!(
        "Runs: {}  deaths: {}  best distance: {:.1}",
        events.runs, events.deaths, events.best_distance
    );
    println!(
        "Current run: distance {:.1}  speed {:.1}  health {}/{}  track knots {}  trimmed {:.1}",
        state.distance(),
        state.runner.speed(),
        state.health.current(),
        state.health.max(),
        state.generator.curve().knot_count(),
        state.generator.removed_distance()
    );
    println!(
        "Obstacle hits: {}  points: {}  jumps: {}  lane changes: {}",
        events.hits, events.points, events.jumps, events.lane_changes
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds(None).unwrap(), DEFAULT_SECONDS);
        assert_eq!(parse_seconds(Some("12.5".into())).unwrap(), 12.5);
        assert!(parse_seconds(Some("soon".into())).is_err());
        assert!(parse_seconds(Some("-3".into())).is_err());
        for endless in ["inf", "infinity", "NaN"] {
            assert!(parse_seconds(Some(endless.into())).is_err(), "{} accepted", endless);
        }
    }

    #[test]
    fn test_restart_after_game_over_uses_next_seed() {
        let mut game = Game::new(GameConfig::default(), 40);
        game.state.phase = voidwave::sim::RunPhase::GameOver;
        game.update(FRAME_DT);

        assert_eq!(game.state.seed, 41);
        assert!(!game.state.is_over());
        assert_eq!(game.state.events.first(), Some(&RunEvent::RunStarted { seed: 41 }));
    }
}
