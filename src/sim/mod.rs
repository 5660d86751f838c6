//! Deterministic simulation module
//!
//! All track and run logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded noise and RNG only
//! - Stable iteration order (spawn order within each spawner)
//! - No rendering or platform dependencies
//!
//! Data flow per tick: the runner advances its global distance, the generator
//! extends and trims the one shared `TrackCurve`, then the runner and every
//! spawned item sample frames from it by global distance.

pub mod curve;
pub mod frame;
pub mod generator;
pub mod health;
pub mod noise;
pub mod ramp;
pub mod runner;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod window;

pub use curve::{CurveSample, Knot, TrackCurve};
pub use frame::{Frame, FrameSampler, compute_frame};
pub use generator::{TrackGenerator, TrackUpdate};
pub use health::{DamageOutcome, PlayerHealth, RegenState};
pub use noise::CurveNoise;
pub use ramp::SpeedRamp;
pub use runner::{LaneChange, RunnerInput, TrackRunner};
pub use spawner::{ItemKind, Placement, Slot, TrackItem, TrackSpawner};
pub use state::{RunEvent, RunPhase, RunState};
pub use tick::{RunObserver, TickInput, autopilot, dispatch_events, tick};
pub use window::{ExtensionPolicy, SpawnRange, TrackWindow};
