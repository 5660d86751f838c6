//! Player health with hit immunity and delayed regeneration
//!
//! Regeneration is a small state machine advanced by `tick`: after a non-fatal hit
//! it waits `regen_delay`, then fills over `regen_duration` and restores one point.
//! Another hit restarts it from the delay.

use crate::config::HealthConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegenState {
    Idle,
    Delay { elapsed: f32 },
    Filling { elapsed: f32 },
}

/// Result of `take_damage`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Immune, already dead, or zero damage
    Ignored,
    Damaged,
    Died,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthEvent {
    RegenCompleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerHealth {
    current: u32,
    max: u32,
    invulnerability: f32,
    regen_delay: f32,
    regen_duration: f32,
    /// Seconds of immunity left
    invulnerable_for: f32,
    regen: RegenState,
}

impl PlayerHealth {
    pub fn new(config: &HealthConfig) -> Self {
        let max = config.max_health.max(1);
        Self {
            current: max,
            max,
            invulnerability: config.invulnerability.max(0.0),
            regen_delay: config.regen_delay.max(0.0),
            regen_duration: config.regen_duration.max(0.001),
            invulnerable_for: 0.0,
            regen: RegenState::Idle,
        }
    }

    /// Back to full health with no timers running
    pub fn reset(&mut self) {
        self.current = self.max;
        self.invulnerable_for = 0.0;
        self.regen = RegenState::Idle;
    }

    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if amount == 0 || self.is_invulnerable() || self.current == 0 {
            return DamageOutcome::Ignored;
        }

        self.current = self.current.saturating_sub(amount);
        self.invulnerable_for = self.invulnerability;

        if self.current == 0 {
            self.regen = RegenState::Idle;
            DamageOutcome::Died
        } else {
            self.regen = RegenState::Delay { elapsed: 0.0 };
            DamageOutcome::Damaged
        }
    }

    /// Advance timers; reports when a regenerated point lands
    pub fn tick(&mut self, dt: f32) -> Option<HealthEvent> {
        let dt = dt.max(0.0);
        self.invulnerable_for = (self.invulnerable_for - dt).max(0.0);

        match self.regen {
            RegenState::Idle => None,
            RegenState::Delay { elapsed } => {
                let elapsed = elapsed + dt;
                self.regen = if elapsed >= self.regen_delay {
                    RegenState::Filling {
                        elapsed: elapsed - self.regen_delay,
                    }
                } else {
                    RegenState::Delay { elapsed }
                };
                None
            }
            RegenState::Filling { elapsed } => {
                if self.current >= self.max {
                    self.regen = RegenState::Idle;
                    return None;
                }
                let elapsed = elapsed + dt;
                if elapsed >= self.regen_duration {
                    self.current = (self.current + 1).min(self.max);
                    self.regen = RegenState::Idle;
                    Some(HealthEvent::RegenCompleted)
                } else {
                    self.regen = RegenState::Filling { elapsed };
                    None
                }
            }
        }
    }

    #[inline]
    pub fn current(&self) -> u32 {
        self.current
    }

    #[inline]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.current == 0
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_for > 0.0
    }

    #[inline]
    pub fn regen_state(&self) -> RegenState {
        self.regen
    }

    /// Fill progress of the point being regenerated (0 when not filling)
    pub fn regen_progress(&self) -> f32 {
        match self.regen {
            RegenState::Filling { elapsed } => (elapsed / self.regen_duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 120.0;

    fn run_for(health: &mut PlayerHealth, seconds: f32) -> Vec<HealthEvent> {
        let ticks = (seconds / DT).round() as usize;
        (0..ticks).filter_map(|_| health.tick(DT)).collect()
    }

    #[test]
    fn test_damage_then_immunity() {
        let mut health = PlayerHealth::new(&HealthConfig::default());
        assert_eq!(health.current(), 2);

        assert_eq!(health.take_damage(1), DamageOutcome::Damaged);
        assert_eq!(health.current(), 1);
        assert!(health.is_invulnerable());
        assert_eq!(health.take_damage(1), DamageOutcome::Ignored);
        assert_eq!(health.current(), 1);

        run_for(&mut health, 1.05);
        assert!(!health.is_invulnerable());
        assert_eq!(health.take_damage(1), DamageOutcome::Died);
        assert!(health.is_dead());
        assert_eq!(health.regen_state(), RegenState::Idle);
    }

    #[test]
    fn test_dead_and_zero_damage_are_ignored() {
        let mut health = PlayerHealth::new(&HealthConfig {
            invulnerability: 0.0,
            ..Default::default()
        });
        assert_eq!(health.take_damage(0), DamageOutcome::Ignored);
        assert_eq!(health.take_damage(5), DamageOutcome::Died);
        assert_eq!(health.current(), 0);
        assert_eq!(health.take_damage(1), DamageOutcome::Ignored);
    }

    #[test]
    fn test_regen_timeline() {
        let mut health = PlayerHealth::new(&HealthConfig::default());
        health.take_damage(1);

        assert!(run_for(&mut health, 1.4).is_empty());
        assert!(matches!(health.regen_state(), RegenState::Delay { .. }));
        assert_eq!(health.regen_progress(), 0.0);

        // Delay over, filling underway
        assert!(run_for(&mut health, 2.0).is_empty());
        assert!(matches!(health.regen_state(), RegenState::Filling { .. }));
        assert!(health.regen_progress() > 0.4 && health.regen_progress() < 0.7);
        assert_eq!(health.current(), 1);

        let events = run_for(&mut health, 1.7);
        assert_eq!(events, vec![HealthEvent::RegenCompleted]);
        assert_eq!(health.current(), 2);
        assert_eq!(health.regen_state(), RegenState::Idle);
    }

    #[test]
    fn test_hit_restarts_regen() {
        let mut health = PlayerHealth::new(&HealthConfig {
            max_health: 3,
            ..Default::default()
        });
        health.take_damage(1);
        run_for(&mut health, 3.0);
        assert!(matches!(health.regen_state(), RegenState::Filling { .. }));

        assert_eq!(health.take_damage(1), DamageOutcome::Damaged);
        assert_eq!(health.regen_state(), RegenState::Delay { elapsed: 0.0 });
        assert_eq!(health.current(), 1);

        // Only one point comes back per regen cycle
        run_for(&mut health, 10.0);
        assert_eq!(health.current(), 2);
    }

    #[test]
    fn test_reset_restores_full_health() {
        let mut health = PlayerHealth::new(&HealthConfig::default());
        health.take_damage(1);
        health.reset();
        let once = health.clone();
        health.reset();
        assert_eq!(health, once);
        assert_eq!(health.current(), 2);
        assert!(!health.is_invulnerable());
        assert_eq!(health.regen_state(), RegenState::Idle);
    }
}
