//! Run speed over time
//!
//! Two shapes, both non-decreasing and both settling on `max`:
//! - `Exponential`: soft cap, `max - (max - start) * e^(-rate * t)`
//! - `Curve`: eased blend from `start` to `max` over a fixed duration

use crate::config::RunnerConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedRamp {
    Exponential { start: f32, max: f32, rate: f32 },
    Curve { start: f32, max: f32, duration: f32 },
}

impl SpeedRamp {
    /// Pick the ramp the runner config asks for, normalizing inverted values
    pub fn from_config(config: &RunnerConfig) -> Self {
        let start = config.start_speed.max(0.0);
        let max = config.max_speed.max(start);

        if config.use_ramp_curve && config.ramp_duration > 0.0 {
            SpeedRamp::Curve {
                start,
                max,
                duration: config.ramp_duration,
            }
        } else {
            SpeedRamp::Exponential {
                start,
                max,
                rate: config.ramp_rate.max(0.0),
            }
        }
    }

    pub fn start_speed(&self) -> f32 {
        match *self {
            SpeedRamp::Exponential { start, .. } | SpeedRamp::Curve { start, .. } => start,
        }
    }

    pub fn max_speed(&self) -> f32 {
        match *self {
            SpeedRamp::Exponential { max, .. } | SpeedRamp::Curve { max, .. } => max,
        }
    }

    /// Speed after `elapsed` seconds of running
    pub fn speed_at(&self, elapsed: f32) -> f32 {
        let t = elapsed.max(0.0);
        match *self {
            SpeedRamp::Exponential { start, max, rate } => max - (max - start) * (-rate * t).exp(),
            SpeedRamp::Curve { start, max, duration } => {
                let u = (t / duration).clamp(0.0, 1.0);
                start + (max - start) * ease_in_out(u)
            }
        }
    }
}

/// Hermite ease with flat ends, `3u^2 - 2u^3`
#[inline]
pub fn ease_in_out(u: f32) -> f32 {
    let u = u.clamp(0.0, 1.0);
    u * u * (3.0 - 2.0 * u)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_ramp_endpoints() {
        let ramp = SpeedRamp::from_config(&RunnerConfig::default());
        assert!(matches!(ramp, SpeedRamp::Curve { .. }));
        assert_eq!(ramp.speed_at(0.0), 18.0);
        assert!((ramp.speed_at(30.0) - 28.0).abs() < 1e-4);
        assert_eq!(ramp.speed_at(60.0), 38.0);
        assert_eq!(ramp.speed_at(1.0e6), 38.0);
    }

    #[test]
    fn test_exponential_ramp_approaches_max() {
        let config = RunnerConfig {
            use_ramp_curve: false,
            ..Default::default()
        };
        let ramp = SpeedRamp::from_config(&config);
        assert!(matches!(ramp, SpeedRamp::Exponential { .. }));
        assert_eq!(ramp.speed_at(0.0), 18.0);
        assert!((ramp.speed_at(200.0) - 38.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_duration_falls_back_to_exponential() {
        let config = RunnerConfig {
            ramp_duration: 0.0,
            ..Default::default()
        };
        assert!(matches!(SpeedRamp::from_config(&config), SpeedRamp::Exponential { .. }));
    }

    #[test]
    fn test_ramps_are_monotonic() {
        for use_curve in [true, false] {
            let ramp = SpeedRamp::from_config(&RunnerConfig {
                use_ramp_curve: use_curve,
                ..Default::default()
            });
            let mut prev = ramp.speed_at(0.0);
            for i in 1..2000 {
                let v = ramp.speed_at(i as f32 * 0.05);
                assert!(v >= prev);
                assert!(v <= ramp.max_speed() + 1e-4);
                prev = v;
            }
        }
    }

    #[test]
    fn test_inverted_speeds_are_flattened() {
        let ramp = SpeedRamp::from_config(&RunnerConfig {
            start_speed: 40.0,
            max_speed: 10.0,
            ..Default::default()
        });
        assert_eq!(ramp.max_speed(), 40.0);
        assert_eq!(ramp.speed_at(0.0), 40.0);
        assert_eq!(ramp.speed_at(100.0), 40.0);
    }

    #[test]
    fn test_ease_in_out_shape() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(ease_in_out(2.0), 1.0);
    }
}
