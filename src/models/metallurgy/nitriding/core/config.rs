use uom::si::{f64::Time, time::second};

use crate::support::ode::StepperConfig;

use super::InputError;

/// Configuration for the explicit adaptive-step integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplicitConfig {
    /// Number of output times, including `t = 0` and the end time.
    ///
    /// Defaults to one per second of process time, plus one. Runs needing
    /// more than ten million points are rejected.
    pub time_points: Option<usize>,

    /// Upper bound on any single step.
    pub max_step: Time,

    /// Relative tolerance on the mass fractions.
    pub rtol: f64,

    /// Absolute tolerance on the mass fractions.
    pub atol: f64,

    /// Initial step; estimated when `None`.
    pub first_step: Option<Time>,

    /// Accepted plus rejected steps allowed before giving up.
    pub max_steps: usize,
}

impl Default for ExplicitConfig {
    fn default() -> Self {
        Self {
            time_points: None,
            max_step: Time::new::<second>(1.0),
            rtol: 1e-3,
            atol: 1e-6,
            first_step: None,
            max_steps: 1_000_000,
        }
    }
}

impl ExplicitConfig {
    /// Converts this configuration into a stepper configuration.
    pub(super) fn stepper(&self) -> Result<StepperConfig, InputError> {
        let max_step = self.max_step.get::<second>();
        positive("max_step", max_step)?;
        positive("rtol", self.rtol)?;
        if !(self.atol >= 0.0) {
            return Err(InputError::Scheme {
                name: "atol",
                value: self.atol,
            });
        }
        let first_step = self.first_step.map(|h| h.get::<second>());
        if let Some(h) = first_step {
            positive("first_step", h)?;
        }

        Ok(StepperConfig {
            max_step,
            rtol: self.rtol,
            atol: self.atol,
            first_step,
            max_steps: self.max_steps,
        })
    }
}

/// Configuration for the implicit fixed-step integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImplicitConfig {
    /// Number of time points, including `t = 0` and the end time.
    ///
    /// Defaults to one per second of process time, plus one. Runs needing
    /// more than ten million points are rejected.
    pub time_points: Option<usize>,

    /// Log progress every this many steps.
    pub report_every: usize,
}

impl Default for ImplicitConfig {
    fn default() -> Self {
        Self {
            time_points: None,
            report_every: 10,
        }
    }
}

/// What to do when a local equilibrium fails to converge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonConvergencePolicy {
    /// Use the best-effort phase fraction and count the cell.
    #[default]
    Proceed,

    /// Stop the run with [`super::SimulationError::EquilibriumNonConvergence`].
    Abort,
}

/// Most time points a single run may record.
const MAX_TIME_POINTS: usize = 10_000_000;

/// Evenly spaced times over `[0, duration]`, in seconds.
pub(super) fn time_grid(duration: Time, time_points: Option<usize>) -> Result<Vec<f64>, InputError> {
    let t_end = duration.get::<second>();

    let points = match time_points {
        Some(points) => points,
        None => default_points(t_end)?,
    };
    if !(2..=MAX_TIME_POINTS).contains(&points) {
        #[allow(clippy::cast_precision_loss)]
        return Err(InputError::Scheme {
            name: "time_points",
            value: points as f64,
        });
    }

    #[allow(clippy::cast_precision_loss)]
    let last = (points - 1) as f64;
    let mut times: Vec<f64> = (0..points)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let i = i as f64;
            t_end * i / last
        })
        .collect();
    times[points - 1] = t_end;
    Ok(times)
}

/// One point per started second plus the start, or an error past [`MAX_TIME_POINTS`].
fn default_points(t_end: f64) -> Result<usize, InputError> {
    let seconds = t_end.ceil();
    #[allow(clippy::cast_precision_loss)]
    let limit = MAX_TIME_POINTS as f64;
    if !(seconds >= 0.0 && seconds < limit) {
        return Err(InputError::Scheme {
            name: "time_points",
            value: seconds + 1.0,
        });
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(seconds as usize + 1)
}

fn positive(name: &'static str, value: f64) -> Result<(), InputError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(InputError::Scheme { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_has_one_point_per_second() {
        let times = time_grid(Time::new::<second>(600.0), None).unwrap();
        assert_eq!(times.len(), 601);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[1], 1.0);
        assert_eq!(times[600], 600.0);
    }

    #[test]
    fn fractional_duration_rounds_up() {
        let times = time_grid(Time::new::<second>(2.5), None).unwrap();
        assert_eq!(times.len(), 4);
        assert_eq!(times[3], 2.5);
    }

    #[test]
    fn rejects_single_time_point() {
        assert!(matches!(
            time_grid(Time::new::<second>(10.0), Some(1)),
            Err(InputError::Scheme {
                name: "time_points",
                ..
            })
        ));
    }

    #[test]
    fn unbounded_durations_are_rejected() {
        for seconds in [f64::INFINITY, 1e300, 2e7] {
            assert!(matches!(
                time_grid(Time::new::<second>(seconds), None),
                Err(InputError::Scheme {
                    name: "time_points",
                    ..
                })
            ));
        }
        assert!(matches!(
            time_grid(Time::new::<second>(10.0), Some(usize::MAX)),
            Err(InputError::Scheme {
                name: "time_points",
                ..
            })
        ));
    }

    #[test]
    fn stepper_config_checks_ranges() {
        let bad = ExplicitConfig {
            max_step: Time::new::<second>(0.0),
            ..ExplicitConfig::default()
        };
        assert!(bad.stepper().is_err());

        let stepper = ExplicitConfig::default().stepper().unwrap();
        assert_eq!(stepper.max_step, 1.0);
        assert_eq!(stepper.rtol, 1e-3);
    }
}
