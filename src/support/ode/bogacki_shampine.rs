use super::{OdeError, OdeSystem, Solution, State, Statistics};

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// Exponent of the error norm in the step-size update, `-1 / (order + 1)`.
const ERROR_EXPONENT: f64 = -1.0 / 3.0;

/// Step-size control for [`BogackiShampine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepperConfig {
    /// Upper bound on any single step.
    pub max_step: f64,

    pub rtol: f64,
    pub atol: f64,

    /// Initial step; estimated from the system when `None`.
    pub first_step: Option<f64>,

    /// Accepted plus rejected steps allowed before giving up.
    pub max_steps: usize,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            max_step: f64::INFINITY,
            rtol: 1e-3,
            atol: 1e-6,
            first_step: None,
            max_steps: 1_000_000,
        }
    }
}

/// Bogacki–Shampine embedded Runge–Kutta 3(2) integrator.
///
/// Propagates the third-order solution, estimates the local error against the
/// embedded second-order one, and reuses the last stage of an accepted step as
/// the first stage of the next.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BogackiShampine {
    pub config: StepperConfig,
}

impl BogackiShampine {
    #[must_use]
    pub fn new(config: StepperConfig) -> Self {
        Self { config }
    }

    /// Integrates `system` from `y0` at `times[0]` through every entry of `times`.
    ///
    /// The returned states line up with `times`; the first one is `y0`.
    ///
    /// # Errors
    ///
    /// Returns an [`OdeError`] if the times are invalid, the system fails or
    /// yields a non-finite derivative, the step underflows, or the step budget
    /// is exhausted. No partial solution is returned.
    pub fn integrate<S: OdeSystem>(
        &self,
        system: &mut S,
        y0: &[f64],
        times: &[f64],
    ) -> Result<Solution, OdeError<S::Error>> {
        let Some(&t0) = times.first() else {
            return Err(OdeError::InvalidTimes);
        };
        if times.iter().any(|t| !t.is_finite()) || times.windows(2).any(|w| w[1] < w[0]) {
            return Err(OdeError::InvalidTimes);
        }

        let config = &self.config;
        let n = y0.len();
        let mut stats = Statistics::default();

        let mut t = t0;
        let mut y = y0.to_vec();
        let mut k1 = vec![0.0; n];
        let mut k2 = vec![0.0; n];
        let mut k3 = vec![0.0; n];
        let mut k4 = vec![0.0; n];
        let mut stage = vec![0.0; n];
        let mut y_new = vec![0.0; n];

        evaluate(system, t, &y, &mut k1, &mut stats)?;

        let span = times[times.len() - 1] - t0;
        let mut h = match config.first_step {
            Some(h) => h,
            None if span > 0.0 => {
                initial_step(system, t, &y, &k1, config, &mut k2, &mut stage, &mut stats)?
            }
            None => 0.0,
        }
        .min(config.max_step);

        let mut states = Vec::with_capacity(times.len());
        states.push(State { x: t0, y: y.clone() });

        for &t_out in &times[1..] {
            while t < t_out {
                if stats.accepted_steps + stats.rejected_steps >= config.max_steps {
                    return Err(OdeError::TooManySteps {
                        t,
                        max_steps: config.max_steps,
                    });
                }

                let min_step = 10.0 * f64::EPSILON * t.abs().max(t_out.abs());
                if !(h > min_step) {
                    return Err(OdeError::StepUnderflow { t, step: h });
                }

                let landing = h >= t_out - t;
                let step = if landing { t_out - t } else { h };

                for i in 0..n {
                    stage[i] = y[i] + 0.5 * step * k1[i];
                }
                evaluate(system, t + 0.5 * step, &stage, &mut k2, &mut stats)?;

                for i in 0..n {
                    stage[i] = y[i] + 0.75 * step * k2[i];
                }
                evaluate(system, t + 0.75 * step, &stage, &mut k3, &mut stats)?;

                for i in 0..n {
                    y_new[i] =
                        y[i] + step * (2.0 / 9.0 * k1[i] + 1.0 / 3.0 * k2[i] + 4.0 / 9.0 * k3[i]);
                }
                let t_new = if landing { t_out } else { t + step };
                evaluate(system, t_new, &y_new, &mut k4, &mut stats)?;

                let norm = error_norm(step, &y, &y_new, [&k1[..], &k2[..], &k3[..], &k4[..]], config);

                if norm <= 1.0 {
                    t = t_new;
                    std::mem::swap(&mut y, &mut y_new);
                    std::mem::swap(&mut k1, &mut k4);
                    stats.accepted_steps += 1;

                    let factor = if norm == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * norm.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                    };
                    h = (step * factor).min(config.max_step);
                } else {
                    stats.rejected_steps += 1;
                    h = step * (SAFETY * norm.powf(ERROR_EXPONENT)).max(MIN_FACTOR);
                }
            }

            states.push(State {
                x: t_out,
                y: y.clone(),
            });
        }

        Ok(Solution {
            states,
            statistics: stats,
        })
    }
}

fn evaluate<S: OdeSystem>(
    system: &mut S,
    t: f64,
    y: &[f64],
    dydt: &mut [f64],
    stats: &mut Statistics,
) -> Result<(), OdeError<S::Error>> {
    stats.evaluations += 1;
    system
        .derivative(t, y, dydt)
        .map_err(|source| OdeError::System { t, source })?;
    match dydt.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OdeError::NonFinite { t, index }),
        None => Ok(()),
    }
}

/// RMS of the embedded error estimate, scaled by `atol + rtol |y|`.
fn error_norm(
    step: f64,
    y: &[f64],
    y_new: &[f64],
    [k1, k2, k3, k4]: [&[f64]; 4],
    config: &StepperConfig,
) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let sum: f64 = (0..y.len())
        .map(|i| {
            let err = step
                * (-5.0 / 72.0 * k1[i] + 1.0 / 12.0 * k2[i] + 1.0 / 9.0 * k3[i]
                    - 1.0 / 8.0 * k4[i]);
            let scale = config.atol + config.rtol * y[i].abs().max(y_new[i].abs());
            (err / scale).powi(2)
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let n = y.len() as f64;
    (sum / n).sqrt()
}

fn rms_scaled(v: &[f64], y: &[f64], config: &StepperConfig) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v
        .iter()
        .zip(y)
        .map(|(v, y)| (v / (config.atol + config.rtol * y.abs())).powi(2))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let n = v.len() as f64;
    (sum / n).sqrt()
}

/// Estimates a first step from the size of the state and its derivative.
///
/// Follows Hairer, Nørsett and Wanner, *Solving ODEs I*, section II.4.
#[allow(clippy::too_many_arguments)]
fn initial_step<S: OdeSystem>(
    system: &mut S,
    t: f64,
    y: &[f64],
    f0: &[f64],
    config: &StepperConfig,
    f1: &mut [f64],
    y1: &mut [f64],
    stats: &mut Statistics,
) -> Result<f64, OdeError<S::Error>> {
    let d0 = rms_scaled(y, y, config);
    let d1 = rms_scaled(f0, y, config);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };

    for i in 0..y.len() {
        y1[i] = y[i] + h0 * f0[i];
    }
    evaluate(system, t + h0, y1, f1, stats)?;

    let diff: Vec<f64> = f1.iter().zip(f0).map(|(a, b)| a - b).collect();
    let d2 = rms_scaled(&diff, y, config) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / 3.0)
    };

    Ok((100.0 * h0).min(h1))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;

    struct Decay;

    impl OdeSystem for Decay {
        type Error = Infallible;

        fn derivative(&mut self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), Infallible> {
            for (d, y) in dydt.iter_mut().zip(y) {
                *d = -y;
            }
            Ok(())
        }
    }

    struct Blowup;

    impl OdeSystem for Blowup {
        type Error = Infallible;

        fn derivative(&mut self, t: f64, _y: &[f64], dydt: &mut [f64]) -> Result<(), Infallible> {
            dydt[0] = if t > 0.5 { f64::NAN } else { 1.0 };
            Ok(())
        }
    }

    #[test]
    fn exponential_decay() {
        let stepper = BogackiShampine::new(StepperConfig {
            rtol: 1e-8,
            atol: 1e-10,
            ..StepperConfig::default()
        });

        let solution = stepper
            .integrate(&mut Decay, &[1.0, 2.0], &[0.0, 0.5, 1.0])
            .unwrap();

        assert_eq!(solution.states.len(), 3);
        let last = &solution.states[2];
        assert_eq!(last.x, 1.0);
        assert_relative_eq!(last.y[0], (-1.0_f64).exp(), max_relative = 1e-6);
        assert_relative_eq!(last.y[1], 2.0 * (-1.0_f64).exp(), max_relative = 1e-6);
        assert!(solution.statistics.accepted_steps > 0);
    }

    #[test]
    fn lands_on_output_times_and_respects_max_step() {
        let stepper = BogackiShampine::new(StepperConfig {
            max_step: 0.1,
            ..StepperConfig::default()
        });
        let times = [0.0, 0.25, 0.3, 1.0];

        let solution = stepper.integrate(&mut Decay, &[1.0], &times).unwrap();

        let reached: Vec<f64> = solution.states.iter().map(|s| s.x).collect();
        assert_eq!(reached, times);
        assert!(solution.statistics.accepted_steps >= 10);
    }

    #[test]
    fn non_finite_derivative_is_fatal() {
        let result = BogackiShampine::default().integrate(&mut Blowup, &[0.0], &[0.0, 1.0]);
        assert!(matches!(result, Err(OdeError::NonFinite { index: 0, .. })));
    }

    #[test]
    fn step_budget_is_enforced() {
        let stepper = BogackiShampine::new(StepperConfig {
            max_step: 1e-3,
            max_steps: 10,
            ..StepperConfig::default()
        });
        let result = stepper.integrate(&mut Decay, &[1.0], &[0.0, 1.0]);
        assert!(matches!(
            result,
            Err(OdeError::TooManySteps { max_steps: 10, .. })
        ));
    }

    #[test]
    fn rejects_decreasing_times() {
        let result = BogackiShampine::default().integrate(&mut Decay, &[1.0], &[1.0, 0.0]);
        assert!(matches!(result, Err(OdeError::InvalidTimes)));
    }
}
