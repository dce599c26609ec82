//! Common-tangent construction between ferrite and austenite.

use thiserror::Error;
use twine_core::Model;
use twine_solvers::equation::bisection;
use uom::si::{
    f64::ThermodynamicTemperature, molar_energy::joule_per_mole,
    thermodynamic_temperature::kelvin,
};

use crate::support::{
    calphad::{GibbsModel, Phase, ThermoError},
    units::GAS_CONSTANT,
};

use super::{
    EquilibriumConfig, Transcript,
    problem::{CrossingModel, InterceptModel, Intercepts, Point, PotentialModel, RootProblem},
};

/// Smallest composition the bracketing search visits; the potential diverges at zero.
const X_MIN: f64 = 1e-12;

/// Fraction of a composition limit kept clear of the fully occupied sublattice.
const LIMIT_MARGIN: f64 = 1e-9;

/// Tie-line ends closer than this, relative to `x_gamma`, are treated as degenerate.
const MIN_WIDTH: f64 = 1e-6;

/// Newton residuals below this multiple of `RT` count as converged.
const RESIDUAL_SCALE: f64 = 1e-10;

const MIN_DAMPING: f64 = 1e-12;

/// Errors raised while constructing a tie line.
#[derive(Debug, Error)]
pub(super) enum TieLineError {
    #[error(transparent)]
    Thermo(#[from] ThermoError),

    #[error("bisection solver error")]
    Bisection(#[from] bisection::Error),

    #[error("bisection hit iteration limit: residual={residual}")]
    BisectionMaxIters { residual: f64, iters: usize },

    #[error("singular Newton system at x_alpha={x_alpha}, x_gamma={x_gamma}")]
    Singular { x_alpha: f64, x_gamma: f64 },

    #[error("Newton step left the admissible region at x_alpha={x_alpha}, x_gamma={x_gamma}")]
    Stalled { x_alpha: f64, x_gamma: f64 },

    #[error("Newton hit iteration limit at x_alpha={x_alpha}, x_gamma={x_gamma}")]
    NewtonMaxIters {
        iters: usize,
        x_alpha: f64,
        x_gamma: f64,
    },
}

/// Equilibrium compositions of coexisting ferrite and austenite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct TieLine {
    pub(super) x_alpha: f64,
    pub(super) x_gamma: f64,
    pub(super) iterations: usize,
}

/// Result of inverting a phase potential.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Inversion {
    pub(super) x: f64,
    pub(super) iterations: usize,
}

/// Gibbs model evaluated at a fixed temperature, in plain J/mol.
pub(super) struct Phases<'a, M> {
    model: &'a M,
    temperature: ThermodynamicTemperature,
    rt: f64,
}

impl<'a, M: GibbsModel> Phases<'a, M> {
    pub(super) fn new(model: &'a M, temperature: ThermodynamicTemperature) -> Self {
        Self {
            model,
            temperature,
            rt: GAS_CONSTANT * temperature.get::<kelvin>(),
        }
    }

    pub(super) fn gibbs(&self, phase: Phase, x: f64) -> Result<f64, ThermoError> {
        Ok(self
            .model
            .gibbs_energy(phase, x, self.temperature)?
            .get::<joule_per_mole>())
    }

    pub(super) fn potential(&self, phase: Phase, x: f64) -> Result<f64, ThermoError> {
        Ok(self
            .model
            .potential(phase, x, self.temperature)?
            .get::<joule_per_mole>())
    }

    fn curvature(&self, phase: Phase, x: f64) -> Result<f64, ThermoError> {
        Ok(self
            .model
            .curvature(phase, x, self.temperature)?
            .get::<joule_per_mole>())
    }

    fn upper(&self, phase: Phase) -> f64 {
        self.model.composition_limit(phase) * (1.0 - LIMIT_MARGIN)
    }

    /// Whether `(x_alpha, x_gamma)` is a usable, non-degenerate tie-line estimate.
    pub(super) fn admits(&self, x_alpha: f64, x_gamma: f64) -> bool {
        x_alpha > 0.0
            && x_alpha < self.upper(Phase::Alpha)
            && x_gamma < self.upper(Phase::Gamma)
            && x_gamma - x_alpha > MIN_WIDTH * x_gamma
    }

    /// Composition of `phase` at which its potential equals `mu`.
    ///
    /// Targets beyond the searchable range clamp to its ends.
    pub(super) fn invert_potential(
        &self,
        phase: Phase,
        mu: f64,
        config: &bisection::Config,
    ) -> Result<Inversion, TieLineError> {
        let lo = X_MIN;
        let hi = self.upper(phase);
        if mu <= self.potential(phase, lo)? {
            return Ok(Inversion { x: lo, iterations: 0 });
        }
        if mu >= self.potential(phase, hi)? {
            return Ok(Inversion { x: hi, iterations: 0 });
        }

        let model = PotentialModel {
            phases: self,
            phase,
            target: mu,
        };
        let solution = bisection::solve(
            &model,
            &RootProblem::<Point>::new(),
            [lo, hi],
            config,
            |event: &bisection::Event<'_, _, _>| {
                if event.result().is_err() {
                    return Some(bisection::Action::assume_positive());
                }
                None
            },
        )?;

        if solution.status != bisection::Status::Converged {
            return Err(TieLineError::BisectionMaxIters {
                residual: solution.residual,
                iters: solution.iters,
            });
        }

        Ok(Inversion {
            x: solution.snapshot.output.x,
            iterations: solution.iters,
        })
    }
}

/// Refines a tie-line estimate with damped Newton iterations.
///
/// Solves equal potentials `mu_alpha(x_alpha) = mu_gamma(x_gamma)` and a
/// shared tangent `G_gamma(x_gamma) = G_alpha(x_alpha) + mu_alpha (x_gamma - x_alpha)`.
/// Steps are halved until the iterate stays admissible.
///
/// # Errors
///
/// Fails on a singular Jacobian, a step that cannot be damped into the
/// admissible region, or when the iteration cap is reached.
pub(super) fn refine<M: GibbsModel>(
    phases: &Phases<'_, M>,
    guess: (f64, f64),
    config: &EquilibriumConfig,
    transcript: &mut Transcript,
) -> Result<TieLine, TieLineError> {
    let (mut xa, mut xg) = guess;
    let residual_tol = RESIDUAL_SCALE * phases.rt;

    for iter in 0..config.newton_max_iters {
        let mu_a = phases.potential(Phase::Alpha, xa)?;
        let mu_g = phases.potential(Phase::Gamma, xg)?;
        let f1 = mu_a - mu_g;
        let f2 = phases.gibbs(Phase::Gamma, xg)?
            - phases.gibbs(Phase::Alpha, xa)?
            - mu_a * (xg - xa);

        transcript.record(|| {
            format!("newton {iter}: x_alpha={xa:.12e} x_gamma={xg:.12e} F=({f1:.3e}, {f2:.3e})")
        });

        if f1.abs() <= residual_tol && f2.abs() <= residual_tol {
            return Ok(TieLine {
                x_alpha: xa,
                x_gamma: xg,
                iterations: iter,
            });
        }

        let ca = phases.curvature(Phase::Alpha, xa)?;
        let cg = phases.curvature(Phase::Gamma, xg)?;

        // Jacobian of (F1, F2) with respect to (x_alpha, x_gamma).
        let (j11, j12) = (ca, -cg);
        let (j21, j22) = (-ca * (xg - xa), -f1);
        let det = j11 * j22 - j12 * j21;
        if !det.is_normal() {
            return Err(TieLineError::Singular {
                x_alpha: xa,
                x_gamma: xg,
            });
        }
        let da = (j22 * f1 - j12 * f2) / det;
        let dg = (j11 * f2 - j21 * f1) / det;

        let mut lambda = 1.0;
        while !phases.admits(xa - lambda * da, xg - lambda * dg) {
            lambda *= 0.5;
            if lambda < MIN_DAMPING {
                return Err(TieLineError::Stalled {
                    x_alpha: xa,
                    x_gamma: xg,
                });
            }
        }

        xa -= lambda * da;
        xg -= lambda * dg;

        if (lambda * da).abs() <= config.newton_tol * xa
            && (lambda * dg).abs() <= config.newton_tol * xg
        {
            return Ok(TieLine {
                x_alpha: xa,
                x_gamma: xg,
                iterations: iter + 1,
            });
        }
    }

    Err(TieLineError::NewtonMaxIters {
        iters: config.newton_max_iters,
        x_alpha: xa,
        x_gamma: xg,
    })
}

/// Locates the tie line without an initial estimate.
///
/// Searches the common potential between its lowest admissible value and the
/// point where both phases would hold the same composition. Beyond that point
/// ferrite is the richer phase and no ferrite + austenite field with
/// `x_alpha < x_gamma` exists. Returns `None` when the intercept gap does not
/// change sign, i.e. one phase is stable at every composition.
///
/// # Errors
///
/// Propagates model and bisection failures.
pub(super) fn bracket<M: GibbsModel>(
    phases: &Phases<'_, M>,
    config: &EquilibriumConfig,
    transcript: &mut Transcript,
) -> Result<Option<TieLine>, TieLineError> {
    let composition = config.composition_bisection();

    let crossing = CrossingModel { phases };
    let lo = X_MIN;
    let hi = phases.upper(Phase::Alpha).min(phases.upper(Phase::Gamma));
    let at_lo = crossing.call(&lo)?;
    let at_hi = crossing.call(&hi)?;

    if at_lo.residual <= 0.0 {
        transcript.record(|| "ferrite is the richer phase at every potential".to_string());
        return Ok(None);
    }

    let mu_lo = phases
        .potential(Phase::Alpha, lo)?
        .max(phases.potential(Phase::Gamma, lo)?);
    let mut iterations = 0;
    let mu_hi = if at_hi.residual < 0.0 {
        let solution = bisection::solve(
            &crossing,
            &RootProblem::<Point>::new(),
            [lo, hi],
            &composition,
            |event: &bisection::Event<'_, _, _>| {
                if event.result().is_err() {
                    return Some(bisection::Action::assume_positive());
                }
                None
            },
        )?;
        if solution.status != bisection::Status::Converged {
            return Err(TieLineError::BisectionMaxIters {
                residual: solution.residual,
                iters: solution.iters,
            });
        }
        iterations += solution.iters;
        phases.potential(Phase::Alpha, solution.snapshot.output.x)?
    } else {
        phases
            .potential(Phase::Alpha, phases.upper(Phase::Alpha))?
            .min(phases.potential(Phase::Gamma, phases.upper(Phase::Gamma))?)
    };

    let intercepts = InterceptModel {
        phases,
        config: composition,
    };
    let gap_lo = intercepts.call(&mu_lo)?.gap;
    let gap_hi = intercepts.call(&mu_hi)?.gap;
    transcript.record(|| {
        format!("bracket mu=[{mu_lo:.6e}, {mu_hi:.6e}] gap=[{gap_lo:.6e}, {gap_hi:.6e}]")
    });
    if !(gap_lo < 0.0 && gap_hi > 0.0) {
        return Ok(None);
    }

    let solution = bisection::solve(
        &intercepts,
        &RootProblem::<Intercepts>::new(),
        [mu_lo, mu_hi],
        &config.potential_bisection(),
        |event: &bisection::Event<'_, _, _>| {
            if event.result().is_err() {
                return Some(bisection::Action::assume_positive());
            }
            None
        },
    )?;
    if solution.status != bisection::Status::Converged {
        return Err(TieLineError::BisectionMaxIters {
            residual: solution.residual,
            iters: solution.iters,
        });
    }
    iterations += solution.iters;

    let found = solution.snapshot.output;
    transcript.record(|| {
        format!(
            "bisection converged: x_alpha={:.12e} x_gamma={:.12e}",
            found.x_alpha, found.x_gamma
        )
    });

    // Polish; the bisection answer stands if Newton cannot improve it.
    let polished = refine(phases, (found.x_alpha, found.x_gamma), config, transcript);
    Ok(Some(match polished {
        Ok(tie) => TieLine {
            iterations: iterations + tie.iterations,
            ..tie
        },
        Err(error) => {
            transcript.record(|| format!("polish skipped: {error}"));
            TieLine {
                x_alpha: found.x_alpha,
                x_gamma: found.x_gamma,
                iterations,
            }
        }
    }))
}
