//! Local ferrite + austenite equilibrium at fixed temperature and bulk nitrogen.
//!
//! At a fixed temperature the two-phase field is bounded by a single tie line,
//! so minimizing `phi_alpha G_alpha(x_alpha) + phi_gamma G_gamma(x_gamma)`
//! under mass balance reduces to a common-tangent construction followed by the
//! lever rule. The tie line is refined by Newton from a warm start when one is
//! available, and otherwise located by nested bisection on the shared
//! potential.
//!
//! The solver never fails loudly: bad inputs and non-convergence come back as
//! an [`Equilibrium`] with `success == false` and the last candidate state.

mod problem;
mod tie_line;
mod transcript;

pub use transcript::Transcript;

use twine_solvers::equation::bisection;
use uom::si::{
    f64::{MolarEnergy, ThermodynamicTemperature},
    molar_energy::joule_per_mole,
    thermodynamic_temperature::kelvin,
};

use crate::support::{
    calphad::{GibbsModel, IronNitrogen, Phase, ThermoError},
    units::{mass_to_mole_fraction, nitrogen_activity},
};

use tie_line::{Phases, TieLine, TieLineError};

/// Phase fractions and phase compositions (nitrogen mole fractions).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquilibriumState {
    pub phi_alpha: f64,
    pub phi_gamma: f64,
    pub x_alpha: f64,
    pub x_gamma: f64,
}

impl EquilibriumState {
    /// Equal phase fractions with both phases at the bulk mole fraction `x`.
    #[must_use]
    pub fn cold(x: f64) -> Self {
        Self {
            phi_alpha: 0.5,
            phi_gamma: 0.5,
            x_alpha: x,
            x_gamma: x,
        }
    }

    /// Absolute violation of `phi_alpha + phi_gamma = 1`.
    #[must_use]
    pub fn phase_sum_error(&self) -> f64 {
        (self.phi_alpha + self.phi_gamma - 1.0).abs()
    }

    /// Absolute violation of the mass balance against bulk mole fraction `x`.
    #[must_use]
    pub fn mass_balance_error(&self, x: f64) -> f64 {
        (self.phi_alpha * self.x_alpha + self.phi_gamma * self.x_gamma - x).abs()
    }

    fn is_bounded(&self) -> bool {
        [self.phi_alpha, self.phi_gamma, self.x_alpha, self.x_gamma]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

/// Outcome of one equilibrium solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Equilibrium {
    pub state: EquilibriumState,

    /// Nitrogen activity of the equilibrated material; `NaN` when unavailable.
    pub activity: f64,

    /// Whether `state` satisfies both equality constraints within tolerance.
    ///
    /// When `false`, `state` holds the last candidate and must not be
    /// mistaken for an equilibrium.
    pub success: bool,

    /// Newton plus bisection iterations spent.
    pub iterations: usize,

    pub transcript: Transcript,
}

/// Solver configuration for local equilibrium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquilibriumConfig {
    /// Tolerance on the phase-sum and mass-balance constraints.
    pub tolerance: f64,

    /// Maximum Newton iterations when refining a tie line.
    pub newton_max_iters: usize,

    /// Relative Newton step below which the tie line is converged.
    pub newton_tol: f64,

    /// Maximum iteration count for each bisection solve.
    pub bisection_max_iters: usize,

    /// Nitriding potential scaling the reported activity.
    pub nitriding_potential: f64,

    /// Transcript lines kept per solve; zero keeps none.
    pub transcript_capacity: usize,
}

impl Default for EquilibriumConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            newton_max_iters: 50,
            newton_tol: 1e-10,
            bisection_max_iters: 200,
            nitriding_potential: 0.05,
            transcript_capacity: 0,
        }
    }
}

impl EquilibriumConfig {
    /// Bisection configuration for searches over a mole fraction.
    pub(crate) fn composition_bisection(&self) -> bisection::Config {
        bisection::Config {
            max_iters: self.bisection_max_iters,
            x_abs_tol: 1e-15,
            x_rel_tol: 1e-13,
            residual_tol: 1e-9,
        }
    }

    /// Bisection configuration for searches over a potential in J/mol.
    pub(crate) fn potential_bisection(&self) -> bisection::Config {
        bisection::Config {
            max_iters: self.bisection_max_iters,
            x_abs_tol: 1e-9,
            x_rel_tol: 1e-14,
            residual_tol: 1e-9,
        }
    }
}

/// Local equilibrium as seen by the diffusion simulator.
pub trait EquilibriumSolver {
    /// Equilibrates bulk nitrogen mass fraction `mass_fraction` at `temperature`.
    ///
    /// Without a `guess` the solve starts from [`EquilibriumState::cold`].
    fn equilibrate(
        &self,
        temperature: ThermodynamicTemperature,
        mass_fraction: f64,
        guess: Option<&EquilibriumState>,
    ) -> Equilibrium;
}

/// Two-phase ferrite + austenite equilibrium for any [`GibbsModel`].
#[derive(Debug, Clone, Default)]
pub struct TwoPhaseEquilibrium<M = IronNitrogen> {
    model: M,
    config: EquilibriumConfig,
}

impl<M: GibbsModel> TwoPhaseEquilibrium<M> {
    #[must_use]
    pub fn new(model: M, config: EquilibriumConfig) -> Self {
        Self { model, config }
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    #[must_use]
    pub fn config(&self) -> &EquilibriumConfig {
        &self.config
    }

    fn solve(
        &self,
        temperature: ThermodynamicTemperature,
        x: f64,
        guess: Option<&EquilibriumState>,
        transcript: &mut Transcript,
    ) -> Result<(EquilibriumState, usize), TieLineError> {
        let phases = Phases::new(&self.model, temperature);

        let warm = guess
            .map(|g| (g.x_alpha, g.x_gamma))
            .filter(|&(xa, xg)| phases.admits(xa, xg));

        let tie = match warm {
            Some(start) => match tie_line::refine(&phases, start, &self.config, transcript) {
                Ok(tie) => Some(tie),
                Err(error) => {
                    transcript.record(|| format!("warm start rejected: {error}"));
                    tie_line::bracket(&phases, &self.config, transcript)?
                }
            },
            None => tie_line::bracket(&phases, &self.config, transcript)?,
        };

        match tie {
            Some(tie) => Ok((lever_rule(x, &tie), tie.iterations)),
            None => Ok((single_phase(&phases, x)?, 0)),
        }
    }

    fn total_gibbs(
        &self,
        state: &EquilibriumState,
        temperature: ThermodynamicTemperature,
    ) -> Result<MolarEnergy, ThermoError> {
        let mut g = MolarEnergy::new::<joule_per_mole>(0.0);
        if state.phi_alpha > 0.0 {
            g += state.phi_alpha * self.model.gibbs_energy(Phase::Alpha, state.x_alpha, temperature)?;
        }
        if state.phi_gamma > 0.0 {
            g += state.phi_gamma * self.model.gibbs_energy(Phase::Gamma, state.x_gamma, temperature)?;
        }
        Ok(g)
    }
}

impl<M: GibbsModel> EquilibriumSolver for TwoPhaseEquilibrium<M> {
    fn equilibrate(
        &self,
        temperature: ThermodynamicTemperature,
        mass_fraction: f64,
        guess: Option<&EquilibriumState>,
    ) -> Equilibrium {
        let mut transcript = Transcript::with_capacity(self.config.transcript_capacity);
        let x = mass_to_mole_fraction(mass_fraction);
        let candidate = guess.copied().unwrap_or_else(|| EquilibriumState::cold(x));

        let failed = |state: EquilibriumState, iterations: usize, transcript: Transcript| Equilibrium {
            state,
            activity: f64::NAN,
            success: false,
            iterations,
            transcript,
        };

        let t = temperature.get::<kelvin>();
        if !(t.is_finite() && t > 0.0) {
            transcript.record(|| format!("rejected temperature {t} K"));
            return failed(candidate, 0, transcript);
        }
        if !(0.0..1.0).contains(&mass_fraction) {
            transcript.record(|| format!("rejected mass fraction {mass_fraction}"));
            return failed(candidate, 0, transcript);
        }

        let (state, iterations) = match self.solve(temperature, x, guess, &mut transcript) {
            Ok(solved) => solved,
            Err(error) => {
                transcript.record(|| format!("equilibrium failed: {error}"));
                return failed(candidate, 0, transcript);
            }
        };

        let activity = match self.total_gibbs(&state, temperature) {
            Ok(g) => nitrogen_activity(self.config.nitriding_potential, g, temperature),
            Err(error) => {
                transcript.record(|| format!("activity unavailable: {error}"));
                return failed(state, iterations, transcript);
            }
        };

        let tolerance = self.config.tolerance;
        let success = state.is_bounded()
            && state.phase_sum_error() <= tolerance
            && state.mass_balance_error(x) <= tolerance;

        Equilibrium {
            state,
            activity,
            success,
            iterations,
            transcript,
        }
    }
}

/// Splits bulk mole fraction `x` across the tie line.
fn lever_rule(x: f64, tie: &TieLine) -> EquilibriumState {
    let (xa, xg) = (tie.x_alpha, tie.x_gamma);
    if x <= xa {
        EquilibriumState {
            phi_alpha: 1.0,
            phi_gamma: 0.0,
            x_alpha: x,
            x_gamma: xg,
        }
    } else if x >= xg {
        EquilibriumState {
            phi_alpha: 0.0,
            phi_gamma: 1.0,
            x_alpha: xa,
            x_gamma: x,
        }
    } else {
        let phi_alpha = (xg - x) / (xg - xa);
        EquilibriumState {
            phi_alpha,
            phi_gamma: 1.0 - phi_alpha,
            x_alpha: xa,
            x_gamma: xg,
        }
    }
}

/// Picks the lower-energy phase when no two-phase field exists.
fn single_phase<M: GibbsModel>(
    phases: &Phases<'_, M>,
    x: f64,
) -> Result<EquilibriumState, ThermoError> {
    let alpha_stable = match (phases.gibbs(Phase::Alpha, x), phases.gibbs(Phase::Gamma, x)) {
        (Ok(ga), Ok(gg)) => ga <= gg,
        (Ok(_), Err(_)) => true,
        (Err(_), Ok(_)) => false,
        (Err(error), Err(_)) => return Err(error),
    };
    let phi_alpha = if alpha_stable { 1.0 } else { 0.0 };
    Ok(EquilibriumState {
        phi_alpha,
        phi_gamma: 1.0 - phi_alpha,
        x_alpha: x,
        x_gamma: x,
    })
}
