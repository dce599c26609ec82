//! Problem formulations for the bracketing tie-line search.
//!
//! Three one-dimensional root finds are nested here:
//!
//! - [`PotentialModel`] inverts one phase's potential `dG/dx = mu` for `x`.
//! - [`CrossingModel`] finds where both phases share a composition at equal
//!   potential, which caps the physically meaningful potential range.
//! - [`InterceptModel`] finds the potential at which both tangent intercepts
//!   coincide, i.e. the common tangent.

use std::{convert::Infallible, marker::PhantomData};

use twine_core::{EquationProblem, Model};
use twine_solvers::equation::bisection;

use crate::support::calphad::{GibbsModel, Phase, ThermoError};

use super::tie_line::{Phases, TieLineError};

/// Output of a scalar root-finding model.
pub(super) trait Residual {
    fn residual(&self) -> f64;
}

/// A composition together with a residual evaluated there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Point {
    pub(super) x: f64,
    pub(super) residual: f64,
}

impl Residual for Point {
    fn residual(&self) -> f64 {
        self.residual
    }
}

/// Evaluates `mu_phase(x) - target`.
pub(super) struct PotentialModel<'a, M> {
    pub(super) phases: &'a Phases<'a, M>,
    pub(super) phase: Phase,
    pub(super) target: f64,
}

impl<M: GibbsModel> Model for PotentialModel<'_, M> {
    type Input = f64;
    type Output = Point;
    type Error = ThermoError;

    fn call(&self, x: &f64) -> Result<Point, ThermoError> {
        let mu = self.phases.potential(self.phase, *x)?;
        Ok(Point {
            x: *x,
            residual: mu - self.target,
        })
    }
}

/// Evaluates `mu_alpha(x) - mu_gamma(x)` at a shared composition.
pub(super) struct CrossingModel<'a, M> {
    pub(super) phases: &'a Phases<'a, M>,
}

impl<M: GibbsModel> Model for CrossingModel<'_, M> {
    type Input = f64;
    type Output = Point;
    type Error = ThermoError;

    fn call(&self, x: &f64) -> Result<Point, ThermoError> {
        let alpha = self.phases.potential(Phase::Alpha, *x)?;
        let gamma = self.phases.potential(Phase::Gamma, *x)?;
        Ok(Point {
            x: *x,
            residual: alpha - gamma,
        })
    }
}

/// Phase compositions at a common potential and the gap between the
/// intercepts of their tangents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Intercepts {
    pub(super) x_alpha: f64,
    pub(super) x_gamma: f64,
    pub(super) gap: f64,
    pub(super) iterations: usize,
}

impl Residual for Intercepts {
    fn residual(&self) -> f64 {
        self.gap
    }
}

/// Inverts both potentials at `mu` and compares tangent intercepts.
///
/// The gap `(G_alpha - mu x_alpha) - (G_gamma - mu x_gamma)` grows with `mu`
/// as long as `x_gamma > x_alpha`, so a sign change brackets the tie line.
pub(super) struct InterceptModel<'a, M> {
    pub(super) phases: &'a Phases<'a, M>,
    pub(super) config: bisection::Config,
}

impl<M: GibbsModel> Model for InterceptModel<'_, M> {
    type Input = f64;
    type Output = Intercepts;
    type Error = TieLineError;

    fn call(&self, mu: &f64) -> Result<Intercepts, TieLineError> {
        let alpha = self.phases.invert_potential(Phase::Alpha, *mu, &self.config)?;
        let gamma = self.phases.invert_potential(Phase::Gamma, *mu, &self.config)?;

        let g_alpha = self.phases.gibbs(Phase::Alpha, alpha.x)?;
        let g_gamma = self.phases.gibbs(Phase::Gamma, gamma.x)?;

        Ok(Intercepts {
            x_alpha: alpha.x,
            x_gamma: gamma.x,
            gap: (g_alpha - mu * alpha.x) - (g_gamma - mu * gamma.x),
            iterations: alpha.iterations + gamma.iterations,
        })
    }
}

/// Root problem with the scalar search variable passed straight through.
pub(super) struct RootProblem<O> {
    _output: PhantomData<O>,
}

impl<O> RootProblem<O> {
    pub(super) fn new() -> Self {
        Self {
            _output: PhantomData,
        }
    }
}

impl<O: Residual> EquationProblem<1> for RootProblem<O> {
    type Input = f64;
    type Output = O;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(x[0])
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        Ok([output.residual()])
    }
}
