//! Nitriding layer models.
//!
//! This module provides a [`twine_core::Model`] implementation for the growth
//! of a nitrided layer. The computational core is in the internal `core`
//! module; [`NitridingLayer`] is its entry point.

mod core;

pub use self::core::{
    Arrhenius, Diagnostics, ExplicitConfig, ImplicitConfig, Input, InputError, Isothermal,
    MixingRule, NitridingLayer, NonConvergedCell, NonConvergencePolicy, PhaseDiffusivities,
    PiecewiseLinear, Results, SimulationError, Snapshot, TemperatureSchedule,
};

use std::marker::PhantomData;

use twine_core::Model;

use crate::support::equilibrium::{EquilibriumSolver, TwoPhaseEquilibrium};

/// Time integration scheme and its tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scheme {
    Explicit(ExplicitConfig),
    Implicit(ImplicitConfig),
}

impl Default for Scheme {
    fn default() -> Self {
        Self::Implicit(ImplicitConfig::default())
    }
}

/// A nitriding layer run as a [`Model`].
///
/// Maps an [`Input`] with schedule type `T` to the final [`Results`] using a
/// fixed layer and integration scheme.
#[derive(Debug, Clone)]
pub struct NitridingModel<S = TwoPhaseEquilibrium, T = Isothermal> {
    layer: NitridingLayer<S>,
    scheme: Scheme,
    _schedule: PhantomData<fn() -> T>,
}

impl<S: EquilibriumSolver, T: TemperatureSchedule> NitridingModel<S, T> {
    #[must_use]
    pub fn new(layer: NitridingLayer<S>, scheme: Scheme) -> Self {
        Self {
            layer,
            scheme,
            _schedule: PhantomData,
        }
    }

    #[must_use]
    pub fn layer(&self) -> &NitridingLayer<S> {
        &self.layer
    }

    #[must_use]
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }
}

impl<S: EquilibriumSolver, T: TemperatureSchedule> Model for NitridingModel<S, T> {
    type Input = Input<T>;
    type Output = Results;
    type Error = SimulationError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        match &self.scheme {
            Scheme::Explicit(config) => self.layer.solve_explicit(input, config),
            Scheme::Implicit(config) => self.layer.solve_implicit(input, config),
        }
    }
}
