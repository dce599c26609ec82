use std::convert::Infallible;

use thiserror::Error;
use uom::si::f64::{ThermodynamicTemperature, Time};

use crate::support::{constraint::ConstraintError, ode::OdeError, tridiagonal::TridiagonalError};

/// Errors that can occur while running a nitriding simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// An input was rejected before or during stepping.
    #[error("invalid input")]
    InvalidInput(#[from] InputError),

    /// The explicit stepper gave up.
    ///
    /// No partial profile is returned.
    #[error("explicit integration failed")]
    IntegrationFailure {
        #[source]
        source: OdeError<Infallible>,
    },

    /// The implicit system could not be solved.
    #[error("singular implicit system at step {step} (t={time:?})")]
    SingularSystem {
        step: usize,
        time: Time,
        #[source]
        source: TridiagonalError,
    },

    /// A local equilibrium did not converge and the abort policy is active.
    #[error(
        "equilibrium did not converge in cell {cell} at t={time:?} \
         (T={temperature:?}, w={mass_fraction})"
    )]
    EquilibriumNonConvergence {
        time: Time,
        cell: usize,
        temperature: ThermodynamicTemperature,
        mass_fraction: f64,
    },
}

/// Reasons an input is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The profile has no interior cell between its two boundary cells.
    #[error("profile needs at least 3 cells, got {cells}")]
    TooFewCells { cells: usize },

    #[error("mass fraction {value} in cell {cell}")]
    MassFraction {
        cell: usize,
        value: f64,
        #[source]
        source: ConstraintError,
    },

    #[error("domain length")]
    DomainLength(#[source] ConstraintError),

    #[error("duration")]
    Duration(#[source] ConstraintError),

    /// The schedule returned a non-positive or non-finite temperature.
    #[error("temperature {kelvin} K at t={seconds} s")]
    Temperature { seconds: f64, kelvin: f64 },

    /// A schedule needs at least one point, with strictly increasing times.
    #[error("temperature schedule points must be non-empty with increasing times")]
    Schedule,

    /// A scheme tuning parameter is out of range.
    #[error("scheme parameter {name} = {value}")]
    Scheme { name: &'static str, value: f64 },
}
