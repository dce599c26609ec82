//! Adaptive explicit integration of first-order ODE systems.
//!
//! A system implements [`OdeSystem`] by writing `dy/dt` for a given state.
//! [`BogackiShampine`] advances it with an embedded Runge–Kutta 3(2) pair,
//! choosing its own steps and landing exactly on each requested output time.

mod bogacki_shampine;

pub use bogacki_shampine::{BogackiShampine, StepperConfig};

use std::convert::Infallible;

use thiserror::Error;

/// A system of ordinary differential equations `dy/dt = f(t, y)`.
///
/// `derivative` takes `&mut self` so a system can keep caches that are
/// updated as it is evaluated, such as warm starts for nested solves.
pub trait OdeSystem {
    type Error: std::error::Error + 'static;

    /// Writes `f(t, y)` into `dydt`, which has the same length as `y`.
    ///
    /// # Errors
    ///
    /// Returns the system's error if `f` cannot be evaluated.
    fn derivative(&mut self, t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), Self::Error>;
}

/// The state of an ODE system at a single point in the solution.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// The independent variable (time).
    pub x: f64,

    /// The dependent variables at `x`.
    pub y: Vec<f64>,
}

/// States at every requested output time, plus step counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub states: Vec<State>,
    pub statistics: Statistics,
}

/// Step counters from one integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

/// Errors that stop an integration.
#[derive(Debug, Error)]
pub enum OdeError<E> {
    /// Output times were empty, unordered, or not finite.
    #[error("output times must be finite and non-decreasing")]
    InvalidTimes,

    /// The system failed to evaluate its derivative.
    #[error("system evaluation failed at t={t}")]
    System {
        t: f64,
        #[source]
        source: E,
    },

    /// The derivative contained `NaN` or an infinity.
    #[error("non-finite derivative at t={t} in component {index}")]
    NonFinite { t: f64, index: usize },

    /// The error controller shrank the step below what `t` can resolve.
    #[error("step size {step} underflowed at t={t}")]
    StepUnderflow { t: f64, step: f64 },

    /// The configured step budget ran out before the last output time.
    #[error("step budget of {max_steps} exhausted at t={t}")]
    TooManySteps { t: f64, max_steps: usize },
}

impl<E> OdeError<E> {
    /// Separates a failure of the system itself from a failure of the stepper.
    ///
    /// Returns the stepper failure, or `Err` with the system's own error.
    ///
    /// # Errors
    ///
    /// Returns the wrapped system error for [`OdeError::System`].
    pub fn stepper_failure(self) -> Result<OdeError<Infallible>, E> {
        match self {
            Self::System { source, .. } => Err(source),
            Self::InvalidTimes => Ok(OdeError::InvalidTimes),
            Self::NonFinite { t, index } => Ok(OdeError::NonFinite { t, index }),
            Self::StepUnderflow { t, step } => Ok(OdeError::StepUnderflow { t, step }),
            Self::TooManySteps { t, max_steps } => Ok(OdeError::TooManySteps { t, max_steps }),
        }
    }
}
