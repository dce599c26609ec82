//! Numeric invariants checked once, at construction.
//!
//! A [`Constrained<T, C>`] holds a value that has already passed the check of
//! marker type `C`. Downstream code can then rely on the invariant without
//! re-validating it in hot loops.
//!
//! # Provided constraints
//!
//! - [`StrictlyPositive`]: greater than zero (lengths, durations, step sizes)
//! - [`Fraction`]: right-open unit interval `0 ≤ x < 1` (mass and mole fractions)
//!
//! # Example
//!
//! ```
//! use nitriding_models::support::constraint::{Fraction, StrictlyPositive};
//! use uom::si::{f64::Length, length::micrometer};
//!
//! let depth = StrictlyPositive::new(Length::new::<micrometer>(100.0)).unwrap();
//! assert_eq!(depth.into_inner().get::<micrometer>(), 100.0);
//!
//! assert!(Fraction::new(0.01).is_ok());
//! assert!(Fraction::new(1.0).is_err());
//! ```

use std::{cmp::Ordering, marker::PhantomData};

use num_traits::Zero;
use thiserror::Error;

/// Result of constructing a [`Constrained`] value.
pub type ConstraintResult<T> = Result<T, ConstraintError>;

/// A check that a value must pass before it can be wrapped in [`Constrained`].
pub trait Constraint<T> {
    /// Checks that `value` satisfies the constraint.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] describing the violation.
    fn check(value: &T) -> Result<(), ConstraintError>;
}

/// An error returned when a [`Constraint`] is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConstraintError {
    #[error("value must not be negative")]
    Negative,
    #[error("value must not be zero")]
    Zero,
    #[error("value is not a number")]
    NotANumber,
    #[error("value is above the maximum allowed")]
    AboveMaximum,
    #[error("value must be finite")]
    Infinite,
}

/// A value that satisfied constraint `C` when it was constructed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Constrained<T, C: Constraint<T>> {
    value: T,
    _marker: PhantomData<C>,
}

impl<T, C: Constraint<T>> Constrained<T, C> {
    /// Checks `value` against `C` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not satisfy the constraint.
    pub fn new(value: T) -> ConstraintResult<Self> {
        C::check(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    /// Consumes the wrapper and returns the inner value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T, C: Constraint<T>> AsRef<T> for Constrained<T, C> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Marker for values strictly greater than zero.
///
/// Works with any `PartialOrd + Zero` type, including `uom` quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictlyPositive;

impl StrictlyPositive {
    /// Constructs a [`Constrained<T, StrictlyPositive>`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is zero, negative, or `NaN`.
    pub fn new<T: PartialOrd + Zero>(
        value: T,
    ) -> ConstraintResult<Constrained<T, StrictlyPositive>> {
        Constrained::new(value)
    }
}

impl<T: PartialOrd + Zero> Constraint<T> for StrictlyPositive {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match value.partial_cmp(&T::zero()) {
            Some(Ordering::Greater) => Ok(()),
            Some(Ordering::Equal) => Err(ConstraintError::Zero),
            Some(Ordering::Less) => Err(ConstraintError::Negative),
            None => Err(ConstraintError::NotANumber),
        }
    }
}

/// Marker for composition fractions in the right-open unit interval `0 ≤ x < 1`.
///
/// The upper end is excluded because a pure-solute cell has no interstitial
/// sublattice left to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction;

impl Fraction {
    /// Constructs a [`Constrained<f64, Fraction>`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative, at or above one, or `NaN`.
    pub fn new(value: f64) -> ConstraintResult<Constrained<f64, Fraction>> {
        Constrained::new(value)
    }
}

impl Constraint<f64> for Fraction {
    fn check(value: &f64) -> Result<(), ConstraintError> {
        if value.is_nan() {
            Err(ConstraintError::NotANumber)
        } else if *value < 0.0 {
            Err(ConstraintError::Negative)
        } else if *value >= 1.0 {
            Err(ConstraintError::AboveMaximum)
        } else {
            Ok(())
        }
    }
}
