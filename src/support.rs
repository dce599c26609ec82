//! Supporting utilities used by models.
//!
//! These modules are public because they are useful on their own, but their
//! APIs are not stable.

pub mod calphad;
pub mod constraint;
pub mod equilibrium;
pub mod ode;
pub mod tridiagonal;
pub mod units;
