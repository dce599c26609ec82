//! CALPHAD-style molar Gibbs energies for interstitial solutions.
//!
//! The equilibrium solver only needs a pure function
//! `(phase, composition, temperature) -> molar Gibbs energy` plus its
//! composition derivative. That contract is the [`GibbsModel`] trait.
//! [`IronNitrogen`] implements it for ferrite and austenite with the
//! two-sublattice description `(Fe)1(N,Va)c`.

mod iron_nitrogen;
mod magnetic;
mod polynomial;

pub use iron_nitrogen::{Endmember, IronNitrogen, SublatticePhase};
pub use magnetic::MagneticOrdering;
pub use polynomial::GibbsPolynomial;

use std::fmt;

use thiserror::Error;
use uom::si::{
    f64::{MolarEnergy, ThermodynamicTemperature},
    molar_energy::joule_per_mole,
};

/// Crystallographic phases taking part in the nitriding equilibrium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Ferrite, BCC_A2.
    Alpha,
    /// Austenite, FCC_A1.
    Gamma,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Alpha => f.write_str("BCC_A2"),
            Phase::Gamma => f.write_str("FCC_A1"),
        }
    }
}

/// Errors raised when a Gibbs energy is requested outside the model's domain.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ThermoError {
    /// The mole fraction is outside the phase's admissible range.
    #[error("{phase}: mole fraction {x} outside [{min}, {max})")]
    Composition {
        phase: Phase,
        x: f64,
        min: f64,
        max: f64,
    },

    /// The absolute temperature is not strictly positive and finite.
    #[error("temperature must be positive and finite, got {kelvin} K")]
    Temperature { kelvin: f64 },
}

/// A molar Gibbs energy model for binary Fe–N phases.
///
/// Implementations must be pure and deterministic: the simulator evaluates
/// them thousands of times per run from a single thread and relies on
/// identical inputs giving identical outputs.
pub trait GibbsModel {
    /// Molar Gibbs energy of `phase` at nitrogen mole fraction `x`.
    ///
    /// # Errors
    ///
    /// Returns a [`ThermoError`] if `x` or `temperature` is outside the model domain.
    fn gibbs_energy(
        &self,
        phase: Phase,
        x: f64,
        temperature: ThermodynamicTemperature,
    ) -> Result<MolarEnergy, ThermoError>;

    /// Composition derivative `dG/dx` of [`GibbsModel::gibbs_energy`].
    ///
    /// The derivative diverges at `x = 0`, so the admissible range is open there.
    ///
    /// # Errors
    ///
    /// Returns a [`ThermoError`] if `x` or `temperature` is outside the model domain.
    fn potential(
        &self,
        phase: Phase,
        x: f64,
        temperature: ThermodynamicTemperature,
    ) -> Result<MolarEnergy, ThermoError>;

    /// Exclusive upper bound on the nitrogen mole fraction of `phase`.
    fn composition_limit(&self, phase: Phase) -> f64;

    /// Second composition derivative `d²G/dx²`.
    ///
    /// The default takes a central difference of [`GibbsModel::potential`].
    ///
    /// # Errors
    ///
    /// Returns a [`ThermoError`] if `x` or `temperature` is outside the model domain.
    fn curvature(
        &self,
        phase: Phase,
        x: f64,
        temperature: ThermodynamicTemperature,
    ) -> Result<MolarEnergy, ThermoError> {
        let h = 1e-6 * x.min(self.composition_limit(phase) - x);
        let hi = self.potential(phase, x + h, temperature)?;
        let lo = self.potential(phase, x - h, temperature)?;
        Ok(MolarEnergy::new::<joule_per_mole>(
            (hi - lo).get::<joule_per_mole>() / (2.0 * h),
        ))
    }
}
