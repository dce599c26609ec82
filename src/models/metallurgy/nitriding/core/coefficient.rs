use log::warn;
use uom::si::{
    diffusion_coefficient::square_meter_per_second,
    f64::{DiffusionCoefficient, MolarEnergy, ThermodynamicTemperature, Time},
    molar_energy::joule_per_mole,
    thermodynamic_temperature::kelvin,
    time::second,
};

use crate::support::{
    equilibrium::{EquilibriumSolver, EquilibriumState},
    units::GAS_CONSTANT,
};

use super::{Diagnostics, NonConvergedCell, NonConvergencePolicy, SimulationError};

/// Arrhenius temperature dependence `D(T) = D0 exp(-Ea / (R T))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrhenius {
    pub prefactor: DiffusionCoefficient,
    pub activation_energy: MolarEnergy,
}

impl Arrhenius {
    #[must_use]
    pub fn new(prefactor: DiffusionCoefficient, activation_energy: MolarEnergy) -> Self {
        Self {
            prefactor,
            activation_energy,
        }
    }

    /// Diffusivity at `temperature`.
    #[must_use]
    pub fn at(&self, temperature: ThermodynamicTemperature) -> DiffusionCoefficient {
        let rt = GAS_CONSTANT * temperature.get::<kelvin>();
        self.prefactor * (-self.activation_energy.get::<joule_per_mole>() / rt).exp()
    }
}

/// Nitrogen diffusivity in each phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDiffusivities {
    pub ferrite: Arrhenius,
    pub austenite: Arrhenius,
}

impl PhaseDiffusivities {
    /// Literature values for interstitial nitrogen in ferrite and austenite.
    #[must_use]
    pub fn literature() -> Self {
        Self {
            ferrite: Arrhenius::new(
                DiffusionCoefficient::new::<square_meter_per_second>(4.87e-7),
                MolarEnergy::new::<joule_per_mole>(80_640.0),
            ),
            austenite: Arrhenius::new(
                DiffusionCoefficient::new::<square_meter_per_second>(4.84e-5),
                MolarEnergy::new::<joule_per_mole>(155_000.0),
            ),
        }
    }
}

impl Default for PhaseDiffusivities {
    fn default() -> Self {
        Self::literature()
    }
}

/// How phase diffusivities combine into an effective mixture diffusivity.
///
/// Each rule takes the local ferrite fraction `v`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MixingRule {
    /// `1 / (v / Da + (1 - v) / Dg)`.
    #[default]
    ParallelResistance,

    /// `v Da + (1 - v) Dg`.
    VolumeWeighted,

    /// `Da (1 - v)^2`.
    Labyrinth,
}

impl MixingRule {
    /// Mixes ferrite and austenite diffusivities at ferrite fraction `v`.
    ///
    /// `v` is clamped to `[0, 1]`. A phase with no weight adds no resistance,
    /// and a weighted phase with zero diffusivity blocks transport entirely.
    #[must_use]
    pub fn mix(self, v: f64, ferrite: f64, austenite: f64) -> f64 {
        let v = v.clamp(0.0, 1.0);
        match self {
            Self::ParallelResistance => {
                let total = resistance(v, ferrite) + resistance(1.0 - v, austenite);
                if total.is_finite() && total > 0.0 {
                    1.0 / total
                } else {
                    0.0
                }
            }
            Self::VolumeWeighted => v * ferrite + (1.0 - v) * austenite,
            Self::Labyrinth => ferrite * (1.0 - v).powi(2),
        }
    }
}

/// Resistance `weight / d` of one phase; infinite when a weighted phase cannot diffuse.
fn resistance(weight: f64, d: f64) -> f64 {
    if weight == 0.0 {
        0.0
    } else if d > 0.0 {
        weight / d
    } else {
        f64::INFINITY
    }
}

/// Per-cell coefficients from one evaluation, in SI units.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CoefficientField {
    /// Mixture diffusivity, m²/s.
    pub mixture: Vec<f64>,
    pub ferrite: Vec<f64>,
    pub non_converged: usize,
}

/// Borrowed view of everything needed to turn a profile into diffusivities.
#[derive(Debug)]
pub(super) struct CoefficientModel<'a, S> {
    pub solver: &'a S,
    pub diffusivities: PhaseDiffusivities,
    pub mixing: MixingRule,
    pub policy: NonConvergencePolicy,
}

impl<S> Clone for CoefficientModel<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for CoefficientModel<'_, S> {}

impl<S: EquilibriumSolver> CoefficientModel<'_, S> {
    /// Equilibrates every cell and mixes the phase diffusivities.
    ///
    /// Each cell is warm-started from its slot in `guesses`, which is
    /// overwritten only by converged solves.
    pub(super) fn evaluate(
        &self,
        time: Time,
        temperature: ThermodynamicTemperature,
        profile: &[f64],
        guesses: &mut [EquilibriumState],
        diagnostics: &mut Diagnostics,
    ) -> Result<CoefficientField, SimulationError> {
        let d_alpha = self
            .diffusivities
            .ferrite
            .at(temperature)
            .get::<square_meter_per_second>();
        let d_gamma = self
            .diffusivities
            .austenite
            .at(temperature)
            .get::<square_meter_per_second>();

        let mut field = CoefficientField {
            mixture: Vec::with_capacity(profile.len()),
            ferrite: Vec::with_capacity(profile.len()),
            non_converged: 0,
        };

        for (cell, (&w, guess)) in profile.iter().zip(guesses.iter_mut()).enumerate() {
            let result = self.solver.equilibrate(temperature, w, Some(&*guess));
            diagnostics.equilibrium_solves += 1;

            if result.success {
                *guess = result.state;
            } else {
                self.reject(
                    NonConvergedCell {
                        time,
                        cell,
                        temperature,
                        mass_fraction: w,
                    },
                    diagnostics,
                )?;
                field.non_converged += 1;
            }

            let v = result.state.phi_alpha.clamp(0.0, 1.0);
            field.ferrite.push(v);
            field.mixture.push(self.mixing.mix(v, d_alpha, d_gamma));
        }

        diagnostics.coefficient_evaluations += 1;
        if field.non_converged > 0 {
            warn!(
                "{} of {} cells did not reach equilibrium at t={:.3} s, T={:.1} K",
                field.non_converged,
                profile.len(),
                time.get::<second>(),
                temperature.get::<kelvin>(),
            );
        }

        Ok(field)
    }

    /// Applies the non-convergence policy to a failed solve.
    ///
    /// Under [`NonConvergencePolicy::Proceed`] the cell is counted and the
    /// first failure of the run is kept.
    pub(super) fn reject(
        &self,
        failure: NonConvergedCell,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), SimulationError> {
        if self.policy == NonConvergencePolicy::Abort {
            return Err(SimulationError::EquilibriumNonConvergence {
                time: failure.time,
                cell: failure.cell,
                temperature: failure.temperature,
                mass_fraction: failure.mass_fraction,
            });
        }
        diagnostics.non_converged_cells += 1;
        if diagnostics.first_non_converged.is_none() {
            diagnostics.first_non_converged = Some(failure);
        }
        Ok(())
    }
}
