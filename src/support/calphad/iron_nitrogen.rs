use uom::si::{
    f64::{MolarEnergy, ThermodynamicTemperature},
    molar_energy::joule_per_mole,
    thermodynamic_temperature::kelvin,
};

use crate::support::units::GAS_CONSTANT;

use super::{GibbsModel, GibbsPolynomial, MagneticOrdering, Phase, ThermoError};

/// Lattice stability of one endmember of a sublattice phase.
///
/// Evaluates to `excess(T) + iron·GHSERFE(T) + nitrogen·GHSERN(T)`, where
/// `GHSERN` is the per-atom nitrogen reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endmember {
    pub excess: GibbsPolynomial,
    pub iron: f64,
    pub nitrogen: f64,
}

impl Endmember {
    /// Molar Gibbs energy of the endmember at `t` kelvin.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        self.excess.evaluate(t)
            + self.iron * GibbsPolynomial::GHSER_FE.evaluate(t)
            + self.nitrogen * 0.5 * GibbsPolynomial::GHSER_N2.evaluate(t)
    }
}

/// A two-sublattice interstitial solution `(Fe)1(N,Va)c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SublatticePhase {
    /// Endmember with every interstitial site filled by nitrogen.
    pub nitride: Endmember,

    /// Endmember with every interstitial site vacant.
    pub vacant: Endmember,

    /// Regular-solution interaction between N and Va, J/mol.
    pub interaction: f64,

    /// Interstitial sites per iron atom.
    pub sites: f64,

    pub magnetic: Option<MagneticOrdering>,
}

impl SublatticePhase {
    /// Ferrite, `(Fe)1(N,Va)3`.
    pub const BCC_A2: Self = Self {
        nitride: Endmember {
            excess: GibbsPolynomial([93562.0, 165.07, 0.0, 0.0, 0.0, 0.0]),
            iron: 1.0,
            nitrogen: 3.0,
        },
        vacant: Endmember {
            excess: GibbsPolynomial::ZERO,
            iron: 1.0,
            nitrogen: 0.0,
        },
        interaction: 0.0,
        sites: 3.0,
        magnetic: Some(MagneticOrdering::BCC),
    };

    /// Austenite, `(Fe)1(N,Va)1`.
    pub const FCC_A1: Self = Self {
        nitride: Endmember {
            excess: GibbsPolynomial([-37460.0, 375.42, -37.6, 0.0, 0.0, 0.0]),
            iron: 1.0,
            nitrogen: 1.0,
        },
        vacant: Endmember {
            excess: GibbsPolynomial([-1462.4, 8.282, -1.15, 6.4e-4, 0.0, 0.0]),
            iron: 1.0,
            nitrogen: 0.0,
        },
        interaction: -26150.0,
        sites: 1.0,
        magnetic: Some(MagneticOrdering::FCC),
    };

    /// Exclusive upper bound on the nitrogen mole fraction, reached when
    /// every interstitial site is occupied.
    #[must_use]
    pub fn composition_limit(&self) -> f64 {
        self.sites / (1.0 + self.sites)
    }

    /// Interstitial site fraction of nitrogen at mole fraction `x`.
    #[must_use]
    pub fn site_fraction(&self, x: f64) -> f64 {
        x / ((1.0 - x) * self.sites)
    }

    fn gibbs(&self, y: f64, t: f64) -> f64 {
        let v = 1.0 - y;
        let entropy = self.sites * GAS_CONSTANT * t * (y_ln_y(y) + y_ln_y(v));
        let magnetic = self.magnetic.map_or(0.0, |m| m.contribution(y, t).0);

        y * self.nitride.evaluate(t)
            + v * self.vacant.evaluate(t)
            + entropy
            + y * v * self.interaction
            + magnetic
    }

    fn gibbs_derivative(&self, y: f64, t: f64) -> f64 {
        let magnetic = self.magnetic.map_or(0.0, |m| m.contribution(y, t).1);

        self.nitride.evaluate(t) - self.vacant.evaluate(t)
            + self.sites * GAS_CONSTANT * t * (y / (1.0 - y)).ln()
            + (1.0 - 2.0 * y) * self.interaction
            + magnetic
    }
}

fn y_ln_y(y: f64) -> f64 {
    if y > 0.0 { y * y.ln() } else { 0.0 }
}

/// Fe–N ferrite and austenite Gibbs energies.
///
/// Parameters default to the published assessment of the iron–nitrogen
/// system. Either phase can be replaced to study sensitivity to a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IronNitrogen {
    pub alpha: SublatticePhase,
    pub gamma: SublatticePhase,
}

impl Default for IronNitrogen {
    fn default() -> Self {
        Self {
            alpha: SublatticePhase::BCC_A2,
            gamma: SublatticePhase::FCC_A1,
        }
    }
}

impl IronNitrogen {
    #[must_use]
    pub fn new(alpha: SublatticePhase, gamma: SublatticePhase) -> Self {
        Self { alpha, gamma }
    }

    /// The sublattice description of `phase`.
    #[must_use]
    pub fn phase(&self, phase: Phase) -> &SublatticePhase {
        match phase {
            Phase::Alpha => &self.alpha,
            Phase::Gamma => &self.gamma,
        }
    }

    fn validate(
        &self,
        phase: Phase,
        x: f64,
        temperature: ThermodynamicTemperature,
        open_at_zero: bool,
    ) -> Result<(&SublatticePhase, f64), ThermoError> {
        let t = temperature.get::<kelvin>();
        if !(t.is_finite() && t > 0.0) {
            return Err(ThermoError::Temperature { kelvin: t });
        }

        let description = self.phase(phase);
        let max = description.composition_limit();
        let above_min = if open_at_zero { x > 0.0 } else { x >= 0.0 };
        if !(above_min && x < max) {
            return Err(ThermoError::Composition {
                phase,
                x,
                min: 0.0,
                max,
            });
        }

        Ok((description, t))
    }
}

impl GibbsModel for IronNitrogen {
    fn gibbs_energy(
        &self,
        phase: Phase,
        x: f64,
        temperature: ThermodynamicTemperature,
    ) -> Result<MolarEnergy, ThermoError> {
        let (description, t) = self.validate(phase, x, temperature, false)?;
        let y = description.site_fraction(x);
        Ok(MolarEnergy::new::<joule_per_mole>(description.gibbs(y, t)))
    }

    fn potential(
        &self,
        phase: Phase,
        x: f64,
        temperature: ThermodynamicTemperature,
    ) -> Result<MolarEnergy, ThermoError> {
        let (description, t) = self.validate(phase, x, temperature, true)?;
        let y = description.site_fraction(x);
        let dy_dx = 1.0 / (description.sites * (1.0 - x).powi(2));
        Ok(MolarEnergy::new::<joule_per_mole>(
            description.gibbs_derivative(y, t) * dy_dx,
        ))
    }

    fn composition_limit(&self, phase: Phase) -> f64 {
        self.phase(phase).composition_limit()
    }
}
