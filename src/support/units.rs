//! Composition conversions and physical constants for the Fe–N system.
//!
//! The diffusion simulator tracks nitrogen as a *mass* fraction, because that
//! is what is measured on a nitrided part, while the thermodynamic model works
//! in *mole* fractions. The functions here convert between the two and are
//! used in both directions of the pipeline:
//!
//! ```
//! use nitriding_models::support::units::{mass_to_mole_fraction, mole_to_mass_fraction};
//!
//! let x = mass_to_mole_fraction(0.01);
//! assert!((mole_to_mass_fraction(x) - 0.01).abs() < 1e-15);
//! ```

use uom::si::{
    f64::{MolarEnergy, ThermodynamicTemperature},
    molar_energy::joule_per_mole,
    thermodynamic_temperature::kelvin,
};

/// Molar gas constant, J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.314_462_618_153_24;

/// Atomic mass of iron, g/mol.
pub const IRON_MOLAR_MASS: f64 = 55.847;

/// Atomic mass of nitrogen, g/mol.
pub const NITROGEN_MOLAR_MASS: f64 = 14.007;

/// Converts a nitrogen mass fraction into a nitrogen mole fraction.
#[must_use]
pub fn mass_to_mole_fraction(w: f64) -> f64 {
    w / (NITROGEN_MOLAR_MASS * (w / NITROGEN_MOLAR_MASS + (1.0 - w) / IRON_MOLAR_MASS))
}

/// Converts a nitrogen mole fraction into a nitrogen mass fraction.
#[must_use]
pub fn mole_to_mass_fraction(x: f64) -> f64 {
    x * NITROGEN_MOLAR_MASS / (x * NITROGEN_MOLAR_MASS + (1.0 - x) * IRON_MOLAR_MASS)
}

/// Nitrogen activity `kn * exp(-g / (R*T))` for a nitriding potential `kn`.
///
/// `g` is the molar Gibbs energy of the equilibrated material.
#[must_use]
pub fn nitrogen_activity(kn: f64, g: MolarEnergy, temperature: ThermodynamicTemperature) -> f64 {
    let rt = GAS_CONSTANT * temperature.get::<kelvin>();
    kn * (-g.get::<joule_per_mole>() / rt).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn mass_mole_round_trip() {
        for i in 0..1000 {
            let x = f64::from(i) / 1000.0;
            assert_relative_eq!(
                mass_to_mole_fraction(mole_to_mass_fraction(x)),
                x,
                epsilon = 1e-12
            );
            assert_relative_eq!(
                mole_to_mass_fraction(mass_to_mole_fraction(x)),
                x,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn one_weight_percent_nitrogen() {
        // Nitrogen is four times lighter than iron, so the mole fraction is larger.
        let x = mass_to_mole_fraction(0.01);
        assert_relative_eq!(x, 0.038_72, max_relative = 1e-3);
    }

    #[test]
    fn endpoints_are_preserved() {
        assert_eq!(mass_to_mole_fraction(0.0), 0.0);
        assert_relative_eq!(mass_to_mole_fraction(1.0), 1.0);
        assert_eq!(mole_to_mass_fraction(0.0), 0.0);
    }

    #[test]
    fn activity_scales_with_potential() {
        let t = ThermodynamicTemperature::new::<kelvin>(823.0);
        let g = MolarEnergy::new::<joule_per_mole>(-31_000.0);
        let a1 = nitrogen_activity(0.05, g, t);
        let a2 = nitrogen_activity(0.10, g, t);
        assert_relative_eq!(a2 / a1, 2.0);
        assert_relative_eq!(a1, 0.05 * (31_000.0 / (GAS_CONSTANT * 823.0)).exp());
    }
}
