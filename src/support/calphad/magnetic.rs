use crate::support::units::GAS_CONSTANT;

/// Inden–Hillert–Jarl magnetic ordering parameters.
///
/// Negative critical temperatures and moments denote antiferromagnetic
/// ordering and are divided by `afm_factor`, following the usual database
/// convention. When `afm_factor <= -3` both values scale with the vacancy
/// fraction `1 - y` of the interstitial sublattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticOrdering {
    /// Curie or Néel temperature, K.
    pub critical_temperature: f64,

    /// Mean magnetic moment per atom, Bohr magnetons.
    pub moment: f64,

    /// Structure factor `p` (0.40 for BCC, 0.28 for FCC).
    pub structure_factor: f64,

    /// Antiferromagnetic factor.
    pub afm_factor: f64,
}

impl MagneticOrdering {
    /// Ferromagnetic BCC iron.
    pub const BCC: Self = Self {
        critical_temperature: 1043.0,
        moment: 2.22,
        structure_factor: 0.40,
        afm_factor: -1.0,
    };

    /// Antiferromagnetic FCC iron.
    pub const FCC: Self = Self {
        critical_temperature: -201.0,
        moment: -2.1,
        structure_factor: 0.28,
        afm_factor: -3.0,
    };

    /// Magnetic Gibbs energy and its derivative with respect to the
    /// interstitial site fraction `y`, both in J/mol, at `t` kelvin.
    pub(super) fn contribution(&self, y: f64, t: f64) -> (f64, f64) {
        let tc0 = self.normalized(self.critical_temperature);
        let beta0 = self.normalized(self.moment);

        let (scale, dscale) = if self.afm_factor <= -3.0 {
            (1.0 - y, -1.0)
        } else {
            (1.0, 0.0)
        };

        let tc = tc0 * scale;
        let beta = beta0 * scale;
        if tc <= 0.0 {
            return (0.0, 0.0);
        }

        let p = self.structure_factor;
        let a = 518.0 / 1125.0 + (11692.0 / 15975.0) * (1.0 / p - 1.0);
        let tau = t / tc;
        let (f, df) = if tau < 1.0 {
            below_critical(tau, p, a)
        } else {
            above_critical(tau, a)
        };

        let rt = GAS_CONSTANT * t;
        let ln_beta = beta.ln_1p();
        let g = rt * ln_beta * f;

        // d(tau)/dy = -tau * dscale / scale; d(beta)/dy = beta0 * dscale.
        let dtau = -tau * dscale / scale;
        let dg = rt * (beta0 * dscale / (1.0 + beta) * f + ln_beta * df * dtau);

        (g, dg)
    }

    fn normalized(&self, value: f64) -> f64 {
        if value > 0.0 {
            value
        } else {
            value / self.afm_factor
        }
    }
}

/// Shape function and derivative below the critical temperature.
fn below_critical(tau: f64, p: f64, a: f64) -> (f64, f64) {
    let k = (474.0 / 497.0) * (1.0 / p - 1.0);
    let t3 = tau.powi(3);
    let t9 = tau.powi(9);
    let t15 = tau.powi(15);
    let f = 1.0 - (79.0 / (140.0 * p * tau) + k * (t3 / 6.0 + t9 / 135.0 + t15 / 600.0)) / a;
    let df = -(-79.0 / (140.0 * p * tau * tau)
        + k * (tau * tau / 2.0 + tau.powi(8) / 15.0 + tau.powi(14) / 40.0))
        / a;
    (f, df)
}

/// Shape function and derivative above the critical temperature.
fn above_critical(tau: f64, a: f64) -> (f64, f64) {
    let f = -(tau.powi(-5) / 10.0 + tau.powi(-15) / 315.0 + tau.powi(-25) / 1500.0) / a;
    let df = (tau.powi(-6) / 2.0 + tau.powi(-16) / 21.0 + tau.powi(-26) / 60.0) / a;
    (f, df)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn numeric_derivative(ordering: &MagneticOrdering, y: f64, t: f64) -> f64 {
        let h = 1e-7;
        let (hi, _) = ordering.contribution(y + h, t);
        let (lo, _) = ordering.contribution(y - h, t);
        (hi - lo) / (2.0 * h)
    }

    #[test]
    fn bcc_is_independent_of_nitrogen() {
        let (g0, dg0) = MagneticOrdering::BCC.contribution(0.0, 823.0);
        let (g1, dg1) = MagneticOrdering::BCC.contribution(0.2, 823.0);
        assert_eq!(g0, g1);
        assert_eq!(dg0, 0.0);
        assert_eq!(dg1, 0.0);
        // Below the Curie point ferromagnetic ordering lowers the energy.
        assert!(g0 < 0.0);
    }

    #[test]
    fn fcc_derivative_matches_finite_difference() {
        for &(y, t) in &[(0.01, 823.0), (0.3, 823.0), (0.1, 1100.0), (0.1, 40.0)] {
            let (_, dg) = MagneticOrdering::FCC.contribution(y, t);
            assert_relative_eq!(
                dg,
                numeric_derivative(&MagneticOrdering::FCC, y, t),
                max_relative = 1e-5,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn shape_functions_are_continuous_at_critical_point() {
        let a = 518.0 / 1125.0 + (11692.0 / 15975.0) * (1.0 / 0.4 - 1.0);
        let (lo, _) = below_critical(1.0, 0.4, a);
        let (hi, _) = above_critical(1.0, a);
        assert_relative_eq!(lo, hi, epsilon = 1e-3);
    }
}
