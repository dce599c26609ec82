/// Six-coefficient temperature polynomial used for lattice stabilities.
///
/// `G(T) = a + b·T + c·T·ln(T) + d·T² + e·T³ + f/T`, in J/mol.
/// Coefficients are stored in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GibbsPolynomial(pub [f64; 6]);

impl GibbsPolynomial {
    /// SER reference of pure iron in its BCC_A2 ground state.
    pub const GHSER_FE: Self = Self([
        1224.83,
        124.134,
        -23.5143,
        -4.397_52e-3,
        -5.892_69e-8,
        77358.5,
    ]);

    /// SER reference of one mole of N2 gas; halve it for one mole of N atoms.
    pub const GHSER_N2: Self = Self([
        -3750.675,
        -9.45425,
        -12.7819,
        -1.766_86e-4,
        2.681e-9,
        -32374.0,
    ]);

    /// A polynomial contributing nothing.
    pub const ZERO: Self = Self([0.0; 6]);

    /// Evaluates the polynomial at `t` kelvin.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        let [a, b, c, d, e, f] = self.0;
        a + t * (b + c * t.ln() + d * t + e * t * t) + f / t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn evaluates_each_term() {
        let t: f64 = 500.0;
        assert_relative_eq!(GibbsPolynomial([2.0, 0.0, 0.0, 0.0, 0.0, 0.0]).evaluate(t), 2.0);
        assert_relative_eq!(GibbsPolynomial([0.0, 2.0, 0.0, 0.0, 0.0, 0.0]).evaluate(t), 1000.0);
        assert_relative_eq!(
            GibbsPolynomial([0.0, 0.0, 1.0, 0.0, 0.0, 0.0]).evaluate(t),
            t * t.ln()
        );
        assert_relative_eq!(GibbsPolynomial([0.0, 0.0, 0.0, 1.0, 0.0, 0.0]).evaluate(t), t * t);
        assert_relative_eq!(
            GibbsPolynomial([0.0, 0.0, 0.0, 0.0, 1.0, 0.0]).evaluate(t),
            t * t * t
        );
        assert_relative_eq!(GibbsPolynomial([0.0, 0.0, 0.0, 0.0, 0.0, 1.0]).evaluate(t), 1.0 / t);
        assert_eq!(GibbsPolynomial::ZERO.evaluate(t), 0.0);
    }

    #[test]
    fn iron_reference_at_nitriding_temperature() {
        assert_relative_eq!(
            GibbsPolynomial::GHSER_FE.evaluate(823.0),
            -29_441.241_901_5,
            max_relative = 1e-10
        );
    }
}
