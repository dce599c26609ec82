//! Results types for nitriding runs.

use uom::si::f64::{DiffusionCoefficient, Length, ThermodynamicTemperature, Time};

use crate::support::ode::Statistics;

/// Final state of a nitriding run.
///
/// Per-cell vectors are ordered from the surface at `x = 0` (cell 0) to the
/// far boundary at the domain length (cell N-1).
#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    /// Cell-center positions.
    pub positions: Vec<Length>,

    /// Nitrogen mass fraction at the end time.
    pub mass_fraction: Vec<f64>,

    /// Local ferrite fraction at the end time.
    pub ferrite_fraction: Vec<f64>,

    /// Mixture diffusivity at the end time.
    pub diffusivity: Vec<DiffusionCoefficient>,

    /// Process temperature at the end time.
    pub final_temperature: ThermodynamicTemperature,

    /// The profile at every output time, starting with the initial one.
    pub history: Vec<Snapshot>,

    pub diagnostics: Diagnostics,
}

impl Results {
    /// Depth at which the mass fraction first falls to `threshold`.
    ///
    /// Interpolates linearly between cell centers. Returns `None` if the
    /// surface is already below `threshold` or the profile never reaches it.
    #[must_use]
    pub fn case_depth(&self, threshold: f64) -> Option<Length> {
        let w = &self.mass_fraction;
        if w.first().is_none_or(|&surface| surface < threshold) {
            return None;
        }
        let i = w.windows(2).position(|pair| pair[1] <= threshold)?;
        let (w0, w1) = (w[i], w[i + 1]);
        let fraction = if w0 == w1 { 0.0 } else { (w0 - threshold) / (w0 - w1) };
        Some(self.positions[i] + (self.positions[i + 1] - self.positions[i]) * fraction)
    }
}

/// The profile at one output time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: Time,
    pub mass_fraction: Vec<f64>,
}

/// Counters and first failure recorded during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Whole-profile coefficient evaluations.
    pub coefficient_evaluations: usize,

    /// Single-cell equilibrium solves, including the initial cold solves.
    pub equilibrium_solves: usize,

    /// Cell evaluations that proceeded with a non-converged equilibrium,
    /// including failed cold solves at `t = 0`.
    pub non_converged_cells: usize,

    pub first_non_converged: Option<NonConvergedCell>,

    /// Step counters from the explicit integrator.
    pub stepper: Option<Statistics>,

    /// Linear solves performed by the implicit integrator.
    pub implicit_steps: usize,
}

/// Where and when an equilibrium first failed to converge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonConvergedCell {
    pub time: Time,
    pub cell: usize,
    pub temperature: ThermodynamicTemperature,
    pub mass_fraction: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        diffusion_coefficient::square_meter_per_second, length::micrometer,
        thermodynamic_temperature::kelvin,
    };

    fn results(mass_fraction: Vec<f64>) -> Results {
        let n = mass_fraction.len();
        Results {
            positions: (0..n)
                .map(|i| Length::new::<micrometer>(10.0 * f64::from(u32::try_from(i).unwrap())))
                .collect(),
            ferrite_fraction: vec![1.0; n],
            diffusivity: vec![DiffusionCoefficient::new::<square_meter_per_second>(1e-12); n],
            final_temperature: ThermodynamicTemperature::new::<kelvin>(823.0),
            history: Vec::new(),
            diagnostics: Diagnostics::default(),
            mass_fraction,
        }
    }

    #[test]
    fn case_depth_interpolates_between_cells() {
        let results = results(vec![0.01, 0.006, 0.002, 0.001]);
        let depth = results.case_depth(0.004).unwrap();
        assert_relative_eq!(depth.get::<micrometer>(), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn case_depth_is_none_when_out_of_reach() {
        let results = results(vec![0.01, 0.008, 0.006]);
        assert!(results.case_depth(0.005).is_none());
        assert!(results.case_depth(0.02).is_none());
    }
}
