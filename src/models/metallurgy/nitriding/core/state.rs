use log::debug;
use uom::si::{
    diffusion_coefficient::square_meter_per_second,
    f64::{DiffusionCoefficient, Length, Time},
    length::meter,
    time::second,
};

use crate::support::equilibrium::{EquilibriumSolver, EquilibriumState};

use super::{
    Diagnostics, Input, NonConvergedCell, Results, SimulationError, Snapshot, TemperatureSchedule,
    coefficient::{CoefficientField, CoefficientModel},
    schedule::check_temperature,
};

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Initialized,
    Running,
    Converged,
    Failed,
}

impl Lifecycle {
    /// Whether a run may move from `self` to `next`.
    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initialized, Self::Running)
                | (Self::Running, Self::Converged | Self::Failed)
        )
    }
}

/// Mutable state owned by a single run.
///
/// Created at the start of each solve and consumed by [`Self::finish`], so
/// runs never share a profile or a guess cache.
#[derive(Debug, Clone)]
pub(super) struct SimulationState {
    lifecycle: Lifecycle,

    /// Cell-center positions, m.
    pub(super) positions: Vec<f64>,

    /// Squared cell spacing, m².
    pub(super) dx2: f64,

    /// Warm starts for each cell's equilibrium solve.
    pub(super) guesses: Vec<EquilibriumState>,

    pub(super) profile: Vec<f64>,

    /// Fixed values of the first and last cell.
    pub(super) boundary: (f64, f64),

    pub(super) history: Vec<Snapshot>,
    pub(super) diagnostics: Diagnostics,
}

impl SimulationState {
    /// Builds the grid and fills the guess cache with cold solves at `t = 0`.
    ///
    /// Cold solves that fail are subject to the non-convergence policy.
    pub(super) fn initialize<S, T>(
        input: &Input<T>,
        model: &CoefficientModel<'_, S>,
    ) -> Result<Self, SimulationError>
    where
        S: EquilibriumSolver,
        T: TemperatureSchedule,
    {
        let profile = input.profile().to_vec();
        let n = profile.len();

        let length = input.domain_length().get::<meter>();
        #[allow(clippy::cast_precision_loss)]
        let dx = length / (n - 1) as f64;
        let positions = (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let i = i as f64;
                i * dx
            })
            .collect();

        let start = Time::new::<second>(0.0);
        let temperature = check_temperature(start, input.schedule().temperature(start))?;

        let mut diagnostics = Diagnostics::default();
        let mut guesses = Vec::with_capacity(n);
        for (cell, &w) in profile.iter().enumerate() {
            let result = model.solver.equilibrate(temperature, w, None);
            diagnostics.equilibrium_solves += 1;
            if !result.success {
                model.reject(
                    NonConvergedCell {
                        time: start,
                        cell,
                        temperature,
                        mass_fraction: w,
                    },
                    &mut diagnostics,
                )?;
            }
            guesses.push(result.state);
        }

        let boundary = (profile[0], profile[n - 1]);
        debug!("initialized {n} cells over {length:e} m");

        Ok(Self {
            lifecycle: Lifecycle::Initialized,
            positions,
            dx2: dx * dx,
            guesses,
            profile,
            boundary,
            history: Vec::new(),
            diagnostics,
        })
    }

    pub(super) fn begin(&mut self) {
        self.transition(Lifecycle::Running);
    }

    pub(super) fn fail(&mut self, error: &SimulationError) {
        debug!("run failed: {error}");
        self.transition(Lifecycle::Failed);
    }

    /// Resets both end cells to their supplied values.
    pub(super) fn impose_boundaries(&mut self) {
        let n = self.profile.len();
        self.profile[0] = self.boundary.0;
        self.profile[n - 1] = self.boundary.1;
    }

    /// Appends the current profile to the history.
    pub(super) fn record(&mut self, seconds: f64) {
        self.history.push(Snapshot {
            time: Time::new::<second>(seconds),
            mass_fraction: self.profile.clone(),
        });
    }

    /// Evaluates the coefficients of the final profile at the end time.
    pub(super) fn final_field<S, T>(
        &mut self,
        input: &Input<T>,
        model: &CoefficientModel<'_, S>,
    ) -> Result<CoefficientField, SimulationError>
    where
        S: EquilibriumSolver,
        T: TemperatureSchedule,
    {
        let end = input.duration();
        let temperature = check_temperature(end, input.schedule().temperature(end))?;
        model.evaluate(
            end,
            temperature,
            &self.profile,
            &mut self.guesses,
            &mut self.diagnostics,
        )
    }

    /// Hands back the results of a completed run.
    pub(super) fn finish<T: TemperatureSchedule>(
        mut self,
        input: &Input<T>,
        field: CoefficientField,
    ) -> Results {
        self.transition(Lifecycle::Converged);
        Results {
            positions: self
                .positions
                .iter()
                .map(|&x| Length::new::<meter>(x))
                .collect(),
            mass_fraction: self.profile,
            ferrite_fraction: field.ferrite,
            diffusivity: field
                .mixture
                .iter()
                .map(|&d| DiffusionCoefficient::new::<square_meter_per_second>(d))
                .collect(),
            final_temperature: input.schedule().temperature(input.duration()),
            history: self.history,
            diagnostics: self.diagnostics,
        }
    }

    fn transition(&mut self, next: Lifecycle) {
        debug_assert!(
            self.lifecycle.allows(next),
            "invalid transition {:?} -> {:?}",
            self.lifecycle,
            next
        );
        debug!("{:?} -> {:?}", self.lifecycle, next);
        self.lifecycle = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_runs_forward_only() {
        use Lifecycle::{Converged, Failed, Initialized, Running};

        assert!(Initialized.allows(Running));
        assert!(Running.allows(Converged));
        assert!(Running.allows(Failed));

        assert!(!Initialized.allows(Converged));
        assert!(!Initialized.allows(Failed));
        assert!(!Converged.allows(Running));
        assert!(!Failed.allows(Converged));
        assert!(!Running.allows(Running));
    }
}
