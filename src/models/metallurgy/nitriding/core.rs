//! Coupled local equilibrium and nitrogen diffusion through a 1-D layer.
//!
//! The profile is discretized into cells of uniform width. At every
//! coefficient evaluation each cell is equilibrated into ferrite and
//! austenite, the phase diffusivities are mixed by the local ferrite
//! fraction, and harmonic-mean face coefficients drive the flux between
//! neighbouring cells. Both end cells hold their supplied values.
//!
//! Two integrators share that pipeline: an explicit adaptive Runge–Kutta
//! 3(2) pair and a fixed-step linearized backward Euler.

mod coefficient;
mod config;
mod error;
mod explicit;
mod flux;
mod implicit;
mod input;
mod results;
mod schedule;
mod state;

#[cfg(test)]
mod test_support;

pub use coefficient::{Arrhenius, MixingRule, PhaseDiffusivities};
pub use config::{ExplicitConfig, ImplicitConfig, NonConvergencePolicy};
pub use error::{InputError, SimulationError};
pub use input::Input;
pub use results::{Diagnostics, NonConvergedCell, Results, Snapshot};
pub use schedule::{Isothermal, PiecewiseLinear, TemperatureSchedule};

use crate::support::equilibrium::{EquilibriumSolver, TwoPhaseEquilibrium};

use coefficient::CoefficientModel;
use state::SimulationState;

/// Entry point for simulating a nitriding layer.
///
/// The equilibrium solver is fixed by the type parameter; diffusivities,
/// mixing rule and non-convergence policy are builder options.
#[derive(Debug, Clone, Default)]
pub struct NitridingLayer<S = TwoPhaseEquilibrium> {
    solver: S,
    diffusivities: PhaseDiffusivities,
    mixing: MixingRule,
    policy: NonConvergencePolicy,
}

impl NitridingLayer {
    /// A layer using the Fe–N two-phase equilibrium and literature diffusivities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: EquilibriumSolver> NitridingLayer<S> {
    /// Replaces the local equilibrium solver.
    #[must_use]
    pub fn with_solver<S2: EquilibriumSolver>(self, solver: S2) -> NitridingLayer<S2> {
        NitridingLayer {
            solver,
            diffusivities: self.diffusivities,
            mixing: self.mixing,
            policy: self.policy,
        }
    }

    #[must_use]
    pub fn with_diffusivities(mut self, diffusivities: PhaseDiffusivities) -> Self {
        self.diffusivities = diffusivities;
        self
    }

    #[must_use]
    pub fn with_mixing_rule(mut self, mixing: MixingRule) -> Self {
        self.mixing = mixing;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: NonConvergencePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Simulates the run with the explicit adaptive-step integrator.
    ///
    /// # Errors
    ///
    /// Returns a [`SimulationError`] if the configuration is invalid, the
    /// schedule leaves the physical range, the stepper gives up, or an
    /// equilibrium fails under [`NonConvergencePolicy::Abort`].
    pub fn solve_explicit<T: TemperatureSchedule>(
        &self,
        input: &Input<T>,
        config: &ExplicitConfig,
    ) -> Result<Results, SimulationError> {
        let model = self.coefficient_model();
        let mut state = SimulationState::initialize(input, &model)?;
        state.begin();
        let outcome = explicit::run(
            &mut state,
            model,
            input.schedule(),
            input.duration(),
            config,
        );
        complete(state, input, &model, outcome)
    }

    /// Simulates the run with the implicit fixed-step integrator.
    ///
    /// # Errors
    ///
    /// Returns a [`SimulationError`] if the configuration is invalid, the
    /// schedule leaves the physical range, a step's linear system is
    /// singular, or an equilibrium fails under [`NonConvergencePolicy::Abort`].
    pub fn solve_implicit<T: TemperatureSchedule>(
        &self,
        input: &Input<T>,
        config: &ImplicitConfig,
    ) -> Result<Results, SimulationError> {
        let model = self.coefficient_model();
        let mut state = SimulationState::initialize(input, &model)?;
        state.begin();
        let outcome = implicit::run(
            &mut state,
            model,
            input.schedule(),
            input.duration(),
            config,
        );
        complete(state, input, &model, outcome)
    }

    fn coefficient_model(&self) -> CoefficientModel<'_, S> {
        CoefficientModel {
            solver: &self.solver,
            diffusivities: self.diffusivities,
            mixing: self.mixing,
            policy: self.policy,
        }
    }
}

/// Evaluates the final coefficients and closes out the run.
fn complete<S, T>(
    mut state: SimulationState,
    input: &Input<T>,
    model: &CoefficientModel<'_, S>,
    outcome: Result<(), SimulationError>,
) -> Result<Results, SimulationError>
where
    S: EquilibriumSolver,
    T: TemperatureSchedule,
{
    match outcome.and_then(|()| state.final_field(input, model)) {
        Ok(field) => Ok(state.finish(input, field)),
        Err(error) => {
            state.fail(&error);
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::{Length, ThermodynamicTemperature, Time},
        length::micrometer,
        thermodynamic_temperature::kelvin,
        time::second,
    };

    use crate::support::equilibrium::{Equilibrium, EquilibriumState, Transcript};

    use super::test_support::{BOUNDARY, CELLS, INTERIOR, scenario, scenario_with, step_profile};

    /// Checks the invariants every run of the step-profile scenario must keep.
    fn check_step_scenario(results: &Results) {
        let last = CELLS - 1;
        for snapshot in &results.history {
            assert_eq!(snapshot.mass_fraction[0], BOUNDARY);
            assert_eq!(snapshot.mass_fraction[last], BOUNDARY);
        }
        assert_eq!(results.mass_fraction[0], BOUNDARY);
        assert_eq!(results.mass_fraction[last], BOUNDARY);

        let mut previous = INTERIOR;
        for snapshot in &results.history {
            let w = snapshot.mass_fraction[1];
            assert!(w >= previous, "cell 1 fell to {w} at {:?}", snapshot.time);
            assert!(w <= BOUNDARY);
            previous = w;
        }

        // Symmetric boundaries give a symmetric profile.
        for i in 0..CELLS {
            assert_relative_eq!(
                results.mass_fraction[i],
                results.mass_fraction[last - i],
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn explicit_step_profile() {
        let results = NitridingLayer::new()
            .solve_explicit(&scenario(), &ExplicitConfig::default())
            .unwrap();

        check_step_scenario(&results);
        assert_eq!(results.history.len(), 601);
        assert_relative_eq!(results.mass_fraction[1], 3.134e-3, max_relative = 0.01);
        assert_eq!(results.diagnostics.non_converged_cells, 0);

        let stepper = results.diagnostics.stepper.unwrap();
        assert!(stepper.accepted_steps >= 600);
        assert_eq!(results.diagnostics.implicit_steps, 0);
    }

    #[test]
    fn implicit_step_profile() {
        let results = NitridingLayer::new()
            .solve_implicit(&scenario(), &ImplicitConfig::default())
            .unwrap();

        check_step_scenario(&results);
        assert_eq!(results.history.len(), 601);
        assert_eq!(results.diagnostics.implicit_steps, 600);
        assert_eq!(results.diagnostics.coefficient_evaluations, 601);
        assert!(results.diagnostics.stepper.is_none());
    }

    #[test]
    fn explicit_and_implicit_agree() {
        let layer = NitridingLayer::new();
        let input = scenario();
        let explicit = layer
            .solve_explicit(&input, &ExplicitConfig::default())
            .unwrap();
        let implicit = layer
            .solve_implicit(&input, &ImplicitConfig::default())
            .unwrap();

        for (e, i) in explicit.mass_fraction.iter().zip(&implicit.mass_fraction) {
            assert_relative_eq!(*e, *i, max_relative = 0.02);
        }
    }

    #[test]
    fn final_fields_describe_the_end_state() {
        let results = NitridingLayer::new()
            .solve_implicit(&scenario(), &ImplicitConfig::default())
            .unwrap();

        assert_eq!(results.positions.len(), CELLS);
        assert_relative_eq!(results.positions[0].get::<micrometer>(), 0.0);
        assert_relative_eq!(results.positions[CELLS - 1].get::<micrometer>(), 100.0);
        assert_relative_eq!(results.final_temperature.get::<kelvin>(), 823.0);

        // The rich surface holds far more austenite than the core.
        let middle = CELLS / 2;
        assert!(results.ferrite_fraction[0] > 0.0);
        assert!(results.ferrite_fraction[0] < 0.9);
        assert!(results.ferrite_fraction[middle] > 0.99);
        assert!(results.diffusivity[middle] > results.diffusivity[0]);
    }

    #[test]
    fn boundaries_keep_their_own_values() {
        let mut profile = step_profile(11);
        profile[10] = 0.0;
        let input = scenario_with(profile, 60.0);

        let results = NitridingLayer::new()
            .solve_implicit(&input, &ImplicitConfig::default())
            .unwrap();

        assert_eq!(results.mass_fraction[0], BOUNDARY);
        assert_eq!(results.mass_fraction[10], 0.0);
        assert!(results.mass_fraction[1] > results.mass_fraction[9]);
    }

    #[test]
    fn custom_time_points_set_history_length() {
        let input = scenario_with(step_profile(CELLS), 60.0);
        let results = NitridingLayer::new()
            .solve_implicit(
                &input,
                &ImplicitConfig {
                    time_points: Some(7),
                    report_every: 2,
                },
            )
            .unwrap();

        let times: Vec<f64> = results
            .history
            .iter()
            .map(|s| s.time.get::<second>())
            .collect();
        assert_eq!(times, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
    }

    #[test]
    fn rejects_invalid_scheme_parameters() {
        let layer = NitridingLayer::new();
        let input = scenario_with(step_profile(5), 10.0);

        let explicit = layer.solve_explicit(
            &input,
            &ExplicitConfig {
                time_points: Some(1),
                ..ExplicitConfig::default()
            },
        );
        assert!(matches!(
            explicit,
            Err(SimulationError::InvalidInput(InputError::Scheme {
                name: "time_points",
                ..
            }))
        ));

        let implicit = layer.solve_implicit(
            &input,
            &ImplicitConfig {
                time_points: None,
                report_every: 0,
            },
        );
        assert!(matches!(
            implicit,
            Err(SimulationError::InvalidInput(InputError::Scheme {
                name: "report_every",
                ..
            }))
        ));
    }

    #[test]
    fn temperature_leaving_the_physical_range_stops_the_run() {
        // Valid at both ends, but crosses zero in the middle of the run.
        let schedule = |t: Time| {
            let s = t.get::<second>();
            let k = if (4.0..6.0).contains(&s) { -1.0 } else { 823.0 };
            ThermodynamicTemperature::new::<kelvin>(k)
        };
        let input = Input::new(
            step_profile(5),
            Length::new::<micrometer>(100.0),
            Time::new::<second>(10.0),
            schedule,
        )
        .unwrap();

        let result = NitridingLayer::new().solve_implicit(&input, &ImplicitConfig::default());
        assert!(matches!(
            result,
            Err(SimulationError::InvalidInput(InputError::Temperature { seconds, .. }))
                if seconds == 4.0
        ));
    }

    /// Converges everywhere except in cells richer than `limit`.
    #[derive(Debug)]
    struct PickySolver {
        limit: f64,
    }

    impl EquilibriumSolver for PickySolver {
        fn equilibrate(
            &self,
            _temperature: ThermodynamicTemperature,
            mass_fraction: f64,
            _guess: Option<&EquilibriumState>,
        ) -> Equilibrium {
            Equilibrium {
                state: EquilibriumState {
                    phi_alpha: 1.0,
                    phi_gamma: 0.0,
                    x_alpha: mass_fraction,
                    x_gamma: mass_fraction,
                },
                activity: f64::NAN,
                success: mass_fraction < self.limit,
                iterations: 0,
                transcript: Transcript::default(),
            }
        }
    }

    #[test]
    fn non_convergence_is_counted_or_fatal() {
        let input = scenario_with(step_profile(5), 5.0);
        let layer = NitridingLayer::new().with_solver(PickySolver { limit: 0.005 });

        let results = layer
            .solve_implicit(&input, &ImplicitConfig::default())
            .unwrap();
        // Two boundary cells per solve sweep: the cold start, five steps and
        // the final state.
        assert_eq!(results.diagnostics.non_converged_cells, 14);
        let first = results.diagnostics.first_non_converged.unwrap();
        assert_eq!(first.cell, 0);
        assert_eq!(first.time.get::<second>(), 0.0);

        // The cold start already fails, so neither scheme takes a step.
        let aborting = layer.with_policy(NonConvergencePolicy::Abort);
        assert!(matches!(
            aborting.solve_explicit(&input, &ExplicitConfig::default()),
            Err(SimulationError::EquilibriumNonConvergence { cell: 0, .. })
        ));
        assert!(matches!(
            aborting.solve_implicit(&input, &ImplicitConfig::default()),
            Err(SimulationError::EquilibriumNonConvergence { cell: 0, time, .. })
                if time.get::<second>() == 0.0
        ));
    }

    #[test]
    fn frozen_diffusion_leaves_the_profile_unchanged() {
        let profile = step_profile(5);
        let input = Input::new(
            profile.clone(),
            Length::new::<micrometer>(100.0),
            Time::new::<second>(5.0),
            Isothermal(ThermodynamicTemperature::new::<kelvin>(12.0)),
        )
        .unwrap();
        let layer = NitridingLayer::new();

        let implicit = layer
            .solve_implicit(&input, &ImplicitConfig::default())
            .unwrap();
        assert_eq!(implicit.mass_fraction, profile);
        assert!(implicit.diffusivity.iter().all(|d| d.value == 0.0));

        let explicit = layer
            .solve_explicit(&input, &ExplicitConfig::default())
            .unwrap();
        assert_eq!(explicit.mass_fraction, profile);
    }

    #[test]
    fn mixing_rule_changes_the_profile() {
        let input = scenario_with(step_profile(CELLS), 120.0);
        let parallel = NitridingLayer::new()
            .solve_implicit(&input, &ImplicitConfig::default())
            .unwrap();
        let weighted = NitridingLayer::new()
            .with_mixing_rule(MixingRule::VolumeWeighted)
            .solve_implicit(&input, &ImplicitConfig::default())
            .unwrap();

        // Volume weighting lets the fast ferrite path dominate the surface cells.
        assert!(weighted.mass_fraction[1] > parallel.mass_fraction[1]);
    }
}
