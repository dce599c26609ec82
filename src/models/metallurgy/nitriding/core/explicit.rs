use log::{debug, info};
use uom::si::{f64::Time, time::second};

use crate::support::{
    equilibrium::EquilibriumSolver,
    ode::{BogackiShampine, OdeSystem},
};

use super::{
    ExplicitConfig, SimulationError, TemperatureSchedule,
    coefficient::CoefficientModel,
    config::time_grid,
    flux::{derivative, face_coefficients},
    schedule::check_temperature,
    state::SimulationState,
};

/// The semi-discrete diffusion equation as an ODE system over the profile.
///
/// Every derivative evaluation re-equilibrates all cells at the current
/// temperature and updates the run's guess cache.
struct DiffusionSystem<'a, S, T> {
    model: CoefficientModel<'a, S>,
    schedule: &'a T,
    state: &'a mut SimulationState,
}

impl<S, T> OdeSystem for DiffusionSystem<'_, S, T>
where
    S: EquilibriumSolver,
    T: TemperatureSchedule,
{
    type Error = SimulationError;

    fn derivative(&mut self, t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), SimulationError> {
        let time = Time::new::<second>(t);
        let temperature = check_temperature(time, self.schedule.temperature(time))?;

        let field = self.model.evaluate(
            time,
            temperature,
            y,
            &mut self.state.guesses,
            &mut self.state.diagnostics,
        )?;

        let faces = face_coefficients(&field.mixture, self.state.dx2);
        derivative(&faces, y, dydt);
        Ok(())
    }
}

/// Advances the profile to `duration` with the adaptive Bogacki–Shampine pair.
pub(super) fn run<S, T>(
    state: &mut SimulationState,
    model: CoefficientModel<'_, S>,
    schedule: &T,
    duration: Time,
    config: &ExplicitConfig,
) -> Result<(), SimulationError>
where
    S: EquilibriumSolver,
    T: TemperatureSchedule,
{
    let stepper = BogackiShampine::new(config.stepper()?);
    let times = time_grid(duration, config.time_points)?;

    info!(
        "explicit run: {} cells, {} output times to {:.2} s",
        state.profile.len(),
        times.len(),
        duration.get::<second>()
    );

    let y0 = state.profile.clone();
    let mut system = DiffusionSystem {
        model,
        schedule,
        state: &mut *state,
    };
    let solution = stepper
        .integrate(&mut system, &y0, &times)
        .map_err(|error| match error.stepper_failure() {
            Ok(source) => SimulationError::IntegrationFailure { source },
            Err(system) => system,
        })?;

    for output in solution.states {
        debug!("reached t={:.3} s", output.x);
        state.profile = output.y;
        state.record(output.x);
    }
    state.diagnostics.stepper = Some(solution.statistics);

    info!(
        "explicit run finished: {} accepted, {} rejected steps, {} evaluations",
        solution.statistics.accepted_steps,
        solution.statistics.rejected_steps,
        solution.statistics.evaluations
    );
    Ok(())
}
