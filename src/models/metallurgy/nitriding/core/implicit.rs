use log::info;
use uom::si::{f64::Time, time::second};

use crate::support::equilibrium::EquilibriumSolver;

use super::{
    ImplicitConfig, InputError, SimulationError, TemperatureSchedule,
    coefficient::CoefficientModel,
    config::time_grid,
    flux::{face_coefficients, implicit_matrix},
    schedule::check_temperature,
    state::SimulationState,
};

/// Advances the profile to `duration` with linearized backward Euler.
///
/// Each step freezes the coefficients at the start of the step, so one
/// tridiagonal solve moves the profile from `t[k - 1]` to `t[k]`.
pub(super) fn run<S, T>(
    state: &mut SimulationState,
    model: CoefficientModel<'_, S>,
    schedule: &T,
    duration: Time,
    config: &ImplicitConfig,
) -> Result<(), SimulationError>
where
    S: EquilibriumSolver,
    T: TemperatureSchedule,
{
    if config.report_every == 0 {
        return Err(InputError::Scheme {
            name: "report_every",
            value: 0.0,
        }
        .into());
    }
    let times = time_grid(duration, config.time_points)?;

    info!(
        "implicit run: {} cells, {} steps to {:.2} s",
        state.profile.len(),
        times.len() - 1,
        duration.get::<second>()
    );

    state.record(times[0]);
    for (index, window) in times.windows(2).enumerate() {
        let (t0, t1) = (window[0], window[1]);
        let step = index + 1;
        if index % config.report_every == 0 {
            info!("advancing at {t0:.2} s");
        }

        state.impose_boundaries();

        let time = Time::new::<second>(t0);
        let temperature = check_temperature(time, schedule.temperature(time))?;
        let field = model.evaluate(
            time,
            temperature,
            &state.profile,
            &mut state.guesses,
            &mut state.diagnostics,
        )?;

        let faces = face_coefficients(&field.mixture, state.dx2);
        state.profile = implicit_matrix(&faces, t1 - t0)
            .solve(&state.profile)
            .map_err(|source| SimulationError::SingularSystem {
                step,
                time: Time::new::<second>(t1),
                source,
            })?;
        state.diagnostics.implicit_steps += 1;
        state.record(t1);
    }

    info!(
        "implicit run finished after {} steps",
        state.diagnostics.implicit_steps
    );
    Ok(())
}
