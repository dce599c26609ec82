//! Nitrides a 100 µm section from both faces and prints the final profile.
//!
//! The part heats from 700 K to 823 K over a minute, holds, and the run is
//! solved with both integrators for comparison.

use nitriding_models::models::metallurgy::nitriding::{
    ExplicitConfig, ImplicitConfig, Input, NitridingLayer, PiecewiseLinear,
};
use uom::si::{
    diffusion_coefficient::square_meter_per_second,
    f64::{Length, ThermodynamicTemperature, Time},
    length::micrometer,
    thermodynamic_temperature::kelvin,
    time::second,
};

const CELLS: usize = 21;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut profile = vec![0.0005; CELLS];
    profile[0] = 0.01;
    profile[CELLS - 1] = 0.01;

    let schedule = PiecewiseLinear::new(vec![
        (
            Time::new::<second>(0.0),
            ThermodynamicTemperature::new::<kelvin>(700.0),
        ),
        (
            Time::new::<second>(60.0),
            ThermodynamicTemperature::new::<kelvin>(823.0),
        ),
    ])?;

    let input = Input::new(
        profile,
        Length::new::<micrometer>(100.0),
        Time::new::<second>(600.0),
        schedule,
    )?;

    let layer = NitridingLayer::new();
    let implicit = layer.solve_implicit(&input, &ImplicitConfig::default())?;
    let explicit = layer.solve_explicit(&input, &ExplicitConfig::default())?;

    println!(
        "{:>10} {:>12} {:>12} {:>10} {:>12}",
        "x (µm)", "w implicit", "w explicit", "ferrite", "D (m²/s)"
    );
    for i in 0..CELLS {
        println!(
            "{:>10.1} {:>12.4e} {:>12.4e} {:>10.4} {:>12.3e}",
            implicit.positions[i].get::<micrometer>(),
            implicit.mass_fraction[i],
            explicit.mass_fraction[i],
            implicit.ferrite_fraction[i],
            implicit.diffusivity[i].get::<square_meter_per_second>(),
        );
    }

    match implicit.case_depth(0.001) {
        Some(depth) => println!("case depth at 0.1 wt% N: {:.1} µm", depth.get::<micrometer>()),
        None => println!("case depth at 0.1 wt% N: not reached"),
    }

    let diagnostics = &explicit.diagnostics;
    println!(
        "explicit: {} equilibrium solves, {} non-converged",
        diagnostics.equilibrium_solves, diagnostics.non_converged_cells
    );
    if let Some(stepper) = diagnostics.stepper {
        println!(
            "explicit: {} accepted / {} rejected steps",
            stepper.accepted_steps, stepper.rejected_steps
        );
    }

    Ok(())
}
