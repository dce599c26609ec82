use uom::si::{
    f64::{Length, ThermodynamicTemperature, Time},
    length::micrometer,
    thermodynamic_temperature::kelvin,
    time::second,
};

use super::{Input, Isothermal};

pub(super) const CELLS: usize = 21;
pub(super) const BOUNDARY: f64 = 0.01;
pub(super) const INTERIOR: f64 = 0.0005;

/// Nitrogen-rich end cells around lean interior cells.
pub(super) fn step_profile(cells: usize) -> Vec<f64> {
    let mut profile = vec![INTERIOR; cells];
    profile[0] = BOUNDARY;
    profile[cells - 1] = BOUNDARY;
    profile
}

/// A 100 µm section held at 823 K for ten minutes.
pub(super) fn scenario() -> Input<Isothermal> {
    scenario_with(step_profile(CELLS), 600.0)
}

pub(super) fn scenario_with(profile: Vec<f64>, seconds: f64) -> Input<Isothermal> {
    Input::new(
        profile,
        Length::new::<micrometer>(100.0),
        Time::new::<second>(seconds),
        Isothermal(ThermodynamicTemperature::new::<kelvin>(823.0)),
    )
    .expect("scenario input is valid")
}
