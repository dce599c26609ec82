use uom::si::{
    f64::{ThermodynamicTemperature, Time},
    thermodynamic_temperature::kelvin,
    time::second,
};

use super::InputError;

/// Process temperature as a function of time.
///
/// Implementations must be pure; integrators evaluate them several times per
/// step and at repeated times.
pub trait TemperatureSchedule {
    fn temperature(&self, time: Time) -> ThermodynamicTemperature;
}

/// A constant process temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isothermal(pub ThermodynamicTemperature);

impl TemperatureSchedule for Isothermal {
    fn temperature(&self, _time: Time) -> ThermodynamicTemperature {
        self.0
    }
}

impl<F> TemperatureSchedule for F
where
    F: Fn(Time) -> ThermodynamicTemperature,
{
    fn temperature(&self, time: Time) -> ThermodynamicTemperature {
        self(time)
    }
}

/// Linear interpolation between `(time, temperature)` points.
///
/// Outside the first and last point the end temperature is held, so a
/// heat-up, hold and cool-down cycle is three or four points.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    points: Vec<(Time, ThermodynamicTemperature)>,
}

impl PiecewiseLinear {
    /// Builds a schedule from points ordered by strictly increasing time.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Schedule`] if there are no points or the times
    /// are not strictly increasing, and [`InputError::Temperature`] for a
    /// non-positive or non-finite temperature.
    pub fn new(points: Vec<(Time, ThermodynamicTemperature)>) -> Result<Self, InputError> {
        if points.is_empty()
            || points
                .windows(2)
                .any(|w| !(w[1].0.get::<second>() > w[0].0.get::<second>()))
        {
            return Err(InputError::Schedule);
        }
        for &(time, temperature) in &points {
            check_temperature(time, temperature)?;
        }
        Ok(Self { points })
    }

    #[must_use]
    pub fn points(&self) -> &[(Time, ThermodynamicTemperature)] {
        &self.points
    }
}

impl TemperatureSchedule for PiecewiseLinear {
    fn temperature(&self, time: Time) -> ThermodynamicTemperature {
        let t = time.get::<second>();
        let seconds = |i: usize| self.points[i].0.get::<second>();
        let last = self.points.len() - 1;

        if t <= seconds(0) {
            return self.points[0].1;
        }
        if t >= seconds(last) {
            return self.points[last].1;
        }

        let upper = self.points.partition_point(|(time, _)| time.get::<second>() <= t);
        let (t0, k0) = (seconds(upper - 1), self.points[upper - 1].1.get::<kelvin>());
        let (t1, k1) = (seconds(upper), self.points[upper].1.get::<kelvin>());
        let weight = (t - t0) / (t1 - t0);
        ThermodynamicTemperature::new::<kelvin>(k0 + weight * (k1 - k0))
    }
}

/// Checks that a temperature can be used by the thermodynamic model.
pub(super) fn check_temperature(
    time: Time,
    temperature: ThermodynamicTemperature,
) -> Result<ThermodynamicTemperature, InputError> {
    let k = temperature.get::<kelvin>();
    if k.is_finite() && k > 0.0 {
        Ok(temperature)
    } else {
        Err(InputError::Temperature {
            seconds: time.get::<second>(),
            kelvin: k,
        })
    }
}
