use uom::si::{
    f64::{Length, Time},
    time::second,
};

use crate::support::constraint::{ConstraintError, Fraction, StrictlyPositive};

use super::{InputError, TemperatureSchedule, schedule::check_temperature};

/// A nitriding run: initial profile, geometry, duration and temperature.
///
/// The first and last entries of the profile are the boundary values and
/// are held fixed for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct Input<T> {
    profile: Vec<f64>,
    domain_length: Length,
    duration: Time,
    schedule: T,
}

impl<T: TemperatureSchedule> Input<T> {
    /// Validates and bundles the inputs for a run.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] if the profile has fewer than three cells or
    /// a mass fraction outside `[0, 1)`, if the length or duration is not
    /// strictly positive and finite, or if the schedule gives a non-physical temperature
    /// at the start or end of the run.
    pub fn new(
        profile: Vec<f64>,
        domain_length: Length,
        duration: Time,
        schedule: T,
    ) -> Result<Self, InputError> {
        if profile.len() < 3 {
            return Err(InputError::TooFewCells {
                cells: profile.len(),
            });
        }
        for (cell, &value) in profile.iter().enumerate() {
            Fraction::new(value).map_err(|source| InputError::MassFraction {
                cell,
                value,
                source,
            })?;
        }
        let domain_length = StrictlyPositive::new(domain_length)
            .map_err(InputError::DomainLength)?
            .into_inner();
        finite(domain_length.value).map_err(InputError::DomainLength)?;
        let duration = StrictlyPositive::new(duration)
            .map_err(InputError::Duration)?
            .into_inner();
        finite(duration.value).map_err(InputError::Duration)?;

        let start = Time::new::<second>(0.0);
        check_temperature(start, schedule.temperature(start))?;
        check_temperature(duration, schedule.temperature(duration))?;

        Ok(Self {
            profile,
            domain_length,
            duration,
            schedule,
        })
    }

    /// Initial mass fractions, boundary cells included.
    #[must_use]
    pub fn profile(&self) -> &[f64] {
        &self.profile
    }

    #[must_use]
    pub fn cells(&self) -> usize {
        self.profile.len()
    }

    #[must_use]
    pub fn domain_length(&self) -> Length {
        self.domain_length
    }

    #[must_use]
    pub fn duration(&self) -> Time {
        self.duration
    }

    #[must_use]
    pub fn schedule(&self) -> &T {
        &self.schedule
    }
}

fn finite(value: f64) -> Result<(), ConstraintError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConstraintError::Infinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::{
        f64::ThermodynamicTemperature, length::micrometer, thermodynamic_temperature::kelvin,
    };

    use super::super::Isothermal;

    fn input(
        profile: Vec<f64>,
        length: f64,
        duration: f64,
        t: f64,
    ) -> Result<Input<Isothermal>, InputError> {
        Input::new(
            profile,
            Length::new::<micrometer>(length),
            Time::new::<second>(duration),
            Isothermal(ThermodynamicTemperature::new::<kelvin>(t)),
        )
    }

    #[test]
    fn accepts_valid_input() {
        let input = input(vec![0.01, 0.0005, 0.0005, 0.01], 100.0, 600.0, 823.0).unwrap();
        assert_eq!(input.cells(), 4);
        assert_eq!(input.duration().get::<second>(), 600.0);
    }

    #[test]
    fn rejects_short_profiles() {
        assert_eq!(
            input(vec![0.01, 0.0], 100.0, 600.0, 823.0),
            Err(InputError::TooFewCells { cells: 2 })
        );
    }

    #[test]
    fn names_the_bad_cell() {
        assert_eq!(
            input(vec![0.01, 0.0, 1.2, 0.0], 100.0, 600.0, 823.0),
            Err(InputError::MassFraction {
                cell: 2,
                value: 1.2,
                source: ConstraintError::AboveMaximum,
            })
        );
    }

    #[test]
    fn rejects_non_positive_geometry_and_time() {
        let profile = vec![0.01, 0.0, 0.01];
        assert_eq!(
            input(profile.clone(), 0.0, 600.0, 823.0),
            Err(InputError::DomainLength(ConstraintError::Zero))
        );
        assert_eq!(
            input(profile.clone(), 100.0, -1.0, 823.0),
            Err(InputError::Duration(ConstraintError::Negative))
        );
        assert!(matches!(
            input(profile, 100.0, 600.0, 0.0),
            Err(InputError::Temperature { .. })
        ));
    }

    #[test]
    fn rejects_unbounded_geometry_and_time() {
        let profile = vec![0.01, 0.0, 0.01];
        assert_eq!(
            input(profile.clone(), f64::INFINITY, 600.0, 823.0),
            Err(InputError::DomainLength(ConstraintError::Infinite))
        );
        assert_eq!(
            input(profile, 100.0, f64::INFINITY, 823.0),
            Err(InputError::Duration(ConstraintError::Infinite))
        );
    }
}
