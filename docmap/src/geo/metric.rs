use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Unit in which a distance is expressed.
///
/// The multiplier is the earth radius in that unit; dividing a distance by
/// it yields radians, which is what spherical queries on legacy coordinate
/// pairs expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Metric {
    /// Plain coordinate units, no conversion.
    #[default]
    Neutral,
    Kilometers,
    Miles,
}

impl Metric {
    pub fn multiplier(&self) -> f64 {
        match self {
            Metric::Neutral => 1.0,
            Metric::Kilometers => 6378.137,
            Metric::Miles => 3963.191,
        }
    }

    /// Number of meters in one unit. GeoJSON queries measure in meters.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            Metric::Neutral => 1.0,
            Metric::Kilometers => 1000.0,
            Metric::Miles => 1609.344,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Metric::Neutral => "",
            Metric::Kilometers => "km",
            Metric::Miles => "mi",
        }
    }
}

/// A non-negative distance in a given [Metric].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    value: f64,
    metric: Metric,
}

impl Distance {
    /// Creates a distance.
    ///
    /// # Errors
    /// Returns an error for negative or non-finite values.
    pub fn new(value: f64, metric: Metric) -> DocmapResult<Self> {
        if !value.is_finite() || value < 0.0 {
            log::error!("Invalid distance value {}", value);
            return Err(DocmapError::new(
                &format!("Distance must be a finite, non-negative number, got {}", value),
                ErrorKind::ValidationError,
            ));
        }
        Ok(Distance { value, metric })
    }

    /// A distance in plain coordinate units.
    pub fn neutral(value: f64) -> DocmapResult<Self> {
        Self::new(value, Metric::Neutral)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// The distance in radians, `value / metric.multiplier()`.
    pub fn normalized_value(&self) -> f64 {
        self.value / self.metric.multiplier()
    }

    /// The distance in meters.
    pub fn in_meters(&self) -> f64 {
        self.value * self.metric.meters_per_unit()
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.metric {
            Metric::Neutral => write!(f, "{}", self.value),
            metric => write!(f, "{} {}", self.value, metric.abbreviation()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_value_divides_by_earth_radius() {
        let distance = Distance::new(6378.137, Metric::Kilometers).unwrap();
        assert!((distance.normalized_value() - 1.0).abs() < 1e-12);

        let neutral = Distance::neutral(3.0).unwrap();
        assert_eq!(neutral.normalized_value(), 3.0);
    }

    #[test]
    fn in_meters_converts_units() {
        assert_eq!(Distance::new(2.0, Metric::Kilometers).unwrap().in_meters(), 2000.0);
        assert_eq!(Distance::new(1.0, Metric::Miles).unwrap().in_meters(), 1609.344);
        assert_eq!(Distance::neutral(5.0).unwrap().in_meters(), 5.0);
    }

    #[test]
    fn rejects_negative_and_nan() {
        assert_eq!(
            Distance::neutral(-1.0).unwrap_err().kind(),
            &ErrorKind::ValidationError
        );
        assert!(Distance::neutral(f64::NAN).is_err());
        assert!(Distance::neutral(0.0).is_ok());
    }

    #[test]
    fn display_appends_abbreviation() {
        assert_eq!(Distance::new(10.0, Metric::Kilometers).unwrap().to_string(), "10 km");
        assert_eq!(Distance::neutral(0.5).unwrap().to_string(), "0.5");
    }
}
