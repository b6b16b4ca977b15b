use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// One day of observations. A `None` value is a missing or unparseable
/// reading and never takes part in aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TemperatureRecord {
    pub date: NaiveDate,

    #[validate(range(min = -50.0, max = 50.0))]
    pub avg_temp: Option<f64>,

    #[validate(range(min = -50.0, max = 50.0))]
    pub min_temp: Option<f64>,

    #[validate(range(min = -50.0, max = 50.0))]
    pub max_temp: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureField {
    Average,
    Minimum,
    Maximum,
}

impl TemperatureField {
    pub const ALL: [TemperatureField; 3] = [
        TemperatureField::Average,
        TemperatureField::Minimum,
        TemperatureField::Maximum,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            TemperatureField::Average => "Average temperature",
            TemperatureField::Minimum => "Minimum temperature",
            TemperatureField::Maximum => "Maximum temperature",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            TemperatureField::Average => "avg",
            TemperatureField::Minimum => "min",
            TemperatureField::Maximum => "max",
        }
    }
}

impl fmt::Display for TemperatureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for TemperatureField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "avg" | "average" | "mean" => Ok(TemperatureField::Average),
            "min" | "minimum" => Ok(TemperatureField::Minimum),
            "max" | "maximum" => Ok(TemperatureField::Maximum),
            other => Err(format!(
                "unknown temperature field '{}' (expected avg, min or max)",
                other
            )),
        }
    }
}

impl TemperatureRecord {
    pub fn new(
        date: NaiveDate,
        avg_temp: Option<f64>,
        min_temp: Option<f64>,
        max_temp: Option<f64>,
    ) -> Self {
        Self {
            date,
            avg_temp,
            min_temp,
            max_temp,
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn is_same_day(&self, month: u32, day: u32) -> bool {
        self.month() == month && self.day() == day
    }

    pub fn value(&self, field: TemperatureField) -> Option<f64> {
        match field {
            TemperatureField::Average => self.avg_temp,
            TemperatureField::Minimum => self.min_temp,
            TemperatureField::Maximum => self.max_temp,
        }
    }

    pub fn has_missing_data(&self) -> bool {
        self.avg_temp.is_none() || self.min_temp.is_none() || self.max_temp.is_none()
    }

    pub fn is_complete(&self) -> bool {
        !self.has_missing_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_date_parts() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 14).unwrap();
        let record = TemperatureRecord::new(date, Some(8.1), Some(3.2), Some(13.9));

        assert_eq!(record.year(), 2024);
        assert_eq!(record.month(), 11);
        assert_eq!(record.day(), 14);
        assert!(record.is_same_day(11, 14));
        assert!(!record.is_same_day(11, 15));
    }

    #[test]
    fn test_field_access() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let record = TemperatureRecord::new(date, Some(-1.5), None, Some(2.0));

        assert_eq!(record.value(TemperatureField::Average), Some(-1.5));
        assert_eq!(record.value(TemperatureField::Minimum), None);
        assert_eq!(record.value(TemperatureField::Maximum), Some(2.0));
        assert!(record.has_missing_data());
    }

    #[test]
    fn test_temperature_validation() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 15).unwrap();

        let valid = TemperatureRecord::new(date, Some(25.5), Some(21.0), Some(31.0));
        assert!(valid.validate().is_ok());

        let invalid = TemperatureRecord::new(date, Some(55.0), Some(21.0), Some(31.0));
        assert!(invalid.validate().is_err());

        let missing = TemperatureRecord::new(date, None, None, None);
        assert!(missing.validate().is_ok());
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("avg".parse::<TemperatureField>(), Ok(TemperatureField::Average));
        assert_eq!("Minimum".parse::<TemperatureField>(), Ok(TemperatureField::Minimum));
        assert_eq!("max".parse::<TemperatureField>(), Ok(TemperatureField::Maximum));
        assert!("humidity".parse::<TemperatureField>().is_err());
    }
}
