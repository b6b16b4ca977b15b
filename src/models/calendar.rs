use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ProcessingError, Result};

const EXAM_YEAR_CALENDAR: &str = include_str!("../../data/calendars/exam_days_by_exam_year.json");
const ACADEMIC_YEAR_CALENDAR: &str =
    include_str!("../../data/calendars/exam_days_by_academic_year.json");

/// A versioned list of labelled dates, e.g. the days the national college
/// entrance exam was held. Entry order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedDateCalendar {
    pub name: String,
    pub version: u32,
    #[serde(default)]
    pub label_kind: String,
    pub entries: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub label: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The bundled exam-day calendars. They list the same exam days but label
/// them differently: by the year the exam was sat, or by the academic year
/// it admits into (which also reaches back to the 1993 sitting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalendarVariant {
    ExamYear,
    AcademicYear,
}

impl CalendarVariant {
    pub fn name(&self) -> &'static str {
        match self {
            CalendarVariant::ExamYear => "exam-year",
            CalendarVariant::AcademicYear => "academic-year",
        }
    }

    pub fn load(&self) -> Result<FixedDateCalendar> {
        let source = match self {
            CalendarVariant::ExamYear => EXAM_YEAR_CALENDAR,
            CalendarVariant::AcademicYear => ACADEMIC_YEAR_CALENDAR,
        };
        FixedDateCalendar::from_json_str(source)
    }
}

impl fmt::Display for CalendarVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CalendarVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exam-year" => Ok(CalendarVariant::ExamYear),
            "academic-year" => Ok(CalendarVariant::AcademicYear),
            other => Err(format!(
                "unknown calendar variant '{}' (expected exam-year or academic-year)",
                other
            )),
        }
    }
}

impl FixedDateCalendar {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let calendar: FixedDateCalendar = serde_json::from_str(json)?;
        calendar.check()?;
        Ok(calendar)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(ProcessingError::Calendar(format!(
                "calendar '{}' has no entries",
                self.name
            )));
        }

        let mut labels = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !labels.insert(entry.label.as_str()) {
                return Err(ProcessingError::Calendar(format!(
                    "calendar '{}' repeats label '{}'",
                    self.name, entry.label
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bundled_exam_year_calendar() {
        let calendar = CalendarVariant::ExamYear.load().unwrap();

        assert_eq!(calendar.name, "exam-days-by-exam-year");
        assert_eq!(calendar.len(), 32);
        assert_eq!(calendar.entries[0].label, "1994");
        assert_eq!(calendar.entries[0].date, NaiveDate::from_ymd_opt(1994, 11, 23).unwrap());

        // Rescheduled sittings stay verbatim.
        let covid = calendar.entries.iter().find(|e| e.label == "2020").unwrap();
        assert_eq!(covid.date, NaiveDate::from_ymd_opt(2020, 12, 3).unwrap());
        assert!(covid.note.is_some());
    }

    #[test]
    fn test_bundled_academic_year_calendar() {
        let calendar = CalendarVariant::AcademicYear.load().unwrap();

        assert_eq!(calendar.len(), 33);
        assert_eq!(calendar.entries[0].label, "1994");
        assert_eq!(calendar.entries[0].date, NaiveDate::from_ymd_opt(1993, 11, 16).unwrap());
        assert_eq!(calendar.entries.last().unwrap().label, "2026");
    }

    #[test]
    fn test_variants_agree_on_dates() {
        let by_exam = CalendarVariant::ExamYear.load().unwrap();
        let by_academic = CalendarVariant::AcademicYear.load().unwrap();

        let exam_dates: Vec<NaiveDate> = by_exam.entries.iter().map(|e| e.date).collect();
        let academic_dates: Vec<NaiveDate> =
            by_academic.entries.iter().skip(1).map(|e| e.date).collect();
        assert_eq!(exam_dates, academic_dates);
    }

    #[test]
    fn test_rejects_bad_calendars() {
        let empty = r#"{"name": "empty", "version": 1, "entries": []}"#;
        assert!(FixedDateCalendar::from_json_str(empty).is_err());

        let bad_date = r#"{"name": "x", "version": 1, "entries": [{"label": "a", "date": "2020-13-01"}]}"#;
        assert!(FixedDateCalendar::from_json_str(bad_date).is_err());

        let repeated = r#"{"name": "x", "version": 1, "entries": [
            {"label": "a", "date": "2020-11-01"},
            {"label": "a", "date": "2021-11-01"}
        ]}"#;
        assert!(FixedDateCalendar::from_json_str(repeated).is_err());
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("exam-year".parse::<CalendarVariant>(), Ok(CalendarVariant::ExamYear));
        assert_eq!(
            "Academic-Year".parse::<CalendarVariant>(),
            Ok(CalendarVariant::AcademicYear)
        );
        assert!("fiscal".parse::<CalendarVariant>().is_err());
    }
}
