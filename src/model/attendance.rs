use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::{AttendanceError, Result};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
    Late,
    #[serde(rename = "Half-Day")]
    #[strum(serialize = "Half-Day")]
    HalfDay,
}

impl AttendanceStatus {
    /// Counts toward the attendance percentage numerator.
    pub fn is_attended(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

/// Time of day as minutes past midnight, written `HH:MM` (24-hour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| ClockTime(hour * 60 + minute))
    }

    pub fn minutes(&self) -> u32 {
        u32::from(self.0)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AttendanceError::validation(format!("Invalid time '{s}', expected HH:MM"));

        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        if h.len() != 2 || m.len() != 2 || !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let hour: u16 = h.parse().map_err(|_| invalid())?;
        let minute: u16 = m.parse().map_err(|_| invalid())?;
        ClockTime::new(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
#[schema(example = json!({
    "employee_id": "E001",
    "status": "Present",
    "check_in": "09:00",
    "check_out": "18:00"
}))]
pub struct AttendanceEntry {
    pub employee_id: String,
    pub status: AttendanceStatus,
    #[schema(value_type = Option<String>, example = "09:00")]
    #[serde(default)]
    pub check_in: Option<ClockTime>,
    #[schema(value_type = Option<String>, example = "18:00")]
    #[serde(default)]
    pub check_out: Option<ClockTime>,
}

impl AttendanceEntry {
    pub fn new(employee_id: impl Into<String>, status: AttendanceStatus) -> Self {
        Self {
            employee_id: employee_id.into(),
            status,
            check_in: None,
            check_out: None,
        }
    }

    pub fn with_times(mut self, check_in: Option<ClockTime>, check_out: Option<ClockTime>) -> Self {
        self.check_in = check_in;
        self.check_out = check_out;
        self
    }

    /// Minutes between check-in and check-out. A check-out before check-in
    /// yields zero rather than an error.
    pub fn work_duration_minutes(&self) -> Option<u32> {
        match (self.check_in, self.check_out) {
            (Some(i), Some(o)) => Some(o.minutes().saturating_sub(i.minutes())),
            _ => None,
        }
    }
}

/// One document per calendar date holding every recorded employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceDay {
    #[schema(value_type = String, format = "date", example = "2024-01-01")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub marked_at: DateTime<Utc>,
    pub entries: Vec<AttendanceEntry>,
}

impl AttendanceDay {
    pub fn new(date: NaiveDate, entries: Vec<AttendanceEntry>) -> Self {
        Self {
            date,
            marked_at: Utc::now(),
            entries,
        }
    }

    pub fn entry_for(&self, employee_id: &str) -> Option<&AttendanceEntry> {
        self.entries.iter().find(|e| e.employee_id == employee_id)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.entries.len());

        for entry in &self.entries {
            if entry.employee_id.trim().is_empty() {
                return Err(AttendanceError::validation("Attendance entry is missing employee_id"));
            }
            if !seen.insert(entry.employee_id.as_str()) {
                return Err(AttendanceError::validation(format!(
                    "Employee {} appears more than once on {}",
                    entry.employee_id, self.date
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct MarkAttendance {
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
}

impl MarkAttendance {
    pub fn into_day(self) -> Result<AttendanceDay> {
        let day = AttendanceDay::new(self.date, self.entries);
        day.validate()?;
        Ok(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_parses_and_displays_zero_padded() {
        let t: ClockTime = "09:05".parse().unwrap();
        assert_eq!(t.minutes(), 9 * 60 + 5);
        assert_eq!(t.to_string(), "09:05");
    }

    #[test]
    fn clock_time_rejects_malformed_values() {
        for bad in ["9:00", "24:00", "12:60", "ab:cd", "1200", "12:0", ""] {
            assert!(bad.parse::<ClockTime>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn negative_duration_clamps_to_zero() {
        let entry = AttendanceEntry::new("E1", AttendanceStatus::Present)
            .with_times(ClockTime::new(18, 0), ClockTime::new(9, 0));
        assert_eq!(entry.work_duration_minutes(), Some(0));

        let entry = AttendanceEntry::new("E1", AttendanceStatus::Present)
            .with_times(ClockTime::new(9, 0), ClockTime::new(17, 30));
        assert_eq!(entry.work_duration_minutes(), Some(510));

        let entry = AttendanceEntry::new("E1", AttendanceStatus::Absent);
        assert_eq!(entry.work_duration_minutes(), None);
    }

    #[test]
    fn status_names_match_wire_format() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "Half-Day");
        assert_eq!("Half-Day".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::HalfDay);
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::HalfDay).unwrap(),
            "\"Half-Day\""
        );

        use strum::IntoEnumIterator;
        for status in AttendanceStatus::iter() {
            let wire = serde_json::to_string(&status).unwrap();
            assert_eq!(wire, format!("\"{status}\""));
            assert_eq!(status.as_ref().parse::<AttendanceStatus>().unwrap(), status);
        }
    }

    #[test]
    fn entry_rejects_unknown_fields() {
        let raw = r#"{"employee_id":"E1","status":"Present","mood":"happy"}"#;
        assert!(serde_json::from_str::<AttendanceEntry>(raw).is_err());

        let raw = r#"{"employee_id":"E1","status":"Late","check_in":"09:40"}"#;
        let entry: AttendanceEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.check_in, ClockTime::new(9, 40));
        assert_eq!(entry.check_out, None);
    }

    #[test]
    fn duplicate_employee_in_one_day_is_rejected() {
        let day = AttendanceDay::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            vec![
                AttendanceEntry::new("E1", AttendanceStatus::Present),
                AttendanceEntry::new("E1", AttendanceStatus::Absent),
            ],
        );
        assert!(matches!(day.validate(), Err(AttendanceError::Validation(_))));
    }
}
