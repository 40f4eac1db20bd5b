use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{AttendanceError, Result};
use crate::model::attendance::{AttendanceDay, AttendanceEntry, AttendanceStatus, ClockTime};
use crate::model::employee::{Employee, EmployeeFilter};
use crate::store::RecordStore;

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_DEPARTMENT: &str = "N/A";

/// One row per (date, employee) pair, joined with the employee's identity.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FlatRecord {
    #[schema(value_type = String, format = "date", example = "2024-01-01")]
    pub date: NaiveDate,
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub status: AttendanceStatus,
    #[schema(value_type = Option<String>, example = "09:00")]
    pub check_in: Option<ClockTime>,
    #[schema(value_type = Option<String>, example = "18:00")]
    pub check_out: Option<ClockTime>,
}

impl FlatRecord {
    pub fn to_entry(&self) -> AttendanceEntry {
        AttendanceEntry {
            employee_id: self.employee_id.clone(),
            status: self.status,
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct EmployeeSummary {
    pub present: u32,
    pub absent: u32,
    pub leave: u32,
    pub late: u32,
    pub half_day: u32,
    pub total_days: u32,
    #[schema(example = 87.5)]
    pub attendance_percentage: f64,
}

impl EmployeeSummary {
    pub fn record(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Leave => self.leave += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::HalfDay => self.half_day += 1,
        }
        self.total_days += 1;
        self.refresh_percentage();
    }

    pub fn absorb(&mut self, other: &EmployeeSummary) {
        self.present += other.present;
        self.absent += other.absent;
        self.leave += other.leave;
        self.late += other.late;
        self.half_day += other.half_day;
        self.total_days += other.total_days;
        self.refresh_percentage();
    }

    /// Present and Late count as attended; Half-Day only widens the
    /// denominator.
    fn refresh_percentage(&mut self) {
        self.attendance_percentage = if self.total_days == 0 {
            0.0
        } else {
            let raw = f64::from(self.present + self.late) / f64::from(self.total_days) * 100.0;
            (raw * 10.0).round() / 10.0
        };
    }
}

pub type DepartmentSummary = BTreeMap<String, BTreeMap<AttendanceStatus, u32>>;

pub type DailySeries = BTreeMap<NaiveDate, BTreeMap<AttendanceStatus, u32>>;

pub fn validate_window(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(AttendanceError::validation(format!(
            "Start date {start} is after end date {end}"
        )));
    }
    Ok(())
}

/// Attendance documents dated within `[start, end]`. Validation happens
/// before the store is touched.
pub async fn fetch_window<S: RecordStore>(
    store: &S,
    start: NaiveDate,
    end: NaiveDate,
    employee_id: Option<&str>,
) -> Result<Vec<AttendanceDay>> {
    validate_window(start, end)?;

    let days = store.query_attendance_range(start, end, employee_id).await?;
    debug!(%start, %end, employee_id, days = days.len(), "Fetched attendance window");
    Ok(days)
}

/// A fetched window joined against the roster.
#[derive(Debug, Default)]
pub struct WindowData {
    pub roster: Vec<Employee>,
    pub days: Vec<AttendanceDay>,
    pub records: Vec<FlatRecord>,
}

/// Fetches the window and the roster together and flattens them.
pub async fn load_window<S: RecordStore>(
    store: &S,
    start: NaiveDate,
    end: NaiveDate,
    employee_id: Option<&str>,
) -> Result<WindowData> {
    validate_window(start, end)?;

    let roster_filter = EmployeeFilter::default();
    let (days, roster) = futures::try_join!(
        fetch_window(store, start, end, employee_id),
        store.find_employees(&roster_filter),
    )?;

    let records = flatten(&days, &roster, employee_id);
    Ok(WindowData {
        roster,
        days,
        records,
    })
}

/// Joins every entry against the roster. Unresolved employee ids render
/// with sentinel name and department. Day order, then entry order, is kept.
pub fn flatten(
    days: &[AttendanceDay],
    roster: &[Employee],
    employee_id: Option<&str>,
) -> Vec<FlatRecord> {
    let by_id: HashMap<&str, &Employee> = roster
        .iter()
        .map(|e| (e.employee_id.as_str(), e))
        .collect();

    days.iter()
        .flat_map(|day| day.entries.iter().map(move |entry| (day.date, entry)))
        .filter(|(_, entry)| employee_id.is_none_or(|id| entry.employee_id == id))
        .map(|(date, entry)| {
            let employee = by_id.get(entry.employee_id.as_str());
            FlatRecord {
                date,
                employee_id: entry.employee_id.clone(),
                name: employee.map_or(UNKNOWN_NAME, |e| e.name.as_str()).to_string(),
                department: employee
                    .map_or(UNKNOWN_DEPARTMENT, |e| e.department.as_str())
                    .to_string(),
                status: entry.status,
                check_in: entry.check_in,
                check_out: entry.check_out,
            }
        })
        .collect()
}

pub fn summarize_by_employee(records: &[FlatRecord]) -> BTreeMap<String, EmployeeSummary> {
    let mut summaries: BTreeMap<String, EmployeeSummary> = BTreeMap::new();

    for record in records {
        summaries
            .entry(record.employee_id.clone())
            .or_default()
            .record(record.status);
    }

    summaries
}

/// Grouped tally only; percentages are left to the caller.
pub fn summarize_by_department(records: &[FlatRecord]) -> DepartmentSummary {
    let mut summary = DepartmentSummary::new();

    for record in records {
        *summary
            .entry(record.department.clone())
            .or_default()
            .entry(record.status)
            .or_default() += 1;
    }

    summary
}

/// Status counts per date over `[start, end]`. Every date in the window has
/// a key, so dates nobody marked show up as empty tallies.
pub fn daily_series(start: NaiveDate, end: NaiveDate, records: &[FlatRecord]) -> DailySeries {
    let mut series: DailySeries = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| (d, BTreeMap::new()))
        .collect();

    for record in records {
        if let Some(tally) = series.get_mut(&record.date) {
            *tally.entry(record.status).or_default() += 1;
        }
    }

    series
}

/// Employees without an entry for today. With no attendance document for
/// today the whole roster is missing.
pub fn missing_today<'a>(roster: &'a [Employee], today: Option<&AttendanceDay>) -> Vec<&'a Employee> {
    match today {
        None => roster.iter().collect(),
        Some(day) => roster
            .iter()
            .filter(|e| day.entry_for(&e.employee_id).is_none())
            .collect(),
    }
}

/// Default entries offered when a new day is marked: everyone Present.
pub fn attendance_template(roster: &[Employee]) -> Vec<AttendanceEntry> {
    roster
        .iter()
        .map(|e| AttendanceEntry::new(e.employee_id.clone(), AttendanceStatus::Present))
        .collect()
}
