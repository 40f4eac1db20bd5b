use chrono::NaiveDate;

use crate::engine::aggregation::FlatRecord;
use crate::engine::monthly::MonthlyRow;
use crate::error::{AttendanceError, Result};
use crate::model::attendance::ClockTime;

pub const FLAT_HEADER: [&str; 7] = [
    "Date",
    "ID",
    "Name",
    "Department",
    "Status",
    "Check-in",
    "Check-out",
];

pub const MONTHLY_HEADER: [&str; 10] = [
    "ID",
    "Name",
    "Department",
    "Present",
    "Absent",
    "Leave",
    "Late",
    "Half-Day",
    "Total Days",
    "Attendance %",
];

pub const NOT_AVAILABLE: &str = "N/A";

fn clock(t: Option<ClockTime>) -> String {
    t.map_or_else(|| NOT_AVAILABLE.to_string(), |t| t.to_string())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| AttendanceError::Export(e.into_error().into()))
}

/// Exactly the given rows, in the given order, under a fixed header.
pub fn flat_records_csv(records: &[FlatRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(FLAT_HEADER)?;

    for r in records {
        writer.write_record([
            r.date.to_string(),
            r.employee_id.clone(),
            r.name.clone(),
            r.department.clone(),
            r.status.to_string(),
            clock(r.check_in),
            clock(r.check_out),
        ])?;
    }

    finish(writer)
}

pub fn monthly_csv(rows: &[MonthlyRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(MONTHLY_HEADER)?;

    for row in rows {
        let s = &row.summary;
        writer.write_record([
            row.employee_id.clone(),
            row.name.clone(),
            row.department.clone(),
            s.present.to_string(),
            s.absent.to_string(),
            s.leave.to_string(),
            s.late.to_string(),
            s.half_day.to_string(),
            s.total_days.to_string(),
            format!("{:.1}%", s.attendance_percentage),
        ])?;
    }

    finish(writer)
}

pub fn export_file_name(start: NaiveDate, end: NaiveDate) -> String {
    format!("attendance_{start}_to_{end}.csv")
}
