use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::engine::aggregation::{FlatRecord, UNKNOWN_DEPARTMENT, UNKNOWN_NAME};
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::Employee;
use crate::report::csv_export::NOT_AVAILABLE;

pub const EMPTY_MESSAGE: &str = "No attendance records found for the selected period.";

const COLUMNS: [&str; 4] = ["Date", "Status", "Check In", "Check Out"];

pub fn status_colour(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => "#2e7d32",
        AttendanceStatus::Absent => "#c62828",
        AttendanceStatus::Leave => "#1565c0",
        AttendanceStatus::Late => "#ef6c00",
        AttendanceStatus::HalfDay => "#6a1b9a",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub date: String,
    pub status: AttendanceStatus,
    pub check_in: String,
    pub check_out: String,
    pub colour: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportBody {
    Table { pages: Vec<Vec<ReportRow>> },
    Empty { message: String },
}

/// Layout of a single-employee attendance report: title, metadata block,
/// then a table split into pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub metadata: Vec<(String, String)>,
    pub body: ReportBody,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        match &self.body {
            ReportBody::Table { pages } => pages.len(),
            ReportBody::Empty { .. } => 1,
        }
    }
}

/// Builds the report for one employee from already filtered records. The
/// employee may be gone from the roster; identity then falls back to the
/// sentinel values.
pub fn employee_report(
    employee_id: &str,
    employee: Option<&Employee>,
    start: NaiveDate,
    end: NaiveDate,
    records: &[FlatRecord],
    rows_per_page: usize,
) -> ReportDocument {
    let name = employee.map_or(UNKNOWN_NAME, |e| e.name.as_str());
    let department = employee.map_or(UNKNOWN_DEPARTMENT, |e| e.department.as_str());

    let metadata = vec![
        ("Employee ID".to_string(), employee_id.to_string()),
        ("Department".to_string(), department.to_string()),
        ("Period".to_string(), format!("{start} to {end}")),
    ];

    let rows: Vec<ReportRow> = records
        .iter()
        .filter(|r| r.employee_id == employee_id)
        .map(|r| ReportRow {
            date: r.date.to_string(),
            status: r.status,
            check_in: r.check_in.map_or_else(|| NOT_AVAILABLE.to_string(), |t| t.to_string()),
            check_out: r.check_out.map_or_else(|| NOT_AVAILABLE.to_string(), |t| t.to_string()),
            colour: status_colour(r.status),
        })
        .collect();

    let body = if rows.is_empty() {
        ReportBody::Empty {
            message: EMPTY_MESSAGE.to_string(),
        }
    } else {
        ReportBody::Table {
            pages: rows.chunks(rows_per_page.max(1)).map(<[ReportRow]>::to_vec).collect(),
        }
    };

    ReportDocument {
        title: format!("Attendance Report for {name}"),
        metadata,
        body,
    }
}

impl fmt::Display for ReportDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pages = self.page_count();

        let header = |f: &mut fmt::Formatter<'_>, page: usize| -> fmt::Result {
            writeln!(f, "{}", self.title)?;
            for (key, value) in &self.metadata {
                writeln!(f, "{key}: {value}")?;
            }
            writeln!(f, "Page {page} of {pages}")?;
            writeln!(f)
        };

        match &self.body {
            ReportBody::Empty { message } => {
                header(f, 1)?;
                writeln!(f, "{message}")
            }
            ReportBody::Table { pages: chunks } => {
                for (i, chunk) in chunks.iter().enumerate() {
                    if i > 0 {
                        writeln!(f, "\x0c")?;
                    }
                    header(f, i + 1)?;
                    writeln!(
                        f,
                        "{:<12}{:<10}{:<10}{:<10}",
                        COLUMNS[0], COLUMNS[1], COLUMNS[2], COLUMNS[3]
                    )?;
                    for row in chunk {
                        writeln!(
                            f,
                            "{:<12}{:<10}{:<10}{:<10}",
                            row.date,
                            row.status.as_ref(),
                            row.check_in,
                            row.check_out
                        )?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::ClockTime;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn employee() -> Employee {
        Employee {
            employee_id: "E1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            mobile: "1".into(),
            department: "IT".into(),
            position: "Senior".into(),
            join_date: date(1),
        }
    }

    fn records(n: u32) -> Vec<FlatRecord> {
        (1..=n)
            .map(|d| FlatRecord {
                date: date(d),
                employee_id: "E1".into(),
                name: "Ada".into(),
                department: "IT".into(),
                status: if d % 2 == 0 { AttendanceStatus::Late } else { AttendanceStatus::Present },
                check_in: ClockTime::new(9, 0),
                check_out: None,
            })
            .collect()
    }

    #[test]
    fn table_is_paginated_in_order() {
        let doc = employee_report("E1", Some(&employee()), date(1), date(31), &records(5), 2);
        assert_eq!(doc.title, "Attendance Report for Ada");
        assert_eq!(doc.metadata[1], ("Department".to_string(), "IT".to_string()));
        assert_eq!(doc.page_count(), 3);

        let ReportBody::Table { pages } = &doc.body else {
            panic!("expected a table");
        };
        let dates: Vec<_> = pages.iter().flatten().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"]);
        assert_eq!(pages[0][1].colour, status_colour(AttendanceStatus::Late));
        assert_eq!(pages[0][0].check_out, "N/A");
    }

    #[test]
    fn empty_report_replaces_table_with_message() {
        let doc = employee_report("E1", Some(&employee()), date(1), date(31), &[], 25);
        assert_eq!(
            doc.body,
            ReportBody::Empty {
                message: EMPTY_MESSAGE.to_string()
            }
        );

        let text = doc.to_string();
        assert!(text.contains("Period: 2024-01-01 to 2024-01-31"));
        assert!(text.contains(EMPTY_MESSAGE));
        assert!(!text.contains("Check In"));
    }

    #[test]
    fn removed_employee_renders_as_unknown() {
        let doc = employee_report("E1", None, date(1), date(31), &records(1), 25);
        assert_eq!(doc.title, "Attendance Report for Unknown");
        assert_eq!(doc.metadata[1].1, "N/A");
    }

    #[test]
    fn text_rendering_lists_every_row() {
        let doc = employee_report("E1", Some(&employee()), date(1), date(31), &records(3), 2);
        let text = doc.to_string();
        assert!(text.contains("Page 2 of 2"));
        assert_eq!(text.matches("Attendance Report for Ada").count(), 2);
        assert_eq!(text.matches("09:00").count(), 3);
    }
}
