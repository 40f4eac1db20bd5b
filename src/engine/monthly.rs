use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::aggregation::{EmployeeSummary, FlatRecord, summarize_by_employee};
use crate::error::{AttendanceError, Result};
use crate::model::employee::Employee;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyRow {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    #[serde(flatten)]
    pub summary: EmployeeSummary,
}

/// First and last calendar day of a `YYYY-MM` month.
pub fn month_window(month: &str) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || AttendanceError::validation(format!("Invalid month '{month}', expected YYYY-MM"));

    if month.len() != 7 {
        return Err(invalid());
    }

    let start = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").map_err(|_| invalid())?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;

    Ok((start, end))
}

/// One row per roster employee, in roster order. Employees without records
/// get zero counts.
pub fn monthly_report(roster: &[Employee], records: &[FlatRecord]) -> Vec<MonthlyRow> {
    let mut summaries = summarize_by_employee(records);

    roster
        .iter()
        .map(|e| MonthlyRow {
            employee_id: e.employee_id.clone(),
            name: e.name.clone(),
            department: e.department.clone(),
            summary: summaries.remove(&e.employee_id).unwrap_or_default(),
        })
        .collect()
}

pub fn department_totals(rows: &[MonthlyRow]) -> BTreeMap<String, EmployeeSummary> {
    let mut totals: BTreeMap<String, EmployeeSummary> = BTreeMap::new();
    for row in rows {
        totals
            .entry(row.department.clone())
            .or_default()
            .absorb(&row.summary);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregation::flatten;
    use crate::model::attendance::{AttendanceDay, AttendanceEntry, AttendanceStatus};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_window_uses_real_month_length() {
        assert_eq!(month_window("2024-02").unwrap(), (ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(month_window("2023-02").unwrap(), (ymd(2023, 2, 1), ymd(2023, 2, 28)));
        assert_eq!(month_window("2024-12").unwrap(), (ymd(2024, 12, 1), ymd(2024, 12, 31)));
    }

    #[test]
    fn month_window_rejects_garbage() {
        for bad in ["2024-13", "2024-1", "24-01", "January", "2024-01-01"] {
            assert!(month_window(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn report_lists_whole_roster_and_totals_departments() {
        let employee = |id: &str, dept: &str| Employee {
            employee_id: id.into(),
            name: id.to_lowercase(),
            email: String::new(),
            mobile: String::new(),
            department: dept.into(),
            position: "Junior".into(),
            join_date: ymd(2024, 1, 1),
        };
        let roster = vec![employee("E1", "IT"), employee("E2", "IT"), employee("E3", "HR")];
        let days = vec![
            AttendanceDay::new(
                ymd(2024, 1, 1),
                vec![
                    AttendanceEntry::new("E1", AttendanceStatus::Present),
                    AttendanceEntry::new("E2", AttendanceStatus::Absent),
                ],
            ),
            AttendanceDay::new(
                ymd(2024, 1, 2),
                vec![AttendanceEntry::new("E1", AttendanceStatus::Late)],
            ),
        ];
        let records = flatten(&days, &roster, None);

        let rows = monthly_report(&roster, &records);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].summary.total_days, 2);
        assert_eq!(rows[0].summary.attendance_percentage, 100.0);
        assert_eq!(rows[2].summary, EmployeeSummary::default());

        let totals = department_totals(&rows);
        let it = &totals["IT"];
        assert_eq!((it.present, it.late, it.absent, it.total_days), (1, 1, 1, 3));
        assert_eq!(it.attendance_percentage, 66.7);
        assert_eq!(totals["HR"].total_days, 0);
    }
}
