use crate::api::attendance::{MissingResponse, TemplateResponse};
use crate::api::report::{AnomalyResponse, MonthlyResponse};
use crate::engine::aggregation::{EmployeeSummary, FlatRecord};
use crate::engine::monthly::MonthlyRow;
use crate::model::attendance::{AttendanceDay, AttendanceEntry, AttendanceStatus, MarkAttendance};
use crate::model::employee::{CreateEmployee, Employee, PromoteEmployee, UpdateEmployee};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

Keeps an employee roster and one attendance document per calendar date, and
turns them into reports.

### Features
- **Employees**
  - Add, update, promote, list and remove employees
- **Attendance**
  - Mark a whole day at once, view or delete a day, list missing employees
- **Reports**
  - Monthly, per-department and per-date summaries, CSV export, a paginated
    per-employee report and anomaly flags

### Statuses
`Present`, `Absent`, `Leave`, `Late`, `Half-Day`. Present and Late count as
attended; every status counts towards total days.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::promote_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::attendance_form,
        crate::api::attendance::mark_attendance,
        crate::api::attendance::get_attendance_day,
        crate::api::attendance::delete_attendance_day,
        crate::api::attendance::list_attendance,
        crate::api::attendance::export_attendance,
        crate::api::attendance::missing_attendance,

        crate::api::report::monthly,
        crate::api::report::monthly_export,
        crate::api::report::department,
        crate::api::report::summary,
        crate::api::report::daily,
        crate::api::report::employee,
        crate::api::report::anomalies
    ),
    components(
        schemas(
            Employee,
            CreateEmployee,
            UpdateEmployee,
            PromoteEmployee,
            AttendanceStatus,
            AttendanceEntry,
            AttendanceDay,
            MarkAttendance,
            FlatRecord,
            TemplateResponse,
            MissingResponse,
            EmployeeSummary,
            MonthlyRow,
            MonthlyResponse,
            AnomalyResponse
        )
    ),
    tags(
        (name = "Employee", description = "Employee roster APIs"),
        (name = "Attendance", description = "Daily attendance APIs"),
        (name = "Report", description = "Aggregated attendance reports"),
    )
)]
pub struct ApiDoc;
