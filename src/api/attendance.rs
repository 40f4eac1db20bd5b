use std::collections::HashSet;

use actix_web::{HttpResponse, Responder, http::header, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use crate::engine::aggregation::{attendance_template, flatten, load_window, missing_today};
use crate::error::{AttendanceError, Result};
use crate::model::attendance::{AttendanceEntry, MarkAttendance};
use crate::model::employee::{Employee, EmployeeFilter};
use crate::report::csv_export::{export_file_name, flat_records_csv};
use crate::store::{RecordStore, Store};

#[derive(Debug, Deserialize, IntoParams)]
pub struct WindowQuery {
    /// First day of the window (inclusive)
    #[param(value_type = String, format = "date", example = "2024-01-01")]
    pub start: NaiveDate,
    /// Last day of the window (inclusive)
    #[param(value_type = String, format = "date", example = "2024-01-31")]
    pub end: NaiveDate,
    /// Only this employee's entries
    pub employee_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DayQuery {
    /// Defaults to today
    #[param(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

impl DayQuery {
    fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[derive(Serialize, ToSchema)]
pub struct TemplateResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub already_marked: bool,
    pub entries: Vec<AttendanceEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct MissingResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    /// False when nobody has marked attendance for the date yet
    pub attendance_open: bool,
    pub missing: Vec<Employee>,
}

/// Default entries for marking a day: every employee Present
#[utoipa::path(
    get,
    path = "/api/attendance/template",
    params(DayQuery),
    responses(
        (status = 200, description = "Entries to prefill the marking form", body = TemplateResponse)
    ),
    tag = "Attendance"
)]
pub async fn attendance_form(
    store: web::Data<Store>,
    query: web::Query<DayQuery>,
) -> Result<impl Responder> {
    let date = query.date_or_today();
    let roster_filter = EmployeeFilter::default();

    let (existing, roster) = futures::try_join!(
        store.find_attendance_day(date),
        store.find_employees(&roster_filter),
    )?;

    Ok(HttpResponse::Ok().json(TemplateResponse {
        date,
        already_marked: existing.is_some(),
        entries: attendance_template(&roster),
    }))
}

/// Mark attendance for one date
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Attendance marked", body = Object, example = json!({
            "message": "Attendance marked successfully",
            "date": "2024-01-01",
            "entries": 2
        })),
        (status = 400, description = "Invalid entries"),
        (status = 409, description = "Attendance already marked for the date", body = Object, example = json!({
            "message": "Attendance already marked for 2024-01-01"
        }))
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_mark", skip(store, payload), fields(date = %payload.date))]
pub async fn mark_attendance(
    store: web::Data<Store>,
    payload: web::Json<MarkAttendance>,
) -> Result<impl Responder> {
    let day = payload.into_inner().into_day()?;

    let roster = store.find_employees(&EmployeeFilter::default()).await?;
    let known: HashSet<&str> = roster.iter().map(|e| e.employee_id.as_str()).collect();
    if let Some(stranger) = day
        .entries
        .iter()
        .find(|e| !known.contains(e.employee_id.as_str()))
    {
        return Err(AttendanceError::validation(format!(
            "Employee {} is not on the roster",
            stranger.employee_id
        )));
    }

    match store.insert_attendance_day(&day).await {
        Ok(()) => {
            info!(entries = day.entries.len(), "Attendance marked");
            Ok(HttpResponse::Created().json(json!({
                "message": "Attendance marked successfully",
                "date": day.date,
                "entries": day.entries.len()
            })))
        }
        Err(e @ AttendanceError::DuplicateDate(_)) => {
            warn!("Attendance already marked, delete the day before re-marking");
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// View one marked day
#[utoipa::path(
    get,
    path = "/api/attendance/{date}",
    params(
        ("date" = String, Path, description = "Date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Entries for the date", body = [FlatRecord]),
        (status = 404, description = "No attendance for the date")
    ),
    tag = "Attendance"
)]
pub async fn get_attendance_day(
    store: web::Data<Store>,
    path: web::Path<NaiveDate>,
) -> Result<impl Responder> {
    let date = path.into_inner();
    let roster_filter = EmployeeFilter::default();

    let (day, roster) = futures::try_join!(
        store.find_attendance_day(date),
        store.find_employees(&roster_filter),
    )?;
    let day = day.ok_or_else(|| AttendanceError::NotFound(format!("Attendance for {date}")))?;

    Ok(HttpResponse::Ok().json(flatten(std::slice::from_ref(&day), &roster, None)))
}

/// Delete a marked day so it can be marked again
#[utoipa::path(
    delete,
    path = "/api/attendance/{date}",
    params(
        ("date" = String, Path, description = "Date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Attendance deleted", body = Object, example = json!({
            "message": "Attendance for 2024-01-01 deleted"
        })),
        (status = 404, description = "No attendance for the date")
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_delete", skip(store))]
pub async fn delete_attendance_day(
    store: web::Data<Store>,
    path: web::Path<NaiveDate>,
) -> Result<impl Responder> {
    let date = path.into_inner();

    if !store.delete_attendance_day(date).await? {
        return Err(AttendanceError::NotFound(format!("Attendance for {date}")));
    }

    info!("Attendance deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Attendance for {date} deleted")
    })))
}

/// Flattened attendance records for a date window
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(WindowQuery),
    responses(
        (status = 200, description = "Records in date then entry order", body = [FlatRecord]),
        (status = 400, description = "Start date after end date")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    store: web::Data<Store>,
    query: web::Query<WindowQuery>,
) -> Result<impl Responder> {
    let window = load_window(
        store.get_ref(),
        query.start,
        query.end,
        query.employee_id.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(window.records))
}

/// Download the window as CSV
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(WindowQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 400, description = "Start date after end date")
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_export", skip(store))]
pub async fn export_attendance(
    store: web::Data<Store>,
    query: web::Query<WindowQuery>,
) -> Result<impl Responder> {
    let window = load_window(
        store.get_ref(),
        query.start,
        query.end,
        query.employee_id.as_deref(),
    )
    .await?;

    let body = flat_records_csv(&window.records)?;
    info!(rows = window.records.len(), "Attendance exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                export_file_name(query.start, query.end)
            ),
        ))
        .body(body))
}

/// Employees without an entry for the date
#[utoipa::path(
    get,
    path = "/api/attendance/missing",
    params(DayQuery),
    responses(
        (status = 200, description = "Missing employees", body = MissingResponse)
    ),
    tag = "Attendance"
)]
pub async fn missing_attendance(
    store: web::Data<Store>,
    query: web::Query<DayQuery>,
) -> Result<impl Responder> {
    let date = query.date_or_today();
    let roster_filter = EmployeeFilter::default();

    let (day, roster) = futures::try_join!(
        store.find_attendance_day(date),
        store.find_employees(&roster_filter),
    )?;

    let missing = missing_today(&roster, day.as_ref())
        .into_iter()
        .cloned()
        .collect();

    Ok(HttpResponse::Ok().json(MissingResponse {
        date,
        attendance_open: day.is_some(),
        missing,
    }))
}
