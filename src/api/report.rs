use std::collections::BTreeMap;

use actix_web::{HttpRequest, HttpResponse, Responder, http::header, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::engine::aggregation::{
    DailySeries, DepartmentSummary, EmployeeSummary, FlatRecord, daily_series, load_window,
    summarize_by_department, summarize_by_employee,
};
use crate::engine::anomaly::{MIN_RECORDS, StandardScoreDetector, anomaly_candidates};
use crate::engine::monthly::{MonthlyRow, department_totals, month_window, monthly_report};
use crate::error::Result;
use crate::report::csv_export::monthly_csv;
use crate::report::document::employee_report;
use crate::store::{RecordStore, Store};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthQuery {
    /// Month as YYYY-MM
    #[param(example = "2024-02")]
    pub month: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RangeQuery {
    #[param(value_type = String, format = "date", example = "2024-01-01")]
    pub start: NaiveDate,
    #[param(value_type = String, format = "date", example = "2024-01-31")]
    pub end: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyResponse {
    pub month: String,
    #[schema(value_type = String, format = "date")]
    pub start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end: NaiveDate,
    /// Attendance documents found in the month
    pub days_recorded: usize,
    pub rows: Vec<MonthlyRow>,
    pub departments: BTreeMap<String, EmployeeSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct AnomalyResponse {
    pub employee_id: String,
    pub sufficient_data: bool,
    pub min_records: usize,
    /// Absent when there are too few records to judge
    pub anomalies: Option<Vec<FlatRecord>>,
}

/// Per-employee counts for a calendar month
#[utoipa::path(
    get,
    path = "/api/report/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "Monthly report", body = MonthlyResponse),
        (status = 400, description = "Malformed month")
    ),
    tag = "Report"
)]
pub async fn monthly(
    store: web::Data<Store>,
    query: web::Query<MonthQuery>,
) -> Result<impl Responder> {
    let (start, end) = month_window(&query.month)?;
    let window = load_window(store.get_ref(), start, end, None).await?;

    let rows = monthly_report(&window.roster, &window.records);
    let departments = department_totals(&rows);

    Ok(HttpResponse::Ok().json(MonthlyResponse {
        month: query.into_inner().month,
        start,
        end,
        days_recorded: window.days.len(),
        rows,
        departments,
    }))
}

/// Monthly report as CSV
#[utoipa::path(
    get,
    path = "/api/report/monthly/export",
    params(MonthQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 400, description = "Malformed month")
    ),
    tag = "Report"
)]
#[instrument(name = "report_monthly_export", skip(store))]
pub async fn monthly_export(
    store: web::Data<Store>,
    query: web::Query<MonthQuery>,
) -> Result<impl Responder> {
    let (start, end) = month_window(&query.month)?;
    let window = load_window(store.get_ref(), start, end, None).await?;

    let rows = monthly_report(&window.roster, &window.records);
    let body = monthly_csv(&rows)?;
    info!(rows = rows.len(), "Monthly report exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"monthly_report_{}.csv\"", query.month),
        ))
        .body(body))
}

/// Status counts per department
#[utoipa::path(
    get,
    path = "/api/report/department",
    params(RangeQuery),
    responses(
        (status = 200, description = "Department -> status -> count", body = Object, example = json!({
            "IT": { "Present": 12, "Late": 2 },
            "HR": { "Absent": 1 }
        })),
        (status = 400, description = "Start date after end date")
    ),
    tag = "Report"
)]
pub async fn department(
    store: web::Data<Store>,
    query: web::Query<RangeQuery>,
) -> Result<impl Responder> {
    let window = load_window(store.get_ref(), query.start, query.end, None).await?;
    let summary: DepartmentSummary = summarize_by_department(&window.records);

    Ok(HttpResponse::Ok().json(summary))
}

/// Status counts per date, including dates with no attendance marked
#[utoipa::path(
    get,
    path = "/api/report/daily",
    params(RangeQuery),
    responses(
        (status = 200, description = "Date -> status -> count", body = Object, example = json!({
            "2024-01-01": { "Present": 8, "Absent": 1 },
            "2024-01-02": {}
        })),
        (status = 400, description = "Start date after end date")
    ),
    tag = "Report"
)]
pub async fn daily(
    store: web::Data<Store>,
    query: web::Query<RangeQuery>,
) -> Result<impl Responder> {
    let window = load_window(store.get_ref(), query.start, query.end, None).await?;
    let series: DailySeries = daily_series(query.start, query.end, &window.records);

    Ok(HttpResponse::Ok().json(series))
}

/// Status counts and attendance percentage per employee
#[utoipa::path(
    get,
    path = "/api/report/summary",
    params(RangeQuery),
    responses(
        (status = 200, description = "Employee ID -> summary", body = Object, example = json!({
            "E001": {
                "present": 18, "absent": 1, "leave": 1, "late": 2, "half_day": 0,
                "total_days": 22, "attendance_percentage": 90.9
            }
        })),
        (status = 400, description = "Start date after end date")
    ),
    tag = "Report"
)]
pub async fn summary(
    store: web::Data<Store>,
    query: web::Query<RangeQuery>,
) -> Result<impl Responder> {
    let window = load_window(store.get_ref(), query.start, query.end, None).await?;
    Ok(HttpResponse::Ok().json(summarize_by_employee(&window.records)))
}

fn wants_json(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Paginated attendance report for one employee. Plain text by default; the
/// layout with status colours as JSON when the client accepts it.
#[utoipa::path(
    get,
    path = "/api/report/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        RangeQuery
    ),
    responses(
        (status = 200, description = "Report document; JSON layout with `Accept: application/json`", content_type = "text/plain"),
        (status = 400, description = "Start date after end date")
    ),
    tag = "Report"
)]
#[instrument(name = "report_employee", skip(req, store, config, query))]
pub async fn employee(
    req: HttpRequest,
    store: web::Data<Store>,
    config: web::Data<Config>,
    path: web::Path<String>,
    query: web::Query<RangeQuery>,
) -> Result<impl Responder> {
    let employee_id = path.into_inner();

    let (window, employee) = futures::try_join!(
        load_window(store.get_ref(), query.start, query.end, Some(&employee_id)),
        store.find_employee(&employee_id),
    )?;

    let document = employee_report(
        &employee_id,
        employee.as_ref(),
        query.start,
        query.end,
        &window.records,
        config.report_rows_per_page,
    );
    info!(pages = document.page_count(), "Employee report generated");

    if wants_json(&req) {
        return Ok(HttpResponse::Ok().json(document));
    }

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(document.to_string()))
}

/// Records that stand out from the employee's usual pattern
#[utoipa::path(
    get,
    path = "/api/report/anomalies/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        RangeQuery
    ),
    responses(
        (status = 200, description = "Flagged records", body = AnomalyResponse),
        (status = 400, description = "Start date after end date")
    ),
    tag = "Report"
)]
#[instrument(name = "report_anomalies", skip(store, config, query))]
pub async fn anomalies(
    store: web::Data<Store>,
    config: web::Data<Config>,
    path: web::Path<String>,
    query: web::Query<RangeQuery>,
) -> Result<impl Responder> {
    let employee_id = path.into_inner();
    let window = load_window(store.get_ref(), query.start, query.end, Some(&employee_id)).await?;

    let flagged = anomaly_candidates(
        &employee_id,
        &window.records,
        config.anomaly_contamination,
        &StandardScoreDetector,
    )
    .map(|indices| {
        let own: Vec<&FlatRecord> = window
            .records
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .collect();
        indices
            .into_iter()
            .filter_map(|i| own.get(i).map(|r| (*r).clone()))
            .collect::<Vec<_>>()
    });

    if let Some(found) = &flagged {
        info!(flagged = found.len(), "Anomaly scan finished");
    }

    Ok(HttpResponse::Ok().json(AnomalyResponse {
        sufficient_data: flagged.is_some(),
        employee_id,
        min_records: MIN_RECORDS,
        anomalies: flagged,
    }))
}
