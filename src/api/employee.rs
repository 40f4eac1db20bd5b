use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde_json::json;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{AttendanceError, Result};
use crate::model::employee::{CreateEmployee, EmployeeFilter, PromoteEmployee, UpdateEmployee};
use crate::store::{RecordStore, Store};

/// Add Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Employee),
        (status = 400, description = "Missing field, unknown department/position or duplicate ID", body = Object, example = json!({
            "message": "Employee ID E001 already exists"
        })),
        (status = 503, description = "Record store unavailable")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_create", skip(store, config, payload), fields(employee_id = %payload.employee_id))]
pub async fn create_employee(
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<CreateEmployee>,
) -> Result<impl Responder> {
    let payload = payload.into_inner();
    payload.validate(config.get_ref())?;

    let employee = payload.into_employee(Local::now().date_naive());
    store.insert_employee(&employee).await?;

    info!(name = %employee.name, "Employee added");
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeFilter),
    responses(
        (status = 200, description = "Employee roster", body = [Employee])
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    store: web::Data<Store>,
    query: web::Query<EmployeeFilter>,
) -> Result<impl Responder> {
    let employees = store.find_employees(&query).await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee E001 not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<impl Responder> {
    let employee_id = path.into_inner();

    match store.find_employee(&employee_id).await? {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Err(AttendanceError::NotFound(format!("Employee {employee_id}"))),
    }
}

/// Update contact details or department
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Object, example = json!({
            "message": "Employee E001 details updated"
        })),
        (status = 400, description = "Unknown department"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_update", skip(store, config, body))]
pub async fn update_employee(
    store: web::Data<Store>,
    config: web::Data<Config>,
    path: web::Path<String>,
    body: web::Json<UpdateEmployee>,
) -> Result<impl Responder> {
    let employee_id = path.into_inner();

    let mut employee = store
        .find_employee(&employee_id)
        .await?
        .ok_or_else(|| AttendanceError::NotFound(format!("Employee {employee_id}")))?;

    if !body.into_inner().apply(&mut employee, config.get_ref())? {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "No changes made"
        })));
    }

    store.upsert_employee(&employee).await?;
    info!(department = %employee.department, "Employee details updated");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Employee {employee_id} details updated")
    })))
}

/// Promote Employee
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}/promote",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = PromoteEmployee,
    responses(
        (status = 200, description = "Employee promoted", body = Object, example = json!({
            "message": "Employee E001 promoted to Manager"
        })),
        (status = 400, description = "Unknown position"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_promote", skip(store, config, body))]
pub async fn promote_employee(
    store: web::Data<Store>,
    config: web::Data<Config>,
    path: web::Path<String>,
    body: web::Json<PromoteEmployee>,
) -> Result<impl Responder> {
    let employee_id = path.into_inner();
    let position = body.into_inner().position;
    config.check_position(&position)?;

    let mut employee = store
        .find_employee(&employee_id)
        .await?
        .ok_or_else(|| AttendanceError::NotFound(format!("Employee {employee_id}")))?;

    if employee.position == position {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "No changes made"
        })));
    }

    employee.position = position;
    store.upsert_employee(&employee).await?;
    info!(position = %employee.position, "Employee promoted");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Employee {employee_id} promoted to {}", employee.position)
    })))
}

/// Terminate Employee; attendance history is kept
#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully removed", body = Object, example = json!({
            "message": "Employee E001 removed"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_delete", skip(store))]
pub async fn delete_employee(
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<impl Responder> {
    let employee_id = path.into_inner();

    if !store.delete_employee(&employee_id).await? {
        return Err(AttendanceError::NotFound(format!("Employee {employee_id}")));
    }

    info!("Employee removed, attendance history retained");
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Employee {employee_id} removed")
    })))
}
