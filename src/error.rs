use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("{0}")]
    Validation(String),

    #[error("Attendance already marked for {0}")]
    DuplicateDate(NaiveDate),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),
}

impl AttendanceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AttendanceError::Validation(msg.into())
    }
}

impl From<sqlx::Error> for AttendanceError {
    fn from(e: sqlx::Error) -> Self {
        AttendanceError::StoreUnavailable(e.to_string())
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
            AttendanceError::DuplicateDate(_) => StatusCode::CONFLICT,
            AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AttendanceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // store details stay in the logs
        let message = match self {
            AttendanceError::StoreUnavailable(_) => "Record store unavailable, try again later".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
