use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::error::{AttendanceError, Result};

// column widths of the employees table
pub const MAX_ID_LEN: usize = 64;
pub const MAX_TEXT_LEN: usize = 255;
pub const MAX_MOBILE_LEN: usize = 64;

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().chars().count() > max {
        return Err(AttendanceError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "E001",
        "name": "John Doe",
        "email": "john.doe@company.com",
        "mobile": "+8801712345678",
        "department": "IT",
        "position": "Senior",
        "join_date": "2024-01-01"
    })
)]
pub struct Employee {
    #[schema(example = "E001")]
    pub employee_id: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678")]
    pub mobile: String,

    #[schema(example = "IT")]
    pub department: String,

    #[schema(example = "Senior")]
    pub position: String,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub join_date: NaiveDate,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "E001")]
    pub employee_id: String,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "+8801712345678")]
    pub mobile: String,
    #[schema(example = "IT")]
    pub department: String,
    #[schema(example = "Junior")]
    pub position: String,
}

impl CreateEmployee {
    pub fn validate(&self, config: &Config) -> Result<()> {
        let required = [
            ("employee_id", &self.employee_id),
            ("name", &self.name),
            ("email", &self.email),
            ("mobile", &self.mobile),
            ("department", &self.department),
            ("position", &self.position),
        ];

        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AttendanceError::validation(format!("{field} is required")));
        }

        check_length("employee_id", &self.employee_id, MAX_ID_LEN)?;
        check_length("name", &self.name, MAX_TEXT_LEN)?;
        check_length("email", &self.email, MAX_TEXT_LEN)?;
        check_length("mobile", &self.mobile, MAX_MOBILE_LEN)?;

        config.check_department(&self.department)?;
        config.check_position(&self.position)
    }

    /// Join date is the day the record is created.
    pub fn into_employee(self, join_date: NaiveDate) -> Employee {
        Employee {
            employee_id: self.employee_id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            department: self.department,
            position: self.position,
            join_date,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub department: Option<String>,
}

impl UpdateEmployee {
    /// Returns true when any field changed.
    pub fn apply(self, employee: &mut Employee, config: &Config) -> Result<bool> {
        let mut changed = false;

        if let Some(email) = self.email.filter(|v| !v.trim().is_empty()) {
            check_length("email", &email, MAX_TEXT_LEN)?;
            changed |= employee.email != email;
            employee.email = email;
        }
        if let Some(mobile) = self.mobile.filter(|v| !v.trim().is_empty()) {
            check_length("mobile", &mobile, MAX_MOBILE_LEN)?;
            changed |= employee.mobile != mobile;
            employee.mobile = mobile;
        }
        if let Some(department) = self.department {
            config.check_department(&department)?;
            changed |= employee.department != department;
            employee.department = department;
        }

        Ok(changed)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PromoteEmployee {
    #[schema(example = "Manager")]
    pub position: String,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeFilter {
    /// Filter by department
    pub department: Option<String>,
    /// Filter by position
    pub position: Option<String>,
}

impl EmployeeFilter {
    pub fn matches(&self, employee: &Employee) -> bool {
        self.department.as_ref().is_none_or(|d| *d == employee.department)
            && self.position.as_ref().is_none_or(|p| *p == employee.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateEmployee {
        CreateEmployee {
            employee_id: "E1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            mobile: "0123".into(),
            department: "IT".into(),
            position: "Senior".into(),
        }
    }

    #[test]
    fn create_requires_every_field() {
        let config = Config::default();
        assert!(request().validate(&config).is_ok());

        let mut req = request();
        req.mobile = "  ".into();
        let err = req.validate(&config).unwrap_err();
        assert_eq!(err.to_string(), "mobile is required");
    }

    #[test]
    fn create_rejects_unknown_department_and_position() {
        let config = Config::default();

        let mut req = request();
        req.department = "Legal".into();
        assert!(matches!(req.validate(&config), Err(AttendanceError::Validation(_))));

        let mut req = request();
        req.position = "CEO".into();
        assert!(matches!(req.validate(&config), Err(AttendanceError::Validation(_))));
    }

    #[test]
    fn fields_wider_than_their_columns_are_rejected() {
        let config = Config::default();

        let mut req = request();
        req.employee_id = "E".repeat(MAX_ID_LEN);
        assert!(req.validate(&config).is_ok());

        req.employee_id = "E".repeat(MAX_ID_LEN + 1);
        let err = req.validate(&config).unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
        assert_eq!(err.to_string(), "employee_id must be at most 64 characters");

        let mut req = request();
        req.mobile = "9".repeat(MAX_MOBILE_LEN + 1);
        assert!(matches!(req.validate(&config), Err(AttendanceError::Validation(_))));

        let mut employee = request().into_employee(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let update = UpdateEmployee {
            email: Some(format!("{}@example.com", "a".repeat(MAX_TEXT_LEN))),
            ..Default::default()
        };
        assert!(matches!(
            update.apply(&mut employee, &config),
            Err(AttendanceError::Validation(_))
        ));
        assert_eq!(employee.email, "ada@example.com");
    }

    #[test]
    fn update_reports_whether_anything_changed() {
        let config = Config::default();
        let mut employee = request().into_employee(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let same = UpdateEmployee {
            department: Some("IT".into()),
            ..Default::default()
        };
        assert!(!same.apply(&mut employee, &config).unwrap());

        let moved = UpdateEmployee {
            department: Some("HR".into()),
            ..Default::default()
        };
        assert!(moved.apply(&mut employee, &config).unwrap());
        assert_eq!(employee.department, "HR");
    }
}
