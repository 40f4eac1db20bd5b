//! Record store contract consumed by the aggregation engine.
//!
//! Every write touches a single document (one employee or one attendance
//! day) and is atomic. The date key of an attendance day is unique; a second
//! insert for the same date fails with `DuplicateDate` and never merges.

pub mod memory;
pub mod mysql;

use chrono::NaiveDate;

use crate::error::Result;
use crate::model::attendance::AttendanceDay;
use crate::model::employee::{Employee, EmployeeFilter};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn insert_attendance_day(&self, day: &AttendanceDay) -> Result<()>;

    async fn find_attendance_day(&self, date: NaiveDate) -> Result<Option<AttendanceDay>>;

    /// Days with `start <= date <= end`, oldest first. With an employee
    /// filter only days holding an entry for that employee are returned,
    /// still as complete documents.
    async fn query_attendance_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        employee_id: Option<&str>,
    ) -> Result<Vec<AttendanceDay>>;

    /// Returns false when nothing was stored for the date.
    async fn delete_attendance_day(&self, date: NaiveDate) -> Result<bool>;

    async fn find_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>>;

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>>;

    /// Fails with a validation error when the id is taken.
    async fn insert_employee(&self, employee: &Employee) -> Result<()>;

    async fn upsert_employee(&self, employee: &Employee) -> Result<()>;

    /// Leaves attendance entries for the employee in place.
    async fn delete_employee(&self, employee_id: &str) -> Result<bool>;
}

/// Backend selected at startup from `DATABASE_URL`.
pub enum Store {
    Memory(MemoryStore),
    MySql(MySqlStore),
}

impl RecordStore for Store {
    async fn insert_attendance_day(&self, day: &AttendanceDay) -> Result<()> {
        match self {
            Store::Memory(s) => s.insert_attendance_day(day).await,
            Store::MySql(s) => s.insert_attendance_day(day).await,
        }
    }

    async fn find_attendance_day(&self, date: NaiveDate) -> Result<Option<AttendanceDay>> {
        match self {
            Store::Memory(s) => s.find_attendance_day(date).await,
            Store::MySql(s) => s.find_attendance_day(date).await,
        }
    }

    async fn query_attendance_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        employee_id: Option<&str>,
    ) -> Result<Vec<AttendanceDay>> {
        match self {
            Store::Memory(s) => s.query_attendance_range(start, end, employee_id).await,
            Store::MySql(s) => s.query_attendance_range(start, end, employee_id).await,
        }
    }

    async fn delete_attendance_day(&self, date: NaiveDate) -> Result<bool> {
        match self {
            Store::Memory(s) => s.delete_attendance_day(date).await,
            Store::MySql(s) => s.delete_attendance_day(date).await,
        }
    }

    async fn find_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>> {
        match self {
            Store::Memory(s) => s.find_employees(filter).await,
            Store::MySql(s) => s.find_employees(filter).await,
        }
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
        match self {
            Store::Memory(s) => s.find_employee(employee_id).await,
            Store::MySql(s) => s.find_employee(employee_id).await,
        }
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<()> {
        match self {
            Store::Memory(s) => s.insert_employee(employee).await,
            Store::MySql(s) => s.insert_employee(employee).await,
        }
    }

    async fn upsert_employee(&self, employee: &Employee) -> Result<()> {
        match self {
            Store::Memory(s) => s.upsert_employee(employee).await,
            Store::MySql(s) => s.upsert_employee(employee).await,
        }
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<bool> {
        match self {
            Store::Memory(s) => s.delete_employee(employee_id).await,
            Store::MySql(s) => s.delete_employee(employee_id).await,
        }
    }
}
