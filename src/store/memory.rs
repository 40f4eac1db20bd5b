use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;

use crate::error::{AttendanceError, Result};
use crate::model::attendance::AttendanceDay;
use crate::model::employee::{Employee, EmployeeFilter};
use crate::store::RecordStore;

#[derive(Default)]
struct Collections {
    // insertion order is the roster order
    employees: Vec<Employee>,
    days: BTreeMap<NaiveDate, AttendanceDay>,
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|_| AttendanceError::StoreUnavailable("memory store lock poisoned".into()))
    }

    /// Leaves the lock poisoned, as after a writer panicked mid-update.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = self.inner.write();
                    panic!("writer died holding the lock");
                })
                .join();
        });
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|_| AttendanceError::StoreUnavailable("memory store lock poisoned".into()))
    }
}

impl RecordStore for MemoryStore {
    async fn insert_attendance_day(&self, day: &AttendanceDay) -> Result<()> {
        let mut c = self.write()?;
        if c.days.contains_key(&day.date) {
            return Err(AttendanceError::DuplicateDate(day.date));
        }
        c.days.insert(day.date, day.clone());
        Ok(())
    }

    async fn find_attendance_day(&self, date: NaiveDate) -> Result<Option<AttendanceDay>> {
        Ok(self.read()?.days.get(&date).cloned())
    }

    async fn query_attendance_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        employee_id: Option<&str>,
    ) -> Result<Vec<AttendanceDay>> {
        if start > end {
            return Ok(Vec::new());
        }

        let c = self.read()?;
        Ok(c.days
            .range(start..=end)
            .map(|(_, day)| day)
            .filter(|day| employee_id.is_none_or(|id| day.entry_for(id).is_some()))
            .cloned()
            .collect())
    }

    async fn delete_attendance_day(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.write()?.days.remove(&date).is_some())
    }

    async fn find_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>> {
        Ok(self
            .read()?
            .employees
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
        Ok(self
            .read()?
            .employees
            .iter()
            .find(|e| e.employee_id == employee_id)
            .cloned())
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<()> {
        let mut c = self.write()?;
        if c.employees.iter().any(|e| e.employee_id == employee.employee_id) {
            return Err(AttendanceError::validation(format!(
                "Employee ID {} already exists",
                employee.employee_id
            )));
        }
        c.employees.push(employee.clone());
        Ok(())
    }

    async fn upsert_employee(&self, employee: &Employee) -> Result<()> {
        let mut c = self.write()?;
        match c
            .employees
            .iter()
            .position(|e| e.employee_id == employee.employee_id)
        {
            Some(i) => c.employees[i] = employee.clone(),
            None => c.employees.push(employee.clone()),
        }
        Ok(())
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<bool> {
        let mut c = self.write()?;
        let before = c.employees.len();
        c.employees.retain(|e| e.employee_id != employee_id);
        Ok(c.employees.len() != before)
    }
}
