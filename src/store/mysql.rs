use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error};

use crate::error::{AttendanceError, Result};
use crate::model::attendance::{AttendanceDay, AttendanceEntry, AttendanceStatus, ClockTime};
use crate::model::employee::{Employee, EmployeeFilter};
use crate::store::RecordStore;

#[derive(FromRow)]
struct DayRow {
    date: NaiveDate,
    marked_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct EntryRow {
    date: NaiveDate,
    employee_id: String,
    status: String,
    check_in: Option<String>,
    check_out: Option<String>,
}

impl TryFrom<EntryRow> for AttendanceEntry {
    type Error = AttendanceError;

    fn try_from(row: EntryRow) -> Result<Self> {
        let malformed = |what: &str| {
            AttendanceError::StoreUnavailable(format!(
                "malformed {what} in attendance row {} / {}",
                row.date, row.employee_id
            ))
        };

        let status: AttendanceStatus = row.status.parse().map_err(|_| malformed("status"))?;
        let check_in = row
            .check_in
            .as_deref()
            .map(str::parse::<ClockTime>)
            .transpose()
            .map_err(|_| malformed("check_in"))?;
        let check_out = row
            .check_out
            .as_deref()
            .map(str::parse::<ClockTime>)
            .transpose()
            .map_err(|_| malformed("check_out"))?;

        Ok(AttendanceEntry {
            employee_id: row.employee_id,
            status,
            check_in,
            check_out,
        })
    }
}

fn sqlstate_is(e: &sqlx::Error, state: &str) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(state))
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    sqlstate_is(e, "23000")
}

fn is_data_too_long(e: &sqlx::Error) -> bool {
    sqlstate_is(e, "22001")
}

fn unavailable(op: &'static str) -> impl FnOnce(sqlx::Error) -> AttendanceError {
    move |e| {
        error!(error = %e, op, "Record store query failed");
        AttendanceError::from(e)
    }
}

fn assemble(days: Vec<DayRow>, entries: Vec<EntryRow>) -> Result<Vec<AttendanceDay>> {
    let mut by_date: BTreeMap<NaiveDate, AttendanceDay> = days
        .into_iter()
        .map(|row| {
            let day = AttendanceDay {
                date: row.date,
                marked_at: row.marked_at,
                entries: Vec::new(),
            };
            (row.date, day)
        })
        .collect();

    // rows arrive ordered by (date, seq)
    for row in entries {
        if let Some(day) = by_date.get_mut(&row.date) {
            day.entries.push(row.try_into()?);
        }
    }

    Ok(by_date.into_values().collect())
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl RecordStore for MySqlStore {
    async fn insert_attendance_day(&self, day: &AttendanceDay) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(unavailable("begin"))?;

        let inserted = sqlx::query("INSERT INTO attendance_days (date, marked_at) VALUES (?, ?)")
            .bind(day.date)
            .bind(day.marked_at)
            .execute(&mut *tx)
            .await;

        if let Err(e) = inserted {
            if is_duplicate_key(&e) {
                debug!(date = %day.date, "Attendance already marked");
                return Err(AttendanceError::DuplicateDate(day.date));
            }
            return Err(unavailable("insert_attendance_day")(e));
        }

        for (seq, entry) in day.entries.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO attendance_entries
                (date, seq, employee_id, status, check_in, check_out)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(day.date)
            .bind(seq as u32)
            .bind(&entry.employee_id)
            .bind(entry.status.as_ref())
            .bind(entry.check_in.map(|t| t.to_string()))
            .bind(entry.check_out.map(|t| t.to_string()))
            .execute(&mut *tx)
            .await
            .map_err(unavailable("insert_attendance_entry"))?;
        }

        tx.commit().await.map_err(unavailable("commit"))
    }

    async fn find_attendance_day(&self, date: NaiveDate) -> Result<Option<AttendanceDay>> {
        let mut days = self.query_attendance_range(date, date, None).await?;
        Ok(days.pop())
    }

    async fn query_attendance_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        employee_id: Option<&str>,
    ) -> Result<Vec<AttendanceDay>> {
        let days: Vec<DayRow> = match employee_id {
            Some(id) => sqlx::query_as::<_, DayRow>(
                r#"
                SELECT d.date, d.marked_at
                FROM attendance_days d
                WHERE d.date BETWEEN ? AND ?
                AND EXISTS (
                    SELECT 1 FROM attendance_entries e
                    WHERE e.date = d.date AND e.employee_id = ?
                )
                ORDER BY d.date
                "#,
            )
            .bind(start)
            .bind(end)
            .bind(id),
            None => sqlx::query_as::<_, DayRow>(
                r#"
                SELECT date, marked_at
                FROM attendance_days
                WHERE date BETWEEN ? AND ?
                ORDER BY date
                "#,
            )
            .bind(start)
            .bind(end),
        }
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable("query_attendance_days"))?;

        if days.is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<EntryRow> = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT date, employee_id, status, check_in, check_out
            FROM attendance_entries
            WHERE date BETWEEN ? AND ?
            ORDER BY date, seq
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable("query_attendance_entries"))?;

        debug!(%start, %end, days = days.len(), entries = entries.len(), "Fetched attendance range");

        assemble(days, entries)
    }

    async fn delete_attendance_day(&self, date: NaiveDate) -> Result<bool> {
        // entries go with the day through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM attendance_days WHERE date = ?")
            .bind(date)
            .execute(&self.pool)
            .await
            .map_err(unavailable("delete_attendance_day"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>> {
        let mut conditions = Vec::new();
        let mut bindings: Vec<&str> = Vec::new();

        if let Some(department) = &filter.department {
            conditions.push("department = ?");
            bindings.push(department);
        }

        if let Some(position) = &filter.position {
            conditions.push("position = ?");
            bindings.push(position);
        }

        let where_clause = if conditions.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT employee_id, name, email, mobile, department, position, join_date \
             FROM employees {} ORDER BY employee_id",
            where_clause
        );
        debug!(sql = %sql, bindings = ?bindings, "Fetching employees");

        let mut query = sqlx::query_as::<_, Employee>(&sql);
        for b in bindings {
            query = query.bind(b);
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable("find_employees"))
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT employee_id, name, email, mobile, department, position, join_date
            FROM employees
            WHERE employee_id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable("find_employee"))
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (employee_id, name, email, mobile, department, position, join_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.mobile)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(employee.join_date)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AttendanceError::validation(format!(
                "Employee ID {} already exists",
                employee.employee_id
            ))),
            Err(e) if is_data_too_long(&e) => Err(AttendanceError::validation(
                "Employee field exceeds the stored column width",
            )),
            Err(e) => Err(unavailable("insert_employee")(e)),
        }
    }

    async fn upsert_employee(&self, employee: &Employee) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO employees
            (employee_id, name, email, mobile, department, position, join_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                email = VALUES(email),
                mobile = VALUES(mobile),
                department = VALUES(department),
                position = VALUES(position)
            "#,
        )
        .bind(&employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.mobile)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(employee.join_date)
        .execute(&self.pool)
        .await
        .map_err(unavailable("upsert_employee"))?;

        Ok(())
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&self.pool)
            .await
            .map_err(unavailable("delete_employee"))?;

        Ok(result.rows_affected() > 0)
    }
}
