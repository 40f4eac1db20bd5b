use anyhow::Context;
use sqlx::MySqlPool;
use tracing::info;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        employee_id VARCHAR(64) NOT NULL PRIMARY KEY,
        name        VARCHAR(255) NOT NULL,
        email       VARCHAR(255) NOT NULL,
        mobile      VARCHAR(64) NOT NULL,
        department  VARCHAR(64) NOT NULL,
        position    VARCHAR(64) NOT NULL,
        join_date   DATE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance_days (
        date      DATE NOT NULL PRIMARY KEY,
        marked_at TIMESTAMP(6) NOT NULL
    )
    "#,
    // no foreign key on employee_id: entries outlive employees
    r#"
    CREATE TABLE IF NOT EXISTS attendance_entries (
        date        DATE NOT NULL,
        seq         INT UNSIGNED NOT NULL,
        employee_id VARCHAR(64) NOT NULL,
        status      VARCHAR(16) NOT NULL,
        check_in    CHAR(5) NULL,
        check_out   CHAR(5) NULL,
        PRIMARY KEY (date, employee_id),
        KEY idx_entries_employee (employee_id, date),
        CONSTRAINT fk_entries_day FOREIGN KEY (date)
            REFERENCES attendance_days (date) ON DELETE CASCADE
    )
    "#,
];

pub async fn init_db(database_url: &str) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .context("Failed to create schema")?;
    }

    info!("Database schema ready");
    Ok(pool)
}
