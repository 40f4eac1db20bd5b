use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use dotenvy::dotenv;

use crate::error::{AttendanceError, Result};

const DEFAULT_DEPARTMENTS: &str = "HR,IT,Finance,Operations,Marketing";
const DEFAULT_POSITIONS: &str = "Intern,Junior,Senior,Manager,Director";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// Unset means the in-memory record store.
    pub database_url: Option<String>,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_per_min: u32,

    pub departments: Vec<String>,
    pub positions: Vec<String>,

    pub report_rows_per_page: usize,
    pub anomaly_contamination: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            database_url: None,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            rate_per_min: 1000,
            departments: split_list(DEFAULT_DEPARTMENTS),
            positions: split_list(DEFAULT_POSITIONS),
            report_rows_per_page: 25,
            anomaly_contamination: 0.1,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let defaults = Config::default();

        let config = Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
            rate_per_min: parse_var("RATE_PER_MIN", defaults.rate_per_min)?,
            departments: env::var("DEPARTMENTS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.departments),
            positions: env::var("POSITIONS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.positions),
            report_rows_per_page: parse_var("REPORT_ROWS_PER_PAGE", defaults.report_rows_per_page)?,
            anomaly_contamination: parse_var("ANOMALY_CONTAMINATION", defaults.anomaly_contamination)?,
        };

        if config.rate_per_min == 0 {
            return Err(anyhow!("RATE_PER_MIN must be at least 1"));
        }
        if config.report_rows_per_page == 0 {
            return Err(anyhow!("REPORT_ROWS_PER_PAGE must be at least 1"));
        }
        if !(0.0..=0.5).contains(&config.anomaly_contamination) {
            return Err(anyhow!("ANOMALY_CONTAMINATION must be within 0.0..=0.5"));
        }
        if config.departments.is_empty() || config.positions.is_empty() {
            return Err(anyhow!("DEPARTMENTS and POSITIONS must not be empty"));
        }

        Ok(config)
    }

    pub fn check_department(&self, department: &str) -> Result<()> {
        check_member("department", department, &self.departments)
    }

    pub fn check_position(&self, position: &str) -> Result<()> {
        check_member("position", position, &self.positions)
    }
}

fn check_member(kind: &str, value: &str, allowed: &[String]) -> Result<()> {
    if allowed.iter().any(|a| a == value) {
        Ok(())
    } else {
        Err(AttendanceError::validation(format!(
            "Unknown {kind} '{value}', expected one of: {}",
            allowed.join(", ")
        )))
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("Invalid {key} value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_values_are_trimmed() {
        assert_eq!(split_list(" HR , IT,,Finance "), vec!["HR", "IT", "Finance"]);
    }

    #[test]
    fn membership_checks_use_configured_sets() {
        let config = Config::default();
        assert!(config.check_department("Finance").is_ok());
        assert!(config.check_position("Director").is_ok());
        assert!(config.check_department("finance").is_err());
    }
}
