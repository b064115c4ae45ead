//! Environment configuration
//!
//! Values come from the process environment, with a `.env` file loaded first
//! when present.

use crate::error::{AppError, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_SLOT_STEP_MINUTES: u16 = 30;
pub const DEFAULT_SLOT_DURATION_MINUTES: u16 = 60;
pub const DEFAULT_CURRENCY: &str = "VND";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Pool size (DB_MAX_CONNECTIONS)
    pub db_max_connections: u32,
    /// Spacing between listed slot start times (SLOT_STEP_MINUTES)
    pub slot_step_minutes: u16,
    /// Slot length when the caller does not ask for one (SLOT_DURATION_MINUTES)
    pub slot_duration_minutes: u16,
    pub currency: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", DEFAULT_PORT)?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            slot_step_minutes: parse_var("SLOT_STEP_MINUTES", DEFAULT_SLOT_STEP_MINUTES)?,
            slot_duration_minutes: parse_var(
                "SLOT_DURATION_MINUTES",
                DEFAULT_SLOT_DURATION_MINUTES,
            )?,
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    /// Defaults for everything; `database_url` is left empty.
    fn default() -> Self {
        Self {
            database_url: String::new(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            slot_step_minutes: DEFAULT_SLOT_STEP_MINUTES,
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
