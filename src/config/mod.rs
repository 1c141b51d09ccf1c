use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::env;

use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

/// Connection parameters for the counter database. Host, port, user,
/// password and name have no defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Reject tokens that carry no `exp` claim.
    pub require_expiry: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

/// Environment source: `APP_` prefix, `__` between nested keys,
/// e.g. `APP_DATABASE__HOST`.
pub fn env_source() -> Environment {
    Environment::with_prefix("app")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::build(&run_mode, env_source())
    }

    /// Layer defaults, optional config files and `env` into settings.
    pub fn build(run_mode: &str, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8081)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 5)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("auth.require_expiry", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    /// Reject values that deserialized but are unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("database.host", self.database.host.as_str()),
            ("database.user", self.database.user.as_str()),
            ("database.password", self.database.password.as_str()),
            ("database.name", self.database.name.as_str()),
            ("auth.jwt_secret", self.auth.jwt_secret.as_str()),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppError::ConfigError(format!("{} must not be empty", key)));
        }
        if self.database.port == 0 {
            return Err(AppError::ConfigError("database.port must not be 0".into()));
        }
        if self.server.workers == 0 {
            return Err(AppError::ConfigError("server.workers must be at least 1".into()));
        }
        Ok(())
    }
}
