use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use taskboard_api::credentials::PasswordScheme;

const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `None` means a private in-memory database.
    pub db_path: Option<PathBuf>,
    pub reset_db: bool,
    pub password_scheme: PasswordScheme,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = env_or("TASKBOARD_HOST", "0.0.0.0");
        let port: u16 = env_or("TASKBOARD_PORT", "8000")
            .parse()
            .context("TASKBOARD_PORT must be a port number")?;

        let db_path = env_or("TASKBOARD_DB_PATH", IN_MEMORY);
        let db_path = (db_path != IN_MEMORY).then(|| PathBuf::from(db_path));

        let reset_db = parse_bool(&env_or("TASKBOARD_RESET_DB", "true"))
            .context("TASKBOARD_RESET_DB must be true or false")?;
        let password_scheme = env_or("TASKBOARD_PASSWORD_SCHEME", "plaintext").parse()?;
        let static_dir = env_or("TASKBOARD_STATIC_DIR", "static").into();

        Ok(Self {
            host,
            port,
            db_path,
            reset_db,
            password_scheme,
            static_dir,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
