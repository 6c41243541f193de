use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            database_url: "sqlite://./reaction.db".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

/// `server.toml` values first, then environment overrides. `DB_FILE_PATH` is a
/// plain file path; `DATABASE_URL` wins over it when both are set.
pub fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
        }
    }

    if let Some(v) = env("REFLEX_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("DB_FILE_PATH") {
        settings.database_url = format!("sqlite://{v}");
    }
    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }

    settings
}

/// Turns the configured database into an sqlx url and creates the directory
/// of a file-backed database.
pub fn prepare_database_url(database_url: &str) -> anyhow::Result<String> {
    let database_url = database_url.trim();
    if database_url.starts_with("sqlite::memory:") {
        return Ok(database_url.to_string());
    }

    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        anyhow::bail!("database url '{database_url}' names no file");
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("creating database directory '{}'", parent.display())
        })?;
    }

    if database_url.starts_with("sqlite:") {
        Ok(database_url.to_string())
    } else {
        Ok(format!("sqlite://{database_url}"))
    }
}
