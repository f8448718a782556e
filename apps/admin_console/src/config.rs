use std::{fs, path::Path, time::Duration};

use client_core::{list_view::DEFAULT_SEARCH_DEBOUNCE, ListScope, ListViewConfig};
use serde::Deserialize;
use shared::{domain::YesNo, protocol::DEFAULT_PAGE_SIZE};

pub const DEFAULT_SETTINGS_FILE: &str = "admin_console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub api_url: String,
    pub access_token: Option<String>,
    pub page_size: u32,
    pub debounce_ms: u64,
    pub author: Option<String>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/".into(),
            access_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_SEARCH_DEBOUNCE.as_millis() as u64,
            author: None,
        }
    }
}

/// Optional keys accepted in `admin_console.toml`.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    access_token: Option<String>,
    page_size: Option<u32>,
    debounce_ms: Option<u64>,
    author: Option<String>,
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub access_token: Option<String>,
    pub page_size: Option<u32>,
    pub author: Option<String>,
}

impl ConsoleSettings {
    pub fn list_view_config(&self) -> ListViewConfig {
        ListViewConfig {
            page_size: self.page_size.max(1),
            debounce: Duration::from_millis(self.debounce_ms),
            ..ListViewConfig::default()
        }
    }

    pub fn list_scope(&self) -> ListScope {
        ListScope {
            author: self.author.clone(),
            is_delete: Some(YesNo::No),
        }
    }
}

pub fn load_settings(file: Option<&Path>, cli: CliOverrides) -> ConsoleSettings {
    let mut settings = ConsoleSettings::default();

    let path = file.unwrap_or(Path::new(DEFAULT_SETTINGS_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(error) => {
                tracing::warn!(%error, file = %path.display(), "ignoring unreadable settings file")
            }
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    apply_cli_overrides(&mut settings, cli);
    settings
}

fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

fn apply_file_settings(settings: &mut ConsoleSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.access_token {
        settings.access_token = non_blank(v);
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.debounce_ms {
        settings.debounce_ms = v;
    }
    if let Some(v) = file_cfg.author {
        settings.author = non_blank(v);
    }
}

fn apply_env_overrides(settings: &mut ConsoleSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("ADMIN_API_URL").and_then(non_blank) {
        settings.api_url = v;
    }
    if let Some(v) = var("ADMIN_ACCESS_TOKEN") {
        settings.access_token = non_blank(v);
    }
    if let Some(v) = var("ADMIN_PAGE_SIZE") {
        match v.trim().parse::<u32>() {
            Ok(parsed) if parsed > 0 => settings.page_size = parsed,
            _ => tracing::warn!(value = %v, "ignoring invalid ADMIN_PAGE_SIZE"),
        }
    }
    if let Some(v) = var("ADMIN_DEBOUNCE_MS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.debounce_ms = parsed,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid ADMIN_DEBOUNCE_MS"),
        }
    }
    if let Some(v) = var("ADMIN_AUTHOR") {
        settings.author = non_blank(v);
    }
}

fn apply_cli_overrides(settings: &mut ConsoleSettings, cli: CliOverrides) {
    if let Some(v) = cli.api_url {
        settings.api_url = v;
    }
    if let Some(v) = cli.access_token {
        settings.access_token = non_blank(v);
    }
    if let Some(v) = cli.page_size {
        settings.page_size = v.max(1);
    }
    if let Some(v) = cli.author {
        settings.author = non_blank(v);
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
