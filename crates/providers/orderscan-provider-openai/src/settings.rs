//! Startup settings table

use orderscan_core::{AppConfig, API_KEY_VAR};

const WIDTH: usize = 78;

/// One line of the settings table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingRow {
    /// Environment variable
    pub name: String,
    /// Effective value (secrets are shown as `set`)
    pub value: String,
    /// `env` or `default`
    pub source: String,
    /// How to change it
    pub change: String,
}

fn row(name: &str, value: String, from_env: bool) -> SettingRow {
    SettingRow {
        name: name.to_string(),
        value,
        source: if from_env { "env" } else { "default" }.to_string(),
        change: format!("{}=...", name),
    }
}

/// Rows describing the effective configuration; `lookup` tells which
/// variables were set in the environment
pub fn settings_rows<F>(config: &AppConfig, lookup: F) -> Vec<SettingRow>
where
    F: Fn(&str) -> Option<String>,
{
    let is_set = |key: &str| lookup(key).map_or(false, |v| !v.trim().is_empty());
    let model = &config.model;

    vec![
        row(API_KEY_VAR, "set".to_string(), true),
        row("OPENAI_MODEL", model.model.clone(), is_set("OPENAI_MODEL")),
        row(
            "OPENAI_TEMPERATURE",
            model.temperature.to_string(),
            is_set("OPENAI_TEMPERATURE"),
        ),
        row(
            "OPENAI_MAX_TOKENS",
            model
                .max_tokens
                .map_or_else(|| "<model default>".to_string(), |t| t.to_string()),
            is_set("OPENAI_MAX_TOKENS"),
        ),
        row(
            "OPENAI_BASE_URL",
            model
                .api_base
                .clone()
                .unwrap_or_else(|| "<api.openai.com>".to_string()),
            is_set("OPENAI_BASE_URL"),
        ),
        row(
            "OPENAI_TIMEOUT_SECS",
            model.timeout_secs.to_string(),
            is_set("OPENAI_TIMEOUT_SECS"),
        ),
        row(
            "ORDERSCAN_CHUNK_SIZE",
            config.chunking.chunk_size().to_string(),
            is_set("ORDERSCAN_CHUNK_SIZE"),
        ),
        row(
            "ORDERSCAN_CHUNK_OVERLAP",
            config.chunking.chunk_overlap().to_string(),
            is_set("ORDERSCAN_CHUNK_OVERLAP"),
        ),
    ]
}

fn pad(s: &str, w: usize) -> String {
    let mut out: String = s.chars().take(w).collect();
    let len = out.chars().count();
    out.push_str(&" ".repeat(w - len));
    out
}

/// Render the boxed settings table (no colors)
pub fn render_settings(title: &str, rows: &[SettingRow]) -> String {
    let rule = format!("+{}+", "-".repeat(WIDTH));
    let mut lines = vec![
        rule.clone(),
        format!("|{}|", pad(&format!("=== {} settings ===", title), WIDTH)),
        format!("|{}|", pad("= change via KEY=VALUE in .env or the environment =", WIDTH)),
        format!("+{}+", "=".repeat(WIDTH)),
        format!(
            "|{}|{}|{}|{}|",
            pad("Setting", 24),
            pad("Value", 20),
            pad("Source", 8),
            pad("Change", 23)
        ),
        rule.clone(),
    ];
    for r in rows {
        lines.push(format!(
            "|{}|{}|{}|{}|",
            pad(&r.name, 24),
            pad(&r.value, 20),
            pad(&r.source, 8),
            pad(&r.change, 23)
        ));
    }
    lines.push(rule);
    lines.join("\n")
}

/// Print the settings table for the process environment to stdout
pub fn print_settings(config: &AppConfig) {
    let rows = settings_rows(config, |key| std::env::var(key).ok());
    println!("\x1b[34m{}\x1b[0m", render_settings("orderscan", &rows));
}
