use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TOP_K: usize = 5;

/// Settings for the external ranking service.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// `None` disables the service; suggestions are then purely local.
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    /// How many of the best local candidates are sent for re-ranking.
    pub top_k: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        AdvisorConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to `tasks.json`.
    pub db_path: PathBuf,
    pub advisor: AdvisorConfig,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// `db_override` comes from the `--db` flag and wins over `TODO_DB`.
    pub fn from_env(db_override: Option<PathBuf>) -> Config {
        let db_path = db_override
            .or_else(|| non_empty_var("TODO_DB").map(PathBuf::from))
            .unwrap_or_else(default_db_path);

        let defaults = AdvisorConfig::default();
        let advisor = AdvisorConfig {
            api_key: non_empty_var("GEMINI_API_KEY"),
            model: non_empty_var("TODO_AI_MODEL").unwrap_or(defaults.model),
            endpoint: non_empty_var("TODO_AI_ENDPOINT").unwrap_or(defaults.endpoint),
            timeout: Duration::from_secs(parse_var("TODO_AI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)),
            top_k: parse_var("TODO_AI_TOP_K", DEFAULT_TOP_K).max(1),
        };

        Config { db_path, advisor }
    }

    /// Local-only configuration around an explicit task file.
    pub fn with_db(db_path: impl Into<PathBuf>) -> Config {
        Config {
            db_path: db_path.into(),
            advisor: AdvisorConfig::default(),
        }
    }

    /// The append-only feedback log, kept next to the task file.
    pub fn feedback_path(&self) -> PathBuf {
        let mut p = self.db_path.clone();
        p.set_file_name("feedback.jsonl");
        p
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match non_empty_var(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(%key, value = %raw, "ignoring unparsable setting");
            default
        }),
    }
}

/// `~/.local/share/smart-todo/tasks.json` on Linux, `./tasks.json` when no data dir exists.
fn default_db_path() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("smart-todo");
    p.push("tasks.json");
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_log_sits_next_to_tasks() {
        let cfg = Config::with_db("/tmp/x/tasks.json");
        assert_eq!(cfg.feedback_path(), PathBuf::from("/tmp/x/feedback.jsonl"));
        assert!(cfg.advisor.api_key.is_none());
    }
}
