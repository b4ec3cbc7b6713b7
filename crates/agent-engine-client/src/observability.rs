use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const SWITCH_ENV_KEY: &str = "AGENT_ENGINE_OBSERVABILITY";
const LEVEL_ENV_KEY: &str = "AGENT_ENGINE_LOG_LEVEL";
const JSON_PATH_ENV_KEY: &str = "AGENT_ENGINE_JSON_LOG_PATH";
const DEFAULT_JSON_FILE: &str = "agent-engine.logs.jsonl";

static INIT: OnceCell<()> = OnceCell::new();

/// Where and how much the binaries log.
#[derive(Clone, Debug, PartialEq, Eq)]
struct LogSettings {
    enabled: bool,
    filter: Option<String>,
    json_path: Option<PathBuf>,
}

impl LogSettings {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let enabled = !non_blank(SWITCH_ENV_KEY).is_some_and(|v| {
            matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "0" | "false")
        });
        Self {
            enabled,
            filter: non_blank(LEVEL_ENV_KEY).or_else(|| non_blank("RUST_LOG")),
            json_path: non_blank(JSON_PATH_ENV_KEY).map(PathBuf::from),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        self.filter
            .as_deref()
            .and_then(|filter| EnvFilter::try_new(filter).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}

/// Splits a JSON log path into the directory and file name the appender wants.
fn json_target(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_JSON_FILE)
        .to_string();
    (dir, file_name)
}

/// Initialize diagnostic logging once per process.
///
/// `AGENT_ENGINE_OBSERVABILITY=off` silences everything. The filter comes from
/// `AGENT_ENGINE_LOG_LEVEL`, then `RUST_LOG`, then `info`. With
/// `AGENT_ENGINE_JSON_LOG_PATH` set, events are written there as JSON lines;
/// otherwise they go to stderr so stdout only carries command output.
pub fn init_observability() {
    INIT.get_or_init(|| {
        let settings = LogSettings::from_env();
        if !settings.enabled {
            return;
        }

        let env_filter = settings.env_filter();
        match &settings.json_path {
            Some(path) => {
                let (dir, file_name) = json_target(path);
                let _ = std::fs::create_dir_all(&dir);
                let json_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(false)
                    .with_writer(tracing_appender::rolling::never(dir, file_name));
                let _ = tracing_subscriber::registry()
                    .with(env_filter)
                    .with(json_layer)
                    .try_init();
            }
            None => {
                let console_layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr);
                let _ = tracing_subscriber::registry()
                    .with(env_filter)
                    .with(console_layer)
                    .try_init();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> LogSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_log_info_to_console() {
        assert_eq!(
            settings(&[]),
            LogSettings {
                enabled: true,
                filter: None,
                json_path: None,
            }
        );
    }

    #[test]
    fn off_switch_disables_logging() {
        assert!(!settings(&[(SWITCH_ENV_KEY, " OFF ")]).enabled);
        assert!(settings(&[(SWITCH_ENV_KEY, "on")]).enabled);
    }

    #[test]
    fn level_override_wins_over_rust_log() {
        let resolved = settings(&[(LEVEL_ENV_KEY, "debug"), ("RUST_LOG", "warn")]);
        assert_eq!(resolved.filter.as_deref(), Some("debug"));
        let fallback = settings(&[(LEVEL_ENV_KEY, "  "), ("RUST_LOG", "warn")]);
        assert_eq!(fallback.filter.as_deref(), Some("warn"));
    }

    #[test]
    fn bare_json_file_name_lands_in_current_dir() {
        assert_eq!(
            json_target(Path::new("run.jsonl")),
            (PathBuf::from("."), "run.jsonl".to_string())
        );
        assert_eq!(
            json_target(Path::new("logs/run.jsonl")),
            (PathBuf::from("logs"), "run.jsonl".to_string())
        );
    }

    #[test]
    fn init_is_idempotent() {
        init_observability();
        init_observability();
    }
}
