//! Environment Configuration Loader
//!
//! Loads `KEY=VALUE` files into the process environment and collects the
//! agent settings from it.
//!
//! ## Usage
//!
//! Call `load_environment()` early in main() before building the config:
//!
//! ```rust
//! use ng_core::config::{load_environment, AgentConfig};
//!
//! load_environment();
//! let config = AgentConfig::from_env();
//! assert!(config.max_rounds >= 1);
//! ```

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Paths to check (in order of priority) when `NG_ENV_FILE` is not set
pub const ENV_FILE_PATHS: &[&str] = &["/etc/ng-agent/environment", ".env"];

pub const DEFAULT_VIEWER_BASE: &str = "https://neuroglancer-demo.appspot.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_ROUNDS: usize = 3;
pub const DEFAULT_TOOL_ECHO_CHARS: usize = 2000;
pub const DEFAULT_TRACE_CAPACITY: usize = 50;
pub const DEFAULT_MEMORY_MAX_ITEMS: usize = 30;
pub const DEFAULT_MEMORY_MAX_CHARS: usize = 6000;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_SESSIONS: usize = 100;

/// Load environment variables from the first configuration file found.
///
/// This function:
/// 1. Uses `NG_ENV_FILE` if set
/// 2. Otherwise checks `/etc/ng-agent/environment`, then `.env`
/// 3. Does NOT override existing environment variables
///
/// Returns the path that was loaded, or None if no file was found.
pub fn load_environment() -> Option<String> {
    if let Ok(custom_path) = std::env::var("NG_ENV_FILE") {
        if let Some(path) = try_load_env_file(&custom_path) {
            return Some(path);
        }
    }

    for path in ENV_FILE_PATHS {
        if let Some(loaded_path) = try_load_env_file(path) {
            return Some(loaded_path);
        }
    }

    debug!("No environment file found, using existing environment");
    None
}

fn try_load_env_file(path: &str) -> Option<String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return None;
    }

    match fs::read_to_string(path_obj) {
        Ok(content) => {
            let mut loaded_count = 0;
            let mut skipped_count = 0;

            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                if let Some((key, value)) = parse_env_line(line) {
                    if std::env::var(&key).is_err() {
                        std::env::set_var(&key, &value);
                        loaded_count += 1;
                        debug!(
                            "Loaded: {}={}",
                            key,
                            if key.contains("KEY") || key.contains("TOKEN") { "***" } else { &value }
                        );
                    } else {
                        skipped_count += 1;
                    }
                }
            }

            info!(
                "Loaded {} environment variables from {} ({} skipped - already set)",
                loaded_count, path, skipped_count
            );

            Some(path.to_string())
        }
        Err(e) => {
            warn!("Failed to read environment file {}: {}", path, e);
            None
        }
    }
}

/// Parse a single environment line into key-value pair.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    // Handle: KEY=VALUE, KEY="VALUE", KEY='VALUE', export KEY=VALUE
    let line = line.strip_prefix("export ").unwrap_or(line);
    let mut parts = line.splitn(2, '=');
    let key = parts.next()?.trim();
    let value = parts.next()?.trim();

    if key.is_empty() {
        return None;
    }

    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    Some((key.to_string(), value.to_string()))
}

/// Get a configuration value with a default.
pub fn get_config(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional configuration value.
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an integer configuration value.
pub fn get_config_int(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_config_usize(key: &str, default: usize) -> usize {
    let value = get_config_int(key, default as i64);
    if value < 1 {
        warn!("{} must be positive, using default {}", key, default);
        default
    } else {
        value as usize
    }
}

/// Agent-wide settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Viewer base URL that shareable links are built on
    pub viewer_base_url: String,
    /// Absent key means the reasoning collaborator runs disabled
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    /// Upper bound on model/tool rounds per chat request
    pub max_rounds: usize,
    /// Character budget for each args/result echo fed back to the model
    pub tool_echo_chars: usize,
    /// How many full execution traces to retain
    pub trace_capacity: usize,
    pub memory_max_items: usize,
    pub memory_max_chars: usize,
    pub llm_timeout_secs: u64,
    pub max_upload_bytes: usize,
    /// Live sessions kept before the least recently updated one is dropped
    pub max_sessions: usize,
    pub port: u16,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            viewer_base_url: DEFAULT_VIEWER_BASE.to_string(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            tool_echo_chars: DEFAULT_TOOL_ECHO_CHARS,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            memory_max_items: DEFAULT_MEMORY_MAX_ITEMS,
            memory_max_chars: DEFAULT_MEMORY_MAX_CHARS,
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_sessions: DEFAULT_MAX_SESSIONS,
            port: DEFAULT_PORT,
        }
    }
}

impl AgentConfig {
    /// Build the configuration from the current process environment.
    pub fn from_env() -> Self {
        let port = get_config_int("PORT", DEFAULT_PORT as i64);
        Self {
            viewer_base_url: get_config("NEUROGLANCER_BASE", DEFAULT_VIEWER_BASE),
            openai_api_key: get_config_opt("OPENAI_API_KEY"),
            openai_base_url: get_config("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            model: get_config("OPENAI_MODEL", DEFAULT_MODEL),
            max_rounds: get_config_usize("NG_MAX_ROUNDS", DEFAULT_MAX_ROUNDS),
            tool_echo_chars: get_config_usize("NG_TOOL_ECHO_CHARS", DEFAULT_TOOL_ECHO_CHARS),
            trace_capacity: get_config_usize("NG_TRACE_CAPACITY", DEFAULT_TRACE_CAPACITY),
            memory_max_items: get_config_usize("NG_MEMORY_MAX_ITEMS", DEFAULT_MEMORY_MAX_ITEMS),
            memory_max_chars: get_config_usize("NG_MEMORY_MAX_CHARS", DEFAULT_MEMORY_MAX_CHARS),
            llm_timeout_secs: get_config_usize("NG_LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS as usize)
                as u64,
            max_upload_bytes: get_config_usize("NG_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            max_sessions: get_config_usize("NG_MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
            port: u16::try_from(port).unwrap_or(DEFAULT_PORT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_line_simple() {
        let (k, v) = parse_env_line("FOO=bar").unwrap();
        assert_eq!(k, "FOO");
        assert_eq!(v, "bar");
    }

    #[test]
    fn test_parse_env_line_quoted() {
        let (k, v) = parse_env_line("FOO=\"bar baz\"").unwrap();
        assert_eq!(k, "FOO");
        assert_eq!(v, "bar baz");
    }

    #[test]
    fn test_parse_env_line_export() {
        let (k, v) = parse_env_line("export OPENAI_MODEL='gpt-4o'").unwrap();
        assert_eq!(k, "OPENAI_MODEL");
        assert_eq!(v, "gpt-4o");
    }

    #[test]
    fn test_parse_env_line_empty() {
        assert!(parse_env_line("").is_none());
        assert!(parse_env_line("=value").is_none());
    }

    #[test]
    fn test_default_config_bounds() {
        let config = AgentConfig::default();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.max_sessions, 100);
        assert!(config.openai_api_key.is_none());
    }
}
