//! Session token resolution for remote sync.
//!
//! The resolution chain: `--session` flag > `EASE_SESSION` env > user config
//! `session_token`. Without a token every command still works and changes
//! are saved locally only.

use std::env;

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

/// Real environment reader.
struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn resolve_session_with(
    cli_flag: Option<&str>,
    config_token: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    non_blank(cli_flag)
        .or_else(|| non_blank(env.get("EASE_SESSION").as_deref()))
        .or_else(|| non_blank(config_token))
}

/// Resolve the session token:
///
/// 1. `--session` CLI flag
/// 2. `EASE_SESSION` environment variable
/// 3. `session_token` in the user config
///
/// Blank values are skipped. Returns `None` when signed out.
pub fn resolve_session(cli_flag: Option<&str>, config_token: Option<&str>) -> Option<String> {
    resolve_session_with(cli_flag, config_token, &RealEnv)
}
