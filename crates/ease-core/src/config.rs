use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::{Category, worry::DEFAULT_INTENSITY};
use crate::sync::http::DEFAULT_SESSION_COOKIE;

/// Journal directory created by `ease init`.
pub const EASE_DIR: &str = ".ease";

/// Per-journal settings in `.ease/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub worries: WorryDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the Ease web app, e.g. `https://ease.example.com`.
    /// Remote sync is disabled while unset.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            session_cookie: default_session_cookie(),
        }
    }
}

impl RemoteConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorryDefaults {
    #[serde(default)]
    pub default_category: Category,
    #[serde(default = "default_intensity")]
    pub default_intensity: u8,
}

impl Default for WorryDefaults {
    fn default() -> Self {
        Self {
            default_category: Category::default(),
            default_intensity: default_intensity(),
        }
    }
}

/// Per-user settings in `~/.config/ease/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Session token copied from a signed-in browser.
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(EASE_DIR).join("config.toml")
}

/// Load `.ease/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write a commented default `.ease/config.toml` unless one exists.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_project_config(project_root: &Path) -> Result<bool> {
    let path = project_config_path(project_root);
    if path.exists() {
        return Ok(false);
    }
    let content = format!(
        "# Ease journal configuration\n\n\
         [remote]\n\
         # base_url = \"https://ease.example.com\"\n\
         timeout_secs = {timeout}\n\
         session_cookie = \"{cookie}\"\n\n\
         [worries]\n\
         default_category = \"{category}\"\n\
         default_intensity = {intensity}\n",
        timeout = default_timeout_secs(),
        cookie = DEFAULT_SESSION_COOKIE,
        category = Category::default(),
        intensity = DEFAULT_INTENSITY,
    );
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ease/config.toml"))
}

/// Load the user config from the platform config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    match user_config_path() {
        Some(path) => load_user_config_from(&path),
        None => Ok(UserConfig::default()),
    }
}

/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project config, user config and environment.
///
/// # Errors
///
/// Returns an error if either config file is malformed.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(cli_json: bool, user_output: Option<String>, env_format: Option<String>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_session_cookie() -> String {
    DEFAULT_SESSION_COOKIE.to_string()
}

const fn default_intensity() -> u8 {
    DEFAULT_INTENSITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert!(cfg.remote.base_url.is_none());
        assert_eq!(cfg.remote.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.remote.session_cookie, "next-auth.session-token");
        assert_eq!(cfg.worries.default_category, Category::Work);
        assert_eq!(cfg.worries.default_intensity, 5);
    }

    #[test]
    fn written_default_config_round_trips() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::create_dir_all(root.path().join(EASE_DIR)).expect("create .ease");
        assert!(write_default_project_config(root.path()).expect("write"));
        assert!(!write_default_project_config(root.path()).expect("second write is a no-op"));

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.worries.default_category, Category::Work);
        assert_eq!(cfg.remote.timeout_secs, 10);
    }

    #[test]
    fn partial_project_config_fills_defaults() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::create_dir_all(root.path().join(EASE_DIR)).expect("create .ease");
        std::fs::write(
            project_config_path(root.path()),
            "[remote]\nbase_url = \"http://localhost:3000\"\n\n[worries]\ndefault_category = \"Garden\"\n",
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.remote.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(cfg.remote.timeout_secs, 10);
        assert_eq!(
            cfg.worries.default_category,
            Category::Custom("Garden".into())
        );
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::create_dir_all(root.path().join(EASE_DIR)).expect("create .ease");
        std::fs::write(project_config_path(root.path()), "[remote\n").expect("write config");
        let err = load_project_config(root.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()));
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_user_config() {
        let output = resolve_output(false, Some("json".to_string()), Some("human".to_string()));
        assert_eq!(output, "pretty");
        let output = resolve_output(false, Some("plain".to_string()), Some("bogus".to_string()));
        assert_eq!(output, "text");
    }

    #[test]
    fn user_config_parses_session_token() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output = \"json\"\nsession_token = \"abc\"\n").expect("write");

        let cfg = load_user_config_from(&path).expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.session_token.as_deref(), Some("abc"));

        let missing = load_user_config_from(&dir.path().join("nope.toml")).expect("defaults");
        assert!(missing.session_token.is_none());
    }
}
