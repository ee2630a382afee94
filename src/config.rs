//! Application-level configuration loading: position aliases, series limits and the admin token.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::roster::{Position, TeamMode};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CLUB_COURT_BACK_CONFIG_PATH";
/// Environment variable that overrides the `admin_token` key.
const ADMIN_TOKEN_ENV: &str = "CLUB_ADMIN_TOKEN";

const DEFAULT_RECENT_RESULTS_LEN: usize = 5;
const DEFAULT_MAX_GAMES: u32 = 4;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Labels recognised for each position in the member directory.
    pub position_aliases: PositionAliases,
    /// Length of the recent form kept per member.
    pub recent_results_len: usize,
    /// Highest accepted game number in a series.
    pub max_games: u32,
    /// Team count used when a balance request does not name one.
    pub default_team_mode: TeamMode,
    /// Token expected in the `x-admin-token` header. Admin routes are closed when unset.
    pub admin_token: Option<String>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };
        config.with_admin_token(env::var(ADMIN_TOKEN_ENV).ok())
    }

    /// Replace the admin token when `token` is a non-empty value.
    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|token| !token.is_empty()) {
            self.admin_token = Some(token);
        }
        if self.admin_token.is_none() {
            warn!("no admin token configured; admin routes will reject every request");
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            position_aliases: PositionAliases::default(),
            recent_results_len: DEFAULT_RECENT_RESULTS_LEN,
            max_games: DEFAULT_MAX_GAMES,
            default_team_mode: TeamMode::default(),
            admin_token: None,
        }
    }
}

/// Raw labels mapped onto each [`Position`]. Matching ignores case and surrounding spaces.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionAliases {
    /// Labels read as a guard.
    pub guard: Vec<String>,
    /// Labels read as a forward.
    pub forward: Vec<String>,
    /// Labels read as a center.
    pub center: Vec<String>,
}

impl PositionAliases {
    /// Map a directory label onto a position; unknown or empty labels give [`Position::Unknown`].
    pub fn resolve(&self, label: &str) -> Position {
        let needle = label.trim().to_lowercase();
        if needle.is_empty() {
            return Position::Unknown;
        }
        let matches = |aliases: &[String]| {
            aliases
                .iter()
                .any(|alias| alias.trim().to_lowercase() == needle)
        };
        if matches(&self.guard) {
            Position::Guard
        } else if matches(&self.forward) {
            Position::Forward
        } else if matches(&self.center) {
            Position::Center
        } else {
            Position::Unknown
        }
    }
}

impl Default for PositionAliases {
    fn default() -> Self {
        let labels = |values: &[&str]| values.iter().map(|v| (*v).to_owned()).collect();
        Self {
            guard: labels(&["guard", "가드", "g"]),
            forward: labels(&["forward", "포워드", "f"]),
            center: labels(&["center", "센터", "c"]),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    position_aliases: Option<PositionAliases>,
    recent_results_len: Option<usize>,
    max_games: Option<u32>,
    default_team_mode: Option<TeamMode>,
    admin_token: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            position_aliases: value.position_aliases.unwrap_or(defaults.position_aliases),
            recent_results_len: value
                .recent_results_len
                .unwrap_or(defaults.recent_results_len),
            max_games: value.max_games.unwrap_or(defaults.max_games),
            default_team_mode: value.default_team_mode.unwrap_or(defaults.default_team_mode),
            admin_token: value.admin_token.filter(|token| !token.is_empty()),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
