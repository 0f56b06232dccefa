// Configuration loading and parsing (config/league.toml).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::filter::{CompositionRules, SexCaps};
use crate::ids::{LeagueId, SessionId, UserId};
use crate::league::League;
use crate::session::{DraftSession, Participant};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Everything in `config/league.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub league: LeagueConfig,
    pub draft: DraftConfig,
    pub database: DatabaseConfig,
    pub data: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub id: String,
    pub name: String,
    pub commissioner: String,
    #[serde(default = "default_min_participants")]
    pub min_participants: usize,
    pub composition: CompositionConfig,
    pub participants: Vec<ParticipantConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompositionConfig {
    #[serde(default = "default_early_rounds")]
    pub early_rounds: u32,
    pub max_male: u32,
    pub max_female: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantConfig {
    pub id: String,
    pub name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftConfig {
    /// Defaults to `<league id>-draft`.
    pub session_id: Option<String>,
    pub total_rounds: u32,
    pub pick_timer_secs: u64,
    /// Fixes the shuffled draft order when set.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
}

fn default_min_participants() -> usize {
    2
}

fn default_early_rounds() -> u32 {
    CompositionRules::default().early_rounds
}

// ---------------------------------------------------------------------------
// Domain builders
// ---------------------------------------------------------------------------

impl Config {
    pub fn composition_rules(&self) -> CompositionRules {
        let c = &self.league.composition;
        CompositionRules {
            early_rounds: c.early_rounds,
            caps: SexCaps {
                male: c.max_male,
                female: c.max_female,
            },
        }
    }

    /// A fresh league in `PreDraft`.
    pub fn build_league(&self) -> League {
        League::new(
            LeagueId::new(self.league.id.clone()),
            self.league.name.clone(),
            UserId::new(self.league.commissioner.clone()),
            self.composition_rules(),
            self.league.min_participants,
        )
    }

    pub fn session_id(&self) -> SessionId {
        match &self.draft.session_id {
            Some(id) => SessionId::new(id.clone()),
            None => SessionId::new(format!("{}-draft", self.league.id)),
        }
    }

    /// A not-yet-ordered session for the configured participants.
    pub fn build_session(&self) -> Result<DraftSession, crate::error::ValidationError> {
        let participants = self
            .league
            .participants
            .iter()
            .map(|p| Participant::new(p.id.as_str(), p.name.as_str(), p.user_id.as_str()))
            .collect();
        DraftSession::new(
            self.session_id(),
            LeagueId::new(self.league.id.clone()),
            participants,
            self.draft.total_rounds,
        )
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/league.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("league.toml");
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Copy files from `defaults/` into `config/` when they are missing there.
/// Returns the files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", path.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if league.id.trim().is_empty() {
        return Err(invalid("league.id", "must not be empty"));
    }
    if league.commissioner.trim().is_empty() {
        return Err(invalid("league.commissioner", "must not be empty"));
    }
    if league.min_participants < 2 {
        return Err(invalid(
            "league.min_participants",
            format!("must be at least 2, got {}", league.min_participants),
        ));
    }
    if league.participants.len() < league.min_participants {
        return Err(invalid(
            "league.participants",
            format!(
                "need at least {} participants, got {}",
                league.min_participants,
                league.participants.len()
            ),
        ));
    }

    let mut ids = HashSet::new();
    for p in &league.participants {
        if p.id.trim().is_empty() {
            return Err(invalid("league.participants.id", "must not be empty"));
        }
        if !ids.insert(p.id.as_str()) {
            return Err(invalid(
                "league.participants.id",
                format!("duplicate participant id {:?}", p.id),
            ));
        }
    }

    let comp = &league.composition;
    let caps = comp.max_male + comp.max_female;
    if caps == 0 {
        return Err(invalid("league.composition", "max_male + max_female must be positive"));
    }
    if comp.early_rounds > comp.max_male.min(comp.max_female) {
        return Err(invalid(
            "league.composition.early_rounds",
            format!(
                "must not exceed the smaller cap ({}), got {}",
                comp.max_male.min(comp.max_female),
                comp.early_rounds
            ),
        ));
    }

    if config.draft.total_rounds != caps {
        return Err(invalid(
            "draft.total_rounds",
            format!(
                "must equal max_male + max_female ({caps}), got {}",
                config.draft.total_rounds
            ),
        ));
    }
    if config.draft.pick_timer_secs == 0 {
        return Err(invalid("draft.pick_timer_secs", "must be positive"));
    }
    if config.database.path.trim().is_empty() {
        return Err(invalid("database.path", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
