// Player pool import from CSV.
//
// Expected header: id,name,sex,active,rating. `active` defaults to true and
// an empty `rating` means unrated.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::player::{Player, Sex};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV row
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: String,
    name: String,
    sex: String,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    rating: Option<f64>,
}

fn default_active() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Parse players from any reader. Malformed rows and rows that fail player
/// validation are skipped with a warning; a repeated id is an error.
pub fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, PoolError> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    let mut seen = HashSet::new();

    for result in reader.deserialize::<RawPlayer>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };

        let Some(sex) = Sex::from_code(&raw.sex) else {
            warn!("skipping player '{}': unknown sex {:?}", raw.id.trim(), raw.sex);
            continue;
        };

        let player = match Player::new(raw.id.trim(), raw.name.trim(), sex, raw.active, raw.rating) {
            Ok(p) => p,
            Err(e) => {
                warn!("skipping player '{}': {}", raw.id.trim(), e);
                continue;
            }
        };

        if !seen.insert(player.id().clone()) {
            return Err(PoolError::Validation(format!("duplicate player id {}", player.id())));
        }
        players.push(player);
    }

    Ok(players)
}

/// Load the player pool from a CSV file.
pub fn load_players(path: &Path) -> Result<Vec<Player>, PoolError> {
    let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let players = load_players_from_reader(file).map_err(|e| match e {
        PoolError::Validation(msg) => PoolError::Validation(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    if players.is_empty() {
        return Err(PoolError::Validation(format!(
            "{}: no valid players found",
            path.display()
        )));
    }
    info!("loaded {} players from {}", players.len(), path.display());
    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
