// Roster composition filter.
//
// Early rounds are unrestricted. After that, a roster that has reached its
// cap in one sex may only draft players of the other.

use serde::{Deserialize, Serialize};

use crate::player::{Player, Sex};

/// Per-sex roster caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SexCaps {
    pub male: u32,
    pub female: u32,
}

impl SexCaps {
    pub fn get(&self, sex: Sex) -> u32 {
        match sex {
            Sex::Male => self.male,
            Sex::Female => self.female,
        }
    }

    /// Roster size implied by the caps.
    pub fn total(&self) -> u32 {
        self.male + self.female
    }
}

impl Default for SexCaps {
    fn default() -> Self {
        SexCaps { male: 2, female: 2 }
    }
}

/// League-level roster composition parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRules {
    /// Rounds `<=` this value are not filtered.
    pub early_rounds: u32,
    pub caps: SexCaps,
}

impl Default for CompositionRules {
    fn default() -> Self {
        CompositionRules {
            early_rounds: 2,
            caps: SexCaps::default(),
        }
    }
}

/// The sex a roster is restricted to in `round`, if any.
pub fn restricted_to(roster: &[Player], round: u32, rules: &CompositionRules) -> Option<Sex> {
    if round <= rules.early_rounds {
        return None;
    }
    let count = |sex: Sex| roster.iter().filter(|p| p.sex() == sex).count() as u32;
    if count(Sex::Male) >= rules.caps.male {
        Some(Sex::Female)
    } else if count(Sex::Female) >= rules.caps.female {
        Some(Sex::Male)
    } else {
        None
    }
}

/// Narrow `pool` to the players `roster` may draft in `round`.
pub fn filter_pool(
    pool: &[Player],
    roster: &[Player],
    round: u32,
    rules: &CompositionRules,
) -> Vec<Player> {
    match restricted_to(roster, round, rules) {
        None => pool.to_vec(),
        Some(sex) => pool.iter().filter(|p| p.sex() == sex).cloned().collect(),
    }
}

/// Whether `player` passes the filter for `roster` in `round`.
pub fn is_allowed(player: &Player, roster: &[Player], round: u32, rules: &CompositionRules) -> bool {
    restricted_to(roster, round, rules).map_or(true, |sex| player.sex() == sex)
}
