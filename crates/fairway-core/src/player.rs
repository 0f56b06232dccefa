// Draftable golfers and their sex tag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::PlayerId;

/// Upper bound accepted for a player rating.
pub const MAX_RATING: f64 = 1000.0;

/// The two categories used for roster-composition balancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Parse the short codes used in player files ("M"/"F"), case-insensitive.
    /// Full words are accepted too.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "M" | "MALE" => Some(Sex::Male),
            "F" | "FEMALE" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    /// The other category.
    pub fn opposite(self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

/// A golfer that can be drafted.
///
/// Identity, name and sex are fixed at construction; rating and the active
/// flag may change between seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    sex: Sex,
    active: bool,
    rating: Option<f64>,
}

impl Player {
    pub fn new(
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        sex: Sex,
        active: bool,
        rating: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let name = name.into();
        if id.as_str().trim().is_empty() {
            return Err(ValidationError::Empty { field: "player.id" });
        }
        if name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "player.name",
            });
        }
        if let Some(r) = rating {
            check_rating(r)?;
        }
        Ok(Player {
            id,
            name,
            sex,
            active,
            rating,
        })
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    /// Rating used for ranking; a missing rating counts as zero.
    pub fn effective_rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    pub fn set_rating(&mut self, rating: Option<f64>) -> Result<(), ValidationError> {
        if let Some(r) = rating {
            check_rating(r)?;
        }
        self.rating = rating;
        Ok(())
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

fn check_rating(r: f64) -> Result<(), ValidationError> {
    if !r.is_finite() || !(0.0..=MAX_RATING).contains(&r) {
        return Err(ValidationError::OutOfRange {
            field: "player.rating",
            message: format!("must be between 0 and {MAX_RATING}, got {r}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_from_code() {
        assert_eq!(Sex::from_code("M"), Some(Sex::Male));
        assert_eq!(Sex::from_code(" f "), Some(Sex::Female));
        assert_eq!(Sex::from_code("female"), Some(Sex::Female));
        assert_eq!(Sex::from_code("X"), None);
        assert_eq!(Sex::Male.opposite(), Sex::Female);
        assert_eq!(Sex::Female.code(), "F");
    }

    #[test]
    fn new_player_valid() {
        let p = Player::new("p1", "Ann Putter", Sex::Female, true, Some(88.5)).unwrap();
        assert_eq!(p.id().as_str(), "p1");
        assert_eq!(p.sex(), Sex::Female);
        assert_eq!(p.effective_rating(), 88.5);
    }

    #[test]
    fn missing_rating_counts_as_zero() {
        let p = Player::new("p1", "Bob Bogey", Sex::Male, true, None).unwrap();
        assert_eq!(p.effective_rating(), 0.0);
    }

    #[test]
    fn rejects_empty_id_and_name() {
        assert_eq!(
            Player::new("", "Name", Sex::Male, true, None),
            Err(ValidationError::Empty { field: "player.id" })
        );
        assert_eq!(
            Player::new("p1", "  ", Sex::Male, true, None),
            Err(ValidationError::Empty {
                field: "player.name"
            })
        );
    }

    #[test]
    fn rejects_out_of_range_rating() {
        assert!(Player::new("p1", "A", Sex::Male, true, Some(-1.0)).is_err());
        assert!(Player::new("p1", "A", Sex::Male, true, Some(f64::NAN)).is_err());
        assert!(Player::new("p1", "A", Sex::Male, true, Some(MAX_RATING + 1.0)).is_err());
    }

    #[test]
    fn rating_and_active_are_mutable() {
        let mut p = Player::new("p1", "A", Sex::Male, true, Some(50.0)).unwrap();
        p.set_rating(Some(70.0)).unwrap();
        p.set_active(false);
        assert_eq!(p.rating(), Some(70.0));
        assert!(!p.is_active());
        assert!(p.set_rating(Some(-5.0)).is_err());
        assert_eq!(p.rating(), Some(70.0));
    }
}
