// Strongly typed string identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a golfer in the draftable pool.
    PlayerId
);
string_id!(
    /// Identifier of a league member's team within a draft.
    ParticipantId
);
string_id!(
    /// Identifier of a draft session.
    SessionId
);
string_id!(LeagueId);
string_id!(
    /// Identifier of an authenticated user acting on a participant's behalf.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![PlayerId::from("p10"), PlayerId::from("p02"), PlayerId::from("p1")];
        ids.sort();
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["p02", "p1", "p10"]);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ParticipantId::new("team_3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"team_3\"");
        let back: ParticipantId = serde_json::from_str("\"team_3\"").unwrap();
        assert_eq!(back, id);
    }
}
