// Session bootstrap: create a fresh draft or resume one from the database.

use anyhow::{bail, Context};
use chrono::Utc;
use fairway_core::config::Config;
use fairway_core::db::SqliteStore;
use fairway_core::league::{League, LeagueStatus, TransitionFacts};
use fairway_core::session::DraftSession;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// League and session ready to hand to a draft actor.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub league: League,
    pub session: DraftSession,
    /// True when the session was found in the database.
    pub resumed: bool,
}

fn league_key(league: &League) -> String {
    format!("league:{}", league.id)
}

pub fn save_league(db: &SqliteStore, league: &League) -> anyhow::Result<()> {
    let value = serde_json::to_value(league).context("failed to serialize league")?;
    db.save_state(&league_key(league), &value)
}

/// The stored league, or a fresh `PreDraft` league from config.
///
/// A stored league keeps the composition rules it was created with; edits to
/// the config file do not change them.
pub fn load_league(config: &Config, db: &SqliteStore) -> anyhow::Result<League> {
    let fresh = config.build_league();
    match db.load_state(&league_key(&fresh))? {
        Some(value) => {
            let stored: League =
                serde_json::from_value(value).context("failed to deserialize stored league")?;
            if stored.rules != fresh.rules {
                warn!(
                    "League {} composition in config differs from the stored league; keeping stored rules {:?}",
                    stored.id, stored.rules
                );
            }
            Ok(stored)
        }
        None => Ok(fresh),
    }
}

/// Resume the configured session if the database has it; otherwise shuffle
/// the draft order, open the league's draft and start a new session.
pub fn recover_or_create(config: &Config, db: &SqliteStore) -> anyhow::Result<Bootstrap> {
    let mut league = load_league(config, db)?;
    let session_id = config.session_id();

    if let Some(session) = db.load_session(&session_id)? {
        let picks = db.load_picks(&session_id)?;
        info!(
            "Resuming session {}: {} of {} picks already made",
            session_id,
            picks.len(),
            session.total_picks()
        );
        return Ok(Bootstrap {
            league,
            session,
            resumed: true,
        });
    }

    if league.status != LeagueStatus::PreDraft {
        bail!(
            "league {} is {} but session {} is missing from the database",
            league.id,
            league.status,
            session_id
        );
    }

    let mut session = config.build_session().context("invalid session configuration")?;
    let mut rng = match config.draft.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    session.assign_random_positions(&mut rng)?;

    league.transition(
        LeagueStatus::Drafting,
        TransitionFacts {
            participant_count: session.participant_count() as usize,
            draft_complete: false,
        },
    )?;
    session.start(&league, Utc::now())?;

    save_league(db, &league)?;
    db.save_session(&session)?;
    info!(
        "Started session {} with {} participants over {} rounds",
        session.id,
        session.participant_count(),
        session.total_rounds()
    );

    Ok(Bootstrap {
        league,
        session,
        resumed: false,
    })
}

/// Move a league whose draft has finished to `PostDraft`.
pub fn close_draft(db: &SqliteStore, league: &mut League, draft_complete: bool) -> anyhow::Result<()> {
    league.transition(
        LeagueStatus::PostDraft,
        TransitionFacts {
            participant_count: 0,
            draft_complete,
        },
    )?;
    save_league(db, league)?;
    info!("League {} moved to {}", league.id, league.status);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fairway_core::ids::ParticipantId;

    const CONFIG: &str = r#"
[league]
id = "spring"
name = "Spring Scramble"
commissioner = "carol"

[league.composition]
max_male = 2
max_female = 2

[[league.participants]]
id = "a"
name = "Team A"
user_id = "alice"

[[league.participants]]
id = "b"
name = "Team B"
user_id = "bob"

[[league.participants]]
id = "c"
name = "Team C"
user_id = "cat"

[draft]
total_rounds = 4
pick_timer_secs = 60
seed = 42

[database]
path = ":memory:"

[data]
players = "data/players.csv"
"#;

    fn config() -> Config {
        toml::from_str(CONFIG).unwrap()
    }

    fn order(session: &DraftSession) -> Vec<ParticipantId> {
        (1..=session.participant_count())
            .map(|pos| session.participant_at(pos).unwrap().id.clone())
            .collect()
    }

    #[test]
    fn fresh_start_opens_league_and_session() {
        let db = SqliteStore::open(":memory:").unwrap();
        let boot = recover_or_create(&config(), &db).unwrap();
        assert!(!boot.resumed);
        assert_eq!(boot.league.status, LeagueStatus::Drafting);
        assert!(boot.session.is_started());
        assert!(boot.session.positions_assigned());

        let stored = load_league(&config(), &db).unwrap();
        assert_eq!(stored.status, LeagueStatus::Drafting);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let first = recover_or_create(&config(), &SqliteStore::open(":memory:").unwrap()).unwrap();
        let second = recover_or_create(&config(), &SqliteStore::open(":memory:").unwrap()).unwrap();
        assert_eq!(order(&first.session), order(&second.session));
    }

    #[test]
    fn second_call_resumes() {
        let db = SqliteStore::open(":memory:").unwrap();
        let first = recover_or_create(&config(), &db).unwrap();
        let second = recover_or_create(&config(), &db).unwrap();
        assert!(second.resumed);
        assert_eq!(second.session, first.session);
        assert_eq!(second.league.status, LeagueStatus::Drafting);
    }

    #[test]
    fn resume_keeps_stored_composition_rules() {
        let db = SqliteStore::open(":memory:").unwrap();
        let first = recover_or_create(&config(), &db).unwrap();

        let edited = CONFIG
            .replace("max_male = 2", "max_male = 3")
            .replace("max_female = 2", "max_female = 1");
        let edited: Config = toml::from_str(&edited).unwrap();
        assert_ne!(edited.composition_rules(), first.league.rules);

        let resumed = recover_or_create(&edited, &db).unwrap();
        assert!(resumed.resumed);
        assert_eq!(resumed.league.rules, first.league.rules);
        assert_eq!(resumed.league.rules.caps.male, 2);
    }

    #[test]
    fn missing_session_for_drafting_league_is_an_error() {
        let db = SqliteStore::open(":memory:").unwrap();
        let mut league = config().build_league();
        league
            .transition(
                LeagueStatus::Drafting,
                TransitionFacts {
                    participant_count: 3,
                    draft_complete: false,
                },
            )
            .unwrap();
        save_league(&db, &league).unwrap();
        assert!(recover_or_create(&config(), &db).is_err());
    }

    #[test]
    fn close_requires_complete_draft() {
        let db = SqliteStore::open(":memory:").unwrap();
        let mut boot = recover_or_create(&config(), &db).unwrap();
        assert!(close_draft(&db, &mut boot.league, false).is_err());
        close_draft(&db, &mut boot.league, true).unwrap();
        assert_eq!(load_league(&config(), &db).unwrap().status, LeagueStatus::PostDraft);
    }
}
