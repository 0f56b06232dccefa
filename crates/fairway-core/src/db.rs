// SQLite persistence for players, draft picks and key-value draft state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use crate::error::StoreError;
use crate::ids::{ParticipantId, PlayerId, SessionId};
use crate::pick::DraftPick;
use crate::player::{Player, Sex};
use crate::session::DraftSession;
use crate::store::DraftStore;

/// SQLite-backed [`DraftStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id      TEXT PRIMARY KEY,
                name    TEXT NOT NULL,
                sex     TEXT NOT NULL CHECK (sex IN ('M', 'F')),
                active  INTEGER NOT NULL,
                rating  REAL
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                session_id     TEXT NOT NULL,
                pick_number    INTEGER NOT NULL,
                participant_id TEXT NOT NULL,
                player_id      TEXT NOT NULL REFERENCES players(id),
                round          INTEGER NOT NULL,
                auto_picked    INTEGER NOT NULL,
                picked_at      TEXT NOT NULL,
                PRIMARY KEY (session_id, pick_number),
                UNIQUE (session_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS draft_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Insert a player or update name, sex, active flag and rating if the id
    /// already exists.
    pub fn upsert_player(&self, player: &Player) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO players (id, name, sex, active, rating)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name   = excluded.name,
                sex    = excluded.sex,
                active = excluded.active,
                rating = excluded.rating",
            params![
                player.id().as_str(),
                player.name(),
                player.sex().code(),
                player.is_active(),
                player.rating(),
            ],
        )
        .context("failed to upsert player")?;
        Ok(())
    }

    /// Import a batch of players in a single transaction.
    pub fn import_players(&self, players: &[Player]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;
        for player in players {
            tx.execute(
                "INSERT INTO players (id, name, sex, active, rating)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name   = excluded.name,
                    sex    = excluded.sex,
                    active = excluded.active,
                    rating = excluded.rating",
                params![
                    player.id().as_str(),
                    player.name(),
                    player.sex().code(),
                    player.is_active(),
                    player.rating(),
                ],
            )
            .with_context(|| format!("failed to import player {}", player.id()))?;
        }
        tx.commit().context("failed to commit player import")?;
        Ok(players.len())
    }

    /// Every player, ordered by id.
    pub fn load_players(&self) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, sex, active, rating FROM players ORDER BY id")
            .context("failed to prepare load_players query")?;
        let players = stmt
            .query_map([], player_from_row)
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;
        Ok(players)
    }

    /// Append `pick` if it is the next pick of its session.
    ///
    /// Runs in an immediate transaction so the length check and the insert
    /// see the same sequence.
    fn insert_next_pick(&self, session_id: &SessionId, pick: &DraftPick) -> Result<PickInsert> {
        let mut conn = self.conn();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to begin pick transaction")?;

        let stored: u32 = tx
            .query_row(
                "SELECT COUNT(*) FROM draft_picks WHERE session_id = ?1",
                params![session_id.as_str()],
                |row| row.get(0),
            )
            .context("failed to count draft picks")?;
        if pick.pick_number != stored + 1 {
            return Ok(PickInsert::Conflict);
        }

        let known: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM players WHERE id = ?1)",
                params![pick.player_id.as_str()],
                |row| row.get(0),
            )
            .context("failed to look up drafted player")?;
        if !known {
            return Ok(PickInsert::UnknownPlayer);
        }

        let inserted = tx.execute(
            "INSERT INTO draft_picks
                (session_id, pick_number, participant_id, player_id, round, auto_picked, picked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session_id.as_str(),
                pick.pick_number,
                pick.participant_id.as_str(),
                pick.player_id.as_str(),
                pick.round,
                pick.auto_picked,
                pick.picked_at.to_rfc3339(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Ok(PickInsert::Conflict);
            }
            Err(e) => return Err(e).context("failed to record draft pick"),
        }

        tx.commit().context("failed to commit draft pick")?;
        Ok(PickInsert::Inserted)
    }

    /// Load picks for `session_id`, ordered by pick number.
    pub fn load_picks(&self, session_id: &SessionId) -> Result<Vec<DraftPick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT session_id, pick_number, participant_id, player_id, round, auto_picked, picked_at
                 FROM draft_picks WHERE session_id = ?1 ORDER BY pick_number",
            )
            .context("failed to prepare load_picks query")?;

        let picks = stmt
            .query_map(params![session_id.as_str()], |row| {
                let picked_at: String = row.get(6)?;
                let picked_at = DateTime::parse_from_rfc3339(&picked_at)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
                    .with_timezone(&Utc);
                Ok(DraftPick {
                    session_id: SessionId::new(row.get::<_, String>(0)?),
                    pick_number: row.get(1)?,
                    participant_id: ParticipantId::new(row.get::<_, String>(2)?),
                    player_id: PlayerId::new(row.get::<_, String>(3)?),
                    round: row.get(4)?,
                    auto_picked: row.get(5)?,
                    picked_at,
                })
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;

        Ok(picks)
    }

    /// Persist an arbitrary JSON value under `key`, replacing any previous
    /// value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM draft_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query draft state")?;
        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize state value"))
            .transpose()
    }

    fn session_key(session_id: &SessionId) -> String {
        format!("session:{session_id}")
    }

    /// Store a session so a restarted process can resume it.
    pub fn save_session(&self, session: &DraftSession) -> Result<()> {
        let value = serde_json::to_value(session).context("failed to serialize session")?;
        self.save_state(&Self::session_key(&session.id), &value)
    }

    pub fn load_session(&self, session_id: &SessionId) -> Result<Option<DraftSession>> {
        self.load_state(&Self::session_key(session_id))?
            .map(|v| serde_json::from_value(v).context("failed to deserialize session"))
            .transpose()
    }
}

fn player_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Player> {
    let code: String = row.get(2)?;
    let sex = Sex::from_code(&code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, format!("unknown sex code {code:?}").into())
    })?;
    Player::new(
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        sex,
        row.get(3)?,
        row.get(4)?,
    )
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Outcome of [`SqliteStore::insert_next_pick`].
enum PickInsert {
    Inserted,
    Conflict,
    UnknownPlayer,
}

#[async_trait]
impl DraftStore for SqliteStore {
    async fn list_picks(&self, session_id: &SessionId) -> Result<Vec<DraftPick>, StoreError> {
        Ok(self.load_picks(session_id)?)
    }

    async fn append_pick(&self, session_id: &SessionId, pick: DraftPick) -> Result<DraftPick, StoreError> {
        match self.insert_next_pick(session_id, &pick)? {
            PickInsert::Inserted => Ok(pick),
            PickInsert::Conflict => Err(StoreError::Conflict {
                pick_number: pick.pick_number,
            }),
            PickInsert::UnknownPlayer => Err(StoreError::UnknownPlayer(pick.player_id)),
        }
    }

    async fn list_available_players(&self, excluding: &[PlayerId]) -> Result<Vec<Player>, StoreError> {
        let players = self
            .load_players()?
            .into_iter()
            .filter(|p| p.is_active() && !excluding.contains(p.id()))
            .collect();
        Ok(players)
    }

    async fn get_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, StoreError> {
        let players = self
            .load_players()?
            .into_iter()
            .filter(|p| ids.contains(p.id()))
            .collect();
        Ok(players)
    }

    async fn get_roster(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> Result<Vec<Player>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT p.id, p.name, p.sex, p.active, p.rating
                 FROM draft_picks d JOIN players p ON p.id = d.player_id
                 WHERE d.session_id = ?1 AND d.participant_id = ?2
                 ORDER BY d.pick_number",
            )
            .context("failed to prepare roster query")?;
        let players = stmt
            .query_map(params![session_id.as_str(), participant_id.as_str()], player_from_row)
            .context("failed to query roster")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map roster rows")?;
        Ok(players)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::LeagueId;
    use crate::session::Participant;

    const SESSION: &str = "test_session_001";

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> SqliteStore {
        let db = SqliteStore::open(":memory:").expect("in-memory database should open");
        db.import_players(&[
            Player::new("f1", "Fay Fairway", Sex::Female, true, Some(81.0)).unwrap(),
            Player::new("m1", "Max Mulligan", Sex::Male, true, Some(92.5)).unwrap(),
            Player::new("m2", "Ned Niblick", Sex::Male, true, None).unwrap(),
            Player::new("x1", "Old Tom", Sex::Male, false, Some(99.0)).unwrap(),
        ])
        .unwrap();
        db
    }

    fn sample_pick(pick_number: u32, participant: &str, player: &str) -> DraftPick {
        DraftPick {
            session_id: SessionId::from(SESSION),
            participant_id: ParticipantId::from(participant),
            player_id: PlayerId::from(player),
            round: 1,
            pick_number,
            auto_picked: pick_number % 2 == 0,
            picked_at: Utc::now(),
        }
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(tables.contains(&"players".to_string()));
        assert!(tables.contains(&"draft_picks".to_string()));
        assert!(tables.contains(&"draft_state".to_string()));
    }

    #[test]
    fn players_round_trip() {
        let db = test_db();
        let players = db.load_players().unwrap();
        let ids: Vec<&str> = players.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["f1", "m1", "m2", "x1"]);
        assert_eq!(players[0].sex(), Sex::Female);
        assert_eq!(players[1].rating(), Some(92.5));
        assert_eq!(players[2].rating(), None);
        assert!(!players[3].is_active());
    }

    #[test]
    fn upsert_updates_rating_and_active() {
        let db = test_db();
        let mut m2 = Player::new("m2", "Ned Niblick", Sex::Male, true, None).unwrap();
        m2.set_rating(Some(77.0)).unwrap();
        m2.set_active(false);
        db.upsert_player(&m2).unwrap();
        let players = db.load_players().unwrap();
        assert_eq!(players.len(), 4);
        let stored = players.iter().find(|p| p.id().as_str() == "m2").unwrap();
        assert_eq!(stored.rating(), Some(77.0));
        assert!(!stored.is_active());
    }

    #[tokio::test]
    async fn append_and_load_picks() {
        let db = test_db();
        let session = SessionId::from(SESSION);
        let p1 = sample_pick(1, "a", "m1");
        let p2 = sample_pick(2, "b", "f1");
        db.append_pick(&session, p1.clone()).await.unwrap();
        db.append_pick(&session, p2.clone()).await.unwrap();

        let picks = db.list_picks(&session).await.unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].player_id, p1.player_id);
        assert!(!picks[0].auto_picked);
        assert!(picks[1].auto_picked);
        assert_eq!(picks[1].picked_at.timestamp(), p2.picked_at.timestamp());
    }

    #[tokio::test]
    async fn duplicate_pick_number_is_conflict() {
        let db = test_db();
        let session = SessionId::from(SESSION);
        db.append_pick(&session, sample_pick(1, "a", "m1")).await.unwrap();
        let err = db
            .append_pick(&session, sample_pick(1, "b", "f1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { pick_number: 1 }));
        assert_eq!(db.load_picks(&session).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gap_is_conflict() {
        let db = test_db();
        let err = db
            .append_pick(&SessionId::from(SESSION), sample_pick(3, "a", "m1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { pick_number: 3 }));
    }

    #[tokio::test]
    async fn same_player_twice_is_conflict() {
        let db = test_db();
        let session = SessionId::from(SESSION);
        db.append_pick(&session, sample_pick(1, "a", "m1")).await.unwrap();
        let err = db
            .append_pick(&session, sample_pick(2, "b", "m1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { pick_number: 2 }));
    }

    #[tokio::test]
    async fn picks_scoped_to_session() {
        let db = test_db();
        db.append_pick(&SessionId::from(SESSION), sample_pick(1, "a", "m1"))
            .await
            .unwrap();
        let mut other = sample_pick(1, "a", "m1");
        other.session_id = SessionId::from("other");
        db.append_pick(&SessionId::from("other"), other).await.unwrap();
        assert_eq!(db.load_picks(&SessionId::from(SESSION)).unwrap().len(), 1);
        assert_eq!(db.load_picks(&SessionId::from("other")).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn available_excludes_drafted_and_inactive() {
        let db = test_db();
        let players = db
            .list_available_players(&[PlayerId::from("m1")])
            .await
            .unwrap();
        let ids: Vec<&str> = players.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["f1", "m2"]);
    }

    #[tokio::test]
    async fn unknown_player_is_rejected() {
        let db = test_db();
        let session = SessionId::from(SESSION);
        let err = db
            .append_pick(&session, sample_pick(1, "a", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownPlayer(ref id) if id.as_str() == "ghost"));
        assert!(db.load_picks(&session).unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_players_includes_inactive() {
        let db = test_db();
        let players = db
            .get_players(&[PlayerId::from("x1"), PlayerId::from("f1"), PlayerId::from("nobody")])
            .await
            .unwrap();
        let ids: Vec<&str> = players.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["f1", "x1"]);
    }

    #[tokio::test]
    async fn roster_in_pick_order() {
        let db = test_db();
        let session = SessionId::from(SESSION);
        db.append_pick(&session, sample_pick(1, "a", "m2")).await.unwrap();
        db.append_pick(&session, sample_pick(2, "b", "m1")).await.unwrap();
        db.append_pick(&session, sample_pick(3, "a", "f1")).await.unwrap();
        let roster = db.get_roster(&session, &ParticipantId::from("a")).await.unwrap();
        let ids: Vec<&str> = roster.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["m2", "f1"]);
    }

    #[test]
    fn state_round_trip_and_missing_key() {
        let db = test_db();
        assert!(db.load_state("nope").unwrap().is_none());
        db.save_state("k", &serde_json::json!({"a": 1})).unwrap();
        db.save_state("k", &serde_json::json!({"a": 2})).unwrap();
        assert_eq!(db.load_state("k").unwrap(), Some(serde_json::json!({"a": 2})));
    }

    #[test]
    fn session_round_trip() {
        let db = test_db();
        let mut session = DraftSession::new(
            SessionId::from(SESSION),
            LeagueId::from("l1"),
            vec![
                Participant::new("a", "Team A", "alice"),
                Participant::new("b", "Team B", "bob"),
            ],
            4,
        )
        .unwrap();
        session
            .assign_positions(&[ParticipantId::from("b"), ParticipantId::from("a")])
            .unwrap();
        db.save_session(&session).unwrap();
        let loaded = db.load_session(&SessionId::from(SESSION)).unwrap().unwrap();
        assert_eq!(loaded, session);
        assert!(db.load_session(&SessionId::from("missing")).unwrap().is_none());
    }
}
