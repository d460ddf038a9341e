//! SQLite implementation of the collection store.

use crate::db::error::DbError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use scheduler_core::config::{CollectionConfig, DeckConfig, DEFAULT_DECK_CONFIG_ID};
use scheduler_core::deck::{DailyCounts, DeckKind, FilteredDeck, DECK_SEPARATOR};
use scheduler_core::store::{CardOrder, CardQuery, CollectionStore};
use scheduler_core::types::{
    Card, CardId, CardQueue, CardType, DeckConfigId, DeckId, Due, LearningProgress, NoteId,
    RevlogEntry, RevlogKind,
};
use scheduler_core::Deck;
use std::path::Path;
use tracing::debug;

type Result<T> = std::result::Result<T, DbError>;

const CARD_COLUMNS: &str = "id, note_id, deck_id, ordinal, card_type, queue, due_kind, due, \
    interval, ease_factor, reps, lapses, left_packed, original_due_kind, original_due, \
    original_deck_id, flags, modified";

const DECK_COLUMNS: &str =
    "id, name, kind, today_day, today_new, today_review, today_millis";

const REVLOG_COLUMNS: &str =
    "id, card_id, usn, ease, interval, last_interval, ease_factor, time_taken_ms, kind";

/// A note and the text shown for its cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteInfo {
    pub id: NoteId,
    pub fields: String,
    pub tags: Vec<String>,
}

/// SQLite-backed collection.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Create tables plus the collection row, default config and default
    /// deck when missing.
    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![super::schema::SCHEMA_VERSION],
        )?;

        let config = CollectionConfig {
            created_secs: chrono::Utc::now().timestamp(),
            ..CollectionConfig::default()
        };
        self.conn.execute(
            "INSERT OR IGNORE INTO collection (id, config) VALUES (1, ?1)",
            params![serde_json::to_string(&config)?],
        )?;

        let default_config = DeckConfig::default();
        self.conn.execute(
            "INSERT OR IGNORE INTO deck_configs (id, name, config) VALUES (?1, ?2, ?3)",
            params![
                default_config.id,
                default_config.name,
                serde_json::to_string(&default_config)?
            ],
        )?;

        let default_deck = Deck::new_normal(1, "Default", DEFAULT_DECK_CONFIG_ID);
        self.conn.execute(
            "INSERT OR IGNORE INTO decks (id, name, kind) VALUES (?1, ?2, ?3)",
            params![
                default_deck.id,
                default_deck.name,
                serde_json::to_string(&default_deck.kind)?
            ],
        )?;
        Ok(())
    }

    // Decks and configs
    ////////////////////////////////////////////////////////////////////////

    /// Add a normal deck, creating missing parents ("A::B" creates "A").
    /// Returns the id of an existing deck with the same name.
    pub fn add_deck(&self, name: &str, config_id: DeckConfigId) -> Result<DeckId> {
        let name = normalize_deck_name(name)?;
        if let Some(deck) = self.deck_by_name(&name)? {
            return Ok(deck.id);
        }
        if let Some((parent, _)) = name.rsplit_once(DECK_SEPARATOR) {
            self.add_deck(parent, config_id)?;
        }
        let kind = DeckKind::Normal { config_id };
        self.conn.execute(
            "INSERT INTO decks (name, kind) VALUES (?1, ?2)",
            params![name, serde_json::to_string(&kind)?],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name = %name, "added deck");
        Ok(id)
    }

    /// Add a filtered deck. Its parents must be normal decks.
    pub fn add_filtered_deck(&self, name: &str, filtered: FilteredDeck) -> Result<DeckId> {
        let name = normalize_deck_name(name)?;
        if self.deck_by_name(&name)?.is_some() {
            return Err(DbError::InvalidData(format!("deck already exists: {name}")));
        }
        if let Some((parent, _)) = name.rsplit_once(DECK_SEPARATOR) {
            self.add_deck(parent, DEFAULT_DECK_CONFIG_ID)?;
        }
        let kind = DeckKind::Filtered(filtered);
        self.conn.execute(
            "INSERT INTO decks (name, kind) VALUES (?1, ?2)",
            params![name, serde_json::to_string(&kind)?],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn deck_by_name(&self, name: &str) -> Result<Option<Deck>> {
        self.conn
            .query_row(
                &format!("SELECT {DECK_COLUMNS} FROM decks WHERE name = ?1"),
                params![name],
                deck_row,
            )
            .optional()?
            .map(DeckRow::into_deck)
            .transpose()
    }

    /// Store a new options group, returning its id.
    pub fn add_deck_config(&self, config: &DeckConfig) -> Result<DeckConfigId> {
        self.conn.execute(
            "INSERT INTO deck_configs (name, config) VALUES (?1, '{}')",
            params![config.name],
        )?;
        let id = self.conn.last_insert_rowid();
        let stored = DeckConfig {
            id,
            ..config.clone()
        };
        self.update_deck_config(&stored)?;
        Ok(id)
    }

    pub fn update_deck_config(&self, config: &DeckConfig) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE deck_configs SET name = ?1, config = ?2 WHERE id = ?3",
            params![config.name, serde_json::to_string(config)?, config.id],
        )?;
        if changed == 0 {
            return Err(DbError::InvalidData(format!(
                "deck config not found: {}",
                config.id
            )));
        }
        Ok(())
    }

    /// Point a normal deck at another options group.
    pub fn set_deck_config_id(&self, deck_id: DeckId, config_id: DeckConfigId) -> Result<()> {
        let mut deck = self
            .get_deck(deck_id)?
            .ok_or_else(|| DbError::DeckNotFound(deck_id.to_string()))?;
        match &mut deck.kind {
            DeckKind::Normal { config_id: current } => *current = config_id,
            DeckKind::Filtered(_) => {
                return Err(DbError::InvalidData(format!(
                    "filtered deck {deck_id} has no options group"
                )))
            }
        }
        self.save_deck(&deck)
    }

    fn save_deck(&self, deck: &Deck) -> Result<()> {
        self.conn.execute(
            "UPDATE decks SET name = ?1, kind = ?2, today_day = ?3, today_new = ?4,
                today_review = ?5, today_millis = ?6 WHERE id = ?7",
            params![
                deck.name,
                serde_json::to_string(&deck.kind)?,
                deck.today.day,
                deck.today.new_studied,
                deck.today.review_studied,
                deck.today.millis_studied,
                deck.id
            ],
        )?;
        Ok(())
    }

    // Notes and cards
    ////////////////////////////////////////////////////////////////////////

    /// Add a note with `card_count` sibling cards at the end of the new
    /// queue. All siblings share one position.
    pub fn add_note(
        &self,
        deck_id: DeckId,
        fields: &str,
        card_count: u16,
    ) -> Result<(NoteId, Vec<CardId>)> {
        let deck = self
            .get_deck(deck_id)?
            .ok_or_else(|| DbError::DeckNotFound(deck_id.to_string()))?;
        if deck.is_filtered() {
            return Err(DbError::InvalidData(format!(
                "cannot add notes to filtered deck {}",
                deck.name
            )));
        }

        self.conn
            .execute("INSERT INTO notes (fields) VALUES (?1)", params![fields])?;
        let note_id = self.conn.last_insert_rowid();
        let position = self.max_new_position()? + 1;

        let mut card_ids = Vec::with_capacity(card_count as usize);
        for ordinal in 0..card_count.max(1) {
            self.conn.execute(
                "INSERT INTO cards (note_id, deck_id, ordinal, card_type, queue, due_kind, due)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'position', ?6)",
                params![
                    note_id,
                    deck_id,
                    ordinal,
                    CardType::New.as_str(),
                    CardQueue::New.as_str(),
                    position
                ],
            )?;
            card_ids.push(self.conn.last_insert_rowid());
        }
        Ok((note_id, card_ids))
    }

    pub fn note(&self, note_id: NoteId) -> Result<Option<NoteInfo>> {
        self.conn
            .query_row(
                "SELECT id, fields, tags FROM notes WHERE id = ?1",
                params![note_id],
                |row| {
                    let tags: String = row.get(2)?;
                    Ok(NoteInfo {
                        id: row.get(0)?,
                        fields: row.get(1)?,
                        tags: split_tags(&tags),
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn cards_in_deck(&self, deck_id: DeckId) -> Result<Vec<Card>> {
        self.query_cards(&CardQuery::deck(deck_id).order(CardOrder::Id))
    }

    /// Revlog rows of a card, oldest first.
    pub fn revlog_for_card(&self, card_id: CardId) -> Result<Vec<RevlogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REVLOG_COLUMNS} FROM revlog WHERE card_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![card_id], revlog_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(RevlogRow::into_entry).collect()
    }

    fn tags_of(&self, note_id: NoteId) -> Result<Vec<String>> {
        let tags: Option<String> = self
            .conn
            .query_row(
                "SELECT tags FROM notes WHERE id = ?1",
                params![note_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(tags.map(|tags| split_tags(&tags)).unwrap_or_default())
    }

    fn set_tags(&self, note_id: NoteId, tags: &[String]) -> Result<()> {
        self.conn.execute(
            "UPDATE notes SET tags = ?1 WHERE id = ?2",
            params![tags.join(" "), note_id],
        )?;
        Ok(())
    }
}

impl CollectionStore for SqliteRepository {
    type Error = DbError;

    fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn collection_config(&self) -> Result<CollectionConfig> {
        let json: String = self
            .conn
            .query_row("SELECT config FROM collection WHERE id = 1", [], |row| {
                row.get(0)
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    fn set_collection_config(&mut self, config: &CollectionConfig) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO collection (id, config) VALUES (1, ?1)",
            params![serde_json::to_string(config)?],
        )?;
        Ok(())
    }

    fn get_card(&self, id: CardId) -> Result<Option<Card>> {
        self.conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"),
                params![id],
                card_row,
            )
            .optional()?
            .map(CardRow::into_card)
            .transpose()
    }

    fn update_card(&mut self, card: &Card) -> Result<()> {
        let (due_kind, due) = due_to_sql(card.due);
        let (original_due_kind, original_due) = match card.original_due.map(due_to_sql) {
            Some((kind, raw)) => (Some(kind), Some(raw)),
            None => (None, None),
        };
        let changed = self.conn.execute(
            "UPDATE cards SET note_id = ?1, deck_id = ?2, ordinal = ?3, card_type = ?4,
                queue = ?5, due_kind = ?6, due = ?7, interval = ?8, ease_factor = ?9,
                reps = ?10, lapses = ?11, left_packed = ?12, original_due_kind = ?13,
                original_due = ?14, original_deck_id = ?15, flags = ?16, modified = ?17
             WHERE id = ?18",
            params![
                card.note_id,
                card.deck_id,
                card.ordinal,
                card.card_type.as_str(),
                card.queue.as_str(),
                due_kind,
                due,
                card.interval,
                card.ease_factor,
                card.reps,
                card.lapses,
                card.remaining_steps.raw(),
                original_due_kind,
                original_due,
                card.original_deck_id,
                card.flags,
                card.modified,
                card.id
            ],
        )?;
        if changed == 0 {
            return Err(DbError::InvalidData(format!("card not found: {}", card.id)));
        }
        Ok(())
    }

    fn query_cards(&self, query: &CardQuery) -> Result<Vec<Card>> {
        let (where_sql, mut values) = card_filter_sql(query);
        let order = match query.order {
            CardOrder::Due => "ORDER BY due, id",
            CardOrder::Id => "ORDER BY id",
        };
        let mut sql = format!("SELECT {CARD_COLUMNS} FROM cards {where_sql} {order}");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), card_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(CardRow::into_card).collect()
    }

    fn count_cards(&self, query: &CardQuery) -> Result<usize> {
        let (where_sql, values) = card_filter_sql(query);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM cards {where_sql}"),
            params_from_iter(values),
            |row| row.get(0),
        )?;
        let count = count as usize;
        Ok(query.limit.map_or(count, |limit| count.min(limit)))
    }

    fn cards_of_note(&self, note_id: NoteId) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE note_id = ?1 ORDER BY ordinal"
        ))?;
        let rows = stmt
            .query_map(params![note_id], card_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(CardRow::into_card).collect()
    }

    fn max_new_position(&self) -> Result<i32> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(CASE WHEN original_deck_id IS NULL THEN due ELSE original_due END)
             FROM cards WHERE card_type = ?1",
            params![CardType::New.as_str()],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0).max(0) as i32)
    }

    fn insert_revlog(&mut self, entry: &RevlogEntry) -> Result<i64> {
        let mut id = entry.id;
        while self
            .conn
            .query_row("SELECT 1 FROM revlog WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?
            .is_some()
        {
            id += 1;
        }
        self.conn.execute(
            &format!("INSERT INTO revlog ({REVLOG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                id,
                entry.card_id,
                entry.usn,
                entry.ease,
                entry.interval,
                entry.last_interval,
                entry.ease_factor,
                entry.time_taken_ms,
                entry.kind.as_str()
            ],
        )?;
        Ok(id)
    }

    fn delete_last_revlog_for_card(&mut self, card_id: CardId) -> Result<Option<RevlogEntry>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {REVLOG_COLUMNS} FROM revlog WHERE card_id = ?1 ORDER BY id DESC LIMIT 1"
                ),
                params![card_id],
                revlog_row,
            )
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let entry = row.into_entry()?;
        self.conn
            .execute("DELETE FROM revlog WHERE id = ?1", params![entry.id])?;
        Ok(Some(entry))
    }

    fn get_deck(&self, id: DeckId) -> Result<Option<Deck>> {
        self.conn
            .query_row(
                &format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = ?1"),
                params![id],
                deck_row,
            )
            .optional()?
            .map(DeckRow::into_deck)
            .transpose()
    }

    fn all_decks(&self) -> Result<Vec<Deck>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DECK_COLUMNS} FROM decks ORDER BY name"))?;
        let rows = stmt
            .query_map([], deck_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(DeckRow::into_deck).collect()
    }

    fn update_deck(&mut self, deck: &Deck) -> Result<()> {
        self.save_deck(deck)
    }

    fn remove_deck(&mut self, id: DeckId) -> Result<()> {
        self.conn
            .execute("DELETE FROM decks WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn get_deck_config(&self, id: DeckConfigId) -> Result<Option<DeckConfig>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT config FROM deck_configs WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => match serde_json::from_str::<DeckConfig>(&json) {
                Ok(config) => Ok(Some(DeckConfig { id, ..config })),
                Err(err) => {
                    // Treated as missing; the scheduler falls back to defaults.
                    debug!(id, error = %err, "unreadable deck config");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn note_add_tag(&mut self, note_id: NoteId, tag: &str) -> Result<bool> {
        let mut tags = self.tags_of(note_id)?;
        if tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            return Ok(false);
        }
        tags.push(tag.to_string());
        self.set_tags(note_id, &tags)?;
        Ok(true)
    }

    fn note_remove_tag(&mut self, note_id: NoteId, tag: &str) -> Result<()> {
        let mut tags = self.tags_of(note_id)?;
        tags.retain(|t| !t.eq_ignore_ascii_case(tag));
        self.set_tags(note_id, &tags)
    }

    fn note_has_tag(&self, note_id: NoteId, tag: &str) -> Result<bool> {
        Ok(self
            .tags_of(note_id)?
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag)))
    }
}

fn normalize_deck_name(name: &str) -> Result<String> {
    let parts: Vec<&str> = name.split(DECK_SEPARATOR).map(str::trim).collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(DbError::InvalidData(format!("invalid deck name: {name:?}")));
    }
    Ok(parts.join(DECK_SEPARATOR))
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split_whitespace().map(str::to_string).collect()
}

/// WHERE clause and parameters for a card query.
fn card_filter_sql(query: &CardQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if !query.deck_ids.is_empty() {
        clauses.push(format!("deck_id IN ({})", placeholders(query.deck_ids.len())));
        values.extend(query.deck_ids.iter().map(|id| Value::Integer(*id)));
    }
    if !query.queues.is_empty() {
        clauses.push(format!("queue IN ({})", placeholders(query.queues.len())));
        values.extend(
            query
                .queues
                .iter()
                .map(|queue| Value::Text(queue.as_str().to_string())),
        );
    }
    if let Some(due) = query.due_before {
        clauses.push("due < ?".to_string());
        values.push(Value::Integer(due));
    }
    if let Some(lapses) = query.min_lapses {
        clauses.push("lapses >= ?".to_string());
        values.push(Value::Integer(lapses as i64));
    }
    if query.exclude_filtered {
        clauses.push("original_deck_id IS NULL".to_string());
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn due_to_sql(due: Due) -> (&'static str, i64) {
    match due {
        Due::Position(position) => ("position", position as i64),
        Due::Deadline(secs) => ("deadline", secs),
        Due::Day(day) => ("day", day as i64),
    }
}

fn due_from_sql(kind: &str, raw: i64) -> Result<Due> {
    match kind {
        "position" => Ok(Due::Position(raw as i32)),
        "deadline" => Ok(Due::Deadline(raw)),
        "day" => Ok(Due::Day(raw as i32)),
        other => Err(DbError::InvalidData(format!("unknown due kind: {other}"))),
    }
}

/// Raw card columns, decoded outside the rusqlite row callback so text
/// enums can fail with our own error.
struct CardRow {
    id: CardId,
    note_id: NoteId,
    deck_id: DeckId,
    ordinal: u16,
    card_type: String,
    queue: String,
    due_kind: String,
    due: i64,
    interval: u32,
    ease_factor: u32,
    reps: u32,
    lapses: u32,
    left_packed: i64,
    original_due_kind: Option<String>,
    original_due: Option<i64>,
    original_deck_id: Option<DeckId>,
    flags: u8,
    modified: i64,
}

fn card_row(row: &rusqlite::Row) -> rusqlite::Result<CardRow> {
    Ok(CardRow {
        id: row.get(0)?,
        note_id: row.get(1)?,
        deck_id: row.get(2)?,
        ordinal: row.get(3)?,
        card_type: row.get(4)?,
        queue: row.get(5)?,
        due_kind: row.get(6)?,
        due: row.get(7)?,
        interval: row.get(8)?,
        ease_factor: row.get(9)?,
        reps: row.get(10)?,
        lapses: row.get(11)?,
        left_packed: row.get(12)?,
        original_due_kind: row.get(13)?,
        original_due: row.get(14)?,
        original_deck_id: row.get(15)?,
        flags: row.get(16)?,
        modified: row.get(17)?,
    })
}

impl CardRow {
    fn into_card(self) -> Result<Card> {
        let card_type = CardType::from_str(&self.card_type)
            .ok_or_else(|| DbError::InvalidData(format!("unknown card type: {}", self.card_type)))?;
        let queue = CardQueue::from_str(&self.queue)
            .ok_or_else(|| DbError::InvalidData(format!("unknown queue: {}", self.queue)))?;
        let original_due = match (self.original_due_kind.as_deref(), self.original_due) {
            (Some(kind), Some(raw)) => Some(due_from_sql(kind, raw)?),
            _ => None,
        };
        Ok(Card {
            id: self.id,
            note_id: self.note_id,
            deck_id: self.deck_id,
            ordinal: self.ordinal,
            card_type,
            queue,
            due: due_from_sql(&self.due_kind, self.due)?,
            interval: self.interval,
            ease_factor: self.ease_factor,
            reps: self.reps,
            lapses: self.lapses,
            remaining_steps: LearningProgress::from_raw(self.left_packed),
            original_due,
            original_deck_id: self.original_deck_id,
            flags: self.flags,
            modified: self.modified,
        })
    }
}

struct DeckRow {
    id: DeckId,
    name: String,
    kind: String,
    today: DailyCounts,
}

fn deck_row(row: &rusqlite::Row) -> rusqlite::Result<DeckRow> {
    Ok(DeckRow {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        today: DailyCounts {
            day: row.get(3)?,
            new_studied: row.get(4)?,
            review_studied: row.get(5)?,
            millis_studied: row.get(6)?,
        },
    })
}

impl DeckRow {
    fn into_deck(self) -> Result<Deck> {
        Ok(Deck {
            id: self.id,
            name: self.name,
            kind: serde_json::from_str(&self.kind)?,
            today: self.today,
        })
    }
}

struct RevlogRow {
    entry: RevlogEntry,
    kind: String,
}

fn revlog_row(row: &rusqlite::Row) -> rusqlite::Result<RevlogRow> {
    Ok(RevlogRow {
        entry: RevlogEntry {
            id: row.get(0)?,
            card_id: row.get(1)?,
            usn: row.get(2)?,
            ease: row.get(3)?,
            interval: row.get(4)?,
            last_interval: row.get(5)?,
            ease_factor: row.get(6)?,
            time_taken_ms: row.get(7)?,
            kind: RevlogKind::Manual,
        },
        kind: row.get(8)?,
    })
}

impl RevlogRow {
    fn into_entry(self) -> Result<RevlogEntry> {
        let kind = RevlogKind::from_str(&self.kind)
            .ok_or_else(|| DbError::InvalidData(format!("unknown revlog kind: {}", self.kind)))?;
        Ok(RevlogEntry { kind, ..self.entry })
    }
}
