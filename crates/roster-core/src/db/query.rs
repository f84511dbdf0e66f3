//! Query and write helpers over the roster store.
//!
//! Reads return typed model structs, never raw rows. Writes validate the ids
//! they reference and return the stored row. The two search endpoints filter
//! through a [`PermissionSet`] before totals and pages are computed, so a
//! page never contains (or counts) a player the viewer cannot reach.
//!
//! All functions take a shared `&Connection` and return `anyhow::Result<T>`.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::str::FromStr;
use tracing::{debug, warn};

use super::{from_micros, to_micros};
use crate::config::HistoryConfig;
use crate::cursor::{Page, PageSource};
use crate::error::{ProfileError, UnknownUser};
use crate::history::FieldEntry;
use crate::model::absence::AbsenceRecord;
use crate::model::field::FieldKey;
use crate::model::note::{Note, NoteCategory};
use crate::model::player::{PlayerSummary, User};
use crate::model::role::{RelationshipType, Role, ViewingPermission};
use crate::model::{ParseEnumError, UserId};
use crate::permission::{PermissionSet, ResourceType};
use crate::profile::summarize;
use crate::snapshot::resolve;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Reset keys of the player listing. Combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerFilter {
    /// Case-insensitive substring of the name.
    pub phrase: Option<String>,
    /// Role to list; `None` lists players.
    pub role_filter: Option<Role>,
    /// Restrict to these ids (the "my players" toggle).
    pub related_player_ids: Option<Vec<UserId>>,
}

/// Reset keys of one player's note listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFilter {
    pub player_id: UserId,
    /// Case-insensitive substring of the content.
    pub phrase: Option<String>,
    /// Enabled categories; empty means all.
    pub categories: Vec<NoteCategory>,
}

impl NoteFilter {
    #[must_use]
    pub const fn for_player(player_id: UserId) -> Self {
        Self {
            player_id,
            phrase: None,
            categories: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Insert a user and return its id.
///
/// # Errors
///
/// Returns an error if the insert fails (for example, an empty name).
pub fn add_user(conn: &Connection, name: &str, role: Role, created_at: DateTime<Utc>) -> Result<UserId> {
    conn.execute(
        "INSERT INTO users (name, role, created_at_us) VALUES (?1, ?2, ?3)",
        params![name.trim(), role.as_str(), to_micros(created_at)],
    )
    .with_context(|| format!("insert user '{name}'"))?;
    Ok(conn.last_insert_rowid())
}

/// Fetch a user by id.
///
/// # Errors
///
/// Returns an error if the query fails or the stored role is unknown.
pub fn get_user(conn: &Connection, id: UserId) -> Result<Option<User>> {
    conn.query_row(
        "SELECT user_id, name, role FROM users WHERE user_id = ?1",
        params![id],
        row_to_user,
    )
    .optional()
    .with_context(|| format!("get_user for {id}"))
}

fn require_user(conn: &Connection, id: UserId) -> Result<User> {
    get_user(conn, id)?.ok_or_else(|| UnknownUser { id }.into())
}

fn require_player(conn: &Connection, id: UserId) -> Result<User> {
    get_user(conn, id)?
        .filter(User::is_player)
        .ok_or_else(|| ProfileError::NotFound { player: id }.into())
}

// ---------------------------------------------------------------------------
// Field history
// ---------------------------------------------------------------------------

/// Append one field observation.
///
/// With `reject_invalid_numbers` set, a numeric key whose text does not parse
/// is refused with [`crate::model::field::ValueError`]. Otherwise the text is
/// stored as given and the resolver treats it as absent if it wins.
///
/// # Errors
///
/// Returns an error if `player` is not a player, the value is refused, or the
/// insert fails.
pub fn record_field(
    conn: &Connection,
    history: &HistoryConfig,
    player: UserId,
    key: FieldKey,
    value: &str,
    created_at: DateTime<Utc>,
) -> Result<FieldEntry> {
    require_player(conn, player)?;
    if let Err(error) = key.parse_value(value) {
        if history.reject_invalid_numbers {
            return Err(error.into());
        }
        warn!(%key, value, "recording a value that will not resolve");
    }

    conn.execute(
        "INSERT INTO profile_fields (player_id, field_key, value, created_at_us, recorded_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            player,
            key.as_str(),
            value,
            to_micros(created_at),
            to_micros(Utc::now())
        ],
    )
    .with_context(|| format!("insert {key} for player {player}"))?;

    Ok(FieldEntry {
        player_id: player,
        key,
        value: value.to_string(),
        created_at,
        seq: conn.last_insert_rowid(),
    })
}

/// Every stored entry of `player`, ordered by key then version.
///
/// Rows with a key token this build does not know are skipped.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn field_history(conn: &Connection, player: UserId) -> Result<Vec<FieldEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT seq, player_id, field_key, value, created_at_us FROM profile_fields \
             WHERE player_id = ?1 ORDER BY field_key, created_at_us, seq",
        )
        .context("prepare field_history")?;
    let rows = stmt
        .query_map(params![player], row_to_raw_entry)
        .context("execute field_history")?;
    collect_entries(rows)
}

/// Entries of one key with `since <= created_at < until`, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn field_history_window(
    conn: &Connection,
    player: UserId,
    key: FieldKey,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<Vec<FieldEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT seq, player_id, field_key, value, created_at_us FROM profile_fields \
             WHERE player_id = ?1 AND field_key = ?2 \
               AND created_at_us >= ?3 AND created_at_us < ?4 \
             ORDER BY created_at_us, seq",
        )
        .context("prepare field_history_window")?;
    let rows = stmt
        .query_map(
            params![
                player,
                key.as_str(),
                since.map_or(i64::MIN, to_micros),
                until.map_or(i64::MAX, to_micros)
            ],
            row_to_raw_entry,
        )
        .context("execute field_history_window")?;
    collect_entries(rows)
}

// ---------------------------------------------------------------------------
// Permissions, absences, notes
// ---------------------------------------------------------------------------

/// Grant `viewer` access to `player`. Returns `false` when the same edge
/// already existed.
///
/// # Errors
///
/// Returns an error if either id is unknown, `player` is not a player, or
/// the insert fails.
pub fn grant_permission(
    conn: &Connection,
    viewer: UserId,
    player: UserId,
    relationship: RelationshipType,
    created_at: DateTime<Utc>,
) -> Result<bool> {
    require_user(conn, viewer)?;
    require_player(conn, player)?;
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO viewing_permissions \
             (viewer_id, related_player_id, relationship, created_at_us) \
             VALUES (?1, ?2, ?3, ?4)",
            params![viewer, player, relationship.as_str(), to_micros(created_at)],
        )
        .with_context(|| format!("grant {viewer} -> {player}"))?;
    Ok(inserted > 0)
}

/// Edges held by `viewer`.
///
/// # Errors
///
/// Returns an error if the query fails or a stored token is unknown.
pub fn viewing_permissions(conn: &Connection, viewer: UserId) -> Result<Vec<ViewingPermission>> {
    let mut stmt = conn
        .prepare(
            "SELECT viewer_id, related_player_id, relationship FROM viewing_permissions \
             WHERE viewer_id = ?1 ORDER BY related_player_id, relationship",
        )
        .context("prepare viewing_permissions")?;
    let rows = stmt
        .query_map(params![viewer], |row| {
            Ok(ViewingPermission {
                viewer_id: row.get(0)?,
                related_player_id: row.get(1)?,
                relationship: parse_token(row, 2)?,
            })
        })
        .context("execute viewing_permissions")?;
    collect(rows, "viewing permission")
}

/// Record an absence and return its row id.
///
/// # Errors
///
/// Returns an error if the player is unknown or the insert fails.
pub fn add_absence(conn: &Connection, record: &AbsenceRecord, created_at: DateTime<Utc>) -> Result<i64> {
    require_player(conn, record.player_id)?;
    conn.execute(
        "INSERT INTO absences (player_id, absence_type, absence_date, reason, description, created_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.player_id,
            record.absence_type.as_str(),
            record.date.format("%Y-%m-%d").to_string(),
            record.reason.as_str(),
            record.description,
            to_micros(created_at)
        ],
    )
    .with_context(|| format!("insert absence for player {}", record.player_id))?;
    Ok(conn.last_insert_rowid())
}

/// Absences of `player`, newest date first.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn absences(conn: &Connection, player: UserId) -> Result<Vec<AbsenceRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT player_id, absence_type, absence_date, reason, description FROM absences \
             WHERE player_id = ?1 ORDER BY absence_date DESC, absence_id DESC",
        )
        .context("prepare absences")?;
    let rows = stmt
        .query_map(params![player], |row| {
            let raw_date: String = row.get(2)?;
            let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
            Ok(AbsenceRecord {
                player_id: row.get(0)?,
                absence_type: parse_token(row, 1)?,
                date,
                reason: parse_token(row, 3)?,
                description: row.get(4)?,
            })
        })
        .context("execute absences")?;
    collect(rows, "absence")
}

/// Write a note and return its id.
///
/// # Errors
///
/// Returns an error if the player or author is unknown, or the insert fails.
pub fn add_note(
    conn: &Connection,
    player: UserId,
    author: UserId,
    category: NoteCategory,
    content: &str,
    created_at: DateTime<Utc>,
) -> Result<i64> {
    require_player(conn, player)?;
    require_user(conn, author)?;
    conn.execute(
        "INSERT INTO notes (player_id, author_id, category, content, created_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![player, author, category.as_str(), content, to_micros(created_at)],
    )
    .with_context(|| format!("insert note for player {player}"))?;
    Ok(conn.last_insert_rowid())
}

/// Every note about `player`, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn notes(conn: &Connection, player: UserId) -> Result<Vec<Note>> {
    let filter = NoteFilter::for_player(player);
    let (where_clause, param_values) = note_conditions(&filter);
    let sql = format!(
        "SELECT note_id, player_id, author_id, category, content, created_at_us \
         FROM notes n WHERE {where_clause} ORDER BY n.created_at_us DESC, n.note_id DESC"
    );
    query_notes(conn, &sql, &param_values)
}

// ---------------------------------------------------------------------------
// Search endpoints
// ---------------------------------------------------------------------------

/// One page of the player listing as `viewer` sees it.
///
/// Only `Player` rows are listed unless `role_filter` asks for another role,
/// so a non-player viewer never shows up through the self rule. Rows the
/// viewer cannot reach are removed before `total_count` is taken. Pages past
/// the end come back empty with the correct total.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn search_players(
    conn: &Connection,
    permissions: &PermissionSet,
    filter: &PlayerFilter,
    page_number: u64,
    page_size: u64,
) -> Result<Page<PlayerSummary>> {
    let mut conditions: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

    let role = filter.role_filter.unwrap_or(Role::Player);
    param_values.push(Box::new(role.as_str()));
    conditions.push(format!("u.role = ?{}", param_values.len()));
    if let Some(phrase) = non_empty(filter.phrase.as_deref()) {
        param_values.push(Box::new(like_pattern(phrase)));
        conditions.push(format!("u.name LIKE ?{} ESCAPE '\\'", param_values.len()));
    }

    let where_clause = conditions.join(" AND ");
    let sql = format!(
        "SELECT u.user_id, u.name, u.role FROM users u WHERE {where_clause} \
         ORDER BY u.name COLLATE NOCASE ASC, u.user_id ASC"
    );

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare search_players query: {sql}"))?;
    let params_ref: Vec<&dyn ToSql> = param_values.iter().map(AsRef::as_ref).collect();
    let rows = stmt
        .query_map(params_from_iter(params_ref), row_to_user)
        .context("execute search_players query")?;
    let mut users = collect(rows, "user")?;

    // Reachability comes from the viewer's edge set, not a column, so rows
    // are filtered here and paged in memory. Year of birth is resolved only
    // for the rows on the returned page.
    if let Some(ids) = &filter.related_player_ids {
        users.retain(|user| ids.contains(&user.id));
    }
    let users = permissions.retain_authorized(users, ResourceType::ProfileFields, |user| user.id);
    let total_count = u64::try_from(users.len()).unwrap_or(u64::MAX);

    let mut results = Vec::new();
    for user in users
        .into_iter()
        .skip(clamp_usize(page_number.saturating_mul(page_size)))
        .take(clamp_usize(page_size))
    {
        let birth = field_history_window(conn, user.id, FieldKey::YearOfBirth, None, None)?;
        results.push(summarize(user, &resolve(&birth), permissions));
    }

    debug!(
        viewer = permissions.viewer().id,
        page_number,
        total_count,
        returned = results.len(),
        "player search"
    );
    Ok(Page {
        results,
        total_count,
    })
}

/// One page of a player's notes.
///
/// # Errors
///
/// Returns [`ProfileError::Forbidden`] (inside the `anyhow::Error`) when the
/// viewer cannot reach the player, or an error if a query fails.
pub fn search_notes(
    conn: &Connection,
    permissions: &PermissionSet,
    filter: &NoteFilter,
    page_number: u64,
    page_size: u64,
) -> Result<Page<Note>> {
    permissions.authorize(filter.player_id, ResourceType::Notes)?;

    let (where_clause, mut param_values) = note_conditions(filter);
    let count_sql = format!("SELECT COUNT(*) FROM notes n WHERE {where_clause}");
    let total: i64 = {
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(AsRef::as_ref).collect();
        conn.query_row(&count_sql, params_from_iter(params_ref), |row| row.get(0))
            .context("count notes")?
    };

    let limit = i64::try_from(page_size).unwrap_or(i64::MAX);
    let offset = i64::try_from(page_number.saturating_mul(page_size)).unwrap_or(i64::MAX);
    param_values.push(Box::new(limit));
    let limit_index = param_values.len();
    param_values.push(Box::new(offset));
    let offset_index = param_values.len();

    let sql = format!(
        "SELECT note_id, player_id, author_id, category, content, created_at_us \
         FROM notes n WHERE {where_clause} \
         ORDER BY n.created_at_us DESC, n.note_id DESC \
         LIMIT ?{limit_index} OFFSET ?{offset_index}"
    );
    let results = query_notes(conn, &sql, &param_values)?;

    Ok(Page {
        results,
        total_count: u64::try_from(total).unwrap_or(0),
    })
}

/// [`PageSource`] over [`search_players`] for one viewer.
pub struct PlayerPages<'c> {
    conn: &'c Connection,
    permissions: &'c PermissionSet,
}

impl<'c> PlayerPages<'c> {
    #[must_use]
    pub const fn new(conn: &'c Connection, permissions: &'c PermissionSet) -> Self {
        Self { conn, permissions }
    }
}

impl PageSource<PlayerFilter> for PlayerPages<'_> {
    type Item = PlayerSummary;
    type Error = anyhow::Error;

    fn fetch(&mut self, keys: &PlayerFilter, page: u64, page_size: u64) -> Result<Page<PlayerSummary>> {
        search_players(self.conn, self.permissions, keys, page, page_size)
    }
}

/// [`PageSource`] over [`search_notes`] for one viewer.
pub struct NotePages<'c> {
    conn: &'c Connection,
    permissions: &'c PermissionSet,
}

impl<'c> NotePages<'c> {
    #[must_use]
    pub const fn new(conn: &'c Connection, permissions: &'c PermissionSet) -> Self {
        Self { conn, permissions }
    }
}

impl PageSource<NoteFilter> for NotePages<'_> {
    type Item = Note;
    type Error = anyhow::Error;

    fn fetch(&mut self, keys: &NoteFilter, page: u64, page_size: u64) -> Result<Page<Note>> {
        search_notes(self.conn, self.permissions, keys, page, page_size)
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn note_conditions(filter: &NoteFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut param_values: Vec<Box<dyn ToSql>> = vec![Box::new(filter.player_id)];
    let mut conditions = vec!["n.player_id = ?1".to_string()];

    if !filter.categories.is_empty() {
        let mut placeholders = Vec::with_capacity(filter.categories.len());
        for category in &filter.categories {
            param_values.push(Box::new(category.as_str()));
            placeholders.push(format!("?{}", param_values.len()));
        }
        conditions.push(format!("n.category IN ({})", placeholders.join(", ")));
    }
    if let Some(phrase) = non_empty(filter.phrase.as_deref()) {
        param_values.push(Box::new(like_pattern(phrase)));
        conditions.push(format!("n.content LIKE ?{} ESCAPE '\\'", param_values.len()));
    }

    (conditions.join(" AND "), param_values)
}

fn query_notes(conn: &Connection, sql: &str, param_values: &[Box<dyn ToSql>]) -> Result<Vec<Note>> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("prepare notes query: {sql}"))?;
    let params_ref: Vec<&dyn ToSql> = param_values.iter().map(AsRef::as_ref).collect();
    let rows = stmt
        .query_map(params_from_iter(params_ref), |row| {
            Ok(Note {
                note_id: row.get(0)?,
                player_id: row.get(1)?,
                author_id: row.get(2)?,
                category: parse_token(row, 3)?,
                content: row.get(4)?,
                created_at: from_micros(row.get(5)?)?,
            })
        })
        .context("execute notes query")?;
    collect(rows, "note")
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        role: parse_token(row, 2)?,
    })
}

/// Entry with its key still as text, so unknown tokens can be skipped.
struct RawEntry {
    seq: i64,
    player_id: UserId,
    key: String,
    value: String,
    created_at: DateTime<Utc>,
}

fn row_to_raw_entry(row: &Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        seq: row.get(0)?,
        player_id: row.get(1)?,
        key: row.get(2)?,
        value: row.get(3)?,
        created_at: from_micros(row.get(4)?)?,
    })
}

fn collect_entries(
    rows: impl Iterator<Item = rusqlite::Result<RawEntry>>,
) -> Result<Vec<FieldEntry>> {
    let mut entries = Vec::new();
    for row in rows {
        let raw = row.context("read profile_fields row")?;
        match raw.key.parse::<FieldKey>() {
            Ok(key) => entries.push(FieldEntry {
                player_id: raw.player_id,
                key,
                value: raw.value,
                created_at: raw.created_at,
                seq: raw.seq,
            }),
            Err(_) => warn!(seq = raw.seq, key = %raw.key, "skipping unknown field key"),
        }
    }
    Ok(entries)
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>, what: &str) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.with_context(|| format!("read {what} row"))?);
    }
    Ok(out)
}

fn parse_token<T>(row: &Row<'_>, index: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.get(index)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn non_empty(phrase: Option<&str>) -> Option<&str> {
    phrase.map(str::trim).filter(|p| !p.is_empty())
}

fn like_pattern(phrase: &str) -> String {
    let mut escaped = String::with_capacity(phrase.len() + 2);
    escaped.push('%');
    for c in phrase.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn clamp_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
