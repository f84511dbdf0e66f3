//! Read contracts the profile engine depends on.
//!
//! The engine never talks to a database directly. It reads through
//! [`ProfileStore`]; [`crate::db::SqliteStore`] is the persistent
//! implementation and [`MemoryStore`] keeps everything in process.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::error::FetchError;
use crate::history::{FieldEntry, FieldLog};
use crate::model::UserId;
use crate::model::absence::AbsenceRecord;
use crate::model::field::FieldKey;
use crate::model::note::{Note, NoteCategory};
use crate::model::player::User;
use crate::model::role::{RelationshipType, Role, ViewingPermission};

/// Reads needed to assemble a profile.
///
/// Every method may fail with a [`FetchError`]; "nothing there" is an empty
/// result, never an error.
pub trait ProfileStore {
    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the store cannot be read.
    fn user(&self, id: UserId) -> Result<Option<User>, FetchError>;

    /// Every field entry of `player`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the store cannot be read.
    fn field_history(&self, player: UserId) -> Result<Vec<FieldEntry>, FetchError>;

    /// Entries of one key with `since <= created_at < until`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the store cannot be read.
    fn field_history_window(
        &self,
        player: UserId,
        key: FieldKey,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<FieldEntry>, FetchError>;

    /// Edges held by `viewer`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the store cannot be read.
    fn viewing_permissions(&self, viewer: UserId) -> Result<Vec<ViewingPermission>, FetchError>;

    /// # Errors
    ///
    /// Returns [`FetchError`] when the store cannot be read.
    fn absences(&self, player: UserId) -> Result<Vec<AbsenceRecord>, FetchError>;

    /// Notes about `player`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the store cannot be read.
    fn notes(&self, player: UserId) -> Result<Vec<Note>, FetchError>;
}

/// In-process store, one [`FieldLog`] per player.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: BTreeMap<UserId, User>,
    logs: BTreeMap<UserId, FieldLog>,
    permissions: Vec<ViewingPermission>,
    absences: Vec<AbsenceRecord>,
    notes: Vec<Note>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, id: UserId, name: impl Into<String>, role: Role) {
        self.users.insert(
            id,
            User {
                id,
                name: name.into(),
                role,
            },
        );
    }

    /// Append a field observation for `player`.
    pub fn record(
        &mut self,
        player: UserId,
        key: FieldKey,
        value: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> &FieldEntry {
        self.logs
            .entry(player)
            .or_default()
            .append(player, key, value, created_at)
    }

    pub fn grant(&mut self, viewer: UserId, player: UserId, relationship: RelationshipType) {
        self.permissions.push(ViewingPermission {
            viewer_id: viewer,
            related_player_id: player,
            relationship,
        });
    }

    pub fn add_absence(&mut self, record: AbsenceRecord) {
        self.absences.push(record);
    }

    pub fn add_note(
        &mut self,
        player: UserId,
        author: UserId,
        category: NoteCategory,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> i64 {
        let note_id = self.notes.iter().map(|n| n.note_id).max().unwrap_or(0) + 1;
        self.notes.push(Note {
            note_id,
            player_id: player,
            author_id: author,
            category,
            content: content.into(),
            created_at,
        });
        note_id
    }
}

impl ProfileStore for MemoryStore {
    fn user(&self, id: UserId) -> Result<Option<User>, FetchError> {
        Ok(self.users.get(&id).cloned())
    }

    fn field_history(&self, player: UserId) -> Result<Vec<FieldEntry>, FetchError> {
        Ok(self
            .logs
            .get(&player)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn field_history_window(
        &self,
        player: UserId,
        key: FieldKey,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<FieldEntry>, FetchError> {
        Ok(self
            .logs
            .get(&player)
            .map(|log| log.window(key, since, until).to_vec())
            .unwrap_or_default())
    }

    fn viewing_permissions(&self, viewer: UserId) -> Result<Vec<ViewingPermission>, FetchError> {
        Ok(self
            .permissions
            .iter()
            .filter(|edge| edge.viewer_id == viewer)
            .copied()
            .collect())
    }

    fn absences(&self, player: UserId) -> Result<Vec<AbsenceRecord>, FetchError> {
        Ok(self
            .absences
            .iter()
            .filter(|record| record.player_id == player)
            .cloned()
            .collect())
    }

    fn notes(&self, player: UserId) -> Result<Vec<Note>, FetchError> {
        let mut notes: Vec<Note> = self
            .notes
            .iter()
            .filter(|note| note.player_id == player)
            .cloned()
            .collect();
        notes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.note_id.cmp(&a.note_id))
        });
        Ok(notes)
    }
}
