use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::query;
use crate::error::FetchError;
use crate::history::FieldEntry;
use crate::model::UserId;
use crate::model::absence::AbsenceRecord;
use crate::model::field::FieldKey;
use crate::model::note::Note;
use crate::model::player::User;
use crate::model::role::ViewingPermission;
use crate::store::ProfileStore;

/// [`ProfileStore`] over an open SQLite connection.
#[derive(Clone, Copy)]
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    #[must_use]
    pub const fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub const fn connection(&self) -> &'c Connection {
        self.conn
    }
}

impl ProfileStore for SqliteStore<'_> {
    fn user(&self, id: UserId) -> Result<Option<User>, FetchError> {
        query::get_user(self.conn, id).map_err(|e| FetchError::new("user", e))
    }

    fn field_history(&self, player: UserId) -> Result<Vec<FieldEntry>, FetchError> {
        query::field_history(self.conn, player).map_err(|e| FetchError::new("field history", e))
    }

    fn field_history_window(
        &self,
        player: UserId,
        key: FieldKey,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<FieldEntry>, FetchError> {
        query::field_history_window(self.conn, player, key, since, until)
            .map_err(|e| FetchError::new("field history", e))
    }

    fn viewing_permissions(&self, viewer: UserId) -> Result<Vec<ViewingPermission>, FetchError> {
        query::viewing_permissions(self.conn, viewer)
            .map_err(|e| FetchError::new("viewing permissions", e))
    }

    fn absences(&self, player: UserId) -> Result<Vec<AbsenceRecord>, FetchError> {
        query::absences(self.conn, player).map_err(|e| FetchError::new("absences", e))
    }

    fn notes(&self, player: UserId) -> Result<Vec<Note>, FetchError> {
        query::notes(self.conn, player).map_err(|e| FetchError::new("notes", e))
    }
}
