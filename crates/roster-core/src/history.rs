//! Append-only field history.
//!
//! A [`FieldEntry`] is one observation of one field for one player. Entries
//! are never edited; a new observation is a new entry. `created_at` is the
//! author's timestamp and can be earlier than entries already stored, so the
//! store also hands out `seq`, a monotonically increasing insertion number.
//!
//! [`FieldLog`] keeps one player's entries indexed by key, each list sorted by
//! `(created_at, seq)` at insert time. The newest value of a key is then the
//! last element of its list, and time-window reads are two binary searches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::UserId;
use crate::model::field::FieldKey;

/// One historical observation of a profile field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub player_id: UserId,
    pub key: FieldKey,
    /// Stored text, interpreted per key by [`FieldKey::parse_value`].
    pub value: String,
    pub created_at: DateTime<Utc>,
    /// Insertion sequence. Larger means appended later.
    pub seq: i64,
}

impl FieldEntry {
    /// Ordering key inside a field's history.
    #[must_use]
    pub fn version(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.seq)
    }
}

/// Versioned, per-key index over one player's field history.
#[derive(Debug, Clone, Default)]
pub struct FieldLog {
    by_key: BTreeMap<FieldKey, Vec<FieldEntry>>,
    next_seq: i64,
}

impl FieldLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from entries in any order.
    ///
    /// Entries keep their `seq`. Two entries with identical `(created_at, seq)`
    /// keep their input order, so the later one is treated as appended later.
    pub fn from_entries(entries: impl IntoIterator<Item = FieldEntry>) -> Self {
        let mut log = Self::new();
        for entry in entries {
            log.insert(entry);
        }
        log
    }

    /// Append a new observation, assigning it the next sequence number.
    pub fn append(
        &mut self,
        player_id: UserId,
        key: FieldKey,
        value: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> &FieldEntry {
        let entry = FieldEntry {
            player_id,
            key,
            value: value.into(),
            created_at,
            seq: self.next_seq,
        };
        let index = self.insert(entry);
        &self.by_key[&key][index]
    }

    /// Insert an entry that already carries a sequence number.
    ///
    /// Returns the entry's position within its key's history.
    pub fn insert(&mut self, entry: FieldEntry) -> usize {
        self.next_seq = self.next_seq.max(entry.seq.saturating_add(1));
        let list = self.by_key.entry(entry.key).or_default();
        let version = entry.version();
        // After every entry that is not newer, so equal versions keep arrival order.
        let index = list.partition_point(|existing| existing.version() <= version);
        list.insert(index, entry);
        index
    }

    /// Full history of one key, oldest first.
    #[must_use]
    pub fn entries(&self, key: FieldKey) -> &[FieldEntry] {
        self.by_key.get(&key).map_or(&[], Vec::as_slice)
    }

    /// The entry that currently defines `key`, if any.
    #[must_use]
    pub fn latest(&self, key: FieldKey) -> Option<&FieldEntry> {
        self.by_key.get(&key).and_then(|list| list.last())
    }

    /// Entries of `key` with `since <= created_at < until`, oldest first.
    ///
    /// Open bounds are expressed with `None`.
    #[must_use]
    pub fn window(
        &self,
        key: FieldKey,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> &[FieldEntry] {
        let list = self.entries(key);
        let start = since.map_or(0, |since| list.partition_point(|e| e.created_at < since));
        let end = until.map_or(list.len(), |until| {
            list.partition_point(|e| e.created_at < until)
        });
        if start >= end { &[] } else { &list[start..end] }
    }

    /// Keys with at least one entry, in key order.
    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.by_key
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(key, _)| *key)
    }

    /// Every entry, grouped by key and ordered within each key.
    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> + '_ {
        self.by_key.values().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.values().all(Vec::is_empty)
    }
}
