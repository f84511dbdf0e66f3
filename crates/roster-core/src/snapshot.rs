//! Snapshot resolution: one current value per field key.
//!
//! A player's history collapses to a [`Snapshot`] by keeping, per key, the
//! entry with the greatest `created_at`. Author timestamps can collide, so
//! the tie-break falls to `seq`: the row appended last wins.
//!
//! Values are interpreted after the winner is chosen. When the winning text of
//! a numeric key does not parse, the key is left out of the snapshot; an older
//! entry is never promoted in its place, since that would present stale data
//! as current. Rejected winners are kept on the snapshot for auditing.
//!
//! A key with no history is simply missing from the snapshot. There is no
//! zero/empty placeholder.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::history::{FieldEntry, FieldLog};
use crate::model::field::{FieldKey, FieldValue, ValueError};

// ---------------------------------------------------------------------------
// Versioned
// ---------------------------------------------------------------------------

/// A last-writer-wins register ordered by `(created_at, seq)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub created_at: DateTime<Utc>,
    pub seq: i64,
}

impl<T> Versioned<T> {
    pub fn new(value: T, created_at: DateTime<Utc>, seq: i64) -> Self {
        Self {
            value,
            created_at,
            seq,
        }
    }
}

impl<T: Clone> Versioned<T> {
    /// Merge a later-arriving write into this register.
    ///
    /// 1. Greater `created_at` wins.
    /// 2. Equal `created_at`: greater `seq` wins.
    /// 3. Equal `seq` as well: `incoming` wins, since it arrived later.
    pub fn merge(&mut self, incoming: &Self) {
        if !self.wins_over(incoming) {
            self.value = incoming.value.clone();
            self.created_at = incoming.created_at;
            self.seq = incoming.seq;
        }
    }

    fn wins_over(&self, incoming: &Self) -> bool {
        match self.created_at.cmp(&incoming.created_at) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
        self.seq > incoming.seq
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Current value of one field, derived on read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    pub key: FieldKey,
    pub current: FieldValue,
    pub last_updated: DateTime<Utc>,
}

/// Resolved view of a player's profile fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    fields: BTreeMap<FieldKey, ResolvedField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rejected: Vec<ValueError>,
}

impl Snapshot {
    #[must_use]
    pub fn get(&self, key: FieldKey) -> Option<&ResolvedField> {
        self.fields.get(&key)
    }

    #[must_use]
    pub fn contains(&self, key: FieldKey) -> bool {
        self.fields.contains_key(&key)
    }

    /// Resolved fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedField> + '_ {
        self.fields.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Winning entries that were dropped because their text did not parse.
    #[must_use]
    pub fn rejected(&self) -> &[ValueError] {
        &self.rejected
    }

    fn admit(&mut self, key: FieldKey, raw: &str, last_updated: DateTime<Utc>) {
        match key.parse_value(raw) {
            Ok(current) => {
                self.fields.insert(
                    key,
                    ResolvedField {
                        key,
                        current,
                        last_updated,
                    },
                );
            }
            Err(error) => {
                debug!(%key, raw, "stored value does not parse; treating field as absent");
                self.rejected.push(error);
            }
        }
    }
}

/// Collapse one player's history (in any order) into a [`Snapshot`].
///
/// When two entries share both `created_at` and `seq`, the one later in
/// `entries` wins.
#[must_use]
pub fn resolve(entries: &[FieldEntry]) -> Snapshot {
    let mut winners: BTreeMap<FieldKey, Versioned<&str>> = BTreeMap::new();
    for entry in entries {
        let incoming = Versioned::new(entry.value.as_str(), entry.created_at, entry.seq);
        winners
            .entry(entry.key)
            .and_modify(|current| current.merge(&incoming))
            .or_insert(incoming);
    }

    let mut snapshot = Snapshot::default();
    for (key, winner) in winners {
        snapshot.admit(key, winner.value, winner.created_at);
    }
    snapshot
}

impl FieldLog {
    /// Snapshot straight from the index: the last entry of every key.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for key in self.keys() {
            if let Some(entry) = self.latest(key) {
                snapshot.admit(key, &entry.value, entry.created_at);
            }
        }
        snapshot
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
