#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use roster_core::history::FieldEntry;
use roster_core::model::field::FieldKey;
use roster_core::model::role::{RelationshipType, Role, ViewingPermission};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 10, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn arb_field_key() -> impl Strategy<Value = FieldKey> {
    prop::sample::select(FieldKey::ALL.to_vec())
}

/// Mostly numbers, sometimes junk, so numeric keys exercise the fail-closed path.
pub fn arb_raw_value() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => (0_i64..3000).prop_map(|n| n.to_string()),
        2 => (0.0_f64..40.0).prop_map(|n| format!("{n:.2}")),
        1 => "[a-z]{1,6}",
    ]
}

/// Timestamps drawn from a narrow range so ties are common.
pub fn arb_created_at() -> impl Strategy<Value = DateTime<Utc>> {
    (0_i64..12).prop_map(|hours| base_time() + Duration::hours(hours))
}

/// One player's history with `seq` numbered in generation order.
pub fn arb_history(max_len: usize) -> impl Strategy<Value = Vec<FieldEntry>> {
    prop::collection::vec((arb_field_key(), arb_raw_value(), arb_created_at()), 0..max_len).prop_map(
        |rows| {
            rows.into_iter()
                .zip(0_i64..)
                .map(|((key, value, created_at), seq)| FieldEntry {
                    player_id: 1,
                    key,
                    value,
                    created_at,
                    seq,
                })
                .collect()
        },
    )
}

pub fn arb_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

pub fn arb_relationship() -> impl Strategy<Value = RelationshipType> {
    prop::sample::select(RelationshipType::ALL.to_vec())
}

/// Edges from a handful of viewers to a handful of players.
pub fn arb_edges() -> impl Strategy<Value = Vec<ViewingPermission>> {
    prop::collection::vec((1_i64..6, 1_i64..10, arb_relationship()), 0..12).prop_map(|rows| {
        rows.into_iter()
            .map(|(viewer_id, related_player_id, relationship)| ViewingPermission {
                viewer_id,
                related_player_id,
                relationship,
            })
            .collect()
    })
}
