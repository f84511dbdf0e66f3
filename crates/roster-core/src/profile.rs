//! Assembling a player's profile for one viewer.
//!
//! Order of checks matters: the viewer's permissions are read and checked
//! before the player is looked up, so a viewer without access gets
//! `Forbidden` whether or not the id exists. Admins and the player
//! themselves always pass the check and see `NotFound` for unknown ids.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProfileError;
use crate::history::FieldEntry;
use crate::model::UserId;
use crate::model::absence::{AbsenceRecord, AbsenceType, group_by_type};
use crate::model::category::ProfileCategory;
use crate::model::field::FieldKey;
use crate::model::note::Note;
use crate::model::player::{PlayerSummary, User};
use crate::model::role::Viewer;
use crate::permission::{PermissionSet, ResourceType};
use crate::snapshot::{Snapshot, resolve};
use crate::store::ProfileStore;
use crate::visibility::visible_categories;

/// Everything a profile page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub player: PlayerSummary,
    pub fields: Snapshot,
    /// Absences per type, newest first within a type.
    pub absences: BTreeMap<AbsenceType, Vec<AbsenceRecord>>,
    /// Tabs to show, in display order.
    pub categories: Vec<ProfileCategory>,
}

impl PlayerProfile {
    /// Resolved fields of one category, in the category's key order.
    pub fn fields_in(
        &self,
        category: ProfileCategory,
    ) -> impl Iterator<Item = &crate::snapshot::ResolvedField> + '_ {
        category
            .field_keys()
            .iter()
            .filter_map(|key| self.fields.get(*key))
    }
}

/// Load the permission set of `viewer` from the store.
///
/// # Errors
///
/// Returns [`ProfileError::Fetch`] when the edges cannot be read.
pub fn permissions_for<S>(store: &S, viewer: Viewer) -> Result<PermissionSet, ProfileError>
where
    S: ProfileStore + ?Sized,
{
    let edges = store.viewing_permissions(viewer.id)?;
    Ok(PermissionSet::new(viewer, edges))
}

/// Build the profile of `player` as seen by `viewer`.
///
/// # Errors
///
/// - [`ProfileError::Forbidden`] when the viewer cannot reach the player
/// - [`ProfileError::NotFound`] when the id is not a player
/// - [`ProfileError::Fetch`] when any read fails
pub fn load_profile<S>(store: &S, viewer: Viewer, player: UserId) -> Result<PlayerProfile, ProfileError>
where
    S: ProfileStore + ?Sized,
{
    let permissions = permissions_for(store, viewer)?;
    permissions.authorize(player, ResourceType::ProfileFields)?;
    let user = find_player(store, player)?;

    let fields = resolve(&store.field_history(player)?);
    let absences = if permissions.is_authorized(player, ResourceType::Absences) {
        store.absences(player)?
    } else {
        Vec::new()
    };
    let categories = visible_categories(
        &fields,
        &absences,
        &permissions.authorized_categories(player),
    );
    debug!(
        viewer = viewer.id,
        player,
        fields = fields.len(),
        categories = categories.len(),
        "profile resolved"
    );

    Ok(PlayerProfile {
        player: summarize(user, &fields, &permissions),
        fields,
        absences: group_by_type(&absences),
        categories,
    })
}

/// History of one key of `player`, `since <= created_at < until`.
///
/// # Errors
///
/// Same outcomes as [`load_profile`].
pub fn load_field_history<S>(
    store: &S,
    viewer: Viewer,
    player: UserId,
    key: FieldKey,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<Vec<FieldEntry>, ProfileError>
where
    S: ProfileStore + ?Sized,
{
    permissions_for(store, viewer)?.authorize(player, ResourceType::ProfileFields)?;
    find_player(store, player)?;
    Ok(store.field_history_window(player, key, since, until)?)
}

/// Notes about `player`, newest first.
///
/// # Errors
///
/// Same outcomes as [`load_profile`].
pub fn load_notes<S>(store: &S, viewer: Viewer, player: UserId) -> Result<Vec<Note>, ProfileError>
where
    S: ProfileStore + ?Sized,
{
    permissions_for(store, viewer)?.authorize(player, ResourceType::Notes)?;
    find_player(store, player)?;
    Ok(store.notes(player)?)
}

/// Listing row for `user`, with the year of birth taken from its snapshot.
#[must_use]
pub fn summarize(user: User, fields: &Snapshot, permissions: &PermissionSet) -> PlayerSummary {
    let relationship = if permissions.viewer().role.is_linked_viewer() {
        permissions.relationship_to(user.id)
    } else {
        None
    };
    PlayerSummary {
        id: user.id,
        name: user.name,
        role: user.role,
        year_of_birth: fields
            .get(FieldKey::YearOfBirth)
            .and_then(|field| field.current.as_integer()),
        relationship,
    }
}

fn find_player<S>(store: &S, player: UserId) -> Result<User, ProfileError>
where
    S: ProfileStore + ?Sized,
{
    store
        .user(player)?
        .filter(User::is_player)
        .ok_or(ProfileError::NotFound { player })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::model::absence::AbsenceReason;
    use crate::model::field::FieldValue;
    use crate::model::note::NoteCategory;
    use crate::model::role::{RelationshipType, Role};
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    const ADMIN: UserId = 1;
    const PLAYER: UserId = 2;
    const OTHER_PLAYER: UserId = 3;
    const MENTOR: UserId = 10;
    const PARENT: UserId = 11;

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, month, day, 15, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_user(ADMIN, "Ada Admin", Role::Admin);
        store.add_user(PLAYER, "Pat Player", Role::Player);
        store.add_user(OTHER_PLAYER, "Quinn Player", Role::Player);
        store.add_user(MENTOR, "Morgan Mentor", Role::Mentor);
        store.add_user(PARENT, "Parker Parent", Role::Parent);
        store.grant(MENTOR, PLAYER, RelationshipType::MentorToPlayer);

        store.record(PLAYER, FieldKey::Gpa, "3.2", at(10, 1));
        store.record(PLAYER, FieldKey::Gpa, "3.6", at(10, 30));
        store.record(PLAYER, FieldKey::Gpa, "3.6", at(10, 15));
        store.record(PLAYER, FieldKey::YearOfBirth, "2007", at(9, 1));
        store.record(PLAYER, FieldKey::BioAboutMe, "Loves defense", at(9, 1));
        store.add_absence(AbsenceRecord {
            player_id: PLAYER,
            absence_type: AbsenceType::Soccer,
            date: "2020-10-12".parse().expect("valid date"),
            reason: AbsenceReason::Excused,
            description: "dentist".to_string(),
        });
        store
    }

    #[test]
    fn linked_mentor_sees_resolved_profile() {
        let store = seeded();
        let profile = load_profile(&store, Viewer::new(MENTOR, Role::Mentor), PLAYER)
            .expect("mentor is linked");

        let gpa = profile.fields.get(FieldKey::Gpa).expect("gpa");
        assert_eq!(gpa.current, FieldValue::Decimal(3.6));
        assert_eq!(gpa.last_updated, at(10, 30));
        assert_eq!(
            profile.categories,
            vec![
                ProfileCategory::Overview,
                ProfileCategory::AcademicPerformance,
                ProfileCategory::Attendance,
            ]
        );
        assert_eq!(profile.player.year_of_birth, Some(2007));
        assert_eq!(profile.player.relationship, Some(RelationshipType::MentorToPlayer));
        assert_eq!(profile.absences[&AbsenceType::Soccer].len(), 1);
    }

    #[test]
    fn fields_in_follows_category_key_order() {
        let store = seeded();
        let profile =
            load_profile(&store, Viewer::new(ADMIN, Role::Admin), PLAYER).expect("admin");
        let keys: Vec<FieldKey> = profile
            .fields_in(ProfileCategory::AcademicPerformance)
            .map(|field| field.key)
            .collect();
        assert_eq!(keys, vec![FieldKey::Gpa]);
    }

    #[test]
    fn unlinked_viewer_is_forbidden_not_empty() {
        let store = seeded();
        let err = load_profile(&store, Viewer::new(PARENT, Role::Parent), PLAYER)
            .expect_err("no edge");
        assert!(err.is_forbidden());
    }

    #[test]
    fn unlinked_viewer_cannot_probe_for_ids() {
        let store = seeded();
        let err = load_profile(&store, Viewer::new(PARENT, Role::Parent), 404)
            .expect_err("no edge");
        assert!(err.is_forbidden());
    }

    #[test]
    fn admin_gets_not_found_for_unknown_player() {
        let store = seeded();
        let err = load_profile(&store, Viewer::new(ADMIN, Role::Admin), 404).expect_err("missing");
        assert!(err.is_not_found());

        let err = load_profile(&store, Viewer::new(ADMIN, Role::Admin), MENTOR)
            .expect_err("mentor is not a player");
        assert!(err.is_not_found());
    }

    #[test]
    fn player_sees_own_profile_only() {
        let store = seeded();
        let me = Viewer::new(PLAYER, Role::Player);
        let profile = load_profile(&store, me, PLAYER).expect("self");
        assert_eq!(profile.player.relationship, None);

        let err = load_profile(&store, me, OTHER_PLAYER).expect_err("other player");
        assert!(err.is_forbidden());
    }

    #[test]
    fn player_without_data_has_no_categories() {
        let store = seeded();
        let profile = load_profile(&store, Viewer::new(ADMIN, Role::Admin), OTHER_PLAYER)
            .expect("admin");
        assert!(profile.fields.is_empty());
        assert!(profile.categories.is_empty());
        assert!(profile.absences.is_empty());
        assert_eq!(profile.player.year_of_birth, None);
    }

    #[test]
    fn granting_an_edge_opens_the_profile() {
        let mut store = seeded();
        let parent = Viewer::new(PARENT, Role::Parent);
        assert!(load_profile(&store, parent, PLAYER).is_err());
        store.grant(PARENT, PLAYER, RelationshipType::ParentToPlayer);
        let profile = load_profile(&store, parent, PLAYER).expect("now linked");
        assert_eq!(profile.categories.len(), 3);
    }

    #[test]
    fn history_window_is_gated_too() {
        let store = seeded();
        let rows = load_field_history(
            &store,
            Viewer::new(MENTOR, Role::Mentor),
            PLAYER,
            FieldKey::Gpa,
            Some(at(10, 10)),
            None,
        )
        .expect("linked");
        let values: Vec<&str> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["3.6", "3.6"]);

        let err = load_field_history(
            &store,
            Viewer::new(PARENT, Role::Parent),
            PLAYER,
            FieldKey::Gpa,
            None,
            None,
        )
        .expect_err("not linked");
        assert!(err.is_forbidden());
    }

    #[test]
    fn notes_follow_the_same_rule() {
        let mut store = seeded();
        store.add_note(PLAYER, MENTOR, NoteCategory::Mentorship, "weekly check-in", at(11, 2));
        let notes = load_notes(&store, Viewer::new(MENTOR, Role::Mentor), PLAYER).expect("linked");
        assert_eq!(notes.len(), 1);
        assert!(
            load_notes(&store, Viewer::new(PARENT, Role::Parent), PLAYER)
                .expect_err("not linked")
                .is_forbidden()
        );
    }

    struct BrokenStore;

    impl ProfileStore for BrokenStore {
        fn user(&self, _id: UserId) -> Result<Option<User>, FetchError> {
            Err(FetchError::new("user", "connection reset"))
        }
        fn field_history(&self, _player: UserId) -> Result<Vec<FieldEntry>, FetchError> {
            Err(FetchError::new("field history", "connection reset"))
        }
        fn field_history_window(
            &self,
            _player: UserId,
            _key: FieldKey,
            _since: Option<DateTime<Utc>>,
            _until: Option<DateTime<Utc>>,
        ) -> Result<Vec<FieldEntry>, FetchError> {
            Err(FetchError::new("field history", "connection reset"))
        }
        fn viewing_permissions(
            &self,
            _viewer: UserId,
        ) -> Result<Vec<crate::model::role::ViewingPermission>, FetchError> {
            Ok(Vec::new())
        }
        fn absences(&self, _player: UserId) -> Result<Vec<AbsenceRecord>, FetchError> {
            Err(FetchError::new("absences", "connection reset"))
        }
        fn notes(&self, _player: UserId) -> Result<Vec<Note>, FetchError> {
            Err(FetchError::new("notes", "connection reset"))
        }
    }

    #[test]
    fn fetch_failures_are_their_own_outcome() {
        let err = load_profile(&BrokenStore, Viewer::new(ADMIN, Role::Admin), PLAYER)
            .expect_err("store down");
        assert!(matches!(err, ProfileError::Fetch(_)));
        assert!(!err.is_forbidden());
        assert!(!err.is_not_found());
    }
}
