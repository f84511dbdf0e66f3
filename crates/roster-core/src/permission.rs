//! Viewer permission model.
//!
//! Authorization is binary per player: a viewer either reaches a player or
//! does not, and reaching a player opens every resource type on it.
//!
//! - Admins reach every player.
//! - Every viewer reaches their own profile.
//! - Anyone else needs at least one [`ViewingPermission`] edge to the player.
//!   The relationship type on the edge does not narrow anything; it only
//!   labels the player as "linked" in listings.
//!
//! [`PermissionSet::is_authorized`] still takes a [`ResourceType`] so callers
//! ask the question they mean, and [`PermissionSet::authorized_categories`]
//! is where per-category capabilities would attach if sharing ever becomes
//! finer grained.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::error::ProfileError;
use crate::model::UserId;
use crate::model::category::ProfileCategory;
use crate::model::role::{RelationshipType, Viewer, ViewingPermission};
use crate::visibility::CategorySet;

/// What a read is after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    ProfileFields,
    Absences,
    Notes,
}

impl ResourceType {
    pub const ALL: [Self; 3] = [Self::ProfileFields, Self::Absences, Self::Notes];

    /// Resource backing a profile tab.
    #[must_use]
    pub const fn for_category(category: ProfileCategory) -> Self {
        if category.uses_absences() {
            Self::Absences
        } else {
            Self::ProfileFields
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ProfileFields => "profile fields",
            Self::Absences => "absences",
            Self::Notes => "notes",
        })
    }
}

/// A viewer together with the viewing permissions they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet {
    viewer: Viewer,
    linked: BTreeMap<UserId, RelationshipType>,
}

impl PermissionSet {
    /// Build from the viewer's permission rows.
    ///
    /// Edges issued to other viewers are ignored. When several edges point at
    /// the same player the lowest relationship token in enumeration order is
    /// kept as its label.
    pub fn new(viewer: Viewer, edges: impl IntoIterator<Item = ViewingPermission>) -> Self {
        let mut linked = BTreeMap::new();
        for edge in edges {
            if edge.viewer_id != viewer.id {
                continue;
            }
            linked
                .entry(edge.related_player_id)
                .and_modify(|existing: &mut RelationshipType| {
                    *existing = (*existing).min(edge.relationship);
                })
                .or_insert(edge.relationship);
        }
        Self { viewer, linked }
    }

    #[must_use]
    pub const fn viewer(&self) -> Viewer {
        self.viewer
    }

    /// Whether the viewer can reach `player` at all.
    #[must_use]
    pub fn reaches(&self, player: UserId) -> bool {
        self.viewer.is_admin() || self.viewer.id == player || self.linked.contains_key(&player)
    }

    #[must_use]
    pub fn is_authorized(&self, player: UserId, resource: ResourceType) -> bool {
        match resource {
            ResourceType::ProfileFields | ResourceType::Absences | ResourceType::Notes => {
                self.reaches(player)
            }
        }
    }

    /// Like [`Self::is_authorized`], with the denial as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Forbidden`] when the viewer may not read
    /// `resource` of `player`.
    pub fn authorize(&self, player: UserId, resource: ResourceType) -> Result<(), ProfileError> {
        if self.is_authorized(player, resource) {
            return Ok(());
        }
        debug!(viewer = self.viewer.id, player, %resource, "viewer denied");
        Err(ProfileError::Forbidden {
            viewer: self.viewer.id,
            player,
            resource,
        })
    }

    /// Relationship label of a linked player, if the viewer holds an edge.
    #[must_use]
    pub fn relationship_to(&self, player: UserId) -> Option<RelationshipType> {
        self.linked.get(&player).copied()
    }

    /// Players the viewer holds an edge to, ascending.
    pub fn linked_players(&self) -> impl Iterator<Item = UserId> + '_ {
        self.linked.keys().copied()
    }

    /// Keep the items whose player the viewer may read `resource` of.
    ///
    /// Used by listings, where unauthorized rows are dropped instead of
    /// failing the whole request.
    pub fn retain_authorized<T>(
        &self,
        items: Vec<T>,
        resource: ResourceType,
        player_of: impl Fn(&T) -> UserId,
    ) -> Vec<T> {
        items
            .into_iter()
            .filter(|item| self.is_authorized(player_of(item), resource))
            .collect()
    }

    /// Profile categories the viewer may open for `player`.
    #[must_use]
    pub fn authorized_categories(&self, player: UserId) -> CategorySet {
        ProfileCategory::ALL
            .into_iter()
            .filter(|category| self.is_authorized(player, ResourceType::for_category(*category)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn edge(viewer_id: UserId, player: UserId, relationship: RelationshipType) -> ViewingPermission {
        ViewingPermission {
            viewer_id,
            related_player_id: player,
            relationship,
        }
    }

    #[test]
    fn admin_needs_no_edges() {
        let set = PermissionSet::new(Viewer::new(1, Role::Admin), []);
        for player in [2, 3, 999] {
            for resource in ResourceType::ALL {
                assert!(set.is_authorized(player, resource));
            }
        }
        assert_eq!(set.relationship_to(2), None);
    }

    #[test]
    fn player_reaches_only_self() {
        let set = PermissionSet::new(Viewer::new(5, Role::Player), []);
        assert!(set.is_authorized(5, ResourceType::ProfileFields));
        assert!(set.is_authorized(5, ResourceType::Notes));
        assert!(!set.is_authorized(6, ResourceType::ProfileFields));
    }

    #[test]
    fn one_edge_opens_every_resource() {
        let mentor = Viewer::new(10, Role::Mentor);
        let without = PermissionSet::new(mentor, []);
        for resource in ResourceType::ALL {
            assert!(!without.is_authorized(3, resource));
        }

        let with = PermissionSet::new(mentor, [edge(10, 3, RelationshipType::DonorToPlayer)]);
        for resource in ResourceType::ALL {
            assert!(with.is_authorized(3, resource));
        }
        assert_eq!(with.relationship_to(3), Some(RelationshipType::DonorToPlayer));
    }

    #[test]
    fn edges_of_other_viewers_are_ignored() {
        let set = PermissionSet::new(
            Viewer::new(10, Role::Parent),
            [edge(11, 3, RelationshipType::ParentToPlayer)],
        );
        assert!(!set.reaches(3));
        assert_eq!(set.linked_players().count(), 0);
    }

    #[test]
    fn duplicate_edges_keep_one_label() {
        let set = PermissionSet::new(
            Viewer::new(10, Role::Parent),
            [
                edge(10, 3, RelationshipType::DonorToPlayer),
                edge(10, 3, RelationshipType::ParentToPlayer),
            ],
        );
        assert_eq!(set.relationship_to(3), Some(RelationshipType::ParentToPlayer));
        assert_eq!(set.linked_players().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn authorize_reports_forbidden() {
        let set = PermissionSet::new(Viewer::new(10, Role::Donor), []);
        let err = set
            .authorize(3, ResourceType::Absences)
            .expect_err("no edge");
        assert!(err.is_forbidden());
        assert!(set.authorize(10, ResourceType::Absences).is_ok());
    }

    #[test]
    fn retain_authorized_filters_listing() {
        let set = PermissionSet::new(
            Viewer::new(10, Role::Mentor),
            [edge(10, 2, RelationshipType::MentorToPlayer)],
        );
        let rows = vec![(1, "a"), (2, "b"), (10, "self"), (4, "d")];
        let kept = set.retain_authorized(rows, ResourceType::ProfileFields, |row| row.0);
        assert_eq!(kept, vec![(2, "b"), (10, "self")]);
    }

    #[test]
    fn authorized_categories_is_all_or_nothing() {
        let set = PermissionSet::new(
            Viewer::new(10, Role::Mentor),
            [edge(10, 2, RelationshipType::MentorToPlayer)],
        );
        assert_eq!(set.authorized_categories(2).len(), ProfileCategory::ALL.len());
        assert!(set.authorized_categories(7).is_empty());
    }

    #[test]
    fn attendance_is_backed_by_absences() {
        assert_eq!(
            ResourceType::for_category(ProfileCategory::Attendance),
            ResourceType::Absences
        );
        assert_eq!(
            ResourceType::for_category(ProfileCategory::Highlights),
            ResourceType::ProfileFields
        );
    }
}
