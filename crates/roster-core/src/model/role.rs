use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, UserId};

/// Role a signed-in user acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Player,
    Mentor,
    Parent,
    Donor,
}

impl Role {
    pub const ALL: [Self; 5] = [
        Self::Admin,
        Self::Player,
        Self::Mentor,
        Self::Parent,
        Self::Donor,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Player => "Player",
            Self::Mentor => "Mentor",
            Self::Parent => "Parent",
            Self::Donor => "Donor",
        }
    }

    /// Roles that reach players through explicit viewing permissions and get
    /// the "your player" marker in listings.
    #[must_use]
    pub const fn is_linked_viewer(self) -> bool {
        matches!(self, Self::Mentor | Self::Parent | Self::Donor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                expected: "role",
                got: s.to_string(),
            })
    }
}

/// Kind of edge between a viewer and a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    #[serde(rename = "Player to Player")]
    PlayerToPlayer,
    #[serde(rename = "Mentor to Player")]
    MentorToPlayer,
    #[serde(rename = "Parent to Player")]
    ParentToPlayer,
    #[serde(rename = "Donor to Player")]
    DonorToPlayer,
}

impl RelationshipType {
    pub const ALL: [Self; 4] = [
        Self::PlayerToPlayer,
        Self::MentorToPlayer,
        Self::ParentToPlayer,
        Self::DonorToPlayer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerToPlayer => "Player to Player",
            Self::MentorToPlayer => "Mentor to Player",
            Self::ParentToPlayer => "Parent to Player",
            Self::DonorToPlayer => "Donor to Player",
        }
    }

    /// The relationship a user of `role` normally holds to a player.
    #[must_use]
    pub const fn for_role(role: Role) -> Option<Self> {
        match role {
            Role::Admin => None,
            Role::Player => Some(Self::PlayerToPlayer),
            Role::Mentor => Some(Self::MentorToPlayer),
            Role::Parent => Some(Self::ParentToPlayer),
            Role::Donor => Some(Self::DonorToPlayer),
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = ParseEnumError;

    /// Accepts the persisted token ("Mentor to Player") or the short role
    /// name ("mentor").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(found) = Self::ALL
            .into_iter()
            .find(|rel| rel.as_str().eq_ignore_ascii_case(trimmed))
        {
            return Ok(found);
        }

        trimmed
            .parse::<Role>()
            .ok()
            .and_then(Self::for_role)
            .ok_or_else(|| ParseEnumError {
                expected: "relationship type",
                got: s.to_string(),
            })
    }
}

/// Authorization edge from a viewer to one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewingPermission {
    pub viewer_id: UserId,
    pub related_player_id: UserId,
    pub relationship: RelationshipType,
}

/// The user on whose behalf a read happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewer {
    pub id: UserId,
    pub role: Role,
}

impl Viewer {
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}
