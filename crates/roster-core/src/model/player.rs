use serde::{Deserialize, Serialize};

use super::UserId;
use super::role::{RelationshipType, Role};

/// A registered user. Players are users with [`Role::Player`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl User {
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.role, Role::Player)
    }
}

/// One row of a player listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    /// Current `YearOfBirth` value, when one parses.
    pub year_of_birth: Option<i64>,
    /// Set when the viewer holds a viewing permission to this player and
    /// views through a linked role (mentor, parent, donor).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipType>,
}
