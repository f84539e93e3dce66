use crate::core::money::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Member,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Owner => "OWNER",
            Role::Member => "MEMBER",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TripMember {
    pub user_id: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

/// A bounded group of participants; every ledger computation is scoped to one.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Trip {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub members: Vec<TripMember>,
    pub default_currency: Currency,
    /// Bumped by every balance-affecting mutation.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

impl TripMember {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

impl Trip {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id && m.is_owner())
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.user_id.clone()).collect()
    }
}
