//! Principal and role records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backoffice_core::{PrincipalId, RecordId};
use backoffice_storage::Entity;

/// Field on [`User`] listing assigned roles.
pub const ROLE_IDS_FIELD: &str = "role_ids";
/// Field on [`Role`] listing granted permissions.
pub const PERMISSION_IDS_FIELD: &str = "permission_ids";

/// A back-office account. Every user is a principal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Record identifier; doubles as the principal identifier.
    pub id: RecordId,
    /// Login email, unique.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Optional avatar location.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Argon2 PHC string.
    #[serde(default)]
    pub password_hash: String,
    /// Assigned roles.
    #[serde(default)]
    pub role_ids: Vec<RecordId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The principal this account authenticates as.
    pub fn principal_id(&self) -> PrincipalId {
        self.id.into()
    }
}

impl Entity for User {
    const KIND: &'static str = "User";
    const UNIQUE: &'static [&'static str] = &["email"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
        dedup_preserving_order(&mut self.role_ids);
    }
}

/// A named bundle of permissions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    /// Record identifier.
    pub id: RecordId,
    /// Role name, unique.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Granted permissions.
    #[serde(default)]
    pub permission_ids: Vec<RecordId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Entity for Role {
    const KIND: &'static str = "Role";
    const UNIQUE: &'static [&'static str] = &["name"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn normalize(&mut self) {
        dedup_preserving_order(&mut self.permission_ids);
    }
}

fn dedup_preserving_order(ids: &mut Vec<RecordId>) {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.retain(|id| seen.insert(*id));
}
