//! Identifier types for principals and governed records.
//!
//! Both identifiers are UUIDs, but they are kept as distinct types so a
//! record identifier is never compared against a caller's identity by
//! accident. The one legitimate crossing, a principal's own account
//! record, goes through the explicit `From<PrincipalId> for RecordId`
//! conversion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Identifier of an authenticated principal (a user account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    /// Creates a new random principal ID.
    ///
    /// # Examples
    ///
    /// ```
    /// use backoffice_core::PrincipalId;
    ///
    /// let a = PrincipalId::new();
    /// let b = PrincipalId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a principal ID from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PrincipalId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self).map_err(|_| Error::InvalidId {
            kind: "principal",
            value: s.to_string(),
        })
    }
}

/// Identifier of a governed record (calculation, role, permission, account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record ID from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self).map_err(|_| Error::InvalidId {
            kind: "record",
            value: s.to_string(),
        })
    }
}

/// A principal's account record is identified by the principal's own ID.
impl From<PrincipalId> for RecordId {
    fn from(id: PrincipalId) -> Self {
        Self(id.0)
    }
}

/// The account record of a principal carries the principal's ID.
impl From<RecordId> for PrincipalId {
    fn from(id: RecordId) -> Self {
        Self(id.0)
    }
}
