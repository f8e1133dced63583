//! Filter and ordering expressions understood by every repository.

use serde_json::Value;

use backoffice_core::{PrincipalId, RecordId};

use crate::entity::ID_FIELD;

/// A filter over records, evaluated against their JSON form.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record.
    All,
    /// `field == value`.
    Eq {
        /// Field name.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// `field` is one of `values`.
    In {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// `field` is a list containing `value`.
    Contains {
        /// Field name of a list.
        field: String,
        /// Element that must be present.
        value: Value,
    },
    /// Every inner predicate matches.
    And(Vec<Predicate>),
}

impl Predicate {
    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// The record whose identifier is `id`.
    pub fn id(id: RecordId) -> Self {
        Self::eq(ID_FIELD, id.to_string())
    }

    /// Records whose identifier is one of `ids`.
    pub fn id_in(ids: impl IntoIterator<Item = RecordId>) -> Self {
        Self::In {
            field: ID_FIELD.to_string(),
            values: ids
                .into_iter()
                .map(|id| Value::String(id.to_string()))
                .collect(),
        }
    }

    /// Records whose ownership relation `field` references `principal`.
    pub fn owned_by(field: impl Into<String>, principal: PrincipalId) -> Self {
        Self::eq(field, principal.to_string())
    }

    /// Records whose list field `field` contains `id`.
    pub fn contains_id(field: impl Into<String>, id: RecordId) -> Self {
        Self::Contains {
            field: field.into(),
            value: Value::String(id.to_string()),
        }
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s and
    /// dropping `All`.
    pub fn and(self, other: Predicate) -> Self {
        let mut parts = Vec::new();
        for p in [self, other] {
            match p {
                Predicate::All => {}
                Predicate::And(inner) => parts.extend(inner),
                p => parts.push(p),
            }
        }
        match parts.len() {
            0 => Predicate::All,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    /// Evaluate against a record's JSON form.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Eq { field, value } => record.get(field) == Some(value),
            Predicate::In { field, values } => record
                .get(field)
                .is_some_and(|actual| values.contains(actual)),
            Predicate::Contains { field, value } => record
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            Predicate::And(parts) => parts.iter().all(|p| p.matches(record)),
        }
    }
}

/// Result ordering by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Most recently created first.
    #[default]
    NewestFirst,
    /// Oldest first.
    OldestFirst,
}
