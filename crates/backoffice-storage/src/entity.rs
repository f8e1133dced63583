//! The [`Entity`] trait and payload helpers.
//!
//! Records travel between the HTTP surface and the store as JSON objects
//! ([`Patch`]). [`hydrate`] turns a creation payload into a typed record and
//! [`merge_into`] overlays an update payload on an existing one. Both stamp
//! the bookkeeping fields themselves, so clients never control them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

use backoffice_core::RecordId;

use crate::{Error, Result};

/// A partial record: field name to JSON value.
pub type Patch = Map<String, Value>;

/// Field holding the record identifier.
pub const ID_FIELD: &str = "id";
/// Field holding the creation timestamp.
pub const CREATED_AT_FIELD: &str = "created_at";
/// Field holding the last-modification timestamp.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Fields owned by the store; never taken from a client payload.
pub const PROTECTED_FIELDS: &[&str] = &[ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// A record type that can live in a [`Repository`](crate::Repository).
///
/// Implementors serialize to a JSON object carrying at least `id`,
/// `created_at` and `updated_at`.
pub trait Entity:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Entity type name used in audit records and error messages.
    const KIND: &'static str;

    /// Fields whose values must be unique across all records of this kind.
    const UNIQUE: &'static [&'static str] = &[];

    /// The record identifier.
    fn id(&self) -> RecordId;

    /// When the record was first persisted.
    fn created_at(&self) -> DateTime<Utc>;

    /// Recompute derived fields after the record was built or merged.
    fn normalize(&mut self) {}
}

/// Drop every store-owned field from a client payload.
pub fn strip_protected(patch: &mut Patch) {
    for field in PROTECTED_FIELDS {
        patch.remove(*field);
    }
}

/// Build a new, not yet persisted record of kind `T` from `partial`.
///
/// A fresh identifier and both timestamps are assigned, replacing whatever
/// the payload carried.
pub fn hydrate<T: Entity>(mut partial: Patch) -> Result<T> {
    let now = timestamp(T::KIND)?;
    partial.insert(ID_FIELD.to_string(), Value::String(RecordId::new().to_string()));
    partial.insert(CREATED_AT_FIELD.to_string(), now.clone());
    partial.insert(UPDATED_AT_FIELD.to_string(), now);

    let mut record: T = serde_json::from_value(Value::Object(partial))
        .map_err(|e| Error::invalid_record(T::KIND, e.to_string()))?;
    record.normalize();
    Ok(record)
}

/// Overlay `partial` on `existing`, returning the merged record.
///
/// Fields present in the payload replace the stored value wholesale (a
/// list field is replaced, not extended). Protected fields in the payload
/// are ignored and `updated_at` is refreshed.
pub fn merge_into<T: Entity>(existing: &T, mut partial: Patch) -> Result<T> {
    strip_protected(&mut partial);

    let mut fields = match to_record_value(existing)? {
        Value::Object(fields) => fields,
        _ => {
            return Err(Error::invalid_record(
                T::KIND,
                "record does not serialize to an object",
            ));
        }
    };
    fields.extend(partial);
    fields.insert(UPDATED_AT_FIELD.to_string(), timestamp(T::KIND)?);

    let mut record: T = serde_json::from_value(Value::Object(fields))
        .map_err(|e| Error::invalid_record(T::KIND, e.to_string()))?;
    record.normalize();
    Ok(record)
}

/// Serialize a record to its JSON form.
pub fn to_record_value<T: Entity>(record: &T) -> Result<Value> {
    serde_json::to_value(record).map_err(|e| Error::invalid_record(T::KIND, e.to_string()))
}

fn timestamp(kind: &'static str) -> Result<Value> {
    serde_json::to_value(Utc::now()).map_err(|e| Error::invalid_record(kind, e.to_string()))
}
