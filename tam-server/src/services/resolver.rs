//! Request identifier resolution
//!
//! A request names tonies and tracks through `tonie_id` / `track_id`. Each
//! field may be absent, a single identifier, an `{"id": ..}` object, or a
//! list of those. Resolution turns the field into concrete handles in input
//! order, or reports that nothing (or not everything) matched.

use serde_json::Value;
use tam_common::models::{Audiobook, Tonie, Track};

use super::ReconcileError;

/// Identifier kinds a request can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// A creative tonie, looked up in the account's tonie catalog
    TargetId,
    /// A chapter, looked up in a freshly fetched track list
    TrackId,
    /// An audiobook, looked up in the local library listing
    AudiobookId,
}

impl IdentifierKind {
    /// Request payload key carrying this kind
    pub fn key(self) -> &'static str {
        match self {
            IdentifierKind::TargetId => "tonie_id",
            IdentifierKind::TrackId => "track_id",
            IdentifierKind::AudiobookId => "audiobook_id",
        }
    }
}

/// Normalized identifier field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawIds {
    /// Key missing or `null`
    Absent,
    /// Identifiers in request order, duplicates kept
    Ids(Vec<String>),
}

impl RawIds {
    pub fn single(id: impl Into<String>) -> Self {
        RawIds::Ids(vec![id.into()])
    }
}

/// Outcome of resolving an identifier field
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// Field absent and no default supplied
    NotProvided,
    /// Empty list, or at least one identifier did not match
    NotFound,
    /// One handle per identifier, in input order
    Resolved(Vec<T>),
}

impl<T> Resolution<T> {
    pub fn len(&self) -> usize {
        match self {
            Resolution::Resolved(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handles that can be looked up by a remote identifier
pub trait Identified {
    fn identifier(&self) -> &str;
}

impl Identified for Tonie {
    fn identifier(&self) -> &str {
        &self.id
    }
}

impl Identified for Track {
    fn identifier(&self) -> &str {
        &self.id
    }
}

impl Identified for Audiobook {
    fn identifier(&self) -> &str {
        &self.id
    }
}

/// Read the field for `kind` out of a request payload
pub fn extract_ids(payload: &Value, kind: IdentifierKind) -> Result<RawIds, ReconcileError> {
    let key = kind.key();
    let invalid = || {
        ReconcileError::InvalidRequest(format!(
            "{} must be an identifier or a list of identifiers",
            key
        ))
    };

    let value = match payload.get(key) {
        None | Some(Value::Null) => return Ok(RawIds::Absent),
        Some(value) => value,
    };

    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| scalar_id(item).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()
            .map(RawIds::Ids),
        other => scalar_id(other).map(RawIds::single).ok_or_else(invalid),
    }
}

/// String, number, or `{"id": <string|number>}`
fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => match map.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// Look every identifier up in `candidates`
///
/// An absent field falls back to `default`. Any unknown identifier turns the
/// whole result into `NotFound`; duplicates produce duplicate handles.
pub fn resolve<T>(raw: &RawIds, default: Option<&[String]>, candidates: &[T]) -> Resolution<T>
where
    T: Identified + Clone,
{
    let ids: &[String] = match raw {
        RawIds::Ids(ids) => ids,
        RawIds::Absent => match default {
            Some(ids) => ids,
            None => return Resolution::NotProvided,
        },
    };

    if ids.is_empty() {
        return Resolution::NotFound;
    }

    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        match candidates.iter().find(|c| c.identifier() == id) {
            Some(handle) => resolved.push(handle.clone()),
            None => {
                tracing::debug!(id = %id, "Identifier did not resolve");
                return Resolution::NotFound;
            }
        }
    }
    Resolution::Resolved(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tonie(id: &str) -> Tonie {
        Tonie {
            id: id.to_string(),
            name: format!("Tonie {}", id),
            household_id: "hh".to_string(),
            image_url: None,
        }
    }

    fn catalog() -> Vec<Tonie> {
        vec![tonie("tonie_1"), tonie("tonie_2")]
    }

    #[test]
    fn test_scalar_equals_single_element_list() {
        let scalar = extract_ids(&json!({"tonie_id": "tonie_1"}), IdentifierKind::TargetId).unwrap();
        let list = extract_ids(&json!({"tonie_id": ["tonie_1"]}), IdentifierKind::TargetId).unwrap();
        assert_eq!(scalar, list);

        let catalog = catalog();
        let a = resolve(&scalar, None, &catalog);
        let b = resolve(&list, None, &catalog);
        assert_eq!(a, b);
        assert_eq!(a, Resolution::Resolved(vec![tonie("tonie_1")]));
    }

    #[test]
    fn test_object_ids_are_accepted() {
        let raw = extract_ids(
            &json!({"track_id": [{"id": "track_1"}, "track_2", 7]}),
            IdentifierKind::TrackId,
        )
        .unwrap();
        assert_eq!(
            raw,
            RawIds::Ids(vec!["track_1".to_string(), "track_2".to_string(), "7".to_string()])
        );
    }

    #[test]
    fn test_absent_and_null_fields() {
        assert_eq!(extract_ids(&json!({}), IdentifierKind::TargetId).unwrap(), RawIds::Absent);
        assert_eq!(
            extract_ids(&json!({"tonie_id": null}), IdentifierKind::TargetId).unwrap(),
            RawIds::Absent
        );
    }

    #[test]
    fn test_malformed_field_is_invalid_request() {
        for payload in [
            json!({"tonie_id": true}),
            json!({"tonie_id": [["nested"]]}),
            json!({"tonie_id": {"name": "no id"}}),
        ] {
            match extract_ids(&payload, IdentifierKind::TargetId) {
                Err(ReconcileError::InvalidRequest(msg)) => assert!(msg.starts_with("tonie_id")),
                other => panic!("expected invalid request for {}, got {:?}", payload, other),
            }
        }
    }

    #[test]
    fn test_absent_uses_default() {
        let catalog = catalog();
        let default = vec!["tonie_2".to_string()];
        assert_eq!(
            resolve(&RawIds::Absent, Some(default.as_slice()), &catalog),
            Resolution::Resolved(vec![tonie("tonie_2")])
        );
        assert_eq!(resolve(&RawIds::Absent, None, &catalog), Resolution::NotProvided);
    }

    #[test]
    fn test_unknown_anywhere_is_not_found() {
        let catalog = catalog();
        let raw = RawIds::Ids(vec!["tonie_1".to_string(), "invalid_tonie".to_string()]);
        assert_eq!(resolve(&raw, None, &catalog), Resolution::NotFound);
    }

    #[test]
    fn test_empty_list_is_not_found() {
        let catalog = catalog();
        assert_eq!(resolve(&RawIds::Ids(vec![]), None, &catalog), Resolution::NotFound);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let catalog = catalog();
        let raw = RawIds::Ids(vec!["tonie_1".to_string(), "tonie_1".to_string()]);
        let resolution = resolve(&raw, None, &catalog);
        assert_eq!(resolution.len(), 2);
        assert_eq!(
            resolution,
            Resolution::Resolved(vec![tonie("tonie_1"), tonie("tonie_1")])
        );
    }

    #[test]
    fn test_order_follows_input() {
        let catalog = catalog();
        let raw = RawIds::Ids(vec!["tonie_2".to_string(), "tonie_1".to_string()]);
        assert_eq!(
            resolve(&raw, None, &catalog),
            Resolution::Resolved(vec![tonie("tonie_2"), tonie("tonie_1")])
        );
    }
}
