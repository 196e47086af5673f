//! Turns a classified query outcome into flat display rows.
//!
//! Every row gets `_id` first, remaining keys sorted. Timestamp-like values
//! become fixed-format strings and a boolean `roles` map collapses to the
//! sorted list of granted role names. Applying the normalizer twice is a no-op.

use crate::core::store::document::{FieldMap, FieldValue};
use crate::core::util::timestamp_util::TimestampUtil;
use crate::domain::query::model::query_result::{QueryOutcome, Row, ROW_ID_FIELD};

const ROLES_FIELD: &str = "roles";

/// `{admin: true, mentor: false, editor: true}` -> `"admin, editor"`.
/// `None` unless the value is a map whose entries are all booleans.
pub fn format_roles(value: &FieldValue) -> Option<String> {
    let FieldValue::Map(map) = value else {
        return None;
    };
    if !map.values().all(|v| matches!(v, FieldValue::Bool(_))) {
        return None;
    }
    let mut granted: Vec<&str> = map
        .iter()
        .filter(|(_, v)| matches!(v, FieldValue::Bool(true)))
        .map(|(k, _)| k.as_str())
        .collect();
    granted.sort_unstable();
    Some(granted.join(", "))
}

fn normalize_value(key: &str, value: FieldValue) -> FieldValue {
    if TimestampUtil::is_timestamp_like(&value) {
        return FieldValue::String(TimestampUtil::format_value(&value));
    }
    if key == ROLES_FIELD {
        if let Some(roles) = format_roles(&value) {
            return FieldValue::String(roles);
        }
    }
    value
}

/// Normalizes one row: `_id` first, other keys in ascending order.
pub fn normalize_row(row: Row) -> Row {
    let mut id = None;
    let mut rest: Vec<(String, FieldValue)> = Vec::with_capacity(row.len());
    for (key, value) in row {
        if key == ROW_ID_FIELD {
            id = Some(value);
        } else {
            rest.push((key, value));
        }
    }
    rest.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut normalized = FieldMap::with_capacity(rest.len() + 1);
    if let Some(id) = id {
        normalized.insert(ROW_ID_FIELD.to_string(), normalize_value(ROW_ID_FIELD, id));
    }
    for (key, value) in rest {
        let value = normalize_value(&key, value);
        normalized.insert(key, value);
    }
    normalized
}

fn row_with_id(id: FieldValue, fields: FieldMap) -> Row {
    let mut row = Row::with_capacity(fields.len() + 1);
    row.insert(ROW_ID_FIELD.to_string(), id);
    // A field named `_id` in the data overrides the synthetic one.
    row.extend(fields);
    row
}

/// Flattens an outcome into rows without normalizing values.
pub fn outcome_rows(outcome: QueryOutcome) -> Vec<Row> {
    match outcome {
        QueryOutcome::DocumentList { documents, .. } => documents
            .into_iter()
            .map(|doc| row_with_id(FieldValue::String(doc.id), doc.fields))
            .collect(),
        QueryOutcome::SingleDocument { document, .. } => {
            vec![row_with_id(FieldValue::String(document.id), document.fields)]
        }
        QueryOutcome::RawArray(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let id = FieldValue::String(format!("item_{idx}"));
                match item {
                    FieldValue::Map(map) => row_with_id(id, map),
                    other => {
                        let mut fields = FieldMap::new();
                        fields.insert("value".to_string(), other);
                        row_with_id(id, fields)
                    }
                }
            })
            .collect(),
        QueryOutcome::RawObject(map) => vec![row_with_id(FieldValue::String("result".into()), map)],
        QueryOutcome::Empty => Vec::new(),
    }
}

/// Flattens and normalizes an outcome.
pub fn normalize_outcome(outcome: QueryOutcome) -> Vec<Row> {
    outcome_rows(outcome).into_iter().map(normalize_row).collect()
}
