use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

use crate::core::store::constraint::{Constraint, FieldPath};
use crate::core::store::document::{Document, FieldMap, FieldValue, StoreTimestamp};
use crate::core::store::reference::{CollectionRef, DocumentRef};
use crate::domain::query::script::script_error::ScriptError;

/// Collection or query target plus the constraints accumulated so far.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryValue {
    pub collection: CollectionRef,
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot {
    pub collection: CollectionRef,
    pub docs: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub reference: DocumentRef,
    pub document: Option<Document>,
}

/// Runtime value of the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Timestamp(StoreTimestamp),
    Array(Vec<ScriptValue>),
    Object(IndexMap<String, ScriptValue>),
    /// The `db` handle.
    Database,
    Collection(CollectionRef),
    DocumentRef(DocumentRef),
    Query(QueryValue),
    Constraint(Constraint),
    FieldPath(FieldPath),
    QuerySnapshot(QuerySnapshot),
    DocumentSnapshot(DocumentSnapshot),
}

impl ScriptValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Date(_) => "Date",
            ScriptValue::Timestamp(_) => "Timestamp",
            ScriptValue::Array(_) => "Array",
            ScriptValue::Object(_) => "Object",
            ScriptValue::Database => "Firestore",
            ScriptValue::Collection(_) => "CollectionReference",
            ScriptValue::DocumentRef(_) => "DocumentReference",
            ScriptValue::Query(_) => "Query",
            ScriptValue::Constraint(_) => "QueryConstraint",
            ScriptValue::FieldPath(_) => "FieldPath",
            ScriptValue::QuerySnapshot(_) => "QuerySnapshot",
            ScriptValue::DocumentSnapshot(_) => "DocumentSnapshot",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, ScriptValue::Undefined | ScriptValue::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Undefined | ScriptValue::Null => false,
            ScriptValue::Bool(b) => *b,
            ScriptValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ScriptValue::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn document_snapshot(reference: DocumentRef, document: Option<Document>) -> Self {
        ScriptValue::DocumentSnapshot(DocumentSnapshot { reference, document })
    }

    /// Converts a store value; integers and doubles both become numbers.
    pub fn from_field(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => ScriptValue::Null,
            FieldValue::Bool(b) => ScriptValue::Bool(*b),
            FieldValue::Integer(i) => ScriptValue::Number(*i as f64),
            FieldValue::Double(d) => ScriptValue::Number(*d),
            FieldValue::String(s) => ScriptValue::String(s.clone()),
            FieldValue::Timestamp(ts) => ScriptValue::Timestamp(*ts),
            FieldValue::Date(d) => ScriptValue::Date(*d),
            FieldValue::Array(items) => ScriptValue::Array(items.iter().map(Self::from_field).collect()),
            FieldValue::Map(map) => ScriptValue::from_fields(map),
        }
    }

    pub fn from_fields(map: &FieldMap) -> Self {
        ScriptValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Self::from_field(v)))
                .collect(),
        )
    }

    /// Converts to a storable value. Whole numbers become integers.
    /// Handles and snapshots cannot be stored and are rejected.
    pub fn to_field(&self) -> Result<FieldValue, ScriptError> {
        Ok(match self {
            ScriptValue::Undefined | ScriptValue::Null => FieldValue::Null,
            ScriptValue::Bool(b) => FieldValue::Bool(*b),
            ScriptValue::Number(n) => number_to_field(*n),
            ScriptValue::String(s) => FieldValue::String(s.clone()),
            ScriptValue::Date(d) => FieldValue::Date(*d),
            ScriptValue::Timestamp(ts) => FieldValue::Timestamp(*ts),
            ScriptValue::Array(items) => FieldValue::Array(
                items.iter().map(Self::to_field).collect::<Result<Vec<_>, _>>()?,
            ),
            ScriptValue::Object(map) => FieldValue::Map(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_field()?)))
                    .collect::<Result<FieldMap, ScriptError>>()?,
            ),
            ScriptValue::Collection(c) => FieldValue::String(c.path()),
            ScriptValue::DocumentRef(d) => FieldValue::String(d.path()),
            other => {
                return Err(ScriptError::Type(format!(
                    "{} cannot be used as a field value",
                    other.type_name()
                )))
            }
        })
    }

    /// Plain JSON view used for console output.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value};
        match self {
            ScriptValue::Undefined | ScriptValue::Null => Value::Null,
            ScriptValue::Bool(b) => Value::Bool(*b),
            ScriptValue::Number(n) => number_to_field(*n).to_json(),
            ScriptValue::String(s) => Value::String(s.clone()),
            ScriptValue::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ScriptValue::Timestamp(ts) => json!({ "seconds": ts.seconds, "nanoseconds": ts.nanoseconds }),
            ScriptValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            ScriptValue::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            ScriptValue::Database => json!({ "type": "firestore" }),
            ScriptValue::Collection(c) => json!({ "type": "collection", "path": c.path() }),
            ScriptValue::DocumentRef(d) => json!({ "type": "document", "path": d.path() }),
            ScriptValue::Query(q) => json!({
                "type": "query",
                "path": q.collection.path(),
                "constraints": q.constraints.iter().map(Constraint::kind).collect::<Vec<_>>(),
            }),
            ScriptValue::Constraint(c) => json!({ "type": c.kind() }),
            ScriptValue::FieldPath(p) => Value::String(p.label().to_string()),
            ScriptValue::QuerySnapshot(snap) => json!({
                "size": snap.docs.len(),
                "docs": snap.docs.iter().map(|d| json!({ "id": d.id, "data": FieldValue::Map(d.fields.clone()).to_json() })).collect::<Vec<_>>(),
            }),
            ScriptValue::DocumentSnapshot(snap) => json!({
                "id": snap.reference.id(),
                "exists": snap.document.is_some(),
                "data": snap.document.as_ref().map(|d| FieldValue::Map(d.fields.clone()).to_json()),
            }),
        }
    }

    /// Text form used by string interpolation and console output.
    pub fn display(&self) -> String {
        match self {
            ScriptValue::Undefined => "undefined".to_string(),
            ScriptValue::Null => "null".to_string(),
            ScriptValue::Bool(b) => b.to_string(),
            ScriptValue::Number(n) => format_number(*n),
            ScriptValue::String(s) => s.clone(),
            ScriptValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            ScriptValue::Array(items) => items
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.display() })
                .collect::<Vec<_>>()
                .join(","),
            other => serde_json::to_string_pretty(&other.to_json()).unwrap_or_default(),
        }
    }
}

fn number_to_field(n: f64) -> FieldValue {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9_007_199_254_740_992.0 {
        FieldValue::Integer(n as i64)
    } else {
        FieldValue::Double(n)
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
