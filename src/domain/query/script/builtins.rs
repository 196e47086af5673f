//! Allow-listed functions, constructors and members reachable from query scripts.
//!
//! Everything here is pure; calls that touch the store (`getDocs`, `getDoc`,
//! `Timestamp.now`) are dispatched by the interpreter.

use chrono::{DateTime, Datelike, SecondsFormat, TimeDelta, Timelike, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::core::store::constraint::{Constraint, Direction, FieldPath, FilterOp};
use crate::core::store::document::{FieldValue, StoreTimestamp};
use crate::core::store::reference::{CollectionRef, DocumentRef};
use crate::core::util::timestamp_util::TimestampUtil;
use crate::domain::query::script::script_error::ScriptError;
use crate::domain::query::script::value::{QuerySnapshot, QueryValue, ScriptValue};

/// Functions callable by bare name.
pub const GLOBAL_FUNCTIONS: &[&str] = &[
    "collection",
    "doc",
    "query",
    "where",
    "orderBy",
    "limit",
    "limitToLast",
    "startAt",
    "startAfter",
    "endAt",
    "endBefore",
    "documentId",
    "getDocs",
    "getDoc",
];

/// Objects that only expose static members, e.g. `Timestamp.now()`.
pub const NAMESPACES: &[&str] = &["Timestamp", "Date", "console"];

fn type_error(message: impl Into<String>) -> ScriptError {
    ScriptError::Type(message.into())
}

fn cannot_read(target: &ScriptValue, property: &str) -> ScriptError {
    type_error(format!(
        "Cannot read properties of {} (reading '{property}')",
        target.type_name()
    ))
}

fn expect_string<'v>(value: &'v ScriptValue, function: &str) -> Result<&'v str, ScriptError> {
    match value {
        ScriptValue::String(s) => Ok(s),
        other => Err(type_error(format!(
            "{function}() expects a string, got {}",
            other.type_name()
        ))),
    }
}

fn expect_count(args: &[ScriptValue], function: &str) -> Result<usize, ScriptError> {
    match args.first() {
        Some(ScriptValue::Number(n)) if n.fract() == 0.0 && *n > 0.0 => Ok(*n as usize),
        Some(other) => Err(type_error(format!(
            "{function}() expects a positive integer, got {}",
            other.display()
        ))),
        None => Err(type_error(format!("{function}() expects a positive integer"))),
    }
}

/// `(db | parentRef, ...segments)` -> full path segments.
fn path_segments(args: &[ScriptValue], function: &str) -> Result<Vec<String>, ScriptError> {
    let Some((base, rest)) = args.split_first() else {
        return Err(type_error(format!(
            "{function}() expects db or a reference as first argument"
        )));
    };

    let mut segments: Vec<String> = match base {
        ScriptValue::Database => Vec::new(),
        ScriptValue::Collection(c) => c.segments().to_vec(),
        ScriptValue::DocumentRef(d) => {
            let mut segments = d.collection().segments().to_vec();
            segments.push(d.id().to_string());
            segments
        }
        other => {
            return Err(type_error(format!(
                "{function}() expects db or a reference as first argument, got {}",
                other.type_name()
            )))
        }
    };
    for arg in rest {
        segments.push(expect_string(arg, function)?.to_string());
    }
    Ok(segments)
}

pub fn collection(args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
    let segments = path_segments(args, "collection")?;
    Ok(ScriptValue::Collection(CollectionRef::parse(&segments)?))
}

pub fn doc(args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
    let mut segments = path_segments(args, "doc")?;
    // `doc(collectionRef)` names a fresh document
    if let [ScriptValue::Collection(_)] = args {
        segments.push(Uuid::new_v4().simple().to_string());
    }
    Ok(ScriptValue::DocumentRef(DocumentRef::parse(&segments)?))
}

pub fn query(args: Vec<ScriptValue>) -> Result<ScriptValue, ScriptError> {
    let mut args = args.into_iter();
    let mut query = match args.next() {
        Some(ScriptValue::Collection(collection)) => QueryValue {
            collection,
            constraints: Vec::new(),
        },
        Some(ScriptValue::Query(query)) => query,
        other => {
            return Err(type_error(format!(
                "query() expects a collection or query, got {}",
                other.as_ref().map_or("nothing", ScriptValue::type_name)
            )))
        }
    };

    for arg in args {
        match arg {
            ScriptValue::Constraint(constraint) => query.constraints.push(constraint),
            other => {
                return Err(type_error(format!(
                    "query() expects query constraints, got {}",
                    other.type_name()
                )))
            }
        }
    }
    Ok(ScriptValue::Query(query))
}

fn field_path(value: &ScriptValue, function: &str) -> Result<FieldPath, ScriptError> {
    match value {
        ScriptValue::FieldPath(path) => Ok(path.clone()),
        other => Ok(FieldPath::Field(expect_string(other, function)?.to_string())),
    }
}

pub fn where_filter(args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
    let [field, op, value] = args else {
        return Err(type_error("where() expects (field, operator, value)"));
    };
    let field = field_path(field, "where")?;
    let code = expect_string(op, "where")?;
    let op = FilterOp::from_code(code)
        .ok_or_else(|| type_error(format!("Invalid query operator '{code}'")))?;
    Ok(ScriptValue::Constraint(Constraint::filter(field, op, value.to_field()?)?))
}

pub fn order_by(args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
    let Some(field) = args.first() else {
        return Err(type_error("orderBy() expects a field"));
    };
    let field = field_path(field, "orderBy")?;
    let direction = match args.get(1) {
        None | Some(ScriptValue::Undefined) => Direction::Ascending,
        Some(value) => {
            let code = expect_string(value, "orderBy")?;
            Direction::from_code(code)
                .ok_or_else(|| type_error(format!("Invalid order direction '{code}'")))?
        }
    };
    Ok(ScriptValue::Constraint(Constraint::order_by(field, direction)))
}

pub fn limit(args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
    Ok(ScriptValue::Constraint(Constraint::Limit(expect_count(args, "limit")?)))
}

pub fn limit_to_last(args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
    Ok(ScriptValue::Constraint(Constraint::LimitToLast(expect_count(
        args,
        "limitToLast",
    )?)))
}

/// `startAt`, `startAfter`, `endAt` and `endBefore`.
pub fn cursor(function: &str, args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
    if args.is_empty() {
        return Err(type_error(format!("{function}() expects at least one value")));
    }
    let values = args
        .iter()
        .map(ScriptValue::to_field)
        .collect::<Result<Vec<FieldValue>, ScriptError>>()?;
    let constraint = match function {
        "startAt" => Constraint::StartAt(values),
        "startAfter" => Constraint::StartAfter(values),
        "endAt" => Constraint::EndAt(values),
        "endBefore" => Constraint::EndBefore(values),
        other => return Err(ScriptError::NotDefined(other.to_string())),
    };
    Ok(ScriptValue::Constraint(constraint))
}

pub fn document_id() -> ScriptValue {
    ScriptValue::FieldPath(FieldPath::DocumentId)
}

/// Argument of `getDocs`.
pub fn query_target(value: ScriptValue) -> Result<QueryValue, ScriptError> {
    match value {
        ScriptValue::Collection(collection) => Ok(QueryValue {
            collection,
            constraints: Vec::new(),
        }),
        ScriptValue::Query(query) => Ok(query),
        other => Err(type_error(format!(
            "getDocs() expects a collection or query, got {}",
            other.type_name()
        ))),
    }
}

/// Argument of `getDoc`.
pub fn document_target(value: ScriptValue) -> Result<DocumentRef, ScriptError> {
    match value {
        ScriptValue::DocumentRef(reference) => Ok(reference),
        other => Err(type_error(format!(
            "getDoc() expects a document reference, got {}",
            other.type_name()
        ))),
    }
}

pub fn error_object(message: String) -> ScriptValue {
    ScriptValue::Object(IndexMap::from([
        ("name".to_string(), ScriptValue::String("Error".to_string())),
        ("message".to_string(), ScriptValue::String(message)),
    ]))
}

/// Text carried by a thrown value: an error's `message`, otherwise its display form.
pub fn thrown_message(value: &ScriptValue) -> String {
    match value {
        ScriptValue::Object(map) => match map.get("message") {
            Some(ScriptValue::String(message)) => message.clone(),
            _ => value.display(),
        },
        other => other.display(),
    }
}

fn new_date(arg: Option<&ScriptValue>) -> Result<DateTime<Utc>, ScriptError> {
    let parsed = match arg {
        None => Some(Utc::now()),
        Some(ScriptValue::Number(ms)) if ms.is_finite() => DateTime::from_timestamp_millis(*ms as i64),
        Some(ScriptValue::String(s)) => TimestampUtil::parse_date_string(s),
        Some(ScriptValue::Date(date)) => Some(*date),
        Some(ScriptValue::Timestamp(ts)) => ts.to_date(),
        Some(_) => None,
    };
    parsed.ok_or_else(|| type_error("Invalid Date"))
}

/// `new Class(...)`.
pub fn construct(class: &str, args: Vec<ScriptValue>) -> Result<ScriptValue, ScriptError> {
    match class {
        "Date" => new_date(args.first()).map(ScriptValue::Date),
        "Error" => Ok(error_object(
            args.first().map(ScriptValue::display).unwrap_or_default(),
        )),
        "Timestamp" => match args.as_slice() {
            [ScriptValue::Number(seconds), ScriptValue::Number(nanos)]
                if seconds.is_finite() && *nanos >= 0.0 && *nanos < 1e9 =>
            {
                Ok(ScriptValue::Timestamp(StoreTimestamp::new(
                    seconds.trunc() as i64,
                    *nanos as u32,
                )))
            }
            _ => Err(type_error("Timestamp expects (seconds, nanoseconds)")),
        },
        other => Err(ScriptError::NotDefined(other.to_string())),
    }
}

pub fn date_static(method: &str) -> Result<ScriptValue, ScriptError> {
    match method {
        "now" => Ok(ScriptValue::Number(Utc::now().timestamp_millis() as f64)),
        other => Err(type_error(format!("Date.{other} is not a function"))),
    }
}

/// `Timestamp.fromDate` and `Timestamp.fromMillis`; `Timestamp.now` needs the store.
pub fn timestamp_static(method: &str, args: &[ScriptValue]) -> Result<StoreTimestamp, ScriptError> {
    match (method, args.first()) {
        ("fromDate", Some(ScriptValue::Date(date))) => Ok(StoreTimestamp::from_date(*date)),
        ("fromDate", _) => Err(type_error("Timestamp.fromDate() expects a Date")),
        ("fromMillis", Some(ScriptValue::Number(ms))) if ms.is_finite() => {
            Ok(StoreTimestamp::from_millis(ms.trunc() as i64))
        }
        ("fromMillis", _) => Err(type_error("Timestamp.fromMillis() expects a number")),
        (other, _) => Err(type_error(format!("Timestamp.{other} is not a function"))),
    }
}

fn console_text(value: &ScriptValue) -> String {
    match value {
        ScriptValue::String(s) => s.clone(),
        ScriptValue::Undefined | ScriptValue::Bool(_) | ScriptValue::Number(_) => value.display(),
        other => serde_json::to_string_pretty(&other.to_json()).unwrap_or_default(),
    }
}

/// One captured console line. Objects are rendered as pretty JSON.
pub fn console_line(method: &str, args: &[ScriptValue]) -> Result<String, ScriptError> {
    let prefix = match method {
        "log" | "info" | "debug" => "",
        "warn" => "WARN: ",
        "error" => "ERROR: ",
        other => return Err(type_error(format!("console.{other} is not a function"))),
    };
    let text = args.iter().map(console_text).collect::<Vec<_>>().join(" ");
    Ok(format!("{prefix}{text}"))
}

/// Local-day time setter with JavaScript overflow rules (`setHours(25)` rolls over).
pub fn set_hours(date: DateTime<Utc>, args: &[ScriptValue]) -> Result<DateTime<Utc>, ScriptError> {
    if args.is_empty() {
        return Err(type_error("setHours() expects at least one argument"));
    }
    let part = |idx: usize, current: u32| -> Result<i64, ScriptError> {
        match args.get(idx) {
            None => Ok(i64::from(current)),
            Some(ScriptValue::Number(n)) if n.is_finite() => Ok(n.trunc() as i64),
            Some(other) => Err(type_error(format!(
                "setHours() expects numbers, got {}",
                other.type_name()
            ))),
        }
    };
    let units = [
        (part(0, date.hour())?, 3_600_000_i64),
        (part(1, date.minute())?, 60_000),
        (part(2, date.second())?, 1_000),
        (part(3, date.timestamp_subsec_millis())?, 1),
    ];

    let offset_ms = units.iter().try_fold(0_i64, |acc, (value, scale)| {
        value.checked_mul(*scale).and_then(|ms| acc.checked_add(ms))
    });
    let midnight = date.date_naive().and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    offset_ms
        .and_then(TimeDelta::try_milliseconds)
        .zip(midnight)
        .and_then(|(delta, midnight)| midnight.checked_add_signed(delta))
        .ok_or_else(|| type_error("Invalid Date"))
}

fn snapshot_docs(snap: &QuerySnapshot) -> Result<Vec<ScriptValue>, ScriptError> {
    let mut docs = Vec::with_capacity(snap.docs.len());
    for document in &snap.docs {
        let reference = snap.collection.doc(&document.id)?;
        docs.push(ScriptValue::document_snapshot(reference, Some(document.clone())));
    }
    Ok(docs)
}

/// `target.property`. Unknown properties read as `undefined`.
pub fn member(target: &ScriptValue, property: &str) -> Result<ScriptValue, ScriptError> {
    let value = match target {
        ScriptValue::Undefined | ScriptValue::Null => return Err(cannot_read(target, property)),
        ScriptValue::QuerySnapshot(snap) => match property {
            "docs" => ScriptValue::Array(snapshot_docs(snap)?),
            "size" => ScriptValue::Number(snap.docs.len() as f64),
            "empty" => ScriptValue::Bool(snap.docs.is_empty()),
            _ => ScriptValue::Undefined,
        },
        ScriptValue::DocumentSnapshot(snap) => match property {
            "id" => ScriptValue::String(snap.reference.id().to_string()),
            "ref" => ScriptValue::DocumentRef(snap.reference.clone()),
            "exists" => ScriptValue::Bool(snap.document.is_some()),
            _ => ScriptValue::Undefined,
        },
        ScriptValue::Timestamp(ts) => match property {
            "seconds" => ScriptValue::Number(ts.seconds as f64),
            "nanoseconds" => ScriptValue::Number(f64::from(ts.nanoseconds)),
            _ => ScriptValue::Undefined,
        },
        ScriptValue::Array(items) if property == "length" => ScriptValue::Number(items.len() as f64),
        ScriptValue::String(s) if property == "length" => ScriptValue::Number(s.chars().count() as f64),
        ScriptValue::Object(map) => map.get(property).cloned().unwrap_or(ScriptValue::Undefined),
        ScriptValue::Collection(c) => match property {
            "id" => ScriptValue::String(c.id().to_string()),
            "path" => ScriptValue::String(c.path()),
            _ => ScriptValue::Undefined,
        },
        ScriptValue::DocumentRef(d) => match property {
            "id" => ScriptValue::String(d.id().to_string()),
            "path" => ScriptValue::String(d.path()),
            "parent" => ScriptValue::Collection(d.collection().clone()),
            _ => ScriptValue::Undefined,
        },
        _ => ScriptValue::Undefined,
    };
    Ok(value)
}

fn position(n: f64) -> Option<usize> {
    (n.fract() == 0.0 && n >= 0.0).then_some(n as usize)
}

/// `target[key]`.
pub fn index(target: &ScriptValue, key: &ScriptValue) -> Result<ScriptValue, ScriptError> {
    match (target, key) {
        (ScriptValue::Array(items), ScriptValue::Number(n)) => Ok(position(*n)
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(ScriptValue::Undefined)),
        (ScriptValue::String(s), ScriptValue::Number(n)) => Ok(position(*n)
            .and_then(|i| s.chars().nth(i))
            .map(|c| ScriptValue::String(c.to_string()))
            .unwrap_or(ScriptValue::Undefined)),
        _ => member(target, &key.display()),
    }
}

fn slice_bounds(len: usize, args: &[ScriptValue]) -> (usize, usize) {
    let resolve = |arg: Option<&ScriptValue>, default: usize| match arg {
        Some(ScriptValue::Number(n)) if !n.is_nan() => {
            let n = n.trunc();
            if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                (n as usize).min(len)
            }
        }
        _ => default,
    };
    let start = resolve(args.first(), 0);
    let end = resolve(args.get(1), len);
    (start, end.max(start))
}

fn string_arg(args: &[ScriptValue]) -> String {
    args.first()
        .map(ScriptValue::display)
        .unwrap_or_else(|| "undefined".to_string())
}

/// `receiver.method(args)` for non-mutating methods.
pub fn call_method(
    receiver: &ScriptValue,
    method: &str,
    args: &[ScriptValue],
) -> Result<ScriptValue, ScriptError> {
    let not_a_function = || {
        type_error(format!(
            "{}.{method} is not a function",
            receiver.type_name()
        ))
    };

    let value = match receiver {
        ScriptValue::Undefined | ScriptValue::Null => return Err(cannot_read(receiver, method)),
        ScriptValue::DocumentSnapshot(snap) => match method {
            "exists" => ScriptValue::Bool(snap.document.is_some()),
            "data" => snap
                .document
                .as_ref()
                .map(|d| ScriptValue::from_fields(&d.fields))
                .unwrap_or(ScriptValue::Undefined),
            "get" => {
                let [ScriptValue::String(path), ..] = args else {
                    return Err(type_error("get() expects a field path"));
                };
                snap.document
                    .as_ref()
                    .and_then(|d| d.get_field(path))
                    .map(ScriptValue::from_field)
                    .unwrap_or(ScriptValue::Undefined)
            }
            _ => return Err(not_a_function()),
        },
        ScriptValue::Timestamp(ts) => match method {
            "toDate" => ts
                .to_date()
                .map(ScriptValue::Date)
                .ok_or_else(|| type_error("Timestamp is out of range"))?,
            "toMillis" => ScriptValue::Number(ts.to_millis() as f64),
            _ => return Err(not_a_function()),
        },
        ScriptValue::Date(date) => match method {
            "getTime" | "valueOf" => ScriptValue::Number(date.timestamp_millis() as f64),
            "toISOString" | "toJSON" => {
                ScriptValue::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            "getFullYear" => ScriptValue::Number(f64::from(date.year())),
            "getMonth" => ScriptValue::Number(f64::from(date.month0())),
            "getDate" => ScriptValue::Number(f64::from(date.day())),
            "getHours" => ScriptValue::Number(f64::from(date.hour())),
            _ => return Err(not_a_function()),
        },
        ScriptValue::Array(items) => match method {
            "slice" => {
                let (start, end) = slice_bounds(items.len(), args);
                ScriptValue::Array(items[start..end].to_vec())
            }
            "join" => {
                let separator = match args.first() {
                    None | Some(ScriptValue::Undefined) => ",".to_string(),
                    Some(sep) => sep.display(),
                };
                ScriptValue::String(
                    items
                        .iter()
                        .map(|v| if v.is_nullish() { String::new() } else { v.display() })
                        .collect::<Vec<_>>()
                        .join(&separator),
                )
            }
            "includes" => {
                let needle = args.first().unwrap_or(&ScriptValue::Undefined);
                ScriptValue::Bool(items.contains(needle))
            }
            _ => return Err(not_a_function()),
        },
        ScriptValue::String(s) => match method {
            "toLowerCase" => ScriptValue::String(s.to_lowercase()),
            "toUpperCase" => ScriptValue::String(s.to_uppercase()),
            "trim" => ScriptValue::String(s.trim().to_string()),
            "includes" => ScriptValue::Bool(s.contains(string_arg(args).as_str())),
            "startsWith" => ScriptValue::Bool(s.starts_with(string_arg(args).as_str())),
            "endsWith" => ScriptValue::Bool(s.ends_with(string_arg(args).as_str())),
            "split" => {
                let separator = string_arg(args);
                let parts: Vec<ScriptValue> = if separator.is_empty() {
                    s.chars().map(|c| ScriptValue::String(c.to_string())).collect()
                } else {
                    s.split(separator.as_str())
                        .map(|part| ScriptValue::String(part.to_string()))
                        .collect()
                };
                ScriptValue::Array(parts)
            }
            "toString" => receiver.clone(),
            _ => return Err(not_a_function()),
        },
        _ if method == "toString" => ScriptValue::String(receiver.display()),
        _ => return Err(not_a_function()),
    };
    Ok(value)
}
