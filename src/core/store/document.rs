use std::cmp::Ordering;

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered field map of a stored document.
pub type FieldMap = IndexMap<String, FieldValue>;

/// Store-native timestamp: whole epoch seconds plus a nanosecond remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreTimestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl StoreTimestamp {
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self { seconds, nanoseconds }
    }

    pub fn now() -> Self {
        Self::from_date(Utc::now())
    }

    pub fn from_date(date: DateTime<Utc>) -> Self {
        Self {
            seconds: date.timestamp(),
            nanoseconds: date.timestamp_subsec_nanos(),
        }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1000),
            nanoseconds: (millis.rem_euclid(1000) * 1_000_000) as u32,
        }
    }

    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanoseconds).single()
    }

    pub fn to_millis(&self) -> i64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add(i64::from(self.nanoseconds / 1_000_000))
    }
}

/// A single field value as held by the document store.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(StoreTimestamp),
    /// Native date produced by the query language (`new Date(..)`, `ts.toDate()`).
    Date(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(FieldMap),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Integer(_) | FieldValue::Double(_) => "number",
            FieldValue::String(_) => "string",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Date(_) => "date",
            FieldValue::Array(_) => "array",
            FieldValue::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Position of the value's type in the store's cross-type ordering.
    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Integer(_) | FieldValue::Double(_) => 2,
            FieldValue::Timestamp(_) | FieldValue::Date(_) => 3,
            FieldValue::String(_) => 4,
            FieldValue::Array(_) => 5,
            FieldValue::Map(_) => 6,
        }
    }

    /// Instant in (seconds, nanoseconds) for timestamp-like values.
    fn instant(&self) -> Option<(i64, u32)> {
        match self {
            FieldValue::Timestamp(ts) => Some((ts.seconds, ts.nanoseconds)),
            FieldValue::Date(d) => Some((d.timestamp(), d.timestamp_subsec_nanos())),
            _ => None,
        }
    }

    /// Compares two values of the same type class. `None` when the values
    /// are not comparable (different types, or maps that differ).
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        if self.type_rank() != other.type_rank() {
            return None;
        }
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Array(a), FieldValue::Array(b)) => {
                for (left, right) in a.iter().zip(b.iter()) {
                    match left.total_cmp(right) {
                        Ordering::Equal => continue,
                        other => return Some(other),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (FieldValue::Map(a), FieldValue::Map(b)) => (a == b).then_some(Ordering::Equal),
            (left, right) => {
                if let (Some(a), Some(b)) = (left.instant(), right.instant()) {
                    return Some(a.cmp(&b));
                }
                match (left.as_f64(), right.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                }
            }
        }
    }

    /// Total order used for sorting: type rank first, then value.
    pub fn total_cmp(&self, other: &FieldValue) -> Ordering {
        self.type_rank()
            .cmp(&other.type_rank())
            .then_with(|| self.compare(other).unwrap_or(Ordering::Equal))
    }

    /// Value equality as the store sees it (`1 == 1.0`, timestamp == same date).
    pub fn loosely_equals(&self, other: &FieldValue) -> bool {
        matches!(self.compare(other), Some(Ordering::Equal))
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Timestamp(ts) => serde_json::json!({
                "seconds": ts.seconds,
                "nanoseconds": ts.nanoseconds,
            }),
            FieldValue::Date(d) => Value::String(d.to_rfc3339()),
            FieldValue::Array(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Reads `{seconds, nanoseconds}` (or the underscored variant) as a timestamp.
fn timestamp_shape(map: &serde_json::Map<String, serde_json::Value>) -> Option<StoreTimestamp> {
    if map.len() != 2 {
        return None;
    }
    let (seconds, nanos) = match (map.get("seconds"), map.get("nanoseconds")) {
        (Some(s), Some(n)) => (s, n),
        _ => (map.get("_seconds")?, map.get("_nanoseconds")?),
    };
    let seconds = seconds.as_i64()?;
    let nanos = u32::try_from(nanos.as_u64()?).ok()?;
    (nanos < 1_000_000_000).then_some(StoreTimestamp::new(seconds, nanos))
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::Array(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => match timestamp_shape(&map) {
                Some(ts) => FieldValue::Timestamp(ts),
                None => FieldValue::Map(
                    map.into_iter()
                        .map(|(k, v)| (k, FieldValue::from(v)))
                        .collect(),
                ),
            },
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Double(d) => serializer.serialize_f64(*d),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Timestamp(ts) => ts.serialize(serializer),
            FieldValue::Date(d) => serializer.serialize_str(&d.to_rfc3339()),
            FieldValue::Array(items) => items.serialize(serializer),
            FieldValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(FieldValue::from)
    }
}

/// A stored document: identifier plus field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: FieldMap,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: FieldMap) -> Self {
        Self { id: id.into(), fields }
    }

    /// Looks up a dotted field path (`roles.admin`) through nested maps.
    pub fn get_field(&self, path: &str) -> Option<&FieldValue> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            match current {
                FieldValue::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_timestamp_shape_becomes_timestamp() {
        let value = FieldValue::from(json!({ "seconds": 1_700_000_000, "nanoseconds": 0 }));
        assert_eq!(value, FieldValue::Timestamp(StoreTimestamp::new(1_700_000_000, 0)));

        let admin_sdk = FieldValue::from(json!({ "_seconds": 10, "_nanoseconds": 5 }));
        assert_eq!(admin_sdk, FieldValue::Timestamp(StoreTimestamp::new(10, 5)));

        // Extra keys keep it an ordinary map
        let map = FieldValue::from(json!({ "seconds": 10, "nanoseconds": 0, "label": "x" }));
        assert!(matches!(map, FieldValue::Map(_)));
    }

    #[test]
    fn cross_type_ordering_ranks_types() {
        let mut values = vec![
            FieldValue::from("b"),
            FieldValue::Integer(3),
            FieldValue::Null,
            FieldValue::Double(1.5),
            FieldValue::Bool(true),
        ];
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(
            values,
            vec![
                FieldValue::Null,
                FieldValue::Bool(true),
                FieldValue::Double(1.5),
                FieldValue::Integer(3),
                FieldValue::from("b"),
            ]
        );
    }

    #[test]
    fn numbers_compare_across_integer_and_double() {
        assert!(FieldValue::Integer(1).loosely_equals(&FieldValue::Double(1.0)));
        assert!(!FieldValue::Integer(1).loosely_equals(&FieldValue::from("1")));
    }

    #[test]
    fn timestamp_and_date_compare_by_instant() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ts = FieldValue::Timestamp(StoreTimestamp::from_date(date));
        assert!(ts.loosely_equals(&FieldValue::Date(date)));
    }

    #[test]
    fn dotted_field_lookup() {
        let doc: Document = serde_json::from_value(json!({
            "id": "u1",
            "fields": { "roles": { "admin": true }, "name": "Ada" }
        }))
        .unwrap();
        assert_eq!(doc.get_field("roles.admin"), Some(&FieldValue::Bool(true)));
        assert_eq!(doc.get_field("name.first"), None);
        assert_eq!(doc.get_field("missing"), None);
    }

    #[test]
    fn millis_conversion_handles_negative_values() {
        let ts = StoreTimestamp::from_millis(-1500);
        assert_eq!(ts, StoreTimestamp::new(-2, 500_000_000));
        assert_eq!(ts.to_millis(), -1500);
    }
}
