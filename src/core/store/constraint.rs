use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::store::document::{Document, FieldValue};
use crate::core::store::store_error::StoreError;

/// Field a constraint applies to. `DocumentId` targets the document identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldPath {
    Field(String),
    DocumentId,
}

impl FieldPath {
    pub fn resolve(&self, doc: &Document) -> Option<FieldValue> {
        match self {
            FieldPath::Field(path) => doc.get_field(path).cloned(),
            FieldPath::DocumentId => Some(FieldValue::String(doc.id.clone())),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FieldPath::Field(path) => path,
            FieldPath::DocumentId => "__name__",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    ArrayContainsAny,
    In,
    NotIn,
}

impl FilterOp {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "==" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            "<" => Some(Self::LessThan),
            "<=" => Some(Self::LessThanOrEqual),
            ">" => Some(Self::GreaterThan),
            ">=" => Some(Self::GreaterThanOrEqual),
            "array-contains" => Some(Self::ArrayContains),
            "array-contains-any" => Some(Self::ArrayContainsAny),
            "in" => Some(Self::In),
            "not-in" => Some(Self::NotIn),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::ArrayContains => "array-contains",
            Self::ArrayContainsAny => "array-contains-any",
            Self::In => "in",
            Self::NotIn => "not-in",
        }
    }

    /// Operators whose operand must be a list.
    pub fn takes_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::ArrayContainsAny)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    Where {
        field: FieldPath,
        op: FilterOp,
        value: FieldValue,
    },
    OrderBy {
        field: FieldPath,
        direction: Direction,
    },
    Limit(usize),
    LimitToLast(usize),
    StartAt(Vec<FieldValue>),
    StartAfter(Vec<FieldValue>),
    EndAt(Vec<FieldValue>),
    EndBefore(Vec<FieldValue>),
}

impl Constraint {
    pub fn filter(field: FieldPath, op: FilterOp, value: FieldValue) -> Result<Self, StoreError> {
        if op.takes_list() && !matches!(value, FieldValue::Array(_)) {
            return Err(StoreError::InvalidQuery(format!(
                "a non-empty array is required for '{}' filters",
                op.as_code()
            )));
        }
        Ok(Constraint::Where { field, op, value })
    }

    pub fn order_by(field: FieldPath, direction: Direction) -> Self {
        Constraint::OrderBy { field, direction }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::Where { .. } => "where",
            Constraint::OrderBy { .. } => "orderBy",
            Constraint::Limit(_) => "limit",
            Constraint::LimitToLast(_) => "limitToLast",
            Constraint::StartAt(_) => "startAt",
            Constraint::StartAfter(_) => "startAfter",
            Constraint::EndAt(_) => "endAt",
            Constraint::EndBefore(_) => "endBefore",
        }
    }
}

fn matches_filter(doc: &Document, field: &FieldPath, op: FilterOp, value: &FieldValue) -> bool {
    let Some(actual) = field.resolve(doc) else {
        return false;
    };

    match op {
        FilterOp::Equal => actual.loosely_equals(value),
        FilterOp::NotEqual => !matches!(actual, FieldValue::Null) && !actual.loosely_equals(value),
        FilterOp::LessThan => actual.compare(value) == Some(Ordering::Less),
        FilterOp::LessThanOrEqual => {
            matches!(actual.compare(value), Some(Ordering::Less | Ordering::Equal))
        }
        FilterOp::GreaterThan => actual.compare(value) == Some(Ordering::Greater),
        FilterOp::GreaterThanOrEqual => {
            matches!(actual.compare(value), Some(Ordering::Greater | Ordering::Equal))
        }
        FilterOp::ArrayContains => match &actual {
            FieldValue::Array(items) => items.iter().any(|item| item.loosely_equals(value)),
            _ => false,
        },
        FilterOp::ArrayContainsAny => match (&actual, value) {
            (FieldValue::Array(items), FieldValue::Array(wanted)) => items
                .iter()
                .any(|item| wanted.iter().any(|w| item.loosely_equals(w))),
            _ => false,
        },
        FilterOp::In => match value {
            FieldValue::Array(options) => options.iter().any(|o| actual.loosely_equals(o)),
            _ => false,
        },
        FilterOp::NotIn => match value {
            FieldValue::Array(options) => {
                !matches!(actual, FieldValue::Null) && !options.iter().any(|o| actual.loosely_equals(o))
            }
            _ => false,
        },
    }
}

/// Sort key of a document under the active ordering; the id is always the final tie-breaker.
fn sort_key(doc: &Document, orderings: &[(&FieldPath, Direction)]) -> Option<Vec<FieldValue>> {
    let mut key = Vec::with_capacity(orderings.len() + 1);
    for (field, _) in orderings {
        key.push(field.resolve(doc)?);
    }
    key.push(FieldValue::String(doc.id.clone()));
    Some(key)
}

fn compare_keys(a: &[FieldValue], b: &[FieldValue], directions: &[Direction]) -> Ordering {
    for (idx, (left, right)) in a.iter().zip(b.iter()).enumerate() {
        let direction = directions.get(idx).copied().unwrap_or(Direction::Ascending);
        let ord = match direction {
            Direction::Ascending => left.total_cmp(right),
            Direction::Descending => right.total_cmp(left),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Orders a document key against a cursor (compared position-wise over the cursor's length).
fn compare_to_cursor(key: &[FieldValue], cursor: &[FieldValue], directions: &[Direction]) -> Ordering {
    let len = cursor.len().min(key.len());
    compare_keys(&key[..len], &cursor[..len], directions)
}

/// Applies query constraints to an unordered document set: filters, ordering,
/// cursors, then limits. Shared by every store backend that evaluates locally.
pub fn apply_constraints(
    docs: Vec<Document>,
    constraints: &[Constraint],
) -> Result<Vec<Document>, StoreError> {
    let mut orderings: Vec<(&FieldPath, Direction)> = Vec::new();
    let mut limit: Option<usize> = None;
    let mut limit_to_last: Option<usize> = None;

    for constraint in constraints {
        match constraint {
            Constraint::OrderBy { field, direction } => orderings.push((field, *direction)),
            Constraint::Limit(n) => limit = Some(*n),
            Constraint::LimitToLast(n) => limit_to_last = Some(*n),
            _ => {}
        }
    }

    if limit_to_last.is_some() && orderings.is_empty() {
        return Err(StoreError::InvalidQuery(
            "limitToLast() queries require specifying at least one orderBy() clause".into(),
        ));
    }

    let mut directions: Vec<Direction> = orderings.iter().map(|(_, d)| *d).collect();
    // Id tie-breaker follows the direction of the last explicit ordering.
    directions.push(directions.last().copied().unwrap_or(Direction::Ascending));

    let mut keyed: Vec<(Vec<FieldValue>, Document)> = docs
        .into_iter()
        .filter(|doc| {
            constraints.iter().all(|c| match c {
                Constraint::Where { field, op, value } => matches_filter(doc, field, *op, value),
                _ => true,
            })
        })
        .filter_map(|doc| sort_key(&doc, &orderings).map(|key| (key, doc)))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, &directions));

    keyed.retain(|(key, _)| {
        constraints.iter().all(|c| match c {
            Constraint::StartAt(cursor) => compare_to_cursor(key, cursor, &directions) != Ordering::Less,
            Constraint::StartAfter(cursor) => compare_to_cursor(key, cursor, &directions) == Ordering::Greater,
            Constraint::EndAt(cursor) => compare_to_cursor(key, cursor, &directions) != Ordering::Greater,
            Constraint::EndBefore(cursor) => compare_to_cursor(key, cursor, &directions) == Ordering::Less,
            _ => true,
        })
    });

    let mut result: Vec<Document> = keyed.into_iter().map(|(_, doc)| doc).collect();

    if let Some(n) = limit {
        result.truncate(n);
    }
    if let Some(n) = limit_to_last {
        let skip = result.len().saturating_sub(n);
        result.drain(..skip);
    }

    Ok(result)
}
