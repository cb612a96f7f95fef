use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Value – a single typed cell
// ---------------------------------------------------------------------------

/// A typed cell after coercion. Unparseable or empty input is `Missing`.
/// Values live in `BTreeSet`s (filter options, selections) so they must be `Ord`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Missing,
}

// -- Manual Eq/Ord so Value can sit in a BTreeSet --

/// Equality follows `Ord`, so `-0.0` and `0.0` are distinct floats.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Missing sorts first. Integers and floats share one numeric order so a
    /// column holding both still sorts by magnitude; on a numeric tie the
    /// integer comes first.
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn rank(v: &Value) -> u8 {
            match v {
                Missing => 0,
                Integer(_) | Float(_) => 1,
                Date(_) => 2,
                Text(_) => 3,
            }
        }
        let (ra, rb) = (rank(self), rank(other));
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (Date(a), Date(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Missing => write!(f, "<missing>"),
        }
    }
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell, used by every aggregate.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column schema
// ---------------------------------------------------------------------------

/// Semantic type of a column, which decides how raw text is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Categorical,
    Numeric,
    /// Parsed with the given `chrono` format string.
    Date(&'static str),
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Data range of a numeric or date column, ignoring missing cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    Numbers { min: f64, max: f64 },
    Dates { start: NaiveDate, end: NaiveDate },
}

/// Per-column facts computed once when the table is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnProfile {
    /// Sorted distinct non-missing values. Left empty for free-text columns.
    pub distinct: BTreeSet<Value>,
    pub bounds: Option<Bounds>,
    pub missing: usize,
}

impl ColumnProfile {
    fn build<'a>(kind: ColumnKind, cells: impl Iterator<Item = &'a Value>) -> Self {
        let mut profile = ColumnProfile::default();
        for cell in cells {
            if cell.is_missing() {
                profile.missing += 1;
                continue;
            }
            profile.bounds = match (profile.bounds, cell) {
                (None, Value::Date(d)) => Some(Bounds::Dates { start: *d, end: *d }),
                (Some(Bounds::Dates { start, end }), Value::Date(d)) => Some(Bounds::Dates {
                    start: start.min(*d),
                    end: end.max(*d),
                }),
                (bounds, other) => match (bounds, other.as_f64()) {
                    (None, Some(v)) => Some(Bounds::Numbers { min: v, max: v }),
                    (Some(Bounds::Numbers { min, max }), Some(v)) => Some(Bounds::Numbers {
                        min: min.min(v),
                        max: max.max(v),
                    }),
                    (bounds, _) => bounds,
                },
            };
            if kind != ColumnKind::Text {
                profile.distinct.insert(cell.clone());
            }
        }
        profile
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// A loaded dataset: ordered columns, row-major cells and column profiles.
/// Never mutated after construction; filtering produces index views.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
    profiles: Vec<ColumnProfile>,
}

impl Table {
    /// Build a table and its column profiles. Every row must hold one cell
    /// per column; short rows are padded with `Missing`.
    pub fn new(columns: Vec<Column>, mut rows: Vec<Vec<Value>>) -> Self {
        for row in &mut rows {
            row.resize(columns.len(), Value::Missing);
        }
        let profiles = columns
            .iter()
            .enumerate()
            .map(|(i, col)| ColumnProfile::build(col.kind, rows.iter().map(|r| &r[i])))
            .collect();
        Table {
            columns,
            rows,
            profiles,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn profile(&self, name: &str) -> Option<&ColumnProfile> {
        self.column_index(name).map(|i| &self.profiles[i])
    }

    pub fn row(&self, index: usize) -> &[Value] {
        &self.rows[index]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
