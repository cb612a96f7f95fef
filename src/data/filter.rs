use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{Bounds, Table, Value};
use super::registry::{FilterDef, FilterKind};

// ---------------------------------------------------------------------------
// Selections: what the user chose per filter
// ---------------------------------------------------------------------------

/// The user's choice for one filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// No restriction.
    All,
    /// Single-select: rows equal to this value.
    One(Value),
    /// Multi-select: rows equal to any of these values. Empty means "all".
    Many(BTreeSet<Value>),
    /// Inclusive numeric range.
    Between { min: f64, max: f64 },
    /// Inclusive date range.
    Dates { start: NaiveDate, end: NaiveDate },
}

/// Filter name → selection. A filter that is absent means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterSelection(BTreeMap<String, Selection>);

impl FilterSelection {
    pub fn get(&self, filter: &str) -> Option<&Selection> {
        self.0.get(filter)
    }

    pub fn set(&mut self, filter: &str, selection: Selection) {
        self.0.insert(filter.to_string(), selection);
    }

    pub fn clear(&mut self, filter: &str) {
        self.0.remove(filter);
    }

    pub fn reset(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selection)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FilteredView – row indices into a table
// ---------------------------------------------------------------------------

/// The rows of a table that pass the current selection, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    table: &'a Table,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Every row of the table.
    pub fn all(table: &'a Table) -> Self {
        Self {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    /// Rebuild a view from indices produced by an earlier filter pass.
    pub fn from_indices(table: &'a Table, indices: Vec<usize>) -> Self {
        debug_assert!(indices.iter().all(|&i| i < table.len()));
        Self { table, indices }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [Value]> + '_ {
        self.indices.iter().map(|&i| self.table.row(i))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Return the rows of `table` passing every active filter in `selection`.
///
/// A filter is inactive when its selection is absent or `All`, an empty or
/// complete multi-select, or a range covering the column's whole data range.
/// Selections naming unknown filters, or of the wrong shape for the filter,
/// are ignored.
pub fn apply_filters<'a>(
    table: &'a Table,
    filters: &[FilterDef],
    selection: &FilterSelection,
) -> FilteredView<'a> {
    for (name, _) in selection.iter() {
        if !filters.iter().any(|f| f.name == name) {
            log::warn!("ignoring selection for unknown filter '{name}'");
        }
    }

    let predicates: Vec<Predicate<'_>> = filters
        .iter()
        .filter_map(|f| Predicate::build(table, f, selection.get(f.name)?))
        .collect();

    if predicates.is_empty() {
        return FilteredView::all(table);
    }

    let indices = table
        .rows()
        .enumerate()
        .filter(|(_, row)| predicates.iter().all(|p| p.matches(row)))
        .map(|(i, _)| i)
        .collect();
    FilteredView::from_indices(table, indices)
}

struct Predicate<'s> {
    column: usize,
    /// (column, value) pairs a row must carry for the test to apply.
    scope: Vec<(usize, &'static str)>,
    test: Test<'s>,
}

enum Test<'s> {
    Equals(&'s Value),
    OneOf(&'s BTreeSet<Value>),
    Between(f64, f64),
    Dates(NaiveDate, NaiveDate),
}

impl<'s> Predicate<'s> {
    /// `None` when the selection places no restriction on the table.
    fn build(table: &Table, filter: &FilterDef, selection: &'s Selection) -> Option<Self> {
        let column = table.column_index(filter.column)?;
        let profile = table.profile(filter.column)?;

        let test = match (filter.kind, selection) {
            (_, Selection::All) => return None,
            (FilterKind::SingleSelect | FilterKind::MultiSelect, Selection::One(v)) => {
                Test::Equals(v)
            }
            (FilterKind::MultiSelect, Selection::Many(set)) => {
                if set.is_empty() || profile.distinct.iter().all(|v| set.contains(v)) {
                    return None;
                }
                Test::OneOf(set)
            }
            (FilterKind::NumericRange, Selection::Between { min, max }) => {
                let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
                match profile.bounds {
                    Some(Bounds::Numbers { min, max }) if lo <= min && hi >= max => return None,
                    Some(Bounds::Numbers { .. }) => Test::Between(lo, hi),
                    _ => return None,
                }
            }
            (FilterKind::DateRange, Selection::Dates { start, end }) => {
                let (lo, hi) = if start <= end { (*start, *end) } else { (*end, *start) };
                match profile.bounds {
                    Some(Bounds::Dates { start, end }) if lo <= start && hi >= end => return None,
                    Some(Bounds::Dates { .. }) => Test::Dates(lo, hi),
                    _ => return None,
                }
            }
            (kind, other) => {
                log::warn!(
                    "filter '{}' ({kind:?}) cannot use selection {other:?}; ignoring it",
                    filter.name
                );
                return None;
            }
        };

        let scope = filter
            .applies_to
            .iter()
            .map(|c| table.column_index(c.column).map(|i| (i, c.equals)))
            .collect::<Option<Vec<_>>>();
        let Some(scope) = scope else {
            log::warn!(
                "filter '{}' is scoped by an unknown column; ignoring it",
                filter.name
            );
            return None;
        };

        Some(Predicate {
            column,
            scope,
            test,
        })
    }

    fn matches(&self, row: &[Value]) -> bool {
        let in_scope = self
            .scope
            .iter()
            .all(|(i, equals)| row[*i].as_str() == Some(*equals));
        if !in_scope {
            return true;
        }
        let cell = &row[self.column];
        if cell.is_missing() {
            return false;
        }
        match &self.test {
            Test::Equals(v) => cell == *v,
            Test::OneOf(set) => set.contains(cell),
            Test::Between(lo, hi) => cell.as_f64().is_some_and(|v| *lo <= v && v <= *hi),
            Test::Dates(lo, hi) => cell.as_date().is_some_and(|d| *lo <= d && d <= *hi),
        }
    }
}

// ---------------------------------------------------------------------------
// Options offered by the UI for each filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOptions {
    /// Sorted distinct values for select filters.
    Values(Vec<Value>),
    Numbers { min: f64, max: f64 },
    Dates { start: NaiveDate, end: NaiveDate },
    /// The column holds no usable data.
    Unavailable,
}

pub fn filter_options(table: &Table, filter: &FilterDef) -> FilterOptions {
    let Some(profile) = table.profile(filter.column) else {
        return FilterOptions::Unavailable;
    };
    match (filter.kind, profile.bounds) {
        (FilterKind::SingleSelect | FilterKind::MultiSelect, _) if !profile.distinct.is_empty() => {
            FilterOptions::Values(profile.distinct.iter().cloned().collect())
        }
        (FilterKind::NumericRange, Some(Bounds::Numbers { min, max })) => {
            FilterOptions::Numbers { min, max }
        }
        (FilterKind::DateRange, Some(Bounds::Dates { start, end })) => {
            FilterOptions::Dates { start, end }
        }
        _ => FilterOptions::Unavailable,
    }
}
