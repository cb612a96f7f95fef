use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::filter::FilteredView;
use super::model::Value;
use super::registry::{Aggregate, CategoryOrder, Condition, DatasetDef, MetricKind, ValueFormat};

// ---------------------------------------------------------------------------
// Metric values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub label: String,
    pub value: f64,
}

/// One named row of values aligned with a category or bin axis. `None` marks
/// an undefined cell (a mean over nothing).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Half-open histogram bin `[start, end)`; the last bin also holds `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MetricValue {
    Count(usize),
    /// Sum or mean. A mean over no values is `None`.
    Scalar(Option<f64>),
    /// Category totals, already ordered and truncated.
    Breakdown(Vec<Category>),
    Table {
        categories: Vec<String>,
        series: Vec<Series>,
    },
    Histogram {
        bins: Vec<Bin>,
        series: Vec<Series>,
    },
}

impl MetricValue {
    /// Counts and scalars are shown as cards rather than charts.
    pub fn is_scalar(&self) -> bool {
        matches!(self, MetricValue::Count(_) | MetricValue::Scalar(_))
    }

    /// True when there is nothing to chart.
    pub fn is_empty(&self) -> bool {
        match self {
            MetricValue::Count(_) | MetricValue::Scalar(_) => false,
            MetricValue::Breakdown(categories) => categories.is_empty(),
            MetricValue::Table { categories, series } => {
                categories.is_empty() || series.is_empty()
            }
            MetricValue::Histogram { bins, .. } => bins.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: &'static str,
    pub label: &'static str,
    pub format: ValueFormat,
    pub value: MetricValue,
}

impl Metric {
    /// Text for a metric card.
    pub fn display(&self) -> String {
        match &self.value {
            MetricValue::Count(n) => format_value(Some(*n as f64), self.format),
            MetricValue::Scalar(v) => format_value(*v, self.format),
            MetricValue::Breakdown(categories) => format!("{} categories", categories.len()),
            MetricValue::Table { categories, .. } => format!("{} rows", categories.len()),
            MetricValue::Histogram { bins, .. } => format!("{} bins", bins.len()),
        }
    }
}

/// All metrics of a dataset in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metrics(Vec<Metric>);

impl Metrics {
    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.0.iter().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metric> {
        self.0.iter()
    }

    /// Metrics shown as cards.
    pub fn scalars(&self) -> impl Iterator<Item = &Metric> {
        self.0.iter().filter(|m| m.value.is_scalar())
    }
}

// ---------------------------------------------------------------------------
// summarize
// ---------------------------------------------------------------------------

/// Compute every metric `def` declares over the rows of `view`.
///
/// Missing cells are skipped by aggregates and rows with a missing group key
/// are dropped. An empty view yields counts of 0, sums of 0 and `None` means.
pub fn summarize(view: &FilteredView<'_>, def: &DatasetDef) -> Metrics {
    Metrics(
        def.metrics
            .iter()
            .map(|m| Metric {
                name: m.name,
                label: m.label,
                format: m.format,
                value: evaluate(view, &m.kind),
            })
            .collect(),
    )
}

fn evaluate(view: &FilteredView<'_>, kind: &MetricKind) -> MetricValue {
    let table = view.table();
    let index = |name: &str| {
        let i = table.column_index(name);
        if i.is_none() {
            log::warn!("metric references unknown column '{name}'");
        }
        i
    };

    match *kind {
        MetricKind::Count => MetricValue::Count(view.len()),
        MetricKind::CountWhere(filter) => MetricValue::Count(rows_where(view, filter).len()),
        MetricKind::Sum { column, filter } => {
            let mut acc = Acc::default();
            if let Some(c) = index(column) {
                rows_where(view, filter).for_each_numeric(c, &mut acc);
            }
            MetricValue::Scalar(acc.result(Aggregate::Sum(column)))
        }
        MetricKind::Mean { column, filter } => {
            let mut acc = Acc::default();
            if let Some(c) = index(column) {
                rows_where(view, filter).for_each_numeric(c, &mut acc);
            }
            MetricValue::Scalar(acc.result(Aggregate::Mean(column)))
        }
        MetricKind::GroupBy {
            key,
            aggregate,
            order,
            filter,
        } => {
            let Some(k) = index(key) else {
                return MetricValue::Breakdown(Vec::new());
            };
            let measure = measure(aggregate).and_then(index);
            let mut groups: BTreeMap<&Value, Acc> = BTreeMap::new();
            for row in rows_where(view, filter).0 {
                if row[k].is_missing() {
                    continue;
                }
                groups
                    .entry(&row[k])
                    .or_default()
                    .push(measure.and_then(|m| row[m].as_f64()));
            }
            let mut categories: Vec<Category> = groups
                .into_iter()
                .filter_map(|(key, acc)| {
                    acc.result(aggregate).map(|value| Category {
                        label: key.to_string(),
                        value,
                    })
                })
                .collect();
            if let CategoryOrder::ValueDesc { top_n } = order {
                categories.sort_by(|a, b| b.value.total_cmp(&a.value));
                categories.truncate(top_n);
            }
            MetricValue::Breakdown(categories)
        }
        MetricKind::ColumnTotals(columns) => {
            if view.is_empty() {
                return MetricValue::Breakdown(Vec::new());
            }
            let categories = columns
                .iter()
                .filter_map(|(column, label)| {
                    let c = index(column)?;
                    let mut acc = Acc::default();
                    for row in view.rows() {
                        acc.push(row[c].as_f64());
                    }
                    Some(Category {
                        label: label.to_string(),
                        value: acc.sum,
                    })
                })
                .collect();
            MetricValue::Breakdown(categories)
        }
        MetricKind::Crosstab {
            rows,
            series,
            aggregate,
            percent_of_row,
            filter,
        } => {
            let (Some(r), Some(s)) = (index(rows), index(series)) else {
                return MetricValue::Table {
                    categories: Vec::new(),
                    series: Vec::new(),
                };
            };
            crosstab(
                &rows_where(view, filter).0,
                r,
                s,
                aggregate,
                measure(aggregate).and_then(index),
                percent_of_row,
            )
        }
        MetricKind::Histogram {
            column,
            bins,
            split_by,
            filter,
        } => {
            let Some(c) = index(column) else {
                return MetricValue::Histogram {
                    bins: Vec::new(),
                    series: Vec::new(),
                };
            };
            let split = split_by.and_then(index);
            histogram(&rows_where(view, filter).0, c, split, bins)
        }
    }
}

fn measure(aggregate: Aggregate) -> Option<&'static str> {
    match aggregate {
        Aggregate::Count => None,
        Aggregate::Sum(column) | Aggregate::Mean(column) => Some(column),
    }
}

/// Rows of the view matching every condition.
struct Rows<'a>(Vec<&'a [Value]>);

impl<'a> Rows<'a> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn for_each_numeric(&self, column: usize, acc: &mut Acc) {
        for row in &self.0 {
            if !row[column].is_missing() {
                acc.push(row[column].as_f64());
            }
        }
    }
}

fn rows_where<'a>(view: &FilteredView<'a>, filter: &[Condition]) -> Rows<'a> {
    let table = view.table();
    let resolved: Option<Vec<(usize, &str)>> = filter
        .iter()
        .map(|c| table.column_index(c.column).map(|i| (i, c.equals)))
        .collect();
    let Some(conditions) = resolved else {
        log::warn!("metric condition references an unknown column");
        return Rows(Vec::new());
    };
    Rows(
        view.rows()
            .filter(|row| {
                conditions
                    .iter()
                    .all(|(i, equals)| row[*i].as_str() == Some(*equals))
            })
            .collect(),
    )
}

/// Running count, sum and count of numeric values.
#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    count: usize,
    sum: f64,
    numeric: usize,
}

impl Acc {
    fn push(&mut self, value: Option<f64>) {
        self.count += 1;
        if let Some(v) = value {
            self.sum += v;
            self.numeric += 1;
        }
    }

    fn result(&self, aggregate: Aggregate) -> Option<f64> {
        match aggregate {
            Aggregate::Count => Some(self.count as f64),
            Aggregate::Sum(_) => Some(self.sum),
            Aggregate::Mean(_) => (self.numeric > 0).then(|| self.sum / self.numeric as f64),
        }
    }
}

fn crosstab(
    rows: &[&[Value]],
    row_key: usize,
    series_key: usize,
    aggregate: Aggregate,
    measure: Option<usize>,
    percent_of_row: bool,
) -> MetricValue {
    let mut cells: BTreeMap<(&Value, &Value), Acc> = BTreeMap::new();
    let mut row_keys = BTreeSet::new();
    let mut series_keys = BTreeSet::new();
    for row in rows {
        let (r, s) = (&row[row_key], &row[series_key]);
        if r.is_missing() || s.is_missing() {
            continue;
        }
        row_keys.insert(r);
        series_keys.insert(s);
        cells
            .entry((r, s))
            .or_default()
            .push(measure.and_then(|m| row[m].as_f64()));
    }

    // Absent cells fall back to an empty accumulator: 0 for counts and sums,
    // undefined for means.
    let mut grid: Vec<Vec<Option<f64>>> = row_keys
        .iter()
        .map(|r| {
            series_keys
                .iter()
                .map(|s| {
                    cells
                        .get(&(*r, *s))
                        .copied()
                        .unwrap_or_default()
                        .result(aggregate)
                })
                .collect()
        })
        .collect();

    if percent_of_row {
        for row in &mut grid {
            let total: f64 = row.iter().flatten().sum();
            if total > 0.0 {
                for cell in row.iter_mut().flatten() {
                    *cell = *cell / total * 100.0;
                }
            }
        }
    }

    let series = series_keys
        .iter()
        .enumerate()
        .map(|(j, name)| Series {
            name: name.to_string(),
            values: grid.iter().map(|row| row[j]).collect(),
        })
        .collect();
    MetricValue::Table {
        categories: row_keys.iter().map(|r| r.to_string()).collect(),
        series,
    }
}

/// Equal-width histogram over the numeric cells of `column`, one series per
/// distinct `split` value (or a single "count" series).
fn histogram(rows: &[&[Value]], column: usize, split: Option<usize>, bins: usize) -> MetricValue {
    let mut groups: BTreeMap<Option<&Value>, Vec<f64>> = BTreeMap::new();
    for row in rows {
        let Some(v) = row[column].as_f64() else {
            continue;
        };
        let key = match split {
            Some(s) if row[s].is_missing() => continue,
            Some(s) => Some(&row[s]),
            None => None,
        };
        groups.entry(key).or_default().push(v);
    }

    let values = groups.values().flatten().copied();
    let Some((min, max)) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    }) else {
        return MetricValue::Histogram {
            bins: Vec::new(),
            series: Vec::new(),
        };
    };

    let edges: Vec<Bin> = if min == max || bins <= 1 {
        let (start, end) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        vec![Bin { start, end }]
    } else {
        let width = (max - min) / bins as f64;
        (0..bins)
            .map(|i| Bin {
                start: min + width * i as f64,
                end: if i + 1 == bins {
                    max
                } else {
                    min + width * (i + 1) as f64
                },
            })
            .collect()
    };

    let last = edges.len() - 1;
    let bin_of = |v: f64| {
        if edges.len() == 1 {
            return 0;
        }
        let width = (max - min) / edges.len() as f64;
        (((v - min) / width).floor() as usize).min(last)
    };

    let series = groups
        .into_iter()
        .map(|(key, values)| {
            let mut counts = vec![0usize; edges.len()];
            for v in values {
                counts[bin_of(v)] += 1;
            }
            Series {
                name: key.map_or_else(|| "count".to_string(), Value::to_string),
                values: counts.into_iter().map(|c| Some(c as f64)).collect(),
            }
        })
        .collect();

    MetricValue::Histogram {
        bins: edges,
        series,
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Format a metric value for display. Undefined values show as "n/a".
pub fn format_value(value: Option<f64>, format: ValueFormat) -> String {
    let Some(v) = value else {
        return "n/a".to_string();
    };
    let text = format!("{:.*}", usize::from(format.decimals), v);
    if !format.grouped {
        return text;
    }

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int, frac) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(text.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
