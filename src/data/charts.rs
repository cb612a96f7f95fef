use serde::Serialize;

use super::metrics::{format_value, Bin, Category, Metric, MetricValue, Metrics, Series};
use super::registry::{Axis, ChartDef, ChartKind, DatasetDef};

/// Shown in place of a chart whose metric has no data.
pub const NO_DATA: &str = "No data available for the selected filters.";

/// Resolved data of a chart, already ordered and truncated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChartData {
    Categories(Vec<Category>),
    Series {
        categories: Vec<String>,
        series: Vec<Series>,
    },
    Histogram {
        bins: Vec<Bin>,
        series: Vec<Series>,
    },
    Empty,
}

impl ChartData {
    /// Number of points along the category axis.
    pub fn points(&self) -> usize {
        match self {
            ChartData::Categories(c) => c.len(),
            ChartData::Series { categories, .. } => categories.len(),
            ChartData::Histogram { bins, .. } => bins.len(),
            ChartData::Empty => 0,
        }
    }
}

/// Everything the renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: &'static str,
    pub kind: ChartKind,
    pub metric: &'static str,
    pub x: Axis,
    pub y: Axis,
    pub series: Option<Axis>,
    pub horizontal: bool,
    pub data: ChartData,
    /// When set the renderer shows this text instead of plotting.
    pub placeholder: Option<String>,
}

/// Build the dataset's charts, in declaration order, from computed metrics.
pub fn build_charts(metrics: &Metrics, def: &DatasetDef) -> Vec<ChartSpec> {
    def.charts
        .iter()
        .map(|chart| match metrics.get(chart.metric) {
            Some(metric) => build_chart(chart, metric),
            None => {
                log::warn!("chart '{}' has no metric '{}'", chart.title, chart.metric);
                spec(chart, ChartData::Empty, Some(NO_DATA.to_string()))
            }
        })
        .collect()
}

fn build_chart(chart: &ChartDef, metric: &Metric) -> ChartSpec {
    let data = match &metric.value {
        MetricValue::Breakdown(categories) => ChartData::Categories(categories.clone()),
        MetricValue::Table { categories, series } => ChartData::Series {
            categories: categories.clone(),
            series: series.clone(),
        },
        MetricValue::Histogram { bins, series } => ChartData::Histogram {
            bins: bins.clone(),
            series: series.clone(),
        },
        MetricValue::Count(_) | MetricValue::Scalar(_) => {
            log::warn!("chart '{}' cannot plot scalar '{}'", chart.title, metric.name);
            ChartData::Empty
        }
    };
    if metric.value.is_empty() || data == ChartData::Empty {
        return spec(chart, ChartData::Empty, Some(NO_DATA.to_string()));
    }

    let placeholder = (chart.kind.is_trend() && data.points() == 1)
        .then(|| single_point(chart, metric, &data));
    spec(chart, data, placeholder)
}

/// A trend over one point is not worth plotting; describe the point instead.
fn single_point(chart: &ChartDef, metric: &Metric, data: &ChartData) -> String {
    let (category, values): (&str, Vec<(Option<&str>, Option<f64>)>) = match data {
        ChartData::Categories(c) => (c[0].label.as_str(), vec![(None, Some(c[0].value))]),
        ChartData::Series { categories, series } => (
            categories[0].as_str(),
            series
                .iter()
                .map(|s| (Some(s.name.as_str()), s.values[0]))
                .collect(),
        ),
        ChartData::Histogram { .. } | ChartData::Empty => ("", Vec::new()),
    };

    let detail = match values.as_slice() {
        [(_, value)] => format!("{}: {}", chart.y.label, format_value(*value, metric.format)),
        many => many
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}: {}",
                    name.unwrap_or(chart.y.label),
                    format_value(*value, metric.format)
                )
            })
            .collect::<Vec<_>>()
            .join(", "),
    };
    format!(
        "Showing data only for {} {category} ({detail}).",
        chart.x.label.to_lowercase()
    )
}

fn spec(chart: &ChartDef, data: ChartData, placeholder: Option<String>) -> ChartSpec {
    ChartSpec {
        title: chart.title,
        kind: chart.kind,
        metric: chart.metric,
        x: chart.x,
        y: chart.y,
        series: chart.series,
        horizontal: chart.horizontal,
        data,
        placeholder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filters, FilterSelection, FilteredView, Selection};
    use crate::data::fixtures::MemorySource;
    use crate::data::loader::load;
    use crate::data::metrics::summarize;
    use crate::data::model::Value;
    use crate::data::registry::DatasetId;

    fn charts_for(id: DatasetId, selection: &FilterSelection) -> Vec<ChartSpec> {
        let def = id.def();
        let table = load(def, &MemorySource::with_fixtures()).unwrap();
        let view = apply_filters(&table, def.filters, selection);
        build_charts(&summarize(&view, def), def)
    }

    #[test]
    fn one_spec_per_declared_chart_in_order() {
        for id in DatasetId::ALL {
            let charts = charts_for(id, &FilterSelection::default());
            let titles: Vec<&str> = charts.iter().map(|c| c.title).collect();
            let declared: Vec<&str> = id.def().charts.iter().map(|c| c.title).collect();
            assert_eq!(titles, declared);
            for chart in &charts {
                assert!(chart.placeholder.is_none(), "{id}: {}", chart.title);
            }
        }
    }

    #[test]
    fn empty_metrics_still_emit_a_placeholder_spec() {
        let def = DatasetId::VideoGameSales.def();
        let table = load(def, &MemorySource::with_fixtures()).unwrap();
        let empty = FilteredView::from_indices(&table, Vec::new());
        let charts = build_charts(&summarize(&empty, def), def);

        assert_eq!(charts.len(), def.charts.len());
        for chart in charts {
            assert_eq!(chart.data, ChartData::Empty);
            assert_eq!(chart.placeholder.as_deref(), Some(NO_DATA));
        }
    }

    #[test]
    fn single_year_trend_is_described_not_plotted() {
        let mut selection = FilterSelection::default();
        selection.set(
            "year",
            Selection::Between {
                min: 2006.0,
                max: 2006.0,
            },
        );
        let charts = charts_for(DatasetId::VideoGameSales, &selection);

        let trend = charts
            .iter()
            .find(|c| c.kind == ChartKind::Line)
            .unwrap();
        assert_eq!(
            trend.placeholder.as_deref(),
            Some("Showing data only for year 2006 (Number of Games Released: 4).")
        );
        // Bar charts with one category are still drawn.
        assert!(charts
            .iter()
            .filter(|c| c.kind == ChartKind::Bar)
            .all(|c| c.placeholder.is_none()));
    }

    #[test]
    fn single_year_multi_series_lists_every_series() {
        let mut selection = FilterSelection::default();
        selection.set(
            "region",
            Selection::Many([Value::text("World")].into_iter().collect()),
        );
        selection.set(
            "year",
            Selection::Between {
                min: 2021.0,
                max: 2021.0,
            },
        );
        let charts = charts_for(DatasetId::EvSales, &selection);
        let stacked = charts
            .iter()
            .find(|c| c.kind == ChartKind::StackedBar)
            .unwrap();
        assert_eq!(
            stacked.placeholder.as_deref(),
            Some("Showing data only for year 2021 (BEV: 11,000,000, PHEV: 5,000,000).")
        );
    }

    #[test]
    fn spec_carries_axes_and_orientation() {
        let charts = charts_for(DatasetId::CouplesSurvey, &FilterSelection::default());
        let grouped = &charts[1];
        assert_eq!(grouped.kind, ChartKind::Bar);
        assert_eq!(grouped.series.map(|s| s.field), Some("relationship_quality"));
        assert!(!grouped.horizontal);
        match &grouped.data {
            ChartData::Series { categories, series } => {
                assert_eq!(categories.len(), 2);
                assert_eq!(series.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }

        let sales = charts_for(DatasetId::VideoGameSales, &FilterSelection::default());
        assert!(sales[0].horizontal);
        assert_eq!(sales[0].x.label, "Genre");
    }
}
