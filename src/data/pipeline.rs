use std::time::Instant;

use super::charts::{build_charts, ChartSpec};
use super::filter::{apply_filters, FilterSelection, FilteredView};
use super::metrics::{summarize, Metrics};
use super::model::Table;
use super::registry::DatasetDef;

/// Result of one filter → summarize → chart pass over a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Indices of the rows passing the filters, in table order.
    pub rows: Vec<usize>,
    pub metrics: Metrics,
    pub charts: Vec<ChartSpec>,
}

impl Snapshot {
    /// Borrow the filtered rows back out of `table`.
    pub fn view<'a>(&self, table: &'a Table) -> FilteredView<'a> {
        FilteredView::from_indices(table, self.rows.clone())
    }
}

/// Run the full pipeline for one interaction. Never fails: an empty result
/// yields zero metrics and placeholder charts.
pub fn recompute(table: &Table, def: &DatasetDef, selection: &FilterSelection) -> Snapshot {
    let started = Instant::now();
    let view = apply_filters(table, def.filters, selection);
    let metrics = summarize(&view, def);
    let charts = build_charts(&metrics, def);
    log::debug!(
        "{}: {} of {} rows after filtering, recomputed in {:?}",
        def.id,
        view.len(),
        table.len(),
        started.elapsed()
    );
    Snapshot {
        rows: view.into_indices(),
        metrics,
        charts,
    }
}
