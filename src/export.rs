use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::charts::ChartSpec;
use crate::data::filter::FilterSelection;
use crate::data::metrics::Metrics;
use crate::data::registry::DatasetId;
use crate::state::AppState;

/// Serializable picture of what the dashboard currently shows.
#[derive(Debug, Serialize)]
pub struct ViewExport<'a> {
    pub dataset: DatasetId,
    pub title: &'static str,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub selection: &'a FilterSelection,
    pub metrics: &'a Metrics,
    pub charts: &'a [ChartSpec],
}

impl<'a> ViewExport<'a> {
    /// `None` until a dataset is loaded.
    pub fn from_state(state: &'a AppState) -> Option<Self> {
        let def = state.dataset()?;
        let table = state.table()?;
        let snapshot = state.snapshot()?;
        Some(ViewExport {
            dataset: def.id,
            title: def.title,
            total_rows: table.len(),
            filtered_rows: snapshot.rows.len(),
            selection: state.selection(),
            metrics: &snapshot.metrics,
            charts: &snapshot.charts,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize the current view")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("exported {} view to {}", self.dataset, path.display());
        Ok(())
    }
}
