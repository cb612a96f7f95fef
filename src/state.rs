use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::cache::{SessionId, TableCache};
use crate::data::filter::{filter_options, FilterOptions, FilterSelection, Selection};
use crate::data::loader::{DirectorySource, TableSource};
use crate::data::model::{Table, Value};
use crate::data::pipeline::{recompute, Snapshot};
use crate::data::registry::{DatasetDef, DatasetId};

// ---------------------------------------------------------------------------
// Session phase
// ---------------------------------------------------------------------------

/// Where the session is in its dataset lifecycle.
///
/// `Unselected → Loading → Loaded ⇄ Filtered`, and `Loading → LoadFailed`
/// whose only way out is back to `Unselected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Unselected,
    Loading(DatasetId),
    /// Loaded with no active filter.
    Loaded(DatasetId),
    Filtered(DatasetId),
    LoadFailed { dataset: DatasetId, error: String },
}

impl Phase {
    /// The dataset the phase refers to, if any.
    pub fn dataset(&self) -> Option<DatasetId> {
        match self {
            Phase::Unselected => None,
            Phase::Loading(id) | Phase::Loaded(id) | Phase::Filtered(id) => Some(*id),
            Phase::LoadFailed { dataset, .. } => Some(*dataset),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Phase::Loaded(_) | Phase::Filtered(_))
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    session: SessionId,
    cache: TableCache,
    source: Box<dyn TableSource>,
    /// Shown in the top bar; `None` for non-directory sources.
    data_dir: Option<PathBuf>,

    phase: Phase,
    /// Table of the selected dataset, shared with the cache.
    table: Option<Arc<Table>>,
    selection: FilterSelection,
    /// Filtered rows, metrics and charts for the current selection.
    snapshot: Option<Snapshot>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
    /// Whether the "Show underlying data" table is expanded.
    pub show_raw_table: bool,
}

impl AppState {
    pub fn new(source: Box<dyn TableSource>) -> Self {
        Self {
            session: SessionId::fresh(),
            cache: TableCache::default(),
            source,
            data_dir: None,
            phase: Phase::Unselected,
            table: None,
            selection: FilterSelection::default(),
            snapshot: None,
            status_message: None,
            show_raw_table: false,
        }
    }

    /// Reads from the configured directory and opens the initial dataset.
    pub fn from_config(config: &DashboardConfig) -> Self {
        let mut state = Self::new(Box::new(DirectorySource::new(&config.data_dir)));
        state.data_dir = Some(config.data_dir.clone());
        if let Some(id) = config.initial_dataset {
            state.select_dataset(id);
        }
        state
    }

    // -- Accessors --

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Definition of the selected dataset while it is usable.
    pub fn dataset(&self) -> Option<&'static DatasetDef> {
        self.phase
            .is_ready()
            .then(|| self.phase.dataset())
            .flatten()
            .map(DatasetId::def)
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_deref()
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    // -- Dataset lifecycle --

    /// Switch to `id`, loading it through the session cache.
    pub fn select_dataset(&mut self, id: DatasetId) {
        if self.phase.is_ready() && self.phase.dataset() == Some(id) {
            return;
        }
        if matches!(self.phase, Phase::LoadFailed { .. }) {
            self.deselect();
        }
        self.selection.reset();
        self.load(id);
    }

    /// Back to the empty dashboard.
    pub fn deselect(&mut self) {
        self.phase = Phase::Unselected;
        self.table = None;
        self.snapshot = None;
        self.selection.reset();
        self.status_message = None;
    }

    /// Re-read the selected dataset from its source, keeping the selection.
    pub fn reload(&mut self) {
        let Some(id) = self.phase.dataset() else {
            return;
        };
        self.cache.invalidate(self.session, id);
        if matches!(self.phase, Phase::LoadFailed { .. }) {
            self.phase = Phase::Unselected;
            self.selection.reset();
        }
        self.load(id);
    }

    /// Read datasets from `dir` from now on. Drops every cached table of the
    /// session and reloads the selected dataset.
    pub fn set_data_dir(&mut self, dir: PathBuf) {
        log::info!("data directory set to {}", dir.display());
        self.source = Box::new(DirectorySource::new(&dir));
        self.data_dir = Some(dir);
        let dropped = self.cache.invalidate_session(self.session);
        log::debug!("invalidated {dropped} cached table(s)");
        if self.phase.dataset().is_some() {
            self.reload();
        }
    }

    fn load(&mut self, id: DatasetId) {
        self.phase = Phase::Loading(id);
        self.table = None;
        self.snapshot = None;

        match self.cache.load(self.session, id, self.source.as_ref()) {
            Ok(table) => {
                if table.is_empty() {
                    log::warn!("{id} has no rows");
                }
                self.table = Some(table);
                log::debug!("{} table(s) cached", self.cache.len());
                self.status_message = None;
                self.phase = Phase::Loaded(id);
                self.refilter();
            }
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(format!("Error: {e}"));
                self.phase = Phase::LoadFailed {
                    dataset: id,
                    error: e.to_string(),
                };
            }
        }
    }

    // -- Filters --

    /// Replace one filter's selection. Ignored unless a dataset is loaded.
    pub fn set_filter(&mut self, filter: &str, selection: Selection) {
        if !self.phase.is_ready() {
            log::debug!("ignoring filter '{filter}' in phase {:?}", self.phase);
            return;
        }
        self.selection.set(filter, selection);
        self.refilter();
    }

    pub fn clear_filter(&mut self, filter: &str) {
        if !self.phase.is_ready() {
            return;
        }
        self.selection.clear(filter);
        self.refilter();
    }

    /// Clear every filter.
    pub fn reset_filters(&mut self) {
        if !self.phase.is_ready() {
            return;
        }
        self.selection.reset();
        self.refilter();
    }

    /// Toggle a single value in a multi-select filter. An unset filter counts
    /// as every value being selected.
    pub fn toggle_filter_value(&mut self, filter: &str, value: &Value) {
        let mut selected = match self.selection.get(filter) {
            Some(Selection::Many(set)) => set.clone(),
            _ => self.all_values(filter),
        };
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.set_filter(filter, Selection::Many(selected));
    }

    /// Select every value of a multi-select filter.
    pub fn select_all(&mut self, filter: &str) {
        let all = self.all_values(filter);
        self.set_filter(filter, Selection::Many(all));
    }

    /// Deselect every value. An empty multi-select restricts nothing.
    pub fn select_none(&mut self, filter: &str) {
        self.set_filter(filter, Selection::Many(BTreeSet::new()));
    }

    /// Options the UI offers for `filter` on the loaded table.
    pub fn filter_options(&self, filter: &str) -> FilterOptions {
        match (self.table(), self.dataset().and_then(|d| d.filter(filter))) {
            (Some(table), Some(def)) => filter_options(table, def),
            _ => FilterOptions::Unavailable,
        }
    }

    fn all_values(&self, filter: &str) -> BTreeSet<Value> {
        match self.filter_options(filter) {
            FilterOptions::Values(values) => values.into_iter().collect(),
            _ => BTreeSet::new(),
        }
    }

    /// Recompute the snapshot after a selection change and move between
    /// `Loaded` and `Filtered`.
    pub fn refilter(&mut self) {
        let (Some(table), Some(id)) = (&self.table, self.phase.dataset()) else {
            return;
        };
        let def = id.def();
        let snapshot = recompute(table, def, &self.selection);
        self.phase = if self.selection.is_empty() {
            Phase::Loaded(id)
        } else {
            Phase::Filtered(id)
        };
        self.snapshot = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{MemorySource, VGSALES_ROWS};

    fn state() -> AppState {
        AppState::new(Box::new(MemorySource::with_fixtures()))
    }

    fn rows(state: &AppState) -> usize {
        state.snapshot().map_or(0, |s| s.rows.len())
    }

    #[test]
    fn select_filter_and_reset_walk_the_phases() {
        let mut state = state();
        assert_eq!(*state.phase(), Phase::Unselected);
        assert!(state.snapshot().is_none());

        state.select_dataset(DatasetId::VideoGameSales);
        assert_eq!(*state.phase(), Phase::Loaded(DatasetId::VideoGameSales));
        assert_eq!(rows(&state), VGSALES_ROWS);

        state.set_filter("platform", Selection::One(Value::text("Wii")));
        assert_eq!(*state.phase(), Phase::Filtered(DatasetId::VideoGameSales));
        assert_eq!(rows(&state), 3);

        state.set_filter("genre", Selection::Many([Value::text("Racing")].into()));
        assert_eq!(*state.phase(), Phase::Filtered(DatasetId::VideoGameSales));
        assert_eq!(rows(&state), 1);

        state.reset_filters();
        assert_eq!(*state.phase(), Phase::Loaded(DatasetId::VideoGameSales));
        assert_eq!(rows(&state), VGSALES_ROWS);
    }

    #[test]
    fn failed_load_only_exits_to_unselected() {
        let source = MemorySource::with_fixtures().without("vgsales.csv");
        let mut state = AppState::new(Box::new(source));

        state.select_dataset(DatasetId::VideoGameSales);
        match state.phase() {
            Phase::LoadFailed { dataset, error } => {
                assert_eq!(*dataset, DatasetId::VideoGameSales);
                assert!(error.contains("data unavailable"), "{error}");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(state.status_message.is_some());
        assert!(state.snapshot().is_none());

        // Filters cannot move a failed session forward.
        state.set_filter("genre", Selection::All);
        assert!(matches!(state.phase(), Phase::LoadFailed { .. }));

        // Another dataset still loads.
        state.select_dataset(DatasetId::EvSales);
        assert_eq!(*state.phase(), Phase::Loaded(DatasetId::EvSales));
        assert!(state.status_message.is_none());

        state.deselect();
        assert_eq!(*state.phase(), Phase::Unselected);
        assert!(state.table().is_none());
    }

    #[test]
    fn filters_are_ignored_without_a_dataset() {
        let mut state = state();
        state.set_filter("genre", Selection::Many([Value::text("Sports")].into()));
        state.select_none("genre");
        assert_eq!(*state.phase(), Phase::Unselected);
        assert!(state.selection().is_empty());
    }

    #[test]
    fn switching_datasets_resets_the_selection() {
        let mut state = state();
        state.select_dataset(DatasetId::CouplesSurvey);
        state.set_filter("quality", Selection::One(Value::text("good")));
        assert_eq!(rows(&state), 2);

        state.select_dataset(DatasetId::MicroenterpriseTaxpayers);
        assert!(state.selection().is_empty());
        assert_eq!(rows(&state), 5);
    }

    #[test]
    fn toggling_starts_from_every_value() {
        let mut state = state();
        state.select_dataset(DatasetId::VideoGameSales);

        state.toggle_filter_value("genre", &Value::text("Sports"));
        match state.selection().get("genre") {
            Some(Selection::Many(set)) => {
                assert_eq!(set.len(), 3);
                assert!(!set.contains(&Value::text("Sports")));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(rows(&state), 4);

        state.select_none("genre");
        assert_eq!(rows(&state), VGSALES_ROWS);

        state.select_all("genre");
        assert_eq!(rows(&state), VGSALES_ROWS);
    }

    #[test]
    fn reload_rereads_and_keeps_the_selection() {
        let mut state = state();
        state.select_dataset(DatasetId::VideoGameSales);
        state.set_filter("platform", Selection::One(Value::text("PS2")));
        let before = state.snapshot().cloned();

        state.reload();
        assert_eq!(*state.phase(), Phase::Filtered(DatasetId::VideoGameSales));
        assert_eq!(state.snapshot().cloned(), before);
        assert_eq!(rows(&state), 4);
    }

    #[test]
    fn reselecting_the_current_dataset_keeps_filters() {
        let mut state = state();
        state.select_dataset(DatasetId::EvSales);
        state.set_filter("region", Selection::Many([Value::text("China")].into()));
        state.select_dataset(DatasetId::EvSales);
        assert_eq!(rows(&state), 3);
    }
}
