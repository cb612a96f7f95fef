use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::{FilterOptions, Selection};
use crate::data::metrics::Metrics;
use crate::data::model::Value;
use crate::data::registry::{DatasetId, FilterDef, FilterKind};
use crate::export::ViewExport;
use crate::state::{AppState, Phase};
use crate::ui::{charts, table};

// ---------------------------------------------------------------------------
// Left side panel – dataset selector and filter widgets
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Dataset");
    let current = state.phase().dataset();
    egui::ComboBox::from_id_salt("dataset")
        .selected_text(current.map_or("Select a dataset…", DatasetId::name))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), "None").clicked() {
                state.deselect();
            }
            for id in DatasetId::ALL {
                if ui.selectable_label(current == Some(id), id.name()).clicked() {
                    state.select_dataset(id);
                }
            }
        });
    ui.separator();

    let Some(def) = state.dataset() else {
        ui.label("No dataset loaded.");
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Filters");
        if ui.small_button("Reset").clicked() {
            state.reset_filters();
        }
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for filter in def.filters {
                match state.filter_options(filter.name) {
                    FilterOptions::Values(values) if filter.kind == FilterKind::SingleSelect => {
                        single_select(ui, state, filter, &values)
                    }
                    FilterOptions::Values(values) => multi_select(ui, state, filter, &values),
                    FilterOptions::Numbers { min, max } => {
                        numeric_range(ui, state, filter, min, max)
                    }
                    FilterOptions::Dates { start, end } => {
                        date_range(ui, state, filter, start, end)
                    }
                    FilterOptions::Unavailable => {
                        ui.label(RichText::new(format!("{}: no data", filter.label)).weak());
                    }
                }
                ui.add_space(6.0);
            }
        });
}

fn single_select(ui: &mut Ui, state: &mut AppState, filter: &FilterDef, values: &[Value]) {
    let current = match state.selection().get(filter.name) {
        Some(Selection::One(v)) => Some(v.clone()),
        _ => None,
    };
    ui.strong(filter.label);
    egui::ComboBox::from_id_salt(filter.name)
        .selected_text(current.as_ref().map_or_else(|| "All".to_string(), Value::to_string))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), "All").clicked() {
                state.clear_filter(filter.name);
            }
            for v in values {
                if ui
                    .selectable_label(current.as_ref() == Some(v), v.to_string())
                    .clicked()
                {
                    state.set_filter(filter.name, Selection::One(v.clone()));
                }
            }
        });
}

fn multi_select(ui: &mut Ui, state: &mut AppState, filter: &FilterDef, values: &[Value]) {
    // An unset filter shows every box ticked.
    let selected = match state.selection().get(filter.name) {
        Some(Selection::Many(set)) => Some(set.clone()),
        _ => None,
    };
    let n_selected = selected.as_ref().map_or(values.len(), |s| s.len());
    let header_text = format!("{}  ({n_selected}/{})", filter.label, values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(filter.name)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(filter.name);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(filter.name);
                }
            });
            if n_selected == 0 {
                ui.label(RichText::new("Nothing selected: showing all").weak());
            }

            for v in values {
                let mut checked = selected.as_ref().map_or(true, |s| s.contains(v));
                if ui.checkbox(&mut checked, v.to_string()).changed() {
                    state.toggle_filter_value(filter.name, v);
                }
            }
        });
}

fn numeric_range(ui: &mut Ui, state: &mut AppState, filter: &FilterDef, min: f64, max: f64) {
    let (mut lo, mut hi) = match state.selection().get(filter.name) {
        Some(Selection::Between { min, max }) => (*min, *max),
        _ => (min, max),
    };
    let decimals = if min.fract() == 0.0 && max.fract() == 0.0 { 0 } else { 2 };

    ui.strong(filter.label);
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        changed |= ui
            .add(egui::DragValue::new(&mut lo).range(min..=max).max_decimals(decimals))
            .changed();
        ui.label("to");
        changed |= ui
            .add(egui::DragValue::new(&mut hi).range(min..=max).max_decimals(decimals))
            .changed();
    });
    if changed {
        state.set_filter(filter.name, Selection::Between { min: lo, max: hi });
    }
}

fn date_range(
    ui: &mut Ui,
    state: &mut AppState,
    filter: &FilterDef,
    start: NaiveDate,
    end: NaiveDate,
) {
    let (mut from, mut to) = match state.selection().get(filter.name) {
        Some(Selection::Dates { start, end }) => (*start, *end),
        _ => (start, end),
    };
    let before = (from, to);

    ui.strong(filter.label);
    ui.horizontal(|ui: &mut Ui| {
        ui.add(DatePickerButton::new(&mut from).id_salt(&format!("{}_from", filter.name)));
        ui.label("to");
        ui.add(DatePickerButton::new(&mut to).id_salt(&format!("{}_to", filter.name)));
    });
    if (from, to) != before {
        state.set_filter(filter.name, Selection::Dates { start: from, end: to });
    }
}

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the dashboard for the current phase.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    match state.phase() {
        Phase::Unselected => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Select a dataset in the side panel to begin.");
            });
        }
        Phase::Loading(id) => {
            let id = *id;
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    ui.spinner();
                    ui.label(format!("Loading {id}…"));
                });
            });
        }
        Phase::LoadFailed { error, .. } => {
            let error = error.clone();
            ui.vertical_centered(|ui: &mut Ui| {
                ui.add_space(40.0);
                ui.label(RichText::new(error).color(Color32::RED));
                ui.label("Check the data folder (File → Data folder…) or choose another dataset.");
            });
        }
        Phase::Loaded(_) | Phase::Filtered(_) => dashboard(ui, state),
    }
}

fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let mut show_raw = state.show_raw_table;
    let (Some(def), Some(table), Some(snapshot)) = (state.dataset(), state.table(), state.snapshot())
    else {
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(def.title);
            ui.add_space(4.0);
            metric_cards(ui, &snapshot.metrics);
            ui.separator();

            charts::chart_grid(ui, &snapshot.charts);
            ui.separator();

            ui.checkbox(&mut show_raw, "Show underlying data");
            if show_raw {
                table::raw_table(ui, &snapshot.view(table));
            }
        });

    state.show_raw_table = show_raw;
}

/// One card per count / scalar metric.
pub fn metric_cards(ui: &mut Ui, metrics: &Metrics) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for metric in metrics.scalars() {
            egui::Frame::group(ui.style())
                .inner_margin(8.0)
                .show(ui, |ui: &mut Ui| {
                    ui.vertical(|ui: &mut Ui| {
                        ui.label(RichText::new(metric.label).small());
                        ui.label(RichText::new(metric.display()).heading().strong());
                    });
                });
        }
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Data folder…").clicked() {
                choose_data_dir(state);
                ui.close_menu();
            }
            let has_dataset = state.phase().dataset().is_some();
            if ui
                .add_enabled(has_dataset, egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
            if ui
                .add_enabled(state.snapshot().is_some(), egui::Button::new("Export view…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(dir) = state.data_dir() {
            ui.label(format!("Data: {}", dir.display()));
            ui.separator();
        }

        if let (Some(table), Some(snapshot)) = (state.table(), state.snapshot()) {
            ui.label(format!(
                "{} rows loaded, {} visible",
                table.len(),
                snapshot.rows.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn choose_data_dir(state: &mut AppState) {
    let mut dialog = rfd::FileDialog::new().set_title("Choose the data folder");
    if let Some(dir) = state.data_dir() {
        dialog = dialog.set_directory(dir);
    }
    if let Some(dir) = dialog.pick_folder() {
        state.set_data_dir(dir);
    }
}

pub fn export_dialog(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export current view")
        .add_filter("JSON", &["json"])
        .set_file_name("dashboard_view.json")
        .save_file()
    else {
        return;
    };

    let result = match ViewExport::from_state(state) {
        Some(export) => export.write(&path),
        None => return,
    };
    match result {
        Ok(()) => state.status_message = None,
        Err(e) => {
            log::error!("Failed to export view: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
