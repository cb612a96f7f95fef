use eframe::egui::{Align, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::FilteredView;
use crate::data::model::Value;

const ROW_HEIGHT: f32 = 18.0;

/// The filtered rows, every column, virtualised.
pub fn raw_table(ui: &mut Ui, view: &FilteredView<'_>) {
    let table = view.table();
    let columns = table.columns();
    ui.label(format!("{} of {} rows", view.len(), table.len()));

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(Layout::left_to_right(Align::Center))
        .columns(Column::auto().at_least(60.0).clip(true), columns.len())
        .min_scrolled_height(0.0)
        .max_scroll_height(320.0)
        .header(ROW_HEIGHT + 2.0, |mut header| {
            for column in columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(&column.name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, view.len(), |mut row| {
                let cells = table.row(view.indices()[row.index()]);
                for cell in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell_text(cell));
                    });
                }
            });
        });
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Missing => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cells_render_blank() {
        assert_eq!(cell_text(&Value::Missing), "");
        assert_eq!(cell_text(&Value::Integer(2006)), "2006");
        assert_eq!(cell_text(&Value::text("PS2")), "PS2");
    }
}
