use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use eframe::egui::{self, RichText, Sense, Shape, Stroke, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::ColorMap;
use crate::data::charts::{ChartData, ChartSpec};
use crate::data::metrics::{Bin, Category, Series};
use crate::data::registry::ChartKind;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Chart grid (central panel)
// ---------------------------------------------------------------------------

/// Lay the charts out two per row.
pub fn chart_grid(ui: &mut Ui, charts: &[ChartSpec]) {
    for pair in charts.chunks(2) {
        ui.columns(2, |columns: &mut [Ui]| {
            for (ui, chart) in columns.iter_mut().zip(pair) {
                chart_card(ui, chart);
            }
        });
        ui.add_space(12.0);
    }
}

fn chart_card(ui: &mut Ui, chart: &ChartSpec) {
    ui.strong(chart.title);

    if let Some(text) = &chart.placeholder {
        ui.allocate_ui(egui::vec2(ui.available_width(), CHART_HEIGHT), |ui: &mut Ui| {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(RichText::new(text).italics().weak());
            });
        });
        return;
    }

    match (&chart.data, chart.kind) {
        (ChartData::Categories(categories), ChartKind::Pie) => pie_chart(ui, categories),
        (ChartData::Categories(categories), ChartKind::Line) => {
            let series = Series {
                name: chart.y.label.to_string(),
                values: categories.iter().map(|c| Some(c.value)).collect(),
            };
            let labels: Vec<String> = categories.iter().map(|c| c.label.clone()).collect();
            line_chart(ui, chart, &labels, std::slice::from_ref(&series));
        }
        (ChartData::Categories(categories), _) => bar_chart(ui, chart, categories),
        (ChartData::Series { categories, series }, ChartKind::Line) => {
            line_chart(ui, chart, categories, series)
        }
        (ChartData::Series { categories, series }, ChartKind::StackedBar) => {
            stacked_bar_chart(ui, chart, categories, series)
        }
        (ChartData::Series { categories, series }, _) => {
            grouped_bar_chart(ui, chart, categories, series)
        }
        (ChartData::Histogram { bins, series }, _) => histogram(ui, chart, bins, series),
        (ChartData::Empty, _) => {
            ui.label(RichText::new("No data").italics().weak());
        }
    }
}

// ---------------------------------------------------------------------------
// Plot helpers
// ---------------------------------------------------------------------------

fn base_plot(chart: &ChartSpec) -> Plot<'static> {
    let (x_label, y_label) = if chart.horizontal {
        (chart.y.label, chart.x.label)
    } else {
        (chart.x.label, chart.y.label)
    };
    Plot::new(chart.title)
        .height(CHART_HEIGHT)
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .allow_scroll(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_zoom(true)
}

/// Axis formatter that prints `labels[i]` at integer position `i`.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let i = mark.value.round();
        if (mark.value - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        labels.get(i as usize).cloned().unwrap_or_default()
    }
}

/// Numeric x positions when every label parses (years), otherwise indices.
fn positions(labels: &[String]) -> (Vec<f64>, bool) {
    let parsed: Option<Vec<f64>> = labels.iter().map(|l| l.parse::<f64>().ok()).collect();
    match parsed {
        Some(xs) => (xs, true),
        None => ((0..labels.len()).map(|i| i as f64).collect(), false),
    }
}

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, chart: &ChartSpec, categories: &[Category]) {
    let colors = ColorMap::new(categories.iter().map(|c| c.label.as_str()));
    let n = categories.len();

    // Horizontal charts list the first (largest) category at the top.
    let position = |i: usize| if chart.horizontal { (n - 1 - i) as f64 } else { i as f64 };
    let bars: Vec<Bar> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Bar::new(position(i), c.value)
                .name(&c.label)
                .fill(colors.color_for(&c.label))
                .width(0.7)
        })
        .collect();

    let mut labels = vec![String::new(); n];
    for (i, c) in categories.iter().enumerate() {
        labels[position(i) as usize] = c.label.clone();
    }

    let mut bar_chart = BarChart::new(bars).name(chart.y.label);
    let mut plot = base_plot(chart);
    if chart.horizontal {
        bar_chart = bar_chart.horizontal();
        plot = plot.y_axis_formatter(category_axis(labels));
    } else {
        plot = plot.x_axis_formatter(category_axis(labels));
    }
    plot.show(ui, |plot_ui| plot_ui.bar_chart(bar_chart));
}

fn grouped_bar_chart(ui: &mut Ui, chart: &ChartSpec, categories: &[String], series: &[Series]) {
    let colors = ColorMap::new(series.iter().map(|s| s.name.as_str()));
    let width = 0.8 / series.len().max(1) as f64;
    let centre = (series.len() as f64 - 1.0) / 2.0;

    let charts: Vec<BarChart> = series
        .iter()
        .enumerate()
        .map(|(j, s)| {
            let offset = (j as f64 - centre) * width;
            let bars = s
                .values
                .iter()
                .enumerate()
                .filter_map(|(i, v)| {
                    v.map(|v| Bar::new(i as f64 + offset, v).width(width * 0.95))
                })
                .collect();
            BarChart::new(bars)
                .name(&s.name)
                .color(colors.color_for(&s.name))
        })
        .collect();

    base_plot(chart)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(categories.to_vec()))
        .show(ui, |plot_ui| {
            for c in charts {
                plot_ui.bar_chart(c);
            }
        });
}

fn stacked_bar_chart(ui: &mut Ui, chart: &ChartSpec, categories: &[String], series: &[Series]) {
    let colors = ColorMap::new(series.iter().map(|s| s.name.as_str()));
    let (xs, numeric) = positions(categories);

    let mut stacked: Vec<BarChart> = Vec::with_capacity(series.len());
    for s in series {
        let bars = xs
            .iter()
            .zip(&s.values)
            .map(|(x, v)| Bar::new(*x, v.unwrap_or(0.0)).width(0.7))
            .collect();
        let below: Vec<&BarChart> = stacked.iter().collect();
        let layer = BarChart::new(bars)
            .name(&s.name)
            .color(colors.color_for(&s.name))
            .stack_on(&below);
        stacked.push(layer);
    }

    let mut plot = base_plot(chart).legend(Legend::default());
    if !numeric {
        plot = plot.x_axis_formatter(category_axis(categories.to_vec()));
    }
    plot.show(ui, |plot_ui| {
        for layer in stacked {
            plot_ui.bar_chart(layer);
        }
    });
}

fn line_chart(ui: &mut Ui, chart: &ChartSpec, categories: &[String], series: &[Series]) {
    let colors = ColorMap::new(series.iter().map(|s| s.name.as_str()));
    let (xs, numeric) = positions(categories);

    let mut plot = base_plot(chart);
    if series.len() > 1 {
        plot = plot.legend(Legend::default());
    }
    if !numeric {
        plot = plot.x_axis_formatter(category_axis(categories.to_vec()));
    }
    plot.show(ui, |plot_ui| {
        for s in series {
            let color = colors.color_for(&s.name);
            let points: Vec<[f64; 2]> = xs
                .iter()
                .zip(&s.values)
                .filter_map(|(x, v)| v.map(|v| [*x, v]))
                .collect();
            plot_ui.line(
                Line::new(PlotPoints::new(points.clone()))
                    .name(&s.name)
                    .color(color)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(PlotPoints::new(points))
                    .name(&s.name)
                    .color(color)
                    .radius(3.0),
            );
        }
    });
}

fn histogram(ui: &mut Ui, chart: &ChartSpec, bins: &[Bin], series: &[Series]) {
    let colors = ColorMap::new(series.iter().map(|s| s.name.as_str()));
    let layered = series.len() > 1;

    let charts: Vec<BarChart> = series
        .iter()
        .map(|s| {
            let color = colors.color_for(&s.name);
            let fill = if layered { color.gamma_multiply(0.6) } else { color };
            let bars = bins
                .iter()
                .zip(&s.values)
                .map(|(bin, v)| {
                    Bar::new((bin.start + bin.end) / 2.0, v.unwrap_or(0.0))
                        .width(bin.end - bin.start)
                        .fill(fill)
                        .stroke(Stroke::new(1.0, color))
                })
                .collect();
            BarChart::new(bars).name(&s.name).color(color)
        })
        .collect();

    let mut plot = base_plot(chart);
    if layered {
        plot = plot.legend(Legend::default());
    }
    plot.show(ui, |plot_ui| {
        for c in charts {
            plot_ui.bar_chart(c);
        }
    });
}

/// Pie chart drawn directly with the painter, legend on the right.
fn pie_chart(ui: &mut Ui, categories: &[Category]) {
    let total: f64 = categories.iter().map(|c| c.value.max(0.0)).sum();
    if total <= 0.0 {
        ui.label(RichText::new("No data").italics().weak());
        return;
    }
    let colors = ColorMap::new(categories.iter().map(|c| c.label.as_str()));

    ui.horizontal(|ui: &mut Ui| {
        let size = CHART_HEIGHT.min(ui.available_width() * 0.6);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(size, size), Sense::hover());
        let painter = ui.painter_at(rect);
        let center = rect.center();
        let radius = size * 0.45;

        // Start at twelve o'clock and go clockwise.
        let mut angle = -TAU / 4.0;
        for c in categories {
            let sweep = (c.value.max(0.0) / total) as f32 * TAU;
            let steps = ((sweep / 0.05).ceil() as usize).max(1);
            let color = colors.color_for(&c.label);
            for k in 0..steps {
                let a0 = angle + sweep * k as f32 / steps as f32;
                let a1 = angle + sweep * (k + 1) as f32 / steps as f32;
                painter.add(Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * egui::vec2(a0.cos(), a0.sin()),
                        center + radius * egui::vec2(a1.cos(), a1.sin()),
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
            angle += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for ((label, color), c) in colors.legend_entries().into_iter().zip(categories) {
                let pct = c.value / total * 100.0;
                ui.label(
                    RichText::new(format!("■ {label}: {} ({pct:.1}%)", c.value)).color(color),
                );
            }
        });
    });
}
