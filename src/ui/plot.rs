use std::f32::consts::TAU;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Color32, Pos2, Sense, Shape, Stroke, Ui};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints};

use crate::color::ColorMap;
use crate::data::aggregate::AggregateView;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Bar charts (state counts, top categories)
// ---------------------------------------------------------------------------

/// One coloured bar per key, keys along the x axis in view order.
pub fn count_bar_chart(ui: &mut Ui, id: &str, x_label: &str, view: &AggregateView<String>) {
    if view.is_empty() {
        ui.label("No incidents match the current filters.");
        return;
    }

    let colors = ColorMap::new(view.keys());
    let bars: Vec<Bar> = view
        .entries
        .iter()
        .enumerate()
        .map(|(i, (key, count))| {
            Bar::new(i as f64, *count as f64)
                .name(key)
                .width(0.7)
                .fill(colors.color_for(key))
        })
        .collect();
    let labels: Vec<String> = view.keys().cloned().collect();

    let chart = BarChart::new(bars)
        .element_formatter(Box::new(|bar, _chart| format!("{}\nCount: {}", bar.name, bar.value)));

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(x_label)
        .y_axis_label("Count")
        .x_axis_formatter(move |mark, _range| category_tick(&labels, mark.value))
        .include_y(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(chart);
        });
}

/// Axis label for a categorical bar position; blank between bars.
fn category_tick(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > f64::EPSILON || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Pie chart (priority distribution)
// ---------------------------------------------------------------------------

/// Pie chart of `view` in its own order with a legend alongside.
pub fn pie_chart(ui: &mut Ui, view: &AggregateView<String>) {
    let total = view.total();
    if total == 0 {
        ui.label("No incidents match the current filters.");
        return;
    }

    let colors = ColorMap::new(view.keys());
    ui.horizontal(|ui: &mut Ui| {
        let (response, painter) =
            ui.allocate_painter(egui::vec2(CHART_HEIGHT, CHART_HEIGHT), Sense::hover());
        let center = response.rect.center();
        let radius = response.rect.width().min(response.rect.height()) * 0.45;

        // Slices start at twelve o'clock and run clockwise.
        let mut start = -TAU / 4.0;
        let mut slices = Vec::with_capacity(view.len());
        for (key, count) in &view.entries {
            let sweep = *count as f32 / total as f32 * TAU;
            paint_slice(&painter, center, radius, start, sweep, colors.color_for(key));
            slices.push((start, start + sweep, key, *count));
            start += sweep;
        }

        if let Some(pos) = response.hover_pos() {
            let offset = pos - center;
            if offset.length() <= radius {
                let mut angle = offset.y.atan2(offset.x);
                if angle < -TAU / 4.0 {
                    angle += TAU;
                }
                if let Some((_, _, key, count)) =
                    slices.iter().find(|(a, b, _, _)| angle >= *a && angle < *b)
                {
                    let pct = *count as f64 / total as f64 * 100.0;
                    response.on_hover_text(format!("{key}\nCount: {count} ({pct:.1}%)"));
                }
            }
        }

        ui.vertical(|ui: &mut Ui| {
            for (key, count) in &view.entries {
                ui.horizontal(|ui: &mut Ui| {
                    ui.colored_label(colors.color_for(key), "■");
                    let pct = *count as f64 / total as f64 * 100.0;
                    ui.label(format!("{key}  {count} ({pct:.1}%)"));
                });
            }
        });
    });
}

/// Fill one wedge as a fan of thin triangles so every piece stays convex.
fn paint_slice(
    painter: &egui::Painter,
    center: Pos2,
    radius: f32,
    start: f32,
    sweep: f32,
    color: Color32,
) {
    let steps = ((sweep / 0.05).ceil() as usize).max(1);
    let point = |angle: f32| center + radius * egui::vec2(angle.cos(), angle.sin());
    for i in 0..steps {
        let a = start + sweep * i as f32 / steps as f32;
        let b = start + sweep * (i + 1) as f32 / steps as f32;
        painter.add(Shape::convex_polygon(
            vec![center, point(a), point(b)],
            color,
            Stroke::NONE,
        ));
    }
}

// ---------------------------------------------------------------------------
// Line chart (incidents opened per day)
// ---------------------------------------------------------------------------

pub fn time_series_chart(ui: &mut Ui, view: &AggregateView<NaiveDate>) {
    if view.is_empty() {
        ui.label("No dated incidents match the current filters.");
        return;
    }

    let points: PlotPoints = view
        .entries
        .iter()
        .map(|(date, count)| [date.num_days_from_ce() as f64, *count as f64])
        .collect();

    let line = Line::new(points)
        .name("Incidents opened")
        .color(Color32::LIGHT_BLUE)
        .width(1.5);

    Plot::new("opened_over_time")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Count")
        .x_axis_formatter(|mark, _range| day_tick(mark.value))
        .label_formatter(|_name, value| format!("{}\nCount: {:.0}", day_tick(value.x), value.y))
        .include_y(0.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(line);
        });
}

fn day_tick(value: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
