use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::color::{generate_palette, to_hex};
use crate::data::aggregate::{category_counts, AggregateView};
use crate::data::model::IncidentTable;

const CHART_WIDTH: usize = 900;
const CHART_HEIGHT: usize = 480;
const MARGIN_LEFT: usize = 70;
const MARGIN_RIGHT: usize = 20;
const MARGIN_TOP: usize = 60;
const MARGIN_BOTTOM: usize = 130;

/// Write the top-`top_n` category bar chart of the whole table to a
/// standalone HTML file.
pub fn write_category_chart(table: &IncidentTable, path: &Path, top_n: usize) -> Result<()> {
    let html = category_chart_html(table, top_n);
    std::fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Category chart written to {}", path.display());
    Ok(())
}

/// Render the category chart as a self-contained HTML page with inline SVG.
pub fn category_chart_html(table: &IncidentTable, top_n: usize) -> String {
    let counts = category_counts(table, top_n);
    let title = format!("Top {top_n} Incident Categories");

    let mut out = String::new();
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"en\">");
    let _ = writeln!(out, "<head>");
    let _ = writeln!(out, "<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>{}</title>", escape(&title));
    let _ = writeln!(
        out,
        "<style>body{{font-family:sans-serif;margin:2em;}} svg text{{font-size:12px;}}</style>"
    );
    let _ = writeln!(out, "</head>");
    let _ = writeln!(out, "<body>");
    out.push_str(&bar_chart_svg(&title, &counts));
    let _ = writeln!(out, "</body>");
    let _ = writeln!(out, "</html>");
    out
}

fn bar_chart_svg(title: &str, counts: &AggregateView<String>) -> String {
    let plot_w = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_h;
    let max = counts.max_count().max(1) as f64;
    let colors = generate_palette(counts.len());

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CHART_WIDTH}\" height=\"{CHART_HEIGHT}\" viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\">"
    );
    let _ = writeln!(
        svg,
        "<text x=\"{}\" y=\"30\" text-anchor=\"middle\" style=\"font-size:18px\">{}</text>",
        CHART_WIDTH / 2,
        escape(title)
    );

    // Axes
    let _ = writeln!(
        svg,
        "<line x1=\"{MARGIN_LEFT}\" y1=\"{MARGIN_TOP}\" x2=\"{MARGIN_LEFT}\" y2=\"{baseline}\" stroke=\"#444\"/>"
    );
    let _ = writeln!(
        svg,
        "<line x1=\"{MARGIN_LEFT}\" y1=\"{baseline}\" x2=\"{}\" y2=\"{baseline}\" stroke=\"#444\"/>",
        MARGIN_LEFT + plot_w
    );
    let _ = writeln!(
        svg,
        "<text x=\"18\" y=\"{}\" text-anchor=\"middle\" transform=\"rotate(-90 18 {})\">Number of Incidents</text>",
        MARGIN_TOP + plot_h / 2,
        MARGIN_TOP + plot_h / 2
    );
    let _ = writeln!(
        svg,
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\">Incident Category</text>",
        MARGIN_LEFT + plot_w / 2,
        CHART_HEIGHT - 10
    );

    if counts.is_empty() {
        let _ = writeln!(
            svg,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\">No incidents</text>",
            MARGIN_LEFT + plot_w / 2,
            MARGIN_TOP + plot_h / 2
        );
    }

    let slot = plot_w as f64 / counts.len().max(1) as f64;
    let bar_w = slot * 0.7;
    for (i, ((category, count), color)) in counts.entries.iter().zip(&colors).enumerate() {
        let h = *count as f64 / max * plot_h as f64;
        let x = MARGIN_LEFT as f64 + slot * i as f64 + (slot - bar_w) / 2.0;
        let y = baseline as f64 - h;
        let label = escape(category);
        let _ = writeln!(
            svg,
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_w:.1}\" height=\"{h:.1}\" fill=\"{}\"><title>{label}: {count}</title></rect>",
            to_hex(*color)
        );
        let _ = writeln!(
            svg,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{count}</text>",
            x + bar_w / 2.0,
            y - 4.0
        );
        let lx = x + bar_w / 2.0;
        let ly = baseline + 14;
        let _ = writeln!(
            svg,
            "<text x=\"{lx:.1}\" y=\"{ly}\" text-anchor=\"end\" transform=\"rotate(-40 {lx:.1} {ly})\">{label}</text>"
        );
    }

    let _ = writeln!(svg, "</svg>");
    svg
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::table_from;

    #[test]
    fn chart_lists_top_categories_with_counts() -> Result<()> {
        let table = table_from(&[
            ("INC001", "01/01/2024 09:00", "Network", "2 - High", "New", "Ops", "true"),
            ("INC002", "01/01/2024 09:00", "Network", "2 - High", "New", "Ops", "true"),
            ("INC003", "01/01/2024 09:00", "Database", "2 - High", "New", "Ops", "true"),
            ("INC004", "01/01/2024 09:00", "Email", "2 - High", "New", "Ops", "true"),
        ])?;

        let html = category_chart_html(&table, 2);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Top 2 Incident Categories"));
        assert!(html.contains("<title>Network: 2</title>"));
        assert!(html.contains("<title>Database: 1</title>"));
        assert!(!html.contains("Email"));
        assert_eq!(html.matches("<rect").count(), 2);
        Ok(())
    }

    #[test]
    fn labels_are_escaped() -> Result<()> {
        let table = table_from(&[(
            "INC001",
            "01/01/2024 09:00",
            "R&D <lab>",
            "2 - High",
            "New",
            "Ops",
            "true",
        )])?;

        let html = category_chart_html(&table, 10);
        assert!(html.contains("R&amp;D &lt;lab&gt;"));
        assert!(!html.contains("<lab>"));
        Ok(())
    }

    #[test]
    fn writes_file() -> Result<()> {
        let table = table_from(&[])?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("incident_categories_plot.html");

        write_category_chart(&table, &path, 10)?;
        let written = std::fs::read_to_string(&path)?;
        assert!(written.contains("No incidents"));
        Ok(())
    }
}
