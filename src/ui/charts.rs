use eframe::egui::{RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::ColorMap;
use crate::data::aggregate::Summary;

// ---------------------------------------------------------------------------
// Key metrics
// ---------------------------------------------------------------------------

/// Format an amount as whole pesos with `,` thousands separators: `$1,234,567`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

/// The three headline numbers, side by side.
pub fn metrics(ui: &mut Ui, summary: &Summary) {
    let cards = [
        ("Total Proyectos", summary.total_projects.to_string()),
        ("Financiamiento Innova Total", format_currency(summary.funding_total)),
        ("Aprobado Privado Total", format_currency(summary.private_total)),
    ];
    ui.columns(cards.len(), |cols| {
        for (col, (label, value)) in cols.iter_mut().zip(cards) {
            col.label(label);
            col.label(RichText::new(value).heading().strong());
        }
    });
}

// ---------------------------------------------------------------------------
// Category bar charts
// ---------------------------------------------------------------------------

/// One single-bar chart per label so the legend names every colour.
fn category_bars(
    pairs: &[(String, usize)],
    colors: &ColorMap,
    position: impl Fn(usize) -> f64,
    horizontal: bool,
) -> Vec<BarChart> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (label, count))| {
            let color = colors.color_for(label);
            let bar = Bar::new(position(i), *count as f64)
                .name(label)
                .fill(color)
                .width(0.8);
            let chart = BarChart::new(vec![bar]).name(label).color(color);
            if horizontal {
                chart.horizontal()
            } else {
                chart
            }
        })
        .collect()
}

/// Vertical bars, largest first from the left.
pub fn vertical_bar_chart(
    ui: &mut Ui,
    id: &str,
    title: &str,
    pairs: &[(String, usize)],
    colors: &ColorMap,
) {
    ui.heading(title);
    let charts = category_bars(pairs, colors, |i| i as f64, false);
    Plot::new(id)
        .legend(Legend::default())
        .height(260.0)
        .y_axis_label("Cantidad de Proyectos")
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// Horizontal bars stacked bottom-up in the given order; pass ascending
/// counts to get the largest at the top.
pub fn horizontal_bar_chart(
    ui: &mut Ui,
    id: &str,
    title: &str,
    pairs: &[(String, usize)],
    colors: &ColorMap,
) {
    ui.heading(title);
    let n = pairs.len();
    let charts = category_bars(pairs, colors, |i| i as f64, true);
    Plot::new(id)
        .legend(Legend::default())
        .height((n as f32 * 22.0).clamp(160.0, 480.0))
        .x_axis_label("Cantidad de Proyectos")
        .show_y(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(1000.0), "$1,000");
        assert_eq!(format_currency(12_345_678.4), "$12,345,678");
        assert_eq!(format_currency(-2500.0), "-$2,500");
    }
}
