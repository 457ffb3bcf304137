use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use crate::map::terminal::ChartModal;
use crate::timeseries::TimeSeriesChart;
use crate::ui::widgets::popup::centered_rect;

/// (x, y) pairs for the chart, x being the point's position in the series
#[allow(clippy::cast_precision_loss)]
pub fn series_data(chart: &TimeSeriesChart) -> Vec<(f64, f64)> {
    chart
        .points
        .iter()
        .enumerate()
        .map(|(i, point)| (i as f64, point.value))
        .collect()
}

/// First, middle and last date labels
pub fn x_labels(chart: &TimeSeriesChart) -> Vec<String> {
    let points = &chart.points;
    match points.len() {
        0 => Vec::new(),
        1 => vec![points[0].label.clone()],
        2 => vec![points[0].label.clone(), points[1].label.clone()],
        n => vec![
            points[0].label.clone(),
            points[n / 2].label.clone(),
            points[n - 1].label.clone(),
        ],
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn render_chart_modal(modal: &ChartModal, f: &mut Frame<'_>, area: Rect) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let chart = &modal.chart;
    let block = Block::default()
        .title(format!(" {} ", chart.title()))
        .title_bottom(" Esc to close ")
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let data = series_data(chart);
    if data.is_empty() {
        let paragraph = Paragraph::new("No points")
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, popup);
        return;
    }

    let [min, max] = chart.value_bounds();
    let y_labels = vec![
        Span::raw(format!("{min:.3}")),
        Span::raw(format!("{:.3}", (min + max) / 2.0)),
        Span::raw(format!("{max:.3}")),
    ];
    let x_max = (data.len().saturating_sub(1)).max(1) as f64;

    let datasets = vec![Dataset::default()
        .name(chart.variable.clone())
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Yellow))
        .data(&data)];

    let widget = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Date")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels(chart)),
        )
        .y_axis(
            Axis::default()
                .title(chart.variable.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds([min, max])
                .labels(y_labels),
        );

    f.render_widget(widget, popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GeoPoint;
    use crate::timeseries::TimeSeriesPoint;

    fn chart(labels: &[&str]) -> TimeSeriesChart {
        TimeSeriesChart {
            dataset: "GRIDMET".to_string(),
            variable: "pr".to_string(),
            location: GeoPoint::new(0.0, 0.0),
            points: labels
                .iter()
                .enumerate()
                .map(|(i, label)| TimeSeriesPoint {
                    label: (*label).to_string(),
                    value: i as f64,
                })
                .collect(),
        }
    }

    #[test]
    fn test_x_labels_pick_ends_and_middle() {
        let labels = x_labels(&chart(&["a", "b", "c", "d", "e"]));
        assert_eq!(labels, vec!["a", "c", "e"]);
        assert!(x_labels(&chart(&[])).is_empty());
    }

    #[test]
    fn test_series_data_keeps_order() {
        let data = series_data(&chart(&["a", "b"]));
        assert_eq!(data, vec![(0.0, 0.0), (1.0, 1.0)]);
    }
}
