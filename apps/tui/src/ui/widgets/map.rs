use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Map, MapResolution, Points};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use throbber_widgets_tui::{Throbber, BRAILLE_SIX};

use crate::map::{HostMapAdapter, TerminalMap};

const MARKER_COLOR: Color = Color::Red;
const LAYER_COLOR: Color = Color::Green;

/// Draws the map pane: world outline, layer tint, click marker and the
/// loading indicator. `canvas_area` is the block's inner area, the same
/// rectangle used to translate mouse clicks.
pub fn render_map(map: &TerminalMap, f: &mut Frame<'_>, area: Rect, canvas_area: Rect) {
    let title = map.layers().last().map_or_else(
        || " Map ".to_string(),
        |layer| format!(" Map: {} ", layer.config.name),
    );
    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(block, area);

    let viewport = *map.viewport();
    let has_layer = !map.layers().is_empty();
    let markers: Vec<(f64, f64)> = map.markers().iter().map(|p| (p.lng, p.lat)).collect();

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([viewport.west, viewport.east])
        .y_bounds([viewport.south, viewport.north])
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: if has_layer { LAYER_COLOR } else { Color::Gray },
                resolution: MapResolution::High,
            });
            ctx.layer();

            for &(x, y) in &markers {
                let dx = (viewport.east - viewport.west) / 60.0;
                let dy = (viewport.north - viewport.south) / 30.0;
                ctx.draw(&CanvasLine::new(x - dx, y, x + dx, y, MARKER_COLOR));
                ctx.draw(&CanvasLine::new(x, y - dy, x, y + dy, MARKER_COLOR));
                ctx.draw(&Points {
                    coords: &[(x, y)],
                    color: MARKER_COLOR,
                });
            }
        });
    f.render_widget(canvas, canvas_area);

    if let Some(url) = map.sample_tile_url() {
        render_footer(f, canvas_area, &url);
    }

    if map.has_loading_indicator() {
        render_loading(map, f, canvas_area);
    }
}

fn render_footer(f: &mut Frame<'_>, canvas_area: Rect, url: &str) {
    if canvas_area.height < 3 {
        return;
    }
    let footer = Rect {
        y: canvas_area.bottom() - 1,
        height: 1,
        ..canvas_area
    };
    let line = TextLine::from(vec![
        Span::styled("tile ", Style::default().fg(Color::DarkGray)),
        Span::styled(url.to_string(), Style::default().fg(Color::Gray)),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Left), footer);
}

fn render_loading(map: &TerminalMap, f: &mut Frame<'_>, canvas_area: Rect) {
    let area = Rect {
        height: 1.min(canvas_area.height),
        width: 24.min(canvas_area.width),
        ..canvas_area
    };
    let throbber = Throbber::default()
        .label("Preparing layer")
        .style(Style::default().fg(Color::Yellow))
        .throbber_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .throbber_set(BRAILLE_SIX);
    let mut state = map.throbber_state().clone();
    f.render_stateful_widget(throbber, area, &mut state);
}
