use crate::cli::CliArgs;
use crate::ui::widgets::popup::centered_rect;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

const SHORTCUTS: &[(&str, &str)] = &[
    ("d", "Pick a dataset"),
    ("v / Tab", "Next variable"),
    ("V / Shift-Tab", "Previous variable"),
    ("t", "Edit the date range"),
    ("r", "Reload the layer"),
    ("click", "Chart the time series at a point"),
    ("+ / - / 0", "Zoom in, out, reset"),
    ("Esc", "Clear marker / close popup"),
    ("L", "Log out"),
    ("F1 / ?", "Toggle this help"),
    ("q", "Quit"),
];

pub fn render_help_popup(f: &mut Frame<'_>, area: Rect) {
    let popup = centered_rect(70, 80, area);
    f.render_widget(Clear, popup);

    let mut lines: Vec<TextLine<'_>> = SHORTCUTS
        .iter()
        .map(|(key, action)| {
            TextLine::from(vec![
                Span::styled(
                    format!("{key:>14}  "),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw(*action),
            ])
        })
        .collect();

    lines.push(TextLine::from(""));
    lines.push(TextLine::from(Span::styled(
        "CLI Options:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for line in CliArgs::help_text().lines() {
        if line.starts_with("Usage") || line.starts_with("Options") || line.trim().is_empty() {
            continue;
        }
        lines.push(TextLine::from(line.to_string()));
    }

    let paragraph = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .title(" Help ")
            .title_bottom(" Esc to close ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(paragraph, popup);
}
