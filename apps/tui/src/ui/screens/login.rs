use crate::app::App;
use crate::ui::widgets::popup::fixed_rect;
use ratatui::layout::{Alignment, Margin};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render_login(app: &App, f: &mut Frame<'_>) {
    let area = fixed_rect(64, 14, f.area().inner(Margin::new(2, 1)));

    let block = Block::default()
        .title(" Climate Engine ")
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let mut lines = vec![
        TextLine::from(Span::styled(
            "Sign in with your Climate Engine API key",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        TextLine::from(""),
        TextLine::from(vec![
            Span::styled("API key: ", Style::default().fg(Color::Green)),
            Span::styled(
                format!("{}_", app.login.masked_input()),
                Style::default().fg(Color::White),
            ),
        ]),
        TextLine::from(""),
    ];

    if app.login.is_validating() {
        lines.push(TextLine::from(Span::styled(
            "Validating key...",
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = &app.login.error {
        lines.push(TextLine::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    } else if !app.status_message.is_empty() {
        lines.push(TextLine::from(Span::styled(
            app.status_message.clone(),
            Style::default().fg(Color::Gray),
        )));
    }

    lines.push(TextLine::from(""));
    lines.push(TextLine::from(Span::styled(
        "Enter: log in  Esc: clear / quit",
        Style::default().fg(Color::DarkGray),
    )));
    if !app.session.has_storage() {
        lines.push(TextLine::from(Span::styled(
            "No database: the key will be forgotten on exit",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
