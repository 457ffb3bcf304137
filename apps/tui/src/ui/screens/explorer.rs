use crate::app::controller::LayerState;
use crate::app::state::{DateField, DatePrompt};
use crate::app::{App, Overlay};
use crate::domain::format_api_date;
use crate::ui::screens::help::render_help_popup;
use crate::ui::widgets::charts::render_chart_modal;
use crate::ui::widgets::map::render_map;
use crate::ui::widgets::notifications::render_notifications;
use crate::ui::widgets::picker::render_dataset_picker;
use crate::ui::widgets::popup::fixed_rect;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

const PANEL_WIDTH: u16 = 34;

/// Regions of the explorer screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorerLayout {
    pub title: Rect,
    pub panel: Rect,
    pub map: Rect,
    /// Inside the map border; clicks are translated against this
    pub map_canvas: Rect,
    pub status: Rect,
    pub shortcuts: Rect,
}

pub fn explorer_layout(area: Rect) -> ExplorerLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(8),    // Panel and map
            Constraint::Length(3), // Status
            Constraint::Length(1), // Shortcuts hint
        ])
        .split(area.inner(Margin::new(1, 0)));

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(PANEL_WIDTH), Constraint::Min(10)])
        .split(rows[1]);

    ExplorerLayout {
        title: rows[0],
        panel: body[0],
        map: body[1],
        map_canvas: body[1].inner(Margin::new(1, 1)),
        status: rows[2],
        shortcuts: rows[3],
    }
}

pub fn render_explorer(app: &App, f: &mut Frame<'_>) {
    let area = f.area();
    let layout = explorer_layout(area);

    render_title(app, f, layout.title);
    render_panel(app, f, layout.panel);
    render_map(&app.map, f, layout.map, layout.map_canvas);
    render_notifications(&app.map, f, layout.map_canvas);
    render_status(app, f, layout.status);
    render_shortcuts(f, layout.shortcuts);

    if let Some(modal) = app.map.chart() {
        render_chart_modal(modal, f, area);
    }

    match app.overlay {
        Overlay::DatasetPicker => render_dataset_picker(
            &app.picker,
            &app.config.datasets,
            app.selection.dataset(),
            f,
            area,
        ),
        Overlay::DateRange => render_date_prompt(app, &app.dates, f, area),
        Overlay::Help => render_help_popup(f, area),
        Overlay::None => {}
    }
}

fn render_title(app: &App, f: &mut Frame<'_>, area: Rect) {
    let line = TextLine::from(vec![
        Span::styled(
            "Climate Engine ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Explorer",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", app.config.api_url),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}

fn label(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(Color::Gray))
}

fn render_panel(app: &App, f: &mut Frame<'_>, area: Rect) {
    let selection = &app.selection;
    let mut lines = vec![
        TextLine::from(vec![
            label("Dataset   "),
            Span::styled(
                selection.dataset().to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        TextLine::from(""),
        TextLine::from(label("Variables")),
    ];

    if selection.variables().is_empty() {
        lines.push(TextLine::from(Span::styled(
            "  loading...",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for variable in selection.variables() {
        let selected = selection.variable() == Some(variable.as_str());
        lines.push(if selected {
            TextLine::from(Span::styled(
                format!("> {variable}"),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))
        } else {
            TextLine::from(format!("  {variable}"))
        });
    }

    lines.push(TextLine::from(""));
    match (selection.start(), selection.end()) {
        (Some(start), Some(end)) => {
            lines.push(TextLine::from(vec![
                label("Start     "),
                Span::raw(format_api_date(start)),
            ]));
            lines.push(TextLine::from(vec![
                label("End       "),
                Span::raw(format_api_date(end)),
            ]));
        }
        _ => lines.push(TextLine::from(vec![
            label("Dates     "),
            Span::styled("loading...", Style::default().fg(Color::DarkGray)),
        ])),
    }
    if let Some(bounds) = selection.bounds() {
        lines.push(TextLine::from(Span::styled(
            format!(
                "  {} to {}",
                format_api_date(bounds.min),
                format_api_date(bounds.max)
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(TextLine::from(""));
    let (state_text, state_color) = layer_state_label(app.controller.state());
    lines.push(TextLine::from(vec![
        label("Layer     "),
        Span::styled(state_text, Style::default().fg(state_color)),
    ]));
    if let Some(dataset) = app.controller.switching_to() {
        lines.push(TextLine::from(Span::styled(
            format!("Switching to {dataset}..."),
            Style::default().fg(Color::Yellow),
        )));
    }
    if app.controller.is_fetching_series() {
        lines.push(TextLine::from(Span::styled(
            "Fetching time series...",
            Style::default().fg(Color::Yellow),
        )));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Selection ")
                .title_style(Style::default().fg(Color::Green))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );
    f.render_widget(paragraph, area);
}

pub const fn layer_state_label(state: LayerState) -> (&'static str, Color) {
    match state {
        LayerState::Uninitialized => ("not mounted", Color::DarkGray),
        LayerState::AwaitingBounds => ("waiting for dates", Color::Yellow),
        LayerState::Idle => ("idle", Color::Gray),
        LayerState::Loading => ("loading...", Color::Yellow),
        LayerState::Displayed => ("displayed", Color::Green),
    }
}

fn render_status(app: &App, f: &mut Frame<'_>, area: Rect) {
    let storage = if app.session.has_storage() {
        ""
    } else {
        "  (key not persisted)"
    };
    let paragraph = Paragraph::new(TextLine::from(vec![
        Span::styled(app.status_message.clone(), Style::default().fg(Color::White)),
        Span::styled(storage, Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .title(" Status ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_shortcuts(f: &mut Frame<'_>, area: Rect) {
    let hint = Paragraph::new(
        "d dataset  v variable  t dates  r reload  click chart  L logout  ? help  q quit",
    )
    .style(Style::default().fg(Color::DarkGray))
    .alignment(Alignment::Center);
    f.render_widget(hint, area);
}

fn render_date_prompt(app: &App, prompt: &DatePrompt, f: &mut Frame<'_>, area: Rect) {
    let popup = fixed_rect(44, 9, area);
    f.render_widget(Clear, popup);

    let field_line = |name: &'static str, value: &str, active: bool| {
        let style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor = if active { "_" } else { "" };
        TextLine::from(vec![
            label(name),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    };

    let mut lines = vec![
        field_line("Start  ", &prompt.start, prompt.field == DateField::Start),
        field_line("End    ", &prompt.end, prompt.field == DateField::End),
    ];
    if let Some(bounds) = app.selection.bounds() {
        lines.push(TextLine::from(Span::styled(
            format!(
                "Available {} to {}",
                format_api_date(bounds.min),
                format_api_date(bounds.max)
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(error) = &prompt.error {
        lines.push(TextLine::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .title(" Date range (YYYY-MM-DD) ")
            .title_bottom(" Tab switch · Enter apply · Esc cancel ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(paragraph, popup);
}
