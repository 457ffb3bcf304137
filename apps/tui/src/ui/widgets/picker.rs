use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::state::DatasetPicker;
use crate::ui::widgets::popup::fixed_rect;

/// First visible row so `selected` stays on screen
pub const fn scroll_offset(selected: usize, visible: usize) -> usize {
    if visible == 0 || selected < visible {
        0
    } else {
        selected + 1 - visible
    }
}

pub fn render_dataset_picker(
    picker: &DatasetPicker,
    datasets: &[String],
    current: &str,
    f: &mut Frame<'_>,
    area: Rect,
) {
    let popup = fixed_rect(48, 18, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Select dataset ")
        .title_bottom(" Enter select · Esc cancel ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    f.render_widget(block, popup);
    if inner.height < 2 {
        return;
    }

    let query = TextLine::from(vec![
        Span::styled("Filter: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{}_", picker.query),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(query), Rect { height: 1, ..inner });

    let list_area = Rect {
        y: inner.y + 1,
        height: inner.height - 1,
        ..inner
    };
    let matches = picker.matches(datasets);
    if matches.is_empty() {
        f.render_widget(
            Paragraph::new("No matching datasets").style(Style::default().fg(Color::DarkGray)),
            list_area,
        );
        return;
    }

    let items: Vec<ListItem<'_>> = matches
        .iter()
        .map(|dataset| {
            let style = if *dataset == current {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(TextLine::from(Span::styled((*dataset).to_string(), style)))
        })
        .collect();

    let selected = picker.selected.min(matches.len() - 1);
    let mut state = ListState::default()
        .with_offset(scroll_offset(selected, usize::from(list_area.height)))
        .with_selected(Some(selected));
    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, list_area, &mut state);
}
