use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::map::NotificationKind;
use crate::map::TerminalMap;

const WIDTH: u16 = 44;
const HEIGHT: u16 = 3;

pub const fn kind_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Success => Color::Green,
        NotificationKind::Info => Color::Cyan,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Error => Color::Red,
    }
}

/// Stacks the active snackbars in the top right corner of `area`, newest
/// at the bottom
pub fn render_notifications(map: &TerminalMap, f: &mut Frame<'_>, area: Rect) {
    let width = WIDTH.min(area.width);
    let mut y = area.y;

    for active in map.notifications() {
        if y + HEIGHT > area.bottom() {
            break;
        }
        let rect = Rect {
            x: area.right().saturating_sub(width),
            y,
            width,
            height: HEIGHT,
        };
        let color = kind_color(active.notification.kind);
        let paragraph = Paragraph::new(active.notification.message.as_str())
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(paragraph, rect);
        y += HEIGHT;
    }
}
