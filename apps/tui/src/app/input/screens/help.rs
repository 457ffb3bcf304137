use crate::app::state::{App, Overlay};
use crossterm::event::KeyCode;

pub fn handle_help_toggle(app: &mut App, key: KeyCode) -> bool {
    if key == KeyCode::F(1) || (key == KeyCode::Char('?') && app.overlay != Overlay::DateRange) {
        app.overlay = if app.overlay == Overlay::Help {
            Overlay::None
        } else {
            Overlay::Help
        };
        return true;
    }

    if app.overlay == Overlay::Help {
        if key == KeyCode::Esc {
            app.overlay = Overlay::None;
        }
        return true;
    }

    false
}
