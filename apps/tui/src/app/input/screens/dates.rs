use crate::app::state::{App, Overlay};
use crossterm::event::KeyCode;

pub fn handle_date_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
        }
        KeyCode::Enter => app.submit_date_prompt(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.dates.toggle_field();
        }
        KeyCode::Backspace => {
            app.dates.active_input().pop();
            app.dates.error = None;
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
            let input = app.dates.active_input();
            if input.len() < 10 {
                input.push(c);
            }
            app.dates.error = None;
        }
        _ => {}
    }
}
