use crate::app::input::helpers::{wrap_decrement, wrap_increment};
use crate::app::state::{App, Overlay};
use crossterm::event::KeyCode;

pub fn handle_picker_input(app: &mut App, key: KeyCode) {
    let matches = app.picker.matches(&app.config.datasets).len();

    match key {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
        }
        KeyCode::Enter => app.choose_picked_dataset(),
        KeyCode::Up => {
            app.picker.selected = wrap_decrement(app.picker.selected, matches);
        }
        KeyCode::Down => {
            app.picker.selected = wrap_increment(app.picker.selected, matches);
        }
        KeyCode::Backspace => {
            app.picker.query.pop();
            app.picker.selected = 0;
        }
        KeyCode::Char(c) => {
            app.picker.query.push(c);
            app.picker.selected = 0;
        }
        _ => {}
    }
}
