use crate::app::state::App;
use crossterm::event::KeyCode;

pub fn handle_login_input(app: &mut App, key: KeyCode) {
    if app.login.is_validating() {
        if key == KeyCode::Esc {
            app.running = false;
        }
        return;
    }

    match key {
        KeyCode::Enter => app.submit_login(),
        KeyCode::Backspace => {
            app.login.input.pop();
            app.login.error = None;
        }
        KeyCode::Esc => {
            if app.login.input.is_empty() {
                app.running = false;
            } else {
                app.login.input.clear();
                app.login.error = None;
            }
        }
        KeyCode::Char(c) if !c.is_control() => {
            app.login.input.push(c);
        }
        _ => {}
    }
}
