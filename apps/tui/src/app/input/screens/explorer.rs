use crate::app::state::App;
use crate::map::HostMapAdapter;
use crossterm::event::KeyCode;

pub async fn handle_explorer_input(app: &mut App, key: KeyCode) {
    // The chart modal swallows everything but its close keys
    if app.map.chart().is_some() {
        if matches!(key, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('c' | 'q')) {
            app.map.close_modal();
        }
        return;
    }

    match key {
        KeyCode::Char('q') => {
            app.running = false;
        }
        KeyCode::Char('d') => app.open_dataset_picker(),
        KeyCode::Char('t') => app.open_date_prompt(),
        KeyCode::Char('v') | KeyCode::Tab => app.cycle_variable(true),
        KeyCode::Char('V') | KeyCode::BackTab => app.cycle_variable(false),
        KeyCode::Char('r') => app.refresh_layer(),
        KeyCode::Char('+' | '=') => app.map.zoom_in(),
        KeyCode::Char('-') => app.map.zoom_out(),
        KeyCode::Char('0') => app.map.reset_view(),
        KeyCode::Char('L') => app.logout().await,
        KeyCode::Esc => app.map.clear_markers(),
        _ => {}
    }
}
