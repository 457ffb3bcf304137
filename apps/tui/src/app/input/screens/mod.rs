use crate::app::state::{App, AppScreen, Overlay};
use crossterm::event::KeyCode;

mod dates;
mod explorer;
mod help;
mod login;
mod picker;

pub async fn dispatch_input(app: &mut App, key: KeyCode) {
    if app.screen() == AppScreen::Login {
        login::handle_login_input(app, key);
        return;
    }

    if help::handle_help_toggle(app, key) {
        return;
    }

    match app.overlay {
        Overlay::DatasetPicker => picker::handle_picker_input(app, key),
        Overlay::DateRange => dates::handle_date_input(app, key),
        Overlay::Help => {}
        Overlay::None => explorer::handle_explorer_input(app, key).await,
    }
}
