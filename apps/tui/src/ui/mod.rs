// UI module for the climate explorer
// Rendering is a pure function of `App`; which screen is drawn follows the
// credential.

pub mod screens;
pub mod widgets;

use crate::app::{App, AppScreen};
use ratatui::Frame;

pub fn ui(app: &App, f: &mut Frame<'_>) {
    match app.screen() {
        AppScreen::Login => screens::login::render_login(app, f),
        AppScreen::Explorer => screens::explorer::render_explorer(app, f),
    }
}
