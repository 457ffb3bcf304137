// App module for the climate explorer
// Session, selection and layer state plus the input handlers driving them

pub mod actions;
pub mod controller;
pub mod events;
pub mod input;
pub mod selection;
pub mod session;
pub mod state;

pub use actions::RequestDispatcher;
pub use events::ApiEvent;
pub use input::handle_input;
pub use state::{App, AppScreen, Overlay};
