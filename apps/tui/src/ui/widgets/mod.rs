pub mod charts;
pub mod map;
pub mod notifications;
pub mod picker;
pub mod popup;
