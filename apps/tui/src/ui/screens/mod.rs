pub mod explorer;
pub mod help;
pub mod login;
