pub mod api;
pub mod app;
pub mod config;
pub mod render;
pub mod state;
pub mod terminal;
pub mod types;
pub mod ui;
pub mod util;
