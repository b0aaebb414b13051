pub mod app;
pub mod cli;
pub mod config;
pub mod curriculum;
pub mod engine;
pub mod logging;
pub mod progress;
pub mod puzzle;
pub mod session;
pub mod ui;
pub mod vim;
