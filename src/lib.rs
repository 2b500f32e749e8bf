pub mod app;
pub mod cli;
pub mod config;
pub mod hn;
pub mod logging;
pub mod state;
pub mod stories;
pub mod utils;
pub mod web;
