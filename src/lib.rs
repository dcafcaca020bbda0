pub mod advisor;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod prompt;
pub mod scoring;
pub mod storage;
pub mod suggest;
pub mod tui;
