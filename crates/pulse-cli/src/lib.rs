//! Command-line components for normalizing saved marketing analytics reports.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod source;
pub mod summary;
