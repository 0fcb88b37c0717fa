//! Command-line stopwatch that keeps a history of daily time totals.

pub mod accumulator;
pub mod commands;
pub mod config;
pub mod error;
pub mod platform;
pub mod state;
pub mod ticker;
pub mod utils;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, ValueEnum, Debug, Default, Serialize, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
