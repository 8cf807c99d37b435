//! CLI commands

pub mod clean;
pub mod generate;
pub mod list;
pub mod search;
pub mod theme;
