//! CLI subcommands.

pub mod serve;
pub mod stats;
pub mod sweep;
