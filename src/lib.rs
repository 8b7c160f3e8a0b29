pub mod cli;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod model;
pub mod output;
pub mod state;
pub mod system;
pub mod tui;
