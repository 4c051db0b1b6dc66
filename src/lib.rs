pub mod analyzer;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod display;
pub mod error;
pub mod handler;
pub mod render;
pub mod report;
pub mod selection;
pub mod util;
