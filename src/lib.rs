// Core infrastructure modules
pub mod core;

// Command-line surface
pub mod cli;
pub mod commands;
pub mod config;

// Feature-specific modules
pub mod inspect;
pub mod report;

#[cfg(test)]
mod test_utils;
