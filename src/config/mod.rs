//! Configuration module for Shop-Scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: every section falls back to defaults
//! tuned for the scrapeme.live demo shop.
//!
//! # Example
//!
//! ```no_run
//! use shop_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Scraper will start at: {}", config.scraper.start_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ExtractionRules, FollowRules, OutputConfig, ScraperConfig, UserAgentConfig,
    DEFAULT_CSV_PATH, DEFAULT_START_URL, DEFAULT_USER_AGENTS,
};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::validate;
