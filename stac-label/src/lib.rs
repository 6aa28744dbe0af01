//! Command line front end of [`stac_label_core`]: argument parsing, config files and logging.
#![forbid(unsafe_code)]

pub mod args;
pub mod config;
pub mod logging;
