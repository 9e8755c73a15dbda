//! Command line interface module
//!
//! This module provides argument parsing and the runner that turns one
//! subcommand into one registry operation, printing the result.

pub mod args;
pub mod runner;

pub use args::{Args, Command};
pub use runner::{ConsoleNavigator, Runner};
