//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the handler and the local
//! service backends.

pub mod cloud;
pub mod invoke;

pub use cloud::{handle_cloud_command, CloudCommands};
pub use invoke::{handle_config_command, handle_list_command, read_event};
