//! CLI module for pomo.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `dispatch`: Interactive command parsing and execution
//! - `display`: Output formatting and display logic
//! - `session`: Interactive and single-timer terminal loops

pub mod commands;
pub mod dispatch;
pub mod display;
pub mod session;

pub use commands::{Cli, Commands, StartArgs, TodoAddArgs, TodoCommands};
pub use dispatch::{Command, DispatchError, Dispatcher, Reply};
pub use display::Display;
pub use session::{run_interactive, run_single};
