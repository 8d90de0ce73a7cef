//! External tool abstractions
//!
//! This module provides trait-based abstractions for external programs,
//! enabling testable code through dependency injection and mock implementations.

pub mod command;

pub use command::{CommandError, CommandExecutor, CommandOutput, CommandSpec, ProcessCommandExecutor};
#[cfg(any(test, feature = "testing"))]
pub use command::MockCommandExecutor;
