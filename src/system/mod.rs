//! # System Interaction Layer
//!
//! This module is the boundary between command translation and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: The sequential runner. It prepares each command, spawns it, waits
//!   for it to exit and decides whether the sequence continues, fails, or (in strict
//!   mode) ends the host process.
//! - **`process`**: Builds `tokio::process::Command`s from translated arguments and
//!   spawn options (shell mode, stdio routing, working directory, environment) and
//!   delivers signals to children.
//! - **`registry`**: Tracks live children so `kill` can reach the one currently running.

pub mod executor;
pub mod process;
pub mod registry;
