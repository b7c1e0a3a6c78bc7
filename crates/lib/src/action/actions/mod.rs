//! Built-in action implementations.
//!
//! - [`cmd`] - shell command execution with env, cwd and stdout capture
//! - [`property`] - build property assignment

pub mod cmd;
pub mod property;
