pub mod branch;
pub mod classifier;
pub mod collab;
pub mod config;
pub mod detector;
pub mod doctor;
pub mod error;
pub mod git;
pub mod io;
pub mod paths;
pub mod process;
pub mod store;
pub mod worktree;

#[cfg(test)]
mod testutil;

pub use error::{ErrorKind, Result, VibeError};
