pub mod artifacts;
pub mod brief;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod export;
pub mod prompt;
pub mod provider;
pub mod recover;
pub mod server;
pub mod studio;
pub mod ux;
pub mod wire;

pub use errors::{VibeError, VibeResult};
