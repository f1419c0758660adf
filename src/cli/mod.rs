pub mod commands;
pub mod handlers;
pub mod render;

pub use commands::{Cli, Commands};
