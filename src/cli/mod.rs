//! Command-line interface module.

mod args;
pub mod publish;
pub mod render;

pub use args::{Cli, Commands, PublishArgs, RenderArgs};
