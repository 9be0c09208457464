pub mod args;
pub mod commands;

pub use args::{Cli, Commands, LinkArgs};
pub use commands::run;
