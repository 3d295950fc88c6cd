mod command;
mod runner;

pub use command::Command;
pub use runner::{Context, OutputMode, run_with_format};
