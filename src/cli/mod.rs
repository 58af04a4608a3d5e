pub mod args;
pub mod commands;
pub mod context;
pub mod output;
pub mod registry;
mod shell;

pub use context::{CliContext, CliError, CommandError, CommandResult};
pub use shell::{run_cli, run_with_args};
