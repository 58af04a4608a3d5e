use std::io;

use recur_core::CoreError;
use thiserror::Error;

use crate::cli::{commands, output, registry::CommandRegistry};
use crate::{AppError, RecurringApp};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Command(#[from] CommandError),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("Unknown command `{0}`. Type `help` to see available commands.")]
    UnknownCommand(String),
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommandError {
    pub fn usage(usage: &str) -> Self {
        CommandError::InvalidArguments(format!("usage: {usage}"))
    }
}

pub type CommandResult = Result<(), CommandError>;

/// Shared state handed to every command handler.
pub struct CliContext {
    pub app: RecurringApp,
    pub registry: CommandRegistry,
}

impl CliContext {
    pub fn new(app: RecurringApp) -> Self {
        Self {
            app,
            registry: commands::registry(),
        }
    }

    pub fn dispatch(&mut self, command: &str, args: &[&str]) -> CommandResult {
        match self.registry.handler(command) {
            Some(handler) => handler(self, args),
            None => {
                if let Some(best) = self.registry.suggest(command) {
                    output::info(format!("Suggestion: `{best}`?"));
                }
                Err(CommandError::UnknownCommand(command.to_string()))
            }
        }
    }

    pub fn usage_of(&self, command: &str) -> &'static str {
        self.registry
            .get(command)
            .map(|entry| entry.usage)
            .unwrap_or("")
    }

    pub fn report_error(&self, err: &CommandError) {
        output::error(err);
    }
}
