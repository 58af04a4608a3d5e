use std::{
    env,
    io::{self, BufRead},
    sync::Arc,
};

use recur_config::ConfigManager;
use recur_core::SystemClock;
use shell_words::split;

use crate::cli::context::{CliContext, CliError};
use crate::cli::output::{self, OutputPreferences};
use crate::{AppError, RecurringApp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Exit,
}

/// Runs the CLI with the process arguments.
pub fn run_cli() -> Result<(), CliError> {
    run_with_args(env::args().skip(1))
}

/// Runs one command when arguments are given, otherwise reads commands from stdin, one per
/// line, until `exit` or end of input.
pub fn run_with_args<I, S>(args: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let mut context = open_context()?;

    match args.split_first() {
        Some((command, rest)) => {
            let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
            context.dispatch(&command.to_lowercase(), &rest)?;
            Ok(())
        }
        None => run_script(&mut context),
    }
}

fn open_context() -> Result<CliContext, CliError> {
    let manager = ConfigManager::new().map_err(AppError::from)?;
    let config = manager.load().map_err(AppError::from)?;
    crate::init_with_filter(config.log_filter.as_deref());
    output::set_preferences(OutputPreferences {
        color_enabled: config.ui_color_enabled,
    });
    let app = RecurringApp::with_config(manager, config, Arc::new(SystemClock))?;
    Ok(CliContext::new(app))
}

fn run_script(context: &mut CliContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if handle_line(context, &line?) == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

fn handle_line(context: &mut CliContext, line: &str) -> LoopControl {
    let tokens = match split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("Could not parse `{}`: {err}", line.trim()));
            return LoopControl::Continue;
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return LoopControl::Continue;
    };

    let command = raw.to_lowercase();
    if matches!(command.as_str(), "exit" | "quit") {
        return LoopControl::Exit;
    }
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    if let Err(err) = context.dispatch(&command, &args) {
        context.report_error(&err);
    }
    LoopControl::Continue
}
