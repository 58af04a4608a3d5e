//! Argument parsing helpers shared by command handlers.

use std::{collections::HashMap, str::FromStr};

use chrono::NaiveDate;
use recur_domain::{FlowType, RecurrencePeriod};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cli::context::CommandError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Positional arguments plus `--name value` / `--name=value` options.
#[derive(Debug, Default)]
pub struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    options: HashMap<&'a str, &'a str>,
}

impl<'a> ParsedArgs<'a> {
    pub fn parse(args: &[&'a str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(option) = arg.strip_prefix("--") else {
                parsed.positional.push(arg);
                continue;
            };
            let (name, value) = match option.split_once('=') {
                Some((name, value)) => (name, value),
                None => {
                    let value = iter.next().ok_or_else(|| {
                        CommandError::InvalidArguments(format!("option `--{option}` needs a value"))
                    })?;
                    (option, value)
                }
            };
            parsed.options.insert(name, value);
        }
        Ok(parsed)
    }

    pub fn option(&self, name: &str) -> Option<&'a str> {
        self.options.get(name).copied()
    }

    /// Positional argument `index`, or a usage error.
    pub fn required(&self, index: usize, usage: &str) -> Result<&'a str, CommandError> {
        self.positional
            .get(index)
            .copied()
            .ok_or_else(|| CommandError::usage(usage))
    }
}

pub fn parse_uuid(label: &str, raw: &str) -> Result<Uuid, CommandError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| CommandError::InvalidArguments(format!("invalid {label} id `{raw}`")))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{raw}`, expected YYYY-MM-DD"))
    })
}

pub fn parse_amount(raw: &str) -> Result<Decimal, CommandError> {
    Decimal::from_str(raw.trim())
        .map_err(|_| CommandError::InvalidArguments(format!("invalid amount `{raw}`")))
}

pub fn parse_flow(raw: &str) -> Result<FlowType, CommandError> {
    raw.parse()
        .map_err(|err: recur_domain::DomainError| CommandError::InvalidArguments(err.to_string()))
}

pub fn parse_period(raw: &str) -> Result<RecurrencePeriod, CommandError> {
    raw.parse()
        .map_err(|err: recur_domain::DomainError| CommandError::InvalidArguments(err.to_string()))
}
