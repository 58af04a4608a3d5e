use std::collections::HashMap;

use strsim::levenshtein;

use crate::cli::context::{CliContext, CommandResult};

pub type CommandHandler = fn(&mut CliContext, &[&str]) -> CommandResult;

pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

/// Commands keyed by name, remembering registration order for help output.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandEntry>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: CommandEntry) {
        let name = entry.name;
        if self.commands.insert(name, entry).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    pub fn list(&self) -> Vec<&CommandEntry> {
        self.order
            .iter()
            .filter_map(|name| self.commands.get(name))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.commands.get(name).map(|entry| entry.handler)
    }

    /// Closest registered name within an edit distance of 3.
    pub fn suggest(&self, input: &str) -> Option<&'static str> {
        self.names()
            .map(|name| (levenshtein(name, input), name))
            .filter(|(distance, _)| *distance <= 3)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut CliContext, _: &[&str]) -> CommandResult {
        Ok(())
    }

    #[test]
    fn registry_keeps_order_and_suggests_close_names() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandEntry::new("sweep", "", "", noop));
        registry.register(CommandEntry::new("history", "", "", noop));
        registry.register(CommandEntry::new("sweep", "", "", noop));

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["sweep", "history"]);
        assert_eq!(registry.suggest("swep"), Some("sweep"));
        assert_eq!(registry.suggest("zzzzzzzz"), None);
    }
}
