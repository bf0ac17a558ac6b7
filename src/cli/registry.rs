use std::collections::BTreeMap;

use crate::cli::core::{CommandResult, ShellContext};

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub aliases: &'static [&'static str],
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
            aliases: &[],
            handler,
        }
    }

    pub fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }
}

/// Commands in registration order, addressable by name or alias.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    lookup: BTreeMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: CommandEntry) {
        let index = self.entries.len();
        self.lookup.insert(entry.name, index);
        for alias in entry.aliases {
            self.lookup.insert(*alias, index);
        }
        self.entries.push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.lookup.get(name).map(|index| &self.entries[*index])
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.get(name).map(|entry| entry.handler)
    }

    pub fn list(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    /// Every name and alias, for completion and suggestions.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.lookup.keys().copied()
    }
}
