//! Shell context, dispatch and error reporting.

use std::{
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use dialoguer::theme::ColorfulTheme;
use rust_decimal::Decimal;
use strsim::levenshtein;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::{Config, ConfigError, ConfigManager},
    currency::{format_money_in, CurrencyCode, NumberLocale, RateBook},
    errors::LedgerError,
    ledger::{ExpenseLedger, LedgerStatus, LedgerView},
    report::ReportOptions,
    storage::{JsonFileStore, KeyValueExpenseStore},
    utils::paths,
};

use super::commands;
use super::io as cli_io;
use super::registry::{CommandEntry, CommandRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
}

pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub(crate) ledger: ExpenseLedger,
    pub(crate) rates: RateBook<JsonFileStore>,
    pub(crate) config: Config,
    pub(crate) config_manager: ConfigManager,
    pub(crate) theme: ColorfulTheme,
    pub(crate) running: bool,
    /// Latest view pushed by the ledger since the last command finished.
    changes: Arc<Mutex<Option<LedgerView>>>,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, paths::app_data_dir())
    }

    pub fn with_base_dir(mode: CliMode, base: PathBuf) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::with_base_dir(base.clone())?;
        let config = config_manager.load()?;
        super::output::set_color(config.color && mode == CliMode::Interactive);

        let data_dir = config.data_dir.clone().unwrap_or(base);
        let store = JsonFileStore::new(paths::store_dir_in(&data_dir))?;
        debug!(root = %store.root().display(), "opening expense store");
        let ledger = ExpenseLedger::local(KeyValueExpenseStore::new(store.clone()));
        let rates = RateBook::new(
            store,
            CurrencyCode::new(config.home_currency.as_str()),
            CurrencyCode::new(config.display_currency.as_str()),
        )
        .with_fallback(config.default_rate);

        let mut context = ShellContext {
            mode,
            registry,
            ledger,
            rates,
            config,
            config_manager,
            theme: ColorfulTheme::default(),
            running: true,
            changes: Arc::new(Mutex::new(None)),
        };
        context.load_ledger();
        let changes = Arc::clone(&context.changes);
        context.ledger.on_change(move |view| {
            if let Ok(mut latest) = changes.lock() {
                *latest = Some(view.clone());
            }
        });
        Ok(context)
    }

    fn load_ledger(&mut self) {
        match self.ledger.load() {
            Ok(report) => {
                for warning in &report.warnings {
                    cli_io::print_warning(warning);
                }
            }
            Err(err) => {
                cli_io::print_error(&err);
                cli_io::print_hint("Changes will not be saved until storage is reachable.");
            }
        }
    }

    pub(crate) fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn home_currency(&self) -> CurrencyCode {
        CurrencyCode::new(self.config.home_currency.as_str())
    }

    pub(crate) fn number_locale(&self) -> NumberLocale {
        self.config.number_locale()
    }

    pub(crate) fn money(&self, amount: Decimal) -> String {
        format_money_in(&self.number_locale(), amount, &self.home_currency())
    }

    pub(crate) fn report_options(&self) -> ReportOptions {
        let locale = self.number_locale();
        match self.mode {
            CliMode::Interactive => ReportOptions {
                width: cli_io::terminal_width(),
                plain: false,
                locale,
            },
            CliMode::Script => ReportOptions {
                width: None,
                plain: true,
                locale,
            },
        }
    }

    /// Takes the view recorded since the last call, if the ledger changed.
    pub(crate) fn take_change(&self) -> Option<LedgerView> {
        self.changes.lock().ok().and_then(|mut latest| latest.take())
    }

    /// Prints refreshed totals when the last command changed the ledger.
    pub(crate) fn announce_change(&self) {
        if let Some(view) = self.take_change() {
            cli_io::print_info(format!(
                "Running total: {} ({}, {})",
                self.money(view.total),
                plural(view.rows.len(), "expense"),
                plural(view.summary.len(), "day")
            ));
        }
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        match self.ledger.status() {
            LedgerStatus::Ready => format!("trip ({})> ", self.ledger.len()),
            LedgerStatus::Degraded(_) => format!("trip ({}, unsaved)> ", self.ledger.len()),
        }
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            let outcome = handler(self, args);
            self.announce_change();
            match outcome {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = crate::cli::shell::parse_command_line(line)
            .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
        let Some(first) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let command = first.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, first, &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_hint(format!("Did you mean `{}`?", name));
            }
        }
    }

    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        match self.mode {
            CliMode::Script => Ok(false),
            CliMode::Interactive => cli_io::confirm_action(&self.theme, prompt, false),
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action(&self.theme, "Exit shell?", true).unwrap_or(true))
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Ledger(err) if err.is_persistence() => {
                cli_io::print_error(&err);
                cli_io::print_hint("The ledger is running without storage; retry later.");
                Ok(())
            }
            CommandError::Io(err) => Err(CliError::Io(err)),
            other => {
                cli_io::print_error(other);
                Ok(())
            }
        }
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
