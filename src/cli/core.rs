//! Command dispatch, shell error type and context helpers shared by every command.

use std::io;

use buddy_config::ConfigError;
use buddy_core::{Anomaly, CoreError, ExpenseQuery};
use buddy_domain::{DomainError, Expense, ExpenseId};
use strsim::levenshtein;

use crate::errors::{BuddyError, CliError};

use super::io as cli_io;
use super::registry::CommandEntry;
pub use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

impl ShellContext {
    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Exit shell?", true)
            .map_err(|err| CliError::Command(err.to_string()))
    }

    /// Asks for confirmation in interactive mode; scripts always proceed.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_info("Use `help <command>` for usage details.");
                Ok(())
            }
            other => {
                cli_io::print_error(other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager
            .save(&self.config)
            .map_err(CommandError::from)
    }

    /// The skipped record whose id is exactly `token`, if any.
    pub(crate) fn malformed_record(&self, token: &str) -> Result<Option<Anomaly>, CommandError> {
        let needle = token.trim();
        let snapshot = self.service.load()?;
        Ok(snapshot
            .anomalies
            .into_iter()
            .find(|anomaly| anomaly.record_id == needle))
    }

    /// Resolves a full id or a unique prefix of one, as printed by `list`.
    pub(crate) fn resolve_expense(&self, token: &str) -> Result<Expense, CommandError> {
        let needle = token.trim();
        if needle.is_empty() {
            return Err(CommandError::InvalidArguments("expense id is required".into()));
        }
        let snapshot = self.service.list(&ExpenseQuery::new())?;
        if let Some(exact) = snapshot
            .expenses
            .iter()
            .find(|expense| expense.id.as_str() == needle)
        {
            return Ok(exact.clone());
        }
        let mut matches = snapshot
            .expenses
            .into_iter()
            .filter(|expense| expense.id.as_str().starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(found), None) => Ok(found),
            (None, _) => Err(CommandError::Core(BuddyError::Core(
                CoreError::ExpenseNotFound(ExpenseId::new(needle)),
            ))),
            (Some(_), Some(_)) => Err(CommandError::InvalidArguments(format!(
                "id prefix `{}` matches more than one expense",
                needle
            ))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] BuddyError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidParameter(message) | CoreError::Validation(message) => {
                CommandError::InvalidArguments(message)
            }
            other => CommandError::Core(other.into()),
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidValue { .. } | ConfigError::UnknownKey(_) => {
                CommandError::InvalidArguments(err.to_string())
            }
            other => CommandError::Core(other.into()),
        }
    }
}

impl From<DomainError> for CommandError {
    fn from(err: DomainError) -> Self {
        CommandError::InvalidArguments(err.to_string())
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[cfg(test)]
impl ShellContext {
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match super::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                cli_io::print_warning(err.to_string());
                return Ok(LoopControl::Continue);
            }
        };

        if tokens.is_empty() {
            return Ok(LoopControl::Continue);
        }

        let command = tokens[0].to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, &tokens[0], &args)
    }
}
