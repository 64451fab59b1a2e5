use buddy_config::Config;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output::{self, line, section};
use crate::cli::{io, registry::CommandEntry};

/// Keys that only take effect once the stores are reopened.
const RESTART_KEYS: [&str; 2] = ["data_root", "attachment_base_url"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and change preferences",
        "config [show|get <key>|set <key> <value>|reset]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = args.first().map(|a| a.to_lowercase());
    match action.as_deref() {
        None | Some("show") => show_config(context),
        Some("get") => {
            let key = args.get(1).ok_or_else(|| {
                CommandError::InvalidArguments("usage: config get <key>".into())
            })?;
            line(format!("{} = {}", key, context.config.get(key)?));
            Ok(())
        }
        Some("set") => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(format!(
                    "usage: config set <{}> <value>",
                    Config::KEYS.join("|")
                )));
            }
            let key = args[1];
            let value = args[2..].join(" ");
            context.config.set(key, &value)?;
            context.persist_config()?;
            output::apply_config(&context.config);
            io::print_success(format!("{} = {}", key, context.config.get(key)?));
            if RESTART_KEYS.contains(&key) {
                io::print_info("Restart the shell for this change to take effect.");
            }
            Ok(())
        }
        Some("reset") => {
            if !context.confirm("Reset all preferences to their defaults?")? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            let owner = context.config.owner_id;
            context.config = Config {
                owner_id: owner,
                ..Config::default()
            };
            context.persist_config()?;
            output::apply_config(&context.config);
            io::print_success("Preferences reset.");
            Ok(())
        }
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{}`",
            other
        ))),
    }
}

fn show_config(context: &ShellContext) -> CommandResult {
    section("Configuration");
    for key in Config::KEYS {
        line(format!("  {:<20} {}", key, context.config.get(key)?));
    }
    line(format!(
        "  {:<20} {}",
        "file",
        context.config_manager.config_path().display()
    ));
    Ok(())
}
