use crate::cli::output::{line, section as output_section};
use crate::cli::registry::{CommandEntry, CommandRegistry};

pub fn print_overview(registry: &CommandRegistry) {
    output_section("Available commands");
    for entry in registry.list() {
        line(format!("  {:<12} {}", entry.name, entry.description));
    }
    line("Use `help <command>` for details.");
}

pub fn print_command(entry: &CommandEntry) {
    output_section(format!("Help: {}", entry.name));
    line(format!("  Description: {}", entry.description));
    line(format!("  Usage: {}", entry.usage));
}
