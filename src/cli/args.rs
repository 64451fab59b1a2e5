//! Positional arguments plus `--option value` pairs and `--switch` flags.

use std::str::FromStr;

use buddy_domain::{DateRange, ExpenseCategory, Window};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::cli::core::CommandError;

#[derive(Debug, Default)]
pub struct ParsedArgs<'a> {
    positional: Vec<&'a str>,
    options: Vec<(&'a str, &'a str)>,
    switches: Vec<&'a str>,
}

impl<'a> ParsedArgs<'a> {
    /// `options` take a value; `switches` do not. Anything else starting with `--` is rejected.
    pub fn parse(
        args: &[&'a str],
        options: &[&str],
        switches: &[&str],
    ) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(name) = arg.strip_prefix("--") else {
                parsed.positional.push(arg);
                continue;
            };
            if options.contains(&name) {
                let value = iter.next().ok_or_else(|| {
                    CommandError::InvalidArguments(format!("`--{name}` needs a value"))
                })?;
                parsed.options.push((name, value));
            } else if switches.contains(&name) {
                parsed.switches.push(name);
            } else {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `--{name}`"
                )));
            }
        }
        Ok(parsed)
    }

    pub fn positional(&self, index: usize) -> Option<&'a str> {
        self.positional.get(index).copied()
    }

    pub fn positional_count(&self) -> usize {
        self.positional.len()
    }

    /// Last value given for `name`.
    pub fn option(&self, name: &str) -> Option<&'a str> {
        self.options
            .iter()
            .rev()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    pub fn has(&self, switch: &str) -> bool {
        self.switches.contains(&switch)
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

pub fn parse_amount(input: &str) -> Result<Decimal, CommandError> {
    Decimal::from_str(input.trim())
        .map_err(|_| CommandError::InvalidArguments(format!("invalid amount `{}`", input)))
}

pub fn parse_category(input: &str) -> Result<ExpenseCategory, CommandError> {
    input.parse().map_err(CommandError::from)
}

pub fn parse_window(input: &str) -> Result<Window, CommandError> {
    input.parse().map_err(CommandError::from)
}

pub fn parse_count(input: &str, what: &str) -> Result<usize, CommandError> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("{what} must be a positive number, got `{input}`"))
        })
}

/// Builds a range from `--from`/`--to`; a missing bound is open on that side.
pub fn parse_bounds(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<DateRange>, CommandError> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    let start = from.map(parse_date).transpose()?.unwrap_or(NaiveDate::MIN);
    let end = to.map(parse_date).transpose()?.unwrap_or(NaiveDate::MAX);
    DateRange::new(start, end)
        .map(Some)
        .map_err(CommandError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_positionals_options_and_switches() {
        let args = ["Food", "--from", "2024-01-01", "--json", "extra"];
        let parsed = ParsedArgs::parse(&args, &["from"], &["json"]).unwrap();
        assert_eq!(parsed.positional(0), Some("Food"));
        assert_eq!(parsed.positional(1), Some("extra"));
        assert_eq!(parsed.option("from"), Some("2024-01-01"));
        assert!(parsed.has("json"));
    }

    #[test]
    fn rejects_unknown_and_incomplete_options() {
        assert!(ParsedArgs::parse(&["--nope"], &[], &[]).is_err());
        assert!(ParsedArgs::parse(&["--from"], &["from"], &[]).is_err());
    }

    #[test]
    fn negative_numbers_are_positional() {
        let parsed = ParsedArgs::parse(&["-3"], &[], &[]).unwrap();
        assert_eq!(parsed.positional(0), Some("-3"));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(parse_bounds(Some("2024-02-01"), Some("2024-01-01")).is_err());
        let open = parse_bounds(Some("2024-02-01"), None).unwrap().unwrap();
        assert_eq!(open.end, NaiveDate::MAX);
    }
}
