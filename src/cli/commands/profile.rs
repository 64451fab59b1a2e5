use buddy_domain::{Gender, UserProfile};

use crate::cli::args::parse_amount;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::format::money;
use crate::cli::output::{line, section};
use crate::cli::{io, registry::CommandEntry};

const FIELDS: &str = "name|phone|age|gender|income";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "profile",
        "Show or update your profile",
        "profile [show|set <name|phone|age|gender|income> <value>|clear <field>]",
        cmd_profile,
    )]
}

fn cmd_profile(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = args.first().map(|a| a.to_lowercase());
    match action.as_deref() {
        None | Some("show") => show_profile(context),
        Some("set") => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(format!(
                    "usage: profile set <{FIELDS}> <value>"
                )));
            }
            let value = args[2..].join(" ");
            let mut profile = load_or_new(context)?;
            apply_field(&mut profile, args[1], Some(value.trim()))?;
            context.profiles.save_profile(&profile)?;
            io::print_success(format!("Profile {} updated.", args[1]));
            Ok(())
        }
        Some("clear") => {
            let field = args.get(1).ok_or_else(|| {
                CommandError::InvalidArguments(format!("usage: profile clear <{FIELDS}>"))
            })?;
            let mut profile = load_or_new(context)?;
            apply_field(&mut profile, field, None)?;
            context.profiles.save_profile(&profile)?;
            io::print_success(format!("Profile {} cleared.", field));
            Ok(())
        }
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown profile action `{}`",
            other
        ))),
    }
}

fn load_or_new(context: &ShellContext) -> Result<UserProfile, CommandError> {
    let owner = context.owner();
    Ok(context
        .profiles
        .load_profile(owner)?
        .unwrap_or_else(|| UserProfile::new(owner, "")))
}

/// `None` clears an optional field; the name can be changed but not cleared.
fn apply_field(
    profile: &mut UserProfile,
    field: &str,
    value: Option<&str>,
) -> Result<(), CommandError> {
    match (field.to_lowercase().as_str(), value) {
        ("name", Some(name)) if !name.is_empty() => profile.name = name.to_string(),
        ("name", _) => {
            return Err(CommandError::InvalidArguments("name cannot be empty".into()));
        }
        ("phone", value) => profile.phone = value.map(str::to_string),
        ("age", Some(raw)) => {
            let age = raw
                .parse::<u32>()
                .ok()
                .filter(|age| (1..=150).contains(age))
                .ok_or_else(|| CommandError::InvalidArguments(format!("invalid age `{raw}`")))?;
            profile.age = Some(age);
        }
        ("age", None) => profile.age = None,
        ("gender", Some(raw)) => profile.gender = Some(raw.parse::<Gender>()?),
        ("gender", None) => profile.gender = None,
        ("income", Some(raw)) => {
            let income = parse_amount(raw)?;
            if income.is_sign_negative() {
                return Err(CommandError::InvalidArguments(
                    "income cannot be negative".into(),
                ));
            }
            profile.income = Some(income);
        }
        ("income", None) => profile.income = None,
        (other, _) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown profile field `{other}` (expected {FIELDS})"
            )));
        }
    }
    Ok(())
}

fn show_profile(context: &ShellContext) -> CommandResult {
    let owner = context.owner();
    section("Profile");
    line(format!("  {:<8} {}", "user", owner));
    let Some(profile) = context.profiles.load_profile(owner)? else {
        io::print_info("No profile yet. Use `profile set name <your name>`.");
        return Ok(());
    };
    let none = || "-".to_string();
    line(format!("  {:<8} {}", "name", profile.name));
    line(format!(
        "  {:<8} {}",
        "phone",
        profile.phone.clone().unwrap_or_else(none)
    ));
    line(format!(
        "  {:<8} {}",
        "age",
        profile.age.map(|a| a.to_string()).unwrap_or_else(none)
    ));
    line(format!(
        "  {:<8} {}",
        "gender",
        profile.gender.map(|g| g.to_string()).unwrap_or_else(none)
    ));
    line(format!(
        "  {:<8} {}",
        "income",
        profile
            .income
            .map(|i| money(i, &context.config.currency))
            .unwrap_or_else(none)
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use buddy_domain::OwnerId;
    use rust_decimal::Decimal;

    #[test]
    fn fields_are_validated() {
        let mut profile = UserProfile::new(OwnerId::new(), "Ana");
        apply_field(&mut profile, "age", Some("34")).unwrap();
        apply_field(&mut profile, "income", Some("5200.50")).unwrap();
        apply_field(&mut profile, "gender", Some("prefer not to say")).unwrap();
        assert_eq!(profile.age, Some(34));
        assert_eq!(profile.income, Some(Decimal::new(520050, 2)));
        assert_eq!(profile.gender, Some(Gender::PreferNotToSay));

        assert!(apply_field(&mut profile, "age", Some("-1")).is_err());
        assert!(apply_field(&mut profile, "name", None).is_err());
        assert!(apply_field(&mut profile, "shoe_size", Some("9")).is_err());

        apply_field(&mut profile, "age", None).unwrap();
        assert_eq!(profile.age, None);
    }
}
