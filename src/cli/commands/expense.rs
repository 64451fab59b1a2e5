use std::{
    fs,
    path::{Path, PathBuf},
};

use buddy_core::{export_file_name, Anomaly, ExpenseQuery, SortOrder};
use buddy_domain::{Expense, ExpenseCategory, ExpenseId, ExpensePatch, NewExpense};

use crate::cli::args::{
    parse_amount, parse_bounds, parse_category, parse_count, parse_date, parse_window, ParsedArgs,
};
use crate::cli::core::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::format::{money, receipt_marker, short_id};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const FILTER_OPTIONS: [&str; 6] = ["search", "category", "from", "to", "window", "sort"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "add",
            "Record a new expense",
            "add <name> <amount> [category] [YYYY-MM-DD] [--receipt <file>]",
            cmd_add,
        ),
        CommandEntry::new(
            "edit",
            "Change fields of an expense",
            "edit <id> [--name <text>] [--amount <n>] [--category <c>] [--date <d>] [--clear-receipt]",
            cmd_edit,
        ),
        CommandEntry::new(
            "delete",
            "Delete an expense, or a malformed record by its full id",
            "delete <id> [--yes]",
            cmd_delete,
        ),
        CommandEntry::new(
            "list",
            "List expenses with search, filters and sorting",
            "list [search] [--category <c>] [--from <d>] [--to <d>] [--window <w>] [--sort <order>] [--limit <n>]",
            cmd_list,
        ),
        CommandEntry::new(
            "attach",
            "Attach a receipt image or PDF to an expense",
            "attach <id> <file>",
            cmd_attach,
        ),
        CommandEntry::new(
            "export",
            "Write the (filtered) expense list as CSV",
            "export [path] [--search <text>] [--category <c>] [--from <d>] [--to <d>] [--window <w>] [--sort <order>]",
            cmd_export,
        ),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["receipt"], &[])?;
    let expense = if parsed.positional_count() == 0 && context.mode == CliMode::Interactive {
        prompt_new_expense(context)?
    } else {
        new_expense_from_args(context, &parsed)?
    };

    let summary = format!(
        "{}, {}, {}, {}",
        expense.name.trim(),
        money(expense.amount, &context.config.currency),
        expense.category,
        expense.date
    );
    let id = context.service.add(expense)?;
    io::print_success(format!("Added expense {} ({}).", short_id(&id), summary));

    if let Some(receipt) = parsed.option("receipt") {
        let reference = upload_receipt(context, &id, Path::new(receipt))?;
        io::print_success(format!("Receipt stored at {}.", reference));
    }
    Ok(())
}

fn new_expense_from_args(
    context: &ShellContext,
    parsed: &ParsedArgs<'_>,
) -> Result<NewExpense, CommandError> {
    let (Some(name), Some(amount)) = (parsed.positional(0), parsed.positional(1)) else {
        return Err(CommandError::InvalidArguments(
            "usage: add <name> <amount> [category] [YYYY-MM-DD]".into(),
        ));
    };
    let category = parsed
        .positional(2)
        .map(parse_category)
        .transpose()?
        .unwrap_or_default();
    let date = parsed
        .positional(3)
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| context.today());
    Ok(NewExpense::new(name, parse_amount(amount)?, category, date))
}

fn prompt_new_expense(context: &ShellContext) -> Result<NewExpense, CommandError> {
    let name = io::prompt_text(&context.theme, "Expense name", None)?;
    let amount = parse_amount(&io::prompt_text(&context.theme, "Amount", None)?)?;
    let labels: Vec<&str> = ExpenseCategory::ALL.iter().map(|c| c.label()).collect();
    let default_index = ExpenseCategory::ALL
        .iter()
        .position(|c| *c == ExpenseCategory::default())
        .unwrap_or(0);
    let choice = io::prompt_select(&context.theme, "Category", &labels, default_index)?;
    let category = ExpenseCategory::ALL
        .get(choice)
        .copied()
        .unwrap_or_default();
    let today = context.today().format("%Y-%m-%d").to_string();
    let date = parse_date(&io::prompt_text(&context.theme, "Date", Some(&today))?)?;
    Ok(NewExpense::new(name, amount, category, date))
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(
        args,
        &["name", "amount", "category", "date"],
        &["clear-receipt"],
    )?;
    let token = parsed
        .positional(0)
        .ok_or_else(|| CommandError::InvalidArguments("usage: edit <id> --field value".into()))?;
    let expense = context.resolve_expense(token)?;

    let patch = ExpensePatch {
        name: parsed.option("name").map(str::to_string),
        amount: parsed.option("amount").map(parse_amount).transpose()?,
        category: parsed.option("category").map(parse_category).transpose()?,
        date: parsed.option("date").map(parse_date).transpose()?,
        attachment: parsed.has("clear-receipt").then_some(None),
    };
    if patch.is_empty() {
        return Err(CommandError::InvalidArguments(
            "nothing to change; pass at least one of --name, --amount, --category, --date, --clear-receipt".into(),
        ));
    }
    context.service.edit(&expense.id, patch)?;
    io::print_success(format!("Updated expense {}.", short_id(&expense.id)));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &["yes"])?;
    let token = parsed
        .positional(0)
        .ok_or_else(|| CommandError::InvalidArguments("usage: delete <id>".into()))?;
    let expense = match context.resolve_expense(token) {
        Ok(expense) => expense,
        Err(err) => {
            return match context.malformed_record(token)? {
                Some(anomaly) => delete_malformed(context, &parsed, anomaly),
                None => Err(err),
            };
        }
    };

    if !parsed.has("yes") {
        let prompt = format!(
            "Delete `{}` ({}) from {}?",
            expense.name,
            money(expense.amount, &context.config.currency),
            expense.date
        );
        if !context.confirm(&prompt)? {
            io::print_info("Deletion cancelled.");
            return Ok(());
        }
    }
    context.service.remove(&expense.id)?;
    io::print_success(format!("Deleted expense {}.", short_id(&expense.id)));
    Ok(())
}

fn delete_malformed(
    context: &ShellContext,
    parsed: &ParsedArgs<'_>,
    anomaly: Anomaly,
) -> CommandResult {
    if !parsed.has("yes") {
        let prompt = format!(
            "Delete malformed record `{}` ({})?",
            anomaly.record_id, anomaly.kind
        );
        if !context.confirm(&prompt)? {
            io::print_info("Deletion cancelled.");
            return Ok(());
        }
    }
    let id = ExpenseId::new(anomaly.record_id);
    context.service.remove(&id)?;
    io::print_success(format!("Deleted malformed record {}.", id));
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut options = FILTER_OPTIONS.to_vec();
    options.push("limit");
    let parsed = ParsedArgs::parse(args, &options, &[])?;
    let query = build_query(context, &parsed, parsed.positional(0))?;
    let limit = parsed
        .option("limit")
        .map(|raw| parse_count(raw, "limit"))
        .transpose()?;

    let listing = context.service.list(&query)?;
    if listing.expenses.is_empty() {
        io::print_info("No expenses match.");
    } else {
        let shown = limit.unwrap_or(listing.expenses.len());
        render_expenses(context, listing.expenses.iter().take(shown));
        let total: rust_decimal::Decimal = listing.expenses.iter().map(|e| e.amount).sum();
        output::line(format!(
            "{} expense(s), total {}",
            listing.expenses.len(),
            money(total, &context.config.currency)
        ));
    }
    io::print_anomalies(&listing.anomalies);
    Ok(())
}

fn cmd_attach(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (Some(token), Some(file)) = (args.first(), args.get(1)) else {
        return Err(CommandError::InvalidArguments(
            "usage: attach <id> <file>".into(),
        ));
    };
    let expense = context.resolve_expense(token)?;
    let reference = upload_receipt(context, &expense.id, Path::new(file))?;
    io::print_success(format!(
        "Attached receipt to {}: {}",
        short_id(&expense.id),
        reference
    ));
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &FILTER_OPTIONS, &[])?;
    let query = build_query(context, &parsed, None)?;
    let path = parsed
        .positional(0)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(export_file_name(context.today())));

    // Nothing touches the disk unless the whole export succeeded.
    let mut buffer = Vec::new();
    let rows = context.service.export(&query, &mut buffer)?;
    fs::write(&path, buffer)?;
    io::print_success(format!("Exported {} expense(s) to {}.", rows, path.display()));
    Ok(())
}

fn upload_receipt(
    context: &ShellContext,
    id: &buddy_domain::ExpenseId,
    file: &Path,
) -> Result<String, CommandError> {
    let bytes = fs::read(file)?;
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("`{}` is not a file name", file.display()))
        })?;
    let reference = context.service.attach_receipt(id, file_name, &bytes)?;
    Ok(reference.to_string())
}

fn build_query(
    context: &ShellContext,
    parsed: &ParsedArgs<'_>,
    search: Option<&str>,
) -> Result<ExpenseQuery, CommandError> {
    let mut query = ExpenseQuery::new();
    if let Some(term) = parsed.option("search").or(search) {
        query = query.with_search(term);
    }
    if let Some(category) = parsed.option("category") {
        query = query.with_category(parse_category(category)?);
    }
    if let Some(sort) = parsed.option("sort") {
        query = query.with_sort(sort.parse::<SortOrder>()?);
    }
    let window_range = parsed
        .option("window")
        .map(parse_window)
        .transpose()?
        .and_then(|window| window.resolve(context.today()));
    let bounds = parse_bounds(parsed.option("from"), parsed.option("to"))?;
    if let Some(range) = bounds.or(window_range) {
        query = query.with_range(range);
    }
    Ok(query)
}

fn render_expenses<'a>(context: &ShellContext, expenses: impl Iterator<Item = &'a Expense>) {
    let mut table = Table::new(vec![
        TableColumn::left("ID"),
        TableColumn::left("Date"),
        TableColumn::left("Name"),
        TableColumn::left("Category"),
        TableColumn::right("Amount"),
        TableColumn::left("Receipt"),
    ]);
    for expense in expenses {
        table.add_row(vec![
            short_id(&expense.id),
            expense.date.format("%Y-%m-%d").to_string(),
            expense.name.clone(),
            expense.category.label().to_string(),
            money(expense.amount, &context.config.currency),
            receipt_marker(expense).to_string(),
        ]);
    }
    table.print();
}
