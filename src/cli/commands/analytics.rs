use buddy_core::{
    AnalyticsReport, AnalyticsRequest, DayTypeStats, ACTIVITY_DAYS, DAILY_SPENDING_HINT,
};
use buddy_domain::Granularity;

use crate::cli::args::{parse_amount, parse_category, parse_count, parse_window, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::format::{budget, delta, money, percent, short_id};
use crate::cli::io;
use crate::cli::output::{line, section};
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "summary",
            "Totals, averages and change against the previous period",
            "summary [window] [--category <c>] [--json]",
            cmd_summary,
        ),
        CommandEntry::new(
            "categories",
            "Spending per category with share of the total",
            "categories [window]",
            cmd_categories,
        ),
        CommandEntry::new(
            "trend",
            "Spending per day, week or month",
            "trend [day|week|month] [periods] [--category <c>]",
            cmd_trend,
        ),
        CommandEntry::new(
            "activity",
            "Days with spending in the last 30 days",
            "activity [--category <c>]",
            cmd_activity,
        ),
        CommandEntry::new(
            "top",
            "Largest expenses in a window",
            "top [n] [--window <w>] [--category <c>]",
            cmd_top,
        ),
        CommandEntry::new(
            "split",
            "Weekday versus weekend spending",
            "split [window] [--category <c>]",
            cmd_split,
        ),
        CommandEntry::new(
            "budget",
            "Suggest a budget from recent spending",
            "budget [window] [--margin <fraction>] [--category <c>]",
            cmd_budget,
        ),
    ]
}

/// Request seeded from the stored preferences, then narrowed by `--category`.
fn base_request(
    context: &ShellContext,
    parsed: &ParsedArgs<'_>,
) -> Result<AnalyticsRequest, CommandError> {
    let config = &context.config;
    let category = parsed.option("category").map(parse_category).transpose()?;
    Ok(AnalyticsRequest::new(context.today())
        .with_window(config.default_window)
        .with_category(category)
        .with_granularity(Granularity::Month, config.trend_months)
        .with_top_n(config.top_n)
        .with_budget_margin(config.budget_margin))
}

fn windowed_request(
    context: &ShellContext,
    parsed: &ParsedArgs<'_>,
    window: Option<&str>,
) -> Result<AnalyticsRequest, CommandError> {
    let mut request = base_request(context, parsed)?;
    if let Some(raw) = window {
        request = request.with_window(parse_window(raw)?);
    }
    Ok(request)
}

fn window_label(report: &AnalyticsReport) -> String {
    match report.range {
        Some(range) => format!("{} to {}", range.start, range.end),
        None => "all time".to_string(),
    }
}

fn report_anomalies(report: &AnalyticsReport) {
    io::print_anomalies(&report.anomalies);
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["category"], &["json"])?;
    let request = windowed_request(context, &parsed, parsed.positional(0))?;
    let report = context.service.analytics(&request)?;

    if parsed.has("json") {
        line(serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let currency = context.config.currency.as_str();
    section(format!("Summary ({})", window_label(&report)));
    line(format!("  Total spent      {}", money(report.total, currency)));
    line(format!("  Expenses         {}", report.expense_count));
    line(format!(
        "  Per expense      {}",
        money(report.average_per_transaction, currency)
    ));
    line(format!(
        "  Per day          {}",
        money(report.average_daily, currency)
    ));
    let top = report
        .top_category
        .and_then(|category| Some((category, report.categories.get(category)?)));
    if let Some((category, totals)) = top {
        line(format!(
            "  Top category     {} ({})",
            category,
            money(totals.amount, currency)
        ));
    }
    if let (Some(previous), Some(change)) = (report.previous_total, report.delta.as_ref()) {
        line(format!(
            "  Previous period  {} ({})",
            money(previous, currency),
            delta(change)
        ));
    }
    line(format!(
        "  Suggested budget {}",
        budget(&report.budget, currency)
    ));
    print_insights(&report, currency);
    if !report.recent.is_empty() {
        line("  Recent:");
        for expense in &report.recent {
            line(format!(
                "    {} {} {} {}",
                short_id(&expense.id),
                expense.date,
                expense.name,
                money(expense.amount, currency)
            ));
        }
    }
    report_anomalies(&report);
    Ok(())
}

fn print_insights(report: &AnalyticsReport, currency: &str) {
    if report.expense_count == 0 {
        return;
    }
    let pace = if report.insights.high_daily_spending {
        format!(
            "above {} a day; consider a daily limit",
            money(DAILY_SPENDING_HINT, currency)
        )
    } else {
        "daily costs are under control".to_string()
    };
    line(format!("  Insight          {pace}"));
    if let Some((category, share)) = report.insights.top_category_share {
        line(format!(
            "  Insight          {} accounts for {} of spending",
            category,
            percent(share)
        ));
    }
}

fn cmd_categories(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let request = windowed_request(context, &parsed, parsed.positional(0))?;
    let report = context.service.analytics(&request)?;
    let currency = context.config.currency.as_str();

    section(format!("Categories ({})", window_label(&report)));
    if report.categories.is_empty() {
        io::print_info("No spending in this window.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("Category"),
        TableColumn::right("Amount"),
        TableColumn::right("Share"),
        TableColumn::right("Count"),
    ]);
    for (category, totals) in report.categories.sorted_by_amount() {
        table.add_row(vec![
            category.label().to_string(),
            money(totals.amount, currency),
            percent(totals.percentage),
            totals.count.to_string(),
        ]);
    }
    table.print();
    line(format!("Total {}", money(report.categories.grand_total, currency)));
    report_anomalies(&report);
    Ok(())
}

fn cmd_trend(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["category"], &[])?;
    let granularity = parsed
        .positional(0)
        .map(|raw| raw.parse::<Granularity>())
        .transpose()?
        .unwrap_or(Granularity::Month);
    let periods = match parsed.positional(1) {
        Some(raw) => u32::try_from(parse_count(raw, "period count")?).map_err(|_| {
            CommandError::InvalidArguments(format!("period count `{raw}` is too large"))
        })?,
        None => context.config.trend_months,
    };

    let request = base_request(context, &parsed)?.with_granularity(granularity, periods);
    let report = context.service.analytics(&request)?;
    let currency = context.config.currency.as_str();

    section(format!("Trend by {} (last {})", granularity, periods));
    let mut table = Table::new(vec![
        TableColumn::left("Period"),
        TableColumn::right("Amount"),
        TableColumn::right("Count"),
    ]);
    for bucket in &report.trend {
        table.add_row(vec![
            bucket.period.to_string(),
            money(bucket.amount, currency),
            bucket.count.to_string(),
        ]);
    }
    table.print();
    Ok(())
}

fn cmd_activity(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["category"], &[])?;
    let request = base_request(context, &parsed)?;
    let report = context.service.analytics(&request)?;
    let currency = context.config.currency.as_str();

    section(format!(
        "Daily activity (last {} days to {})",
        ACTIVITY_DAYS,
        context.today()
    ));
    if report.daily_activity.is_empty() {
        io::print_info("No spending in the last 30 days.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("Day"),
        TableColumn::right("Amount"),
        TableColumn::right("Count"),
    ]);
    for bucket in &report.daily_activity {
        table.add_row(vec![
            bucket.period.to_string(),
            money(bucket.amount, currency),
            bucket.count.to_string(),
        ]);
    }
    table.print();
    Ok(())
}

fn cmd_top(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["window", "category"], &[])?;
    let mut request = windowed_request(context, &parsed, parsed.option("window"))?;
    if let Some(raw) = parsed.positional(0) {
        request = request.with_top_n(parse_count(raw, "n")?);
    }
    let report = context.service.analytics(&request)?;
    let currency = context.config.currency.as_str();

    section(format!(
        "Top {} expenses ({})",
        request.top_n,
        window_label(&report)
    ));
    if report.top_expenses.is_empty() {
        io::print_info("No spending in this window.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::right("#"),
        TableColumn::left("ID"),
        TableColumn::left("Date"),
        TableColumn::left("Name"),
        TableColumn::left("Category"),
        TableColumn::right("Amount"),
    ]);
    for (rank, expense) in report.top_expenses.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            short_id(&expense.id),
            expense.date.to_string(),
            expense.name.clone(),
            expense.category.label().to_string(),
            money(expense.amount, currency),
        ]);
    }
    table.print();
    Ok(())
}

fn cmd_split(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["category"], &[])?;
    let request = windowed_request(context, &parsed, parsed.positional(0))?;
    let report = context.service.analytics(&request)?;
    let currency = context.config.currency.as_str();

    section(format!("Weekday vs weekend ({})", window_label(&report)));
    let mut table = Table::new(vec![
        TableColumn::left("Days"),
        TableColumn::right("Total"),
        TableColumn::right("Expenses"),
        TableColumn::right("Calendar days"),
        TableColumn::right("Per day"),
        TableColumn::right("Per expense"),
    ]);
    let row = |label: &str, stats: &DayTypeStats| {
        vec![
            label.to_string(),
            money(stats.total, currency),
            stats.transactions.to_string(),
            stats.days.to_string(),
            money(stats.average_per_day, currency),
            money(stats.average_per_transaction, currency),
        ]
    };
    table.add_row(row("Weekday", &report.day_split.weekday));
    table.add_row(row("Weekend", &report.day_split.weekend));
    table.print();
    Ok(())
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["margin", "category"], &[])?;
    let mut request = windowed_request(context, &parsed, parsed.positional(0))?;
    if let Some(raw) = parsed.option("margin") {
        request = request.with_budget_margin(parse_amount(raw)?);
    }
    let report = context.service.analytics(&request)?;
    let currency = context.config.currency.as_str();

    section(format!("Budget ({})", window_label(&report)));
    line(format!("  Spent            {}", money(report.total, currency)));
    line(format!(
        "  Margin           {}",
        percent(request.budget_margin * rust_decimal::Decimal::ONE_HUNDRED)
    ));
    line(format!(
        "  Suggested budget {}",
        budget(&report.budget, currency)
    ));
    Ok(())
}
