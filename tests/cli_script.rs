mod common;

use common::{fresh_home, owner_id, run_script, shell};
use predicates::prelude::*;
use predicates::str::contains;
use regex::Regex;

#[test]
fn script_mode_records_and_lists_expenses() {
    let home = fresh_home();
    shell(&home)
        .write_stdin(
            "add Lunch 12.50 Food 2024-03-20\n\
             add \"Taxi home\" 30 Travel 2024-03-22\n\
             list\n\
             exit\n",
        )
        .assert()
        .success()
        .stdout(contains("Added expense"))
        .stdout(contains("Taxi home"))
        .stdout(contains("2 expense(s), total 42.50 USD"));
}

#[test]
fn blank_lines_and_comments_are_ignored() {
    let home = fresh_home();
    shell(&home)
        .write_stdin("# seed data\n\nadd Bread 3 Food 2024-03-01\nlist\n")
        .assert()
        .success()
        .stdout(contains("1 expense(s), total 3.00 USD"))
        .stdout(contains("Unknown command").not());
}

#[test]
fn unknown_command_suggests_closest_name() {
    let home = fresh_home();
    shell(&home)
        .write_stdin("lsit\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `lsit`"))
        .stdout(contains("Suggestion: `list`?"));
}

#[test]
fn invalid_input_is_reported_without_ending_the_session() {
    let home = fresh_home();
    shell(&home)
        .write_stdin("add Refund -5 Other 2024-03-01\nadd Tea 2 Drinks\nlist\n")
        .assert()
        .success()
        .stdout(contains("ERROR"))
        .stdout(contains("unknown category"))
        .stdout(contains("No expenses match."));
}

#[test]
fn categories_report_shares_of_total() {
    let home = fresh_home();
    shell(&home)
        .write_stdin(
            "add Groceries 40 Food 2024-03-05\n\
             add Bus 30 Travel 2024-03-06\n\
             add Dinner 30 Food 2024-03-07\n\
             categories all\n",
        )
        .assert()
        .success()
        .stdout(contains("70.00 USD"))
        .stdout(contains("70.0%"))
        .stdout(contains("30.0%"))
        .stdout(contains("Total 100.00 USD"));
}

#[test]
fn trend_fills_months_without_spending() {
    let home = fresh_home();
    let stdout = run_script(
        &home,
        "add Rent 900 Utilities 2024-01-03\nadd Rent 950 Utilities 2024-03-03\ntrend month 3\n",
    );
    assert!(stdout.contains("2024-01"));
    let february = stdout
        .lines()
        .find(|line| line.starts_with("2024-02"))
        .expect("february row");
    assert!(february.contains("0.00 USD"));
    assert!(stdout.contains("950.00 USD"));
}

#[test]
fn summary_compares_with_previous_period() {
    let home = fresh_home();
    shell(&home)
        .write_stdin(
            "add Old 100 Other 2024-02-10\n\
             add New 150 Other 2024-03-10\n\
             summary 2024-03-01..2024-03-31\n",
        )
        .assert()
        .success()
        .stdout(contains("Total spent      150.00 USD"))
        .stdout(contains("Previous period  100.00 USD (+50.0%)"))
        .stdout(contains("Suggested budget 165.00 USD"));
}

#[test]
fn summary_json_is_machine_readable() {
    let home = fresh_home();
    let stdout = run_script(&home, "add Cinema 18 Entertainment 2024-03-30\nsummary all --json\n");
    let start = stdout.find('{').expect("json output");
    let end = stdout.rfind('}').expect("json output");
    let report: serde_json::Value =
        serde_json::from_str(&stdout[start..=end]).expect("valid json");
    assert_eq!(report["expense_count"], 1);
    assert!(report["range"].is_null());
}

#[test]
fn budget_without_spending_needs_more_data() {
    let home = fresh_home();
    shell(&home)
        .write_stdin("budget\n")
        .assert()
        .success()
        .stdout(contains("not enough data"));
}

#[test]
fn edit_and_delete_across_sessions() {
    let home = fresh_home();
    let stdout = run_script(&home, "add Gym 40 Healthcare 2024-03-01\n");
    let id_pattern = Regex::new(r"Added expense ([0-9a-f]{8})").expect("regex");
    let id = id_pattern
        .captures(&stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .expect("expense id in output");

    shell(&home)
        .write_stdin(format!("edit {id} --amount 45 --name \"Gym pass\"\nlist\n"))
        .assert()
        .success()
        .stdout(contains("Updated expense"))
        .stdout(contains("Gym pass"))
        .stdout(contains("45.00 USD"));

    shell(&home)
        .write_stdin(format!("delete {id}\nlist\n"))
        .assert()
        .success()
        .stdout(contains("Deleted expense"))
        .stdout(contains("No expenses match."));
}

#[test]
fn export_writes_csv_file() {
    let home = fresh_home();
    let target = home.join("out.csv");
    shell(&home)
        .write_stdin(format!(
            "add \"Train, return\" 23 Travel 2024-03-02\nadd Coffee 4.5 Food 2024-03-03\nexport {} --category travel\n",
            target.display()
        ))
        .assert()
        .success()
        .stdout(contains("Exported 1 expense(s)"));

    let csv = std::fs::read_to_string(&target).expect("read export");
    assert_eq!(
        csv,
        "Date,Name,Category,Amount\n2024-03-02,\"Train, return\",Travel,23\n"
    );
}

#[test]
fn receipts_can_be_attached() {
    let home = fresh_home();
    let receipt = home.join("receipt.pdf");
    let notes = home.join("notes.txt");
    std::fs::write(&receipt, b"%PDF-1.4").expect("write receipt");
    std::fs::write(&notes, b"not a receipt").expect("write notes");

    let stdout = run_script(&home, "add Laptop 900 Shopping 2024-03-15\n");
    let id = Regex::new(r"Added expense ([0-9a-f]{8})")
        .expect("regex")
        .captures(&stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .expect("expense id");

    shell(&home)
        .write_stdin(format!(
            "attach {id} {}\nattach {id} {}\n",
            receipt.display(),
            notes.display()
        ))
        .assert()
        .success()
        .stdout(contains("Attached receipt"))
        .stdout(contains("Unsupported attachment type"));

    let owner = owner_id(&home);
    let stored = home.join("data").join("receipts").join(owner);
    assert_eq!(std::fs::read_dir(stored).expect("receipts dir").count(), 1);
}

#[test]
fn malformed_rows_on_disk_are_skipped_and_counted() {
    let home = fresh_home();
    run_script(&home, "add Seed 1 Other 2024-03-01\n");
    let owner = owner_id(&home);
    let file = home
        .join("data")
        .join("expenses")
        .join(format!("{owner}.json"));
    let rows = format!(
        r#"[
  {{"id":"good","user_id":"{owner}","expense_name":"Rent","amount":"900","category":"Utilities","date":"2024-03-01"}},
  {{"id":"bad","user_id":"{owner}","expense_name":"Mystery","amount":"abc","category":"Other","date":"2024-03-02"}}
]"#
    );
    std::fs::write(&file, rows).expect("write rows");

    shell(&home)
        .write_stdin("list\nsummary all\n")
        .assert()
        .success()
        .stdout(contains("1 expense(s), total 900.00 USD"))
        .stdout(contains("Skipped 1 malformed record(s)."))
        .stdout(contains("record bad: amount `abc` is not numeric"));

    shell(&home)
        .write_stdin("delete bad\nlist\n")
        .assert()
        .success()
        .stdout(contains("Deleted malformed record bad."))
        .stdout(contains("1 expense(s), total 900.00 USD"))
        .stdout(contains("malformed record(s)").not());
}

#[test]
fn failed_export_leaves_no_file_behind() {
    let home = fresh_home();
    run_script(&home, "add Seed 1 Other 2024-03-01\n");
    let owner = owner_id(&home);
    let file = home
        .join("data")
        .join("expenses")
        .join(format!("{owner}.json"));
    std::fs::write(&file, "[{ broken").expect("corrupt store");

    let target = home.join("broken.csv");
    shell(&home)
        .write_stdin(format!("export {}\n", target.display()))
        .assert()
        .success()
        .stdout(contains("ERROR"))
        .stdout(contains("Exported").not());
    assert!(!target.exists());
}

#[test]
fn oversized_amounts_are_rejected() {
    let home = fresh_home();
    shell(&home)
        .write_stdin("add Yacht 50000000000000000000000000000 Other 2024-03-01\nlist\n")
        .assert()
        .success()
        .stdout(contains("must not exceed"))
        .stdout(contains("No expenses match."));
}

#[test]
fn activity_lists_recent_days_with_spending() {
    let home = fresh_home();
    let stdout = run_script(
        &home,
        "add Old 9 Food 2024-02-01\n\
         add Lunch 40 Food 2024-03-02\n\
         add Snack 5 Food 2024-03-30\n\
         add Tea 2 Food 2024-03-30\n\
         activity\n",
    );
    assert!(stdout.contains("Daily activity (last 30 days to 2024-03-31)"));
    let rows: Vec<_> = stdout
        .lines()
        .filter(|line| line.starts_with("2024-"))
        .collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("2024-03-02"));
    assert!(rows[1].starts_with("2024-03-30"));
    assert!(rows[1].contains("7.00 USD"));
}

#[test]
fn summary_offers_spending_insights() {
    let home = fresh_home();
    shell(&home)
        .write_stdin("add Flight 2000 Travel 2024-03-10\nadd Lunch 10 Food 2024-03-11\nsummary\n")
        .assert()
        .success()
        .stdout(contains("above 50.00 USD a day; consider a daily limit"))
        .stdout(contains("Travel accounts for 99.5% of spending"));
}

#[test]
fn config_changes_persist_between_sessions() {
    let home = fresh_home();
    shell(&home)
        .write_stdin("config set currency eur\nconfig set top_n 0\n")
        .assert()
        .success()
        .stdout(contains("currency = EUR"))
        .stdout(contains("must be at least 1"));

    shell(&home)
        .write_stdin("config get currency\nadd Bread 2 Food 2024-03-01\nlist\n")
        .assert()
        .success()
        .stdout(contains("currency = EUR"))
        .stdout(contains("2.00 EUR"));
}

#[test]
fn profile_round_trips() {
    let home = fresh_home();
    shell(&home)
        .write_stdin("profile set name Robin\nprofile set age 29\nprofile set gender female\nprofile\n")
        .assert()
        .success()
        .stdout(contains("Robin"))
        .stdout(contains("29"))
        .stdout(contains("Female"));
}

#[test]
fn help_lists_commands() {
    let home = fresh_home();
    shell(&home)
        .write_stdin("help\nhelp trend\n")
        .assert()
        .success()
        .stdout(contains("summary"))
        .stdout(contains("Usage: trend [day|week|month]"));
}

#[test]
fn version_reports_where_data_lives() {
    let home = fresh_home();
    let stdout = run_script(&home, "version\n");
    assert!(stdout.contains(&format!("Budget Buddy {}", env!("CARGO_PKG_VERSION"))));
    assert!(stdout.contains("Receipts"));
    assert!(stdout.contains(&owner_id(&home)));
}
