//! CLI for the ledger reports: events, search and the 90-day category spend.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use ledger_reports::client::MarketClient;
use ledger_reports::error::ReportError;
use ledger_reports::loader::load_transactions;
use ledger_reports::models::{CategoryTotal, Period, Transaction, TransactionTable};
use ledger_reports::reports::{
    build_events, expenses_by_category_last_90_days, search_records, search_transactions,
};
use ledger_reports::settings::load_watchlists;
use owo_colors::OwoColorize;
use serde_json::Value;

/// Environment variable holding the currency-data API key.
const CURRENCY_KEY_ENV: &str = "CURRENCY_DATA_API_KEY";

/// Environment variable holding the stock data API key.
const STOCK_KEY_ENV: &str = "MARKETSTACK_API_KEY";

/// Ledger reports: spending, income and market quotes from a bank export.
///
/// Without a subcommand, asks for the report inputs on the terminal and
/// prints the events, search and category reports as one JSON line each.
#[derive(Debug, Parser)]
#[command(name = "ledger-reports", version, about)]
struct Cli {
    /// Operations spreadsheet (.xlsx, .xls or .ods).
    #[arg(
        long,
        global = true,
        env = "LEDGER_TRANSACTIONS",
        default_value = "data/operations.xlsx",
        value_name = "FILE"
    )]
    transactions: PathBuf,
    /// Settings file with the watched currencies and stocks.
    #[arg(
        long,
        global = true,
        env = "LEDGER_SETTINGS",
        default_value = "user_settings.json",
        value_name = "FILE"
    )]
    settings: PathBuf,
    /// Report to run; interactive when omitted.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Expenses, income, currency rates and stock prices for one period.
    Events {
        /// Reference date (YYYY-MM-DD); the period ends on this day.
        date: String,
        /// Period code: W (week), M (month), Y (year) or ALL.
        #[arg(long, default_value = "M", value_parser = parse_period)]
        period: Period,
    },
    /// Operations whose category or description contains a term.
    Search {
        /// Text to look for, case-insensitive.
        term: String,
        /// Print a table instead of JSON.
        #[arg(long)]
        table: bool,
    },
    /// Spend of one category over the 90 days up to a date.
    Category {
        /// Category name, e.g. "supermarkets".
        category: String,
        /// Last day of the window (YYYY-MM-DD); today when omitted.
        #[arg(long)]
        date: Option<String>,
        /// Print a table instead of JSON.
        #[arg(long)]
        table: bool,
    },
}

/// Parses a period code for clap.
fn parse_period(s: &str) -> Result<Period, String> {
    s.parse().map_err(|err: ReportError| err.to_string())
}

/// Answers collected by the interactive mode.
#[derive(Debug, PartialEq, Eq)]
struct Answers {
    /// Reference date of the events report, if given.
    date: Option<String>,
    /// Period code of the events report.
    period: String,
    /// Search term.
    term: String,
    /// Category of the 90-day report.
    category: String,
    /// Last day of the 90-day window, if given.
    report_date: Option<String>,
}

/// Writes `label` to `prompts` and reads one trimmed line from `input`.
fn ask<R: BufRead, W: Write>(input: &mut R, prompts: &mut W, label: &str) -> io::Result<String> {
    write!(prompts, "{} ", label.bold())?;
    prompts.flush()?;
    let mut line = String::new();
    _ = input.read_line(&mut line)?;
    Ok(line.trim().to_owned())
}

/// Asks for every interactive input in turn.
fn read_answers<R: BufRead, W: Write>(input: &mut R, prompts: &mut W) -> io::Result<Answers> {
    let date = ask(input, prompts, "Cutoff date (YYYY-MM-DD):")?;
    let period = ask(input, prompts, "Period (W, M, Y, ALL; blank for month):")?;
    let term = ask(input, prompts, "Search term:")?;
    let category = ask(input, prompts, "Category for the 90-day report:")?;
    let report_date = ask(input, prompts, "Report date (YYYY-MM-DD; blank for today):")?;
    Ok(Answers {
        date: non_blank(date),
        period,
        term,
        category,
        report_date: non_blank(report_date),
    })
}

/// Treats an empty answer as not given.
fn non_blank(answer: String) -> Option<String> {
    (!answer.is_empty()).then_some(answer)
}

/// Prints a failure and returns `None`, or passes the value through.
fn report<T>(context: &str, result: ledger_reports::error::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} {context}: {err}",
                "error:".red().bold()
            )?;
            Ok(None)
        }
    }
}

/// Reads an API key from the environment, treating empty values as unset.
fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Builds the market client from the environment.
fn market_client() -> ledger_reports::error::Result<MarketClient> {
    let mut builder = MarketClient::builder();
    match env_key(CURRENCY_KEY_ENV) {
        Some(key) => builder = builder.currency_api_key(key),
        None => tracing::warn!(variable = CURRENCY_KEY_ENV, "API key not set"),
    }
    match env_key(STOCK_KEY_ENV) {
        Some(key) => builder = builder.stock_api_key(key),
        None => tracing::warn!(variable = STOCK_KEY_ENV, "API key not set"),
    }
    builder.build()
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let Some(table) = report(
        "failed to load operations",
        load_transactions(&cli.transactions),
    )?
    else {
        return Ok(ExitCode::FAILURE);
    };

    match cli.command {
        None => cmd_interactive(&cli.settings, table),
        Some(Command::Events { date, period }) => cmd_events(&cli.settings, table, &date, period),
        Some(Command::Search { term, table: as_table }) => cmd_search(&table, &term, as_table),
        Some(Command::Category {
            category,
            date,
            table: as_table,
        }) => cmd_category(&table, &category, date.as_deref(), as_table),
    }
}

/// Loads the watch-lists and builds the events report.
fn events_json(
    settings: &Path,
    table: TransactionTable,
    date: Option<&str>,
    period: Period,
) -> ledger_reports::error::Result<String> {
    let watchlists = load_watchlists(settings)?;
    let market = market_client()?;
    let spinner = make_spinner("Fetching exchange rates and stock prices...");
    let events = build_events(table, date, Some(period), &watchlists, &market);
    spinner.finish_and_clear();
    events?.to_json()
}

/// Runs the three reports from terminal answers.
fn cmd_interactive(settings: &Path, table: TransactionTable) -> io::Result<ExitCode> {
    let answers = read_answers(&mut io::stdin().lock(), &mut io::stderr().lock())?;
    let Some(period) = report("invalid period", answers.period.parse::<Period>())? else {
        return Ok(ExitCode::FAILURE);
    };

    let search_result = table.to_records().and_then(|records| {
        search_records(
            Some(&Value::Array(records)),
            Some(&Value::String(answers.term)),
        )
        .and_then(|rows| serde_json::to_string(&rows).map_err(ReportError::from))
    });
    let category_result = expenses_by_category_last_90_days(
        Some(&table),
        Some(&answers.category),
        answers.report_date.as_deref(),
    )
    .and_then(|totals| serde_json::to_string(&totals).map_err(ReportError::from));

    let Some(events) = report(
        "events report failed",
        events_json(settings, table, answers.date.as_deref(), period),
    )?
    else {
        return Ok(ExitCode::FAILURE);
    };
    let Some(found) = report("search failed", search_result)? else {
        return Ok(ExitCode::FAILURE);
    };
    let Some(spend) = report("category report failed", category_result)? else {
        return Ok(ExitCode::FAILURE);
    };

    let mut out = io::stdout().lock();
    writeln!(out, "{events}")?;
    writeln!(out, "{found}")?;
    writeln!(out, "{spend}")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `events` subcommand.
fn cmd_events(
    settings: &Path,
    table: TransactionTable,
    date: &str,
    period: Period,
) -> io::Result<ExitCode> {
    let Some(json) = report(
        "events report failed",
        events_json(settings, table, Some(date), period),
    )?
    else {
        return Ok(ExitCode::FAILURE);
    };
    writeln!(io::stdout().lock(), "{json}")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `search` subcommand.
fn cmd_search(table: &TransactionTable, term: &str, as_table: bool) -> io::Result<ExitCode> {
    if as_table {
        print_transactions_table(&search_transactions(table.rows(), term))?;
        return Ok(ExitCode::SUCCESS);
    }
    let search_result = table
        .to_records()
        .and_then(|records| {
            search_records(
                Some(&Value::Array(records)),
                Some(&Value::String(term.to_owned())),
            )
        })
        .and_then(|rows| serde_json::to_string(&rows).map_err(ReportError::from));
    let Some(json) = report("search failed", search_result)? else {
        return Ok(ExitCode::FAILURE);
    };
    writeln!(io::stdout().lock(), "{json}")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `category` subcommand.
fn cmd_category(
    table: &TransactionTable,
    category: &str,
    date: Option<&str>,
    as_table: bool,
) -> io::Result<ExitCode> {
    let Some(totals) = report(
        "category report failed",
        expenses_by_category_last_90_days(Some(table), Some(category), date),
    )?
    else {
        return Ok(ExitCode::FAILURE);
    };
    if as_table {
        print_totals_table(&totals)?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(json) = report(
        "failed to serialize report",
        serde_json::to_string(&totals).map_err(ReportError::from),
    )?
    else {
        return Ok(ExitCode::FAILURE);
    };
    writeln!(io::stdout().lock(), "{json}")?;
    Ok(ExitCode::SUCCESS)
}

// ── Output formatting ────────────────────────────────────────────────

/// Builds the table of matching operations.
fn transactions_table(rows: &[&Transaction]) -> Table {
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
    ]);
    for row in rows {
        let date = row
            .operation_date
            .as_ref()
            .map_or_else(|| "\u{2014}".to_owned(), ToString::to_string);
        let amount = if row.operation_amount < 0.0_f64 {
            Cell::new(format!("{:.2}", row.operation_amount)).fg(Color::Red)
        } else {
            Cell::new(format!("{:.2}", row.operation_amount)).fg(Color::Green)
        };
        _ = table.add_row(vec![
            Cell::new(date),
            Cell::new(row.category_text()),
            Cell::new(row.description_text()),
            amount.set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Prints matching operations in a table.
fn print_transactions_table(rows: &[&Transaction]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if rows.is_empty() {
        writeln!(out, "{}", "No operations found.".dimmed())?;
        return Ok(());
    }
    writeln!(
        out,
        "{} {}",
        "Operations".green().bold(),
        format_args!("({})", rows.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{}", transactions_table(rows))?;
    Ok(())
}

/// Prints category totals in a table.
fn print_totals_table(totals: &[CategoryTotal]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if totals.is_empty() {
        writeln!(out, "{}", "No spending in this category.".dimmed())?;
        return Ok(());
    }
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
    ]);
    for total in totals {
        _ = table.add_row(vec![
            Cell::new(&total.category),
            Cell::new(format!("{:.2}", total.amount)).set_alignment(CellAlignment::Right),
        ]);
    }
    writeln!(out, "{}", "Last 90 days".green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // Last resort: if stderr itself failed there is nothing left to do.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
