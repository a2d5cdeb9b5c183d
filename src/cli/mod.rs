use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::application::{AccountLedger, LedgerService, StatementSection};
use crate::config::Settings;
use crate::domain::{
    format_cents, format_money, parse_cents, AccountType, EntryId, JournalLine, NewJournalEntry,
};

/// Double-entry bookkeeping ledger
#[derive(Parser)]
#[command(name = "ledgerbook")]
#[command(about = "A small double-entry bookkeeping ledger with financial statements")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and install the default chart of accounts
    Init {
        /// Skip the default chart of accounts
        #[arg(long)]
        empty: bool,
    },

    /// Chart of accounts commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Post a balanced journal entry
    Post {
        /// Entry date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Memo for the entry
        #[arg(short, long, default_value = "")]
        memo: String,

        /// Debit line as CODE:AMOUNT[:DESCRIPTION] (repeatable)
        #[arg(long = "debit", value_name = "CODE:AMOUNT")]
        debits: Vec<String>,

        /// Credit line as CODE:AMOUNT[:DESCRIPTION] (repeatable)
        #[arg(long = "credit", value_name = "CODE:AMOUNT")]
        credits: Vec<String>,
    },

    /// Reverse a posted entry with an offsetting entry
    Reverse {
        /// Entry ID to reverse
        id: EntryId,

        /// Date of the reversal (YYYY-MM-DD, defaults to the original date)
        #[arg(long)]
        date: Option<String>,

        /// Memo for the reversal
        #[arg(short, long)]
        memo: Option<String>,
    },

    /// Show a journal entry
    Show {
        /// Entry ID
        id: EntryId,
    },

    /// List journal entries
    Journal {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Show the ledger for one account with running balances
    Ledger {
        /// Account code
        code: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Financial statements
    #[command(subcommand)]
    Report(ReportCommands),

    /// Verify ledger integrity
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export: accounts, journal, trial-balance, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// As-of date for the trial balance (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        as_of: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account code (must be unique), e.g. "1000"
        code: String,

        /// Account name
        name: String,

        /// Account type: asset, liability, equity, revenue, expense, cogs
        #[arg(short = 't', long = "type")]
        account_type: String,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// List accounts
    List {
        /// Only accounts of this type
        #[arg(short = 't', long = "type")]
        account_type: Option<String>,

        /// Include archived accounts
        #[arg(long)]
        all: bool,
    },

    /// Show account details and balance
    Show {
        /// Account code
        code: String,
    },

    /// Archive an account (soft delete)
    Archive {
        /// Account code
        code: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Account balances in debit and credit columns
    TrialBalance {
        /// As-of date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        as_of: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Revenue, cost of goods sold, expenses and net income
    IncomeStatement {
        /// Start date (YYYY-MM-DD, defaults to start of current month)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Assets, liabilities and equity
    BalanceSheet {
        /// As-of date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        as_of: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Month-to-date figures
    Dashboard {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let settings = self.settings;

        match self.command {
            Commands::Init { empty } => {
                let service = settings.init_service().await?;
                println!("Database initialized: {}", settings.database);
                if !empty {
                    let created = service.seed_default_chart().await?;
                    println!("Installed {} default accounts", created);
                }
            }

            Commands::Account(account_cmd) => {
                let service = settings.open_service().await?;
                run_account_command(&service, &settings, account_cmd).await?;
            }

            Commands::Post {
                date,
                memo,
                debits,
                credits,
            } => {
                let service = settings.open_service().await?;
                let date = match date {
                    Some(d) => parse_date(&d)?,
                    None => today(),
                };

                let mut entry = NewJournalEntry::new(date, memo);
                for arg in &debits {
                    let (code, amount, description) = parse_line_arg(arg)?;
                    let account = service.get_account_by_code(&code).await?;
                    entry = entry.with_line(with_optional_description(
                        JournalLine::debit(account.id, amount),
                        description,
                    ));
                }
                for arg in &credits {
                    let (code, amount, description) = parse_line_arg(arg)?;
                    let account = service.get_account_by_code(&code).await?;
                    entry = entry.with_line(with_optional_description(
                        JournalLine::credit(account.id, amount),
                        description,
                    ));
                }

                let posted = service.post_entry(entry).await?;
                println!(
                    "Posted entry #{} on {}: {}",
                    posted.id,
                    posted.date,
                    format_money(posted.total_debits(), &settings.currency)
                );
            }

            Commands::Reverse { id, date, memo } => {
                let service = settings.open_service().await?;
                let date = date.map(|d| parse_date(&d)).transpose()?;
                let result = service.reverse_entry(id, date, memo).await?;
                println!(
                    "Reversed entry #{} with entry #{} ({})",
                    result.original.id,
                    result.reversal.id,
                    format_money(result.reversal.total_debits(), &settings.currency)
                );
            }

            Commands::Show { id } => {
                let service = settings.open_service().await?;
                run_show_entry_command(&service, id).await?;
            }

            Commands::Journal { from, to } => {
                let service = settings.open_service().await?;
                let from = from.map(|d| parse_date(&d)).transpose()?;
                let to = to.map(|d| parse_date(&d)).transpose()?;
                run_journal_command(&service, from, to).await?;
            }

            Commands::Ledger {
                code,
                from,
                to,
                format,
            } => {
                let service = settings.open_service().await?;
                let from = from.map(|d| parse_date(&d)).transpose()?;
                let to = to.map(|d| parse_date(&d)).transpose()?;
                let account = service.get_account_by_code(&code).await?;
                let ledger = service.get_account_ledger(account.id, from, to).await?;
                print_ledger(&ledger, &format)?;
            }

            Commands::Report(report_cmd) => {
                let service = settings.open_service().await?;
                run_report_command(&service, &settings, report_cmd).await?;
            }

            Commands::Check => {
                let service = settings.open_service().await?;
                run_check_command(&service).await?;
            }

            Commands::Export {
                export_type,
                output,
                as_of,
            } => {
                let service = settings.open_service().await?;
                let as_of = match as_of {
                    Some(d) => parse_date(&d)?,
                    None => today(),
                };
                run_export_command(&service, &export_type, output.as_deref(), as_of).await?;
            }
        }

        Ok(())
    }
}

async fn run_account_command(
    service: &LedgerService,
    settings: &Settings,
    cmd: AccountCommands,
) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            code,
            name,
            account_type,
            description,
        } => {
            let account = service
                .create_account(code, name, &account_type, description)
                .await?;
            println!(
                "Created account: {} {} ({}, normal {})",
                account.code,
                account.name,
                account.account_type,
                account.normal_side()
            );
        }

        AccountCommands::List { account_type, all } => {
            let filter = account_type
                .map(|t| t.parse::<AccountType>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            let accounts = service.list_accounts(filter, all).await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<8} {:<32} {:<10} {:<7}", "CODE", "NAME", "TYPE", "NORMAL");
                println!("{}", "-".repeat(60));
                for account in accounts {
                    println!(
                        "{:<8} {:<32} {:<10} {:<7}{}",
                        account.code,
                        truncate(&account.name, 32),
                        account.account_type.as_str(),
                        account.normal_side().as_str(),
                        if account.is_archived() { " (archived)" } else { "" }
                    );
                }
            }
        }

        AccountCommands::Show { code } => {
            let account = service.get_account_by_code(&code).await?;
            let ledger = service.get_account_ledger(account.id, None, None).await?;

            println!("Account: {} {}", account.code, account.name);
            println!("  ID:          {}", account.id);
            println!("  Type:        {}", account.account_type);
            println!("  Normal side: {}", account.normal_side());
            if let Some(desc) = &account.description {
                println!("  Description: {}", desc);
            }
            println!(
                "  Created:     {}",
                account.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            if let Some(archived) = account.archived_at {
                println!("  Archived:    {}", archived.format("%Y-%m-%d %H:%M:%S"));
            }
            println!();
            println!(
                "  Balance:     {}",
                format_money(ledger.closing_balance, &settings.currency)
            );
            println!("  Lines:       {}", ledger.lines.len());
            if let Some(last) = ledger.lines.last() {
                println!("  Last entry:  #{} on {}", last.entry_id, last.date);
            }
        }

        AccountCommands::Archive { code } => {
            let account = service.archive_account(&code).await?;
            println!("Archived account: {} {}", account.code, account.name);
        }
    }
    Ok(())
}

async fn run_show_entry_command(service: &LedgerService, id: EntryId) -> Result<()> {
    let info = service.get_entry(id).await?;
    let accounts = service.account_index().await?;
    let entry = &info.entry;

    println!("Entry #{}", entry.id);
    println!("  Date:     {}", entry.date);
    println!("  Memo:     {}", entry.memo);
    println!("  Status:   {}", info.status);
    println!(
        "  Recorded: {}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(original) = entry.reverses {
        println!("  Reverses: #{}", original);
    }
    if let Some(reversal) = info.reversed_by {
        println!("  Reversed by: #{}", reversal);
    }
    println!();
    println!("  {:<8} {:<28} {:>14} {:>14}", "CODE", "ACCOUNT", "DEBIT", "CREDIT");
    println!("  {}", "-".repeat(67));
    for line in &entry.lines {
        let (code, name) = accounts
            .get(&line.account_id)
            .map(|a| (a.code.as_str(), a.name.as_str()))
            .unwrap_or(("?", "?"));
        println!(
            "  {:<8} {:<28} {:>14} {:>14}",
            code,
            truncate(name, 28),
            amount_or_blank(line.debit),
            amount_or_blank(line.credit)
        );
    }
    println!("  {}", "-".repeat(67));
    println!(
        "  {:<37} {:>14} {:>14}",
        "TOTAL",
        format_cents(entry.total_debits()),
        format_cents(entry.total_credits())
    );
    Ok(())
}

async fn run_journal_command(
    service: &LedgerService,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let entries = service.list_entries(from, to).await?;
    if entries.is_empty() {
        println!("No journal entries found.");
        return Ok(());
    }

    let accounts = service.account_index().await?;
    println!(
        "{:<6} {:<10} {:<30} {:>14} {:>14}",
        "ID", "DATE", "ACCOUNT / MEMO", "DEBIT", "CREDIT"
    );
    println!("{}", "-".repeat(78));
    for entry in &entries {
        let memo = match entry.reverses {
            Some(original) => format!("{} [reverses #{}]", entry.memo, original),
            None => entry.memo.clone(),
        };
        println!(
            "{:<6} {:<10} {}",
            format!("#{}", entry.id),
            entry.date,
            truncate(&memo, 60)
        );
        for line in &entry.lines {
            let label = accounts
                .get(&line.account_id)
                .map(|a| format!("{} {}", a.code, a.name))
                .unwrap_or_else(|| line.account_id.to_string());
            // Credits are indented, as in a paper journal
            let label = if line.is_debit() {
                label
            } else {
                format!("    {}", label)
            };
            println!(
                "{:<6} {:<10} {:<30} {:>14} {:>14}",
                "",
                "",
                truncate(&label, 30),
                amount_or_blank(line.debit),
                amount_or_blank(line.credit)
            );
        }
    }
    Ok(())
}

fn print_ledger(ledger: &AccountLedger, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(ledger)?);
        }
        "csv" => {
            println!("entry_id,date,memo,debit,credit,balance");
            for line in &ledger.lines {
                println!(
                    "{},{},\"{}\",{},{},{}",
                    line.entry_id,
                    line.date,
                    line.memo.replace('"', "\"\""),
                    format_cents(line.debit),
                    format_cents(line.credit),
                    format_cents(line.balance)
                );
            }
        }
        _ => {
            let account = &ledger.account;
            println!(
                "Ledger: {} {} ({}, normal {})",
                account.code,
                account.name,
                account.account_type,
                account.normal_side()
            );
            println!(
                "Period: {} to {}",
                ledger
                    .from
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "beginning".into()),
                ledger
                    .to
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "end".into())
            );
            println!();
            println!(
                "{:<10} {:<6} {:<24} {:>12} {:>12} {:>14}",
                "DATE", "ENTRY", "MEMO", "DEBIT", "CREDIT", "BALANCE"
            );
            println!("{}", "-".repeat(83));
            println!(
                "{:<10} {:<6} {:<24} {:>12} {:>12} {:>14}",
                "",
                "",
                "Opening balance",
                "",
                "",
                format_cents(ledger.opening_balance)
            );
            for line in &ledger.lines {
                println!(
                    "{:<10} {:<6} {:<24} {:>12} {:>12} {:>14}",
                    line.date,
                    format!("#{}", line.entry_id),
                    truncate(line.description.as_deref().unwrap_or(&line.memo), 24),
                    amount_or_blank(line.debit),
                    amount_or_blank(line.credit),
                    format_cents(line.balance)
                );
            }
            println!("{}", "-".repeat(83));
            println!(
                "{:<42} {:>40}",
                "Closing balance",
                format_cents(ledger.closing_balance)
            );
        }
    }
    Ok(())
}

async fn run_report_command(
    service: &LedgerService,
    settings: &Settings,
    cmd: ReportCommands,
) -> Result<()> {
    let currency = settings.currency.as_str();

    match cmd {
        ReportCommands::TrialBalance { as_of, format } => {
            let as_of = as_of.map(|d| parse_date(&d)).transpose()?.unwrap_or_else(today);
            let report = service.trial_balance(as_of).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    println!("code,name,type,debit,credit");
                    for row in &report.rows {
                        println!(
                            "{},\"{}\",{},{},{}",
                            row.code,
                            row.name.replace('"', "\"\""),
                            row.account_type,
                            format_cents(row.debit),
                            format_cents(row.credit)
                        );
                    }
                }
                _ => {
                    println!("{}", settings.app_name);
                    println!("Trial Balance as of {} ({})", report.as_of, currency);
                    println!();
                    println!("{:<8} {:<32} {:>15} {:>15}", "CODE", "ACCOUNT", "DEBIT", "CREDIT");
                    println!("{}", "-".repeat(73));
                    for row in &report.rows {
                        println!(
                            "{:<8} {:<32} {:>15} {:>15}",
                            row.code,
                            truncate(&row.name, 32),
                            amount_or_blank(row.debit),
                            amount_or_blank(row.credit)
                        );
                    }
                    println!("{}", "-".repeat(73));
                    println!(
                        "{:<41} {:>15} {:>15}",
                        "TOTAL",
                        format_cents(report.total_debit),
                        format_cents(report.total_credit)
                    );
                }
            }
        }

        ReportCommands::IncomeStatement { from, to, format } => {
            let to = to.map(|d| parse_date(&d)).transpose()?.unwrap_or_else(today);
            let from = match from {
                Some(d) => parse_date(&d)?,
                None => month_start(to),
            };
            let report = service.income_statement(from, to).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    println!("section,code,name,amount");
                    print_section_csv("revenue", &report.revenue);
                    print_section_csv("cogs", &report.cost_of_goods_sold);
                    print_section_csv("expense", &report.expenses);
                    println!("gross_profit,,,{}", format_cents(report.gross_profit));
                    println!("net_income,,,{}", format_cents(report.net_income));
                }
                _ => {
                    println!("{}", settings.app_name);
                    println!(
                        "Income Statement {} to {} ({})",
                        report.from, report.to, currency
                    );
                    println!();
                    print_section("Revenue", &report.revenue, "Total Revenue");
                    print_section(
                        "Cost of Goods Sold",
                        &report.cost_of_goods_sold,
                        "Total COGS",
                    );
                    println!("{:<36} {:>15}", "Gross Profit", format_cents(report.gross_profit));
                    println!();
                    print_section("Expenses", &report.expenses, "Total Expenses");
                    println!("{}", "=".repeat(52));
                    println!("{:<36} {:>15}", "Net Income", format_cents(report.net_income));
                }
            }
        }

        ReportCommands::BalanceSheet { as_of, format } => {
            let as_of = as_of.map(|d| parse_date(&d)).transpose()?.unwrap_or_else(today);
            let report = service.balance_sheet(as_of).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    println!("section,code,name,amount");
                    print_section_csv("asset", &report.assets);
                    print_section_csv("liability", &report.liabilities);
                    print_section_csv("equity", &report.equity);
                    println!(
                        "equity,,Current Earnings,{}",
                        format_cents(report.current_earnings)
                    );
                }
                _ => {
                    println!("{}", settings.app_name);
                    println!("Balance Sheet as of {} ({})", report.as_of, currency);
                    println!();
                    print_section("Assets", &report.assets, "Total Assets");
                    print_section("Liabilities", &report.liabilities, "Total Liabilities");
                    println!("Equity:");
                    for line in &report.equity.lines {
                        println!(
                            "  {:<34} {:>15}",
                            truncate(&line.name, 34),
                            format_cents(line.balance)
                        );
                    }
                    println!(
                        "  {:<34} {:>15}",
                        "Current Earnings",
                        format_cents(report.current_earnings)
                    );
                    println!("  {:<34} {:>15}", "", "-".repeat(15));
                    println!(
                        "  {:<34} {:>15}",
                        "Total Equity",
                        format_cents(report.total_equity)
                    );
                    println!();
                    println!("{}", "=".repeat(52));
                    println!(
                        "{:<36} {:>15}",
                        "Liabilities + Equity",
                        format_cents(report.total_liabilities_and_equity)
                    );
                }
            }
        }

        ReportCommands::Dashboard { format } => {
            let kpis = service.month_to_date_kpis(today()).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&kpis)?),
                "csv" => {
                    println!("metric,amount");
                    println!("revenue,{}", format_cents(kpis.revenue));
                    println!("cost_of_goods_sold,{}", format_cents(kpis.cost_of_goods_sold));
                    println!("expenses,{}", format_cents(kpis.expenses));
                    println!("gross_profit,{}", format_cents(kpis.gross_profit));
                    println!("net_profit,{}", format_cents(kpis.net_profit));
                    println!("cash_balance,{}", format_cents(kpis.cash_balance));
                }
                _ => {
                    println!("{}", settings.app_name);
                    println!("Month to date: {} to {}", kpis.period_start, kpis.as_of);
                    println!();
                    println!("  {:<20} {:>20}", "Revenue", format_money(kpis.revenue, currency));
                    println!(
                        "  {:<20} {:>20}",
                        "Cost of goods sold",
                        format_money(kpis.cost_of_goods_sold, currency)
                    );
                    println!("  {:<20} {:>20}", "Expenses", format_money(kpis.expenses, currency));
                    println!(
                        "  {:<20} {:>20}",
                        "Gross profit",
                        format_money(kpis.gross_profit, currency)
                    );
                    println!(
                        "  {:<20} {:>20}",
                        "Net profit",
                        format_money(kpis.net_profit, currency)
                    );
                    println!(
                        "  {:<20} {:>20}",
                        "Cash balance",
                        format_money(kpis.cash_balance, currency)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    let report = service.check_integrity().await?;

    println!("Ledger Integrity Check");
    println!("  Accounts: {}", report.account_count);
    println!("  Entries:  {}", report.entry_count);
    println!("  Lines:    {}", report.line_count);
    println!();

    if report.is_ok() {
        println!("OK: every entry balances and the ledger totals agree");
        Ok(())
    } else {
        println!("Problems found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("ledger integrity check failed with {} issue(s)", report.issues.len())
    }
}

async fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    output: Option<&str>,
    as_of: NaiveDate,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "accounts" => {
            let count = exporter.export_accounts_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} accounts", count);
            }
        }
        "journal" => {
            let count = exporter.export_journal_csv(writer, None, None).await?;
            if output.is_some() {
                eprintln!("Exported {} journal lines", count);
            }
        }
        "trial-balance" => {
            let count = exporter.export_trial_balance_csv(writer, as_of).await?;
            if output.is_some() {
                eprintln!("Exported trial balance with {} accounts", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} accounts, {} entries",
                    snapshot.accounts.len(),
                    snapshot.entries.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: accounts, journal, trial-balance, full",
                export_type
            );
        }
    }

    Ok(())
}

fn print_section(title: &str, section: &StatementSection, total_label: &str) {
    println!("{}:", title);
    for line in &section.lines {
        println!(
            "  {:<34} {:>15}",
            truncate(&line.name, 34),
            format_cents(line.balance)
        );
    }
    println!("  {:<34} {:>15}", "", "-".repeat(15));
    println!("  {:<34} {:>15}", total_label, format_cents(section.total));
    println!();
}

fn print_section_csv(section_name: &str, section: &StatementSection) {
    for line in &section.lines {
        println!(
            "{},{},\"{}\",{}",
            section_name,
            line.code,
            line.name.replace('"', "\"\""),
            format_cents(line.balance)
        );
    }
}

/// Parse "CODE:AMOUNT" or "CODE:AMOUNT:DESCRIPTION".
fn parse_line_arg(arg: &str) -> Result<(String, i64, Option<String>)> {
    let mut parts = arg.splitn(3, ':');
    let code = parts.next().unwrap_or_default().trim();
    let amount = parts
        .next()
        .with_context(|| format!("Invalid line '{}'. Use CODE:AMOUNT", arg))?;
    let description = parts
        .next()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    if code.is_empty() {
        anyhow::bail!("Invalid line '{}': missing account code", arg);
    }
    let cents = parse_cents(amount)
        .with_context(|| format!("Invalid amount '{}'. Use '1000.00' or '1000'", amount))?;

    Ok((code.to_string(), cents, description))
}

fn with_optional_description(line: JournalLine, description: Option<String>) -> JournalLine {
    match description {
        Some(d) => line.with_description(d),
        None => line,
    }
}

/// Parse a date string (YYYY-MM-DD)
fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn amount_or_blank(cents: i64) -> String {
    if cents == 0 {
        String::new()
    } else {
        format_cents(cents)
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_arg() {
        let (code, cents, desc) = parse_line_arg("1000:250.50").unwrap();
        assert_eq!(code, "1000");
        assert_eq!(cents, 25050);
        assert_eq!(desc, None);

        let (_, _, desc) = parse_line_arg("4000:10:Walk-in sale").unwrap();
        assert_eq!(desc.as_deref(), Some("Walk-in sale"));
    }

    #[test]
    fn test_parse_line_arg_invalid() {
        assert!(parse_line_arg("1000").is_err());
        assert!(parse_line_arg(":100").is_err());
        assert!(parse_line_arg("1000:abc").is_err());
        assert!(parse_line_arg("1000:1.234").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Cash", 10), "Cash");
        assert_eq!(truncate("Delivery & Courier Expense", 10), "Deliver...");
    }

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_cli_parses_post_command() {
        let cli = Cli::try_parse_from([
            "ledgerbook",
            "post",
            "--date",
            "2024-01-05",
            "--memo",
            "Cash sale",
            "--debit",
            "1000:1000.00",
            "--credit",
            "4000:1000.00",
        ])
        .unwrap();

        match cli.command {
            Commands::Post { debits, credits, .. } => {
                assert_eq!(debits, vec!["1000:1000.00"]);
                assert_eq!(credits, vec!["4000:1000.00"]);
            }
            _ => panic!("expected post command"),
        }
    }
}
