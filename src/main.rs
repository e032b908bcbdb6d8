//! D2C Calculators CLI
//!
//! Usage:
//!   d2c-calc list                                  Calculators and their access state
//!   d2c-calc calc unit-economics --set cogs=500    Evaluate one calculator
//!   d2c-calc calc runway --csv runway.csv          Evaluate and export the projection
//!   d2c-calc insight marketing                     AI recommendations
//!   d2c-calc optimize rto --apply                  AI-suggested inputs
//!   d2c-calc batch scenarios.json                  Evaluate a file of input records
//!   d2c-calc login founder@brand.in                Email identity
//!   d2c-calc unlock-phone "+91 98765 43210"        Phone identity

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use d2c_calculators::formulas::{self, ReorderTiming, Runway};
use d2c_calculators::input::{clamp_percent, parse_or_default};
use d2c_calculators::insight::FieldChange;
use d2c_calculators::session::FileStore;
use d2c_calculators::tracking::JsonlSink;
use d2c_calculators::{
    Access, AccessGate, AppConfig, CalculatorController, CalculatorKind, CalculatorOutput, DeviceType,
    EventLog, InsightClient, InsightGateway, ScenarioRunner, Session,
};

/// Financial calculators for e-commerce sellers
#[derive(Parser)]
#[command(name = "d2c-calc")]
#[command(about = "Unit economics, runway, marketing, inventory, COD/RTO and bundle calculators", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List calculators and whether this session can open them
    List,

    /// Evaluate a calculator
    Calc {
        /// Calculator name or route (e.g. unit-economics, runway, rto)
        calculator: CalculatorKind,

        /// Override an input, e.g. --set sellingPrice=1799
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Reference date for inventory dates (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Print inputs and metrics as JSON
        #[arg(long)]
        json: bool,

        /// Write the runway projection to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Ask the insight backend for recommendations
    Insight {
        calculator: CalculatorKind,

        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },

    /// Ask the insight backend for better inputs
    Optimize {
        calculator: CalculatorKind,

        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Apply the suggestion and show the recomputed metrics
        #[arg(long)]
        apply: bool,
    },

    /// Evaluate a JSON array of tagged input records
    Batch {
        file: PathBuf,

        #[arg(long)]
        as_of: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },

    /// One-off pricing quotes
    Quote {
        #[command(subcommand)]
        quote: QuoteCommand,
    },

    /// Verify a phone number for this device
    UnlockPhone { phone: String },

    /// Sign in with an email identity
    Login {
        email: String,

        #[arg(long)]
        name: Option<String>,
    },

    /// Sign out the email identity
    Logout,

    /// Show the current identities
    Whoami,
}

#[derive(Subcommand)]
enum QuoteCommand {
    /// Gateway fees on one transaction
    Settlement {
        #[arg(long, value_parser = amount_arg)]
        value: f64,

        /// Percentage fee
        #[arg(long, default_value = "2", value_parser = percent_arg)]
        rate: f64,

        #[arg(long, default_value = "0", value_parser = amount_arg)]
        flat_fee: f64,
    },

    /// Cost-plus price for a target margin versus a competitor
    Price {
        #[arg(long, value_parser = amount_arg)]
        cost: f64,

        /// Target gross margin, %
        #[arg(long, value_parser = percent_arg)]
        margin: f64,

        #[arg(long, value_parser = amount_arg)]
        competitor: f64,
    },
}

/// Numeric argument read the same way as a calculator field
fn amount_arg(raw: &str) -> std::result::Result<f64, String> {
    Ok(parse_or_default(raw))
}

fn percent_arg(raw: &str) -> std::result::Result<f64, String> {
    Ok(clamp_percent(parse_or_default(raw)))
}

struct App {
    config: AppConfig,
    store: FileStore,
    events: Arc<EventLog>,
    gate: AccessGate,
}

impl App {
    fn open(config: AppConfig) -> Self {
        let device = DeviceType::from_user_agent(config.user_agent.as_deref());
        let events = EventLog::new(Box::new(JsonlSink::new(config.events_path())), device);
        Self {
            store: FileStore::new(config.store_path()),
            events: Arc::new(events),
            gate: AccessGate::new(),
            config,
        }
    }

    fn session(&self) -> Session {
        Session::restore(&self.store)
    }

    /// Gate-checked controller with `--set` overrides applied
    fn controller(&self, kind: CalculatorKind, sets: &[String], as_of: Option<NaiveDate>) -> Result<CalculatorController> {
        let mut controller = self.gate.open(kind, &self.session())?;
        if let Some(date) = as_of {
            controller.set_as_of(date);
        }
        for assignment in sets {
            let (field, raw) = assignment
                .split_once('=')
                .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{}'", assignment))?;
            let stored = controller.set_field(field.trim(), raw)?;
            log::debug!("{} = {}", field.trim(), stored);
        }
        Ok(controller)
    }

    fn gateway(&self) -> Result<Option<InsightGateway>> {
        let client = InsightClient::from_config(&self.config).context("Failed to create insight backend")?;
        Ok(client.map(|c| InsightGateway::new(c, self.events.clone())))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Invalid configuration")?;
    let app = App::open(config);

    match cli.command {
        Commands::List => cmd_list(&app),
        Commands::Calc {
            calculator,
            set,
            as_of,
            json,
            csv,
        } => cmd_calc(&app, calculator, &set, as_of, json, csv.as_deref()),
        Commands::Insight { calculator, set } => cmd_insight(&app, calculator, &set).await,
        Commands::Optimize { calculator, set, apply } => cmd_optimize(&app, calculator, &set, apply).await,
        Commands::Batch { file, as_of, json } => cmd_batch(&app, &file, as_of, json),
        Commands::Quote { quote } => cmd_quote(quote),
        Commands::UnlockPhone { phone } => {
            let mut session = app.session();
            session.unlock_phone(&phone, &app.store, &app.events)?;
            println!("Phone verified. COD & RTO and bundle calculators unlocked.");
            Ok(())
        }
        Commands::Login { email, name } => {
            let mut session = app.session();
            session.sign_in(&email, name.as_deref(), &app.store, &app.events)?;
            println!("Signed in as {}", email.trim());
            Ok(())
        }
        Commands::Logout => {
            let mut session = app.session();
            session.sign_out(&app.store)?;
            println!("Signed out");
            Ok(())
        }
        Commands::Whoami => {
            let session = app.session();
            println!("Email: {}", session.email().unwrap_or("-"));
            println!("Phone: {}", session.phone().unwrap_or("-"));
            Ok(())
        }
    }
}

fn cmd_list(app: &App) -> Result<()> {
    let session = app.session();

    println!("{:<18} {:<32} {:<10} {}", "Calculator", "Title", "Access", "Description");
    println!("{}", "-".repeat(110));
    for kind in CalculatorKind::ALL {
        let access = if app.gate.check(kind, &session).is_granted() {
            "open".to_string()
        } else {
            format!("{:?}", app.gate.requirement(kind)).to_lowercase()
        };
        println!("{:<18} {:<32} {:<10} {}", kind, kind.title(), access, kind.description());
    }
    Ok(())
}

fn cmd_calc(
    app: &App,
    kind: CalculatorKind,
    sets: &[String],
    as_of: Option<NaiveDate>,
    json: bool,
    csv: Option<&Path>,
) -> Result<()> {
    let controller = app.controller(kind, sets, as_of)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    } else {
        println!("{}", kind.title());
        println!("{}\n", "=".repeat(kind.title().len()));
        print_inputs(&controller);
        print_output(controller.output());
    }

    if let Some(path) = csv {
        let CalculatorOutput::BreakEven(analysis) = controller.output() else {
            bail!("--csv is only available for the runway calculator");
        };
        let file = File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
        analysis.projection.write_csv(file)?;
        println!("\nProjection written to: {}", path.display());
    }
    Ok(())
}

async fn cmd_insight(app: &App, kind: CalculatorKind, sets: &[String]) -> Result<()> {
    let controller = app.controller(kind, sets, None)?;
    let Some(gateway) = app.gateway()? else {
        println!("AI insights are unavailable: set GEMINI_API_KEY or INSIGHT_BACKEND=mock");
        return Ok(());
    };

    let session = app.session();
    println!("Asking {} about {}...\n", gateway.model(), kind.context_label());
    let text = gateway
        .request_insight(kind.context_label(), &controller.snapshot(), session.user_label())
        .await;
    println!("{}", text);
    Ok(())
}

async fn cmd_optimize(app: &App, kind: CalculatorKind, sets: &[String], apply: bool) -> Result<()> {
    let mut controller = app.controller(kind, sets, None)?;
    let Some(gateway) = app.gateway()? else {
        println!("AI optimization is unavailable: set GEMINI_API_KEY or INSIGHT_BACKEND=mock");
        return Ok(());
    };

    let session = app.session();
    let ticket = controller.begin_optimization()?;
    let current = controller.input().clone();

    let Some(optimization) = gateway.request_optimization(&current, session.user_label()).await else {
        controller.cancel_optimization(ticket);
        println!("No usable suggestion was returned. Inputs are unchanged.");
        return Ok(());
    };

    println!("Explanation: {}", optimization.explanation);
    println!("Impact:      {}", optimization.impact);
    if !optimization.rejected_fields.is_empty() {
        println!("Ignored:     {}", optimization.rejected_fields.join(", "));
    }
    println!();
    print_changes(&optimization.changes_from(&current));

    if apply {
        gateway.accept_optimization(&mut controller, ticket, &optimization, session.user_label())?;
        println!();
        print_output(controller.output());
    } else {
        controller.cancel_optimization(ticket);
        println!("\nRun again with --apply to use these inputs.");
    }
    Ok(())
}

fn cmd_batch(app: &App, file: &Path, as_of: Option<NaiveDate>, json: bool) -> Result<()> {
    let inputs = ScenarioRunner::load_batch(file).with_context(|| format!("Failed to load {}", file.display()))?;

    let session = app.session();
    for input in &inputs {
        if let Access::Locked(requirement) = app.gate.check(input.kind(), &session) {
            bail!("{} requires {}", input.kind(), requirement);
        }
    }

    let runner = as_of.map(ScenarioRunner::as_of).unwrap_or_default();
    let outputs = runner.run_batch(&inputs);

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    println!("Evaluated {} records as of {}\n", outputs.len(), runner.date());
    println!("{:>4} {:<18} {}", "#", "Calculator", "Headline");
    println!("{}", "-".repeat(70));
    for (i, output) in outputs.iter().enumerate() {
        println!("{:>4} {:<18} {}", i + 1, output.kind(), headline(output));
    }
    Ok(())
}

fn cmd_quote(quote: QuoteCommand) -> Result<()> {
    match quote {
        QuoteCommand::Settlement { value, rate, flat_fee } => {
            let q = formulas::rto::settlement(value, rate, flat_fee);
            println!("  Fees:            ₹{:.2}", q.fees);
            println!("  Net settlement:  ₹{:.2}", q.net_settlement);
            println!("  Effective rate:  {:.2}%", q.effective_rate_pct);
        }
        QuoteCommand::Price { cost, margin, competitor } => {
            let Some(p) = formulas::bundle::price_for_margin(cost, margin, competitor) else {
                bail!("a {}% margin cannot be reached at any price", margin);
            };
            println!("  Suggested price: ₹{:.2}", p.suggested_price);
            println!("  Positioning:     {:?} ({:.1}% from competitor)", p.positioning, p.gap_pct);
        }
    }
    Ok(())
}

fn print_inputs(controller: &CalculatorController) {
    println!("Inputs:");
    for (field, value) in controller.input().values() {
        println!("  {:<24} {:>14.2}", field, value);
    }
    println!();
}

fn print_changes(changes: &[FieldChange]) {
    if changes.is_empty() {
        println!("No input changes suggested.");
        return;
    }
    println!("{:<24} {:>14} {:>14}", "Field", "Current", "Suggested");
    println!("{}", "-".repeat(54));
    for change in changes {
        println!("{:<24} {:>14.2} {:>14.2}", change.field, change.before, change.after);
    }
}

fn row(label: &str, value: f64) {
    println!("  {:<28} {:>14.2}", label, value);
}

fn print_output(output: &CalculatorOutput) {
    println!("Results:");
    match output {
        CalculatorOutput::UnitEconomics(m) => {
            row("Gateway fee", m.gateway_fee);
            row("Return cost", m.return_cost);
            row("Total variable cost", m.total_variable_cost);
            row("Contribution margin", m.contribution_margin);
            row("Margin %", m.margin_pct);
            row("Break-even ROAS", m.breakeven_roas);
            println!("\n  Cost breakdown:");
            row("  COGS", m.breakdown.cogs);
            row("  Marketing", m.breakdown.marketing);
            row("  Logistics", m.breakdown.logistics);
            row("  Fees & returns", m.breakdown.fees_and_returns);
            row("  Profit", m.breakdown.profit);
        }
        CalculatorOutput::MarketingBudget(m) => {
            row("Ad budget", m.budget);
            row("Conversions needed", m.conversions_needed);
            row("Clicks needed", m.clicks_needed);
            row("Implied conversion rate %", m.implied_conversion_rate);
            row("Cost per acquisition", m.cpa);
            if m.conversion_rate_aggressive {
                println!("  Warning: conversion rate above 5% is hard to achieve");
            }
        }
        CalculatorOutput::BreakEven(analysis) => {
            let m = &analysis.metrics;
            row("Contribution per unit", m.contribution_per_unit);
            if m.break_even_reachable {
                println!("  {:<28} {:>14}", "Break-even units", m.break_even_units);
            } else {
                println!("  {:<28} {:>14}", "Break-even units", "unreachable");
            }
            row("Break-even revenue", m.break_even_revenue);
            row("Current units", m.current_units);
            row("Burn rate", m.burn_rate);
            println!("  {:<28} {:>14}", "Runway", runway_label(&m.runway));

            let projection = &analysis.projection;
            println!("\n{:>6} {:>16} {:>16} {:>16}", "Month", "Revenue", "Profit", "Cash");
            println!("{}", "-".repeat(58));
            for period in &projection.periods {
                println!(
                    "{:>6} {:>16.2} {:>16.2} {:>16.2}",
                    period.period, period.revenue, period.profit, period.cash_balance
                );
            }

            let summary = projection.summary();
            println!("\nSummary:");
            row("Total revenue", summary.total_revenue);
            row("Total profit", summary.total_profit);
            row("Ending cash", summary.ending_cash);
            row("Lowest cash", summary.lowest_cash);
            match projection.months_to_profitability {
                Some(month) => println!("  Profitable from month {}", month),
                None => println!("  Not profitable within {} months", projection.periods.len()),
            }
            if let Some(month) = projection.cash_out_period {
                println!("  Cash runs out in month {}", month);
            }
        }
        CalculatorOutput::Inventory(m) => {
            match m.days_of_inventory {
                Some(days) => row("Days of inventory", days),
                None => println!("  {:<28} {:>14}", "Days of inventory", "no sales"),
            }
            row("Reorder point (units)", m.reorder_point_units);
            println!("  {:<28} {:>14}", "Status", format!("{:?}", m.status));
            row("Suggested order (units)", m.suggested_order_units);
            row("Capital required", m.capital_required);
            if let Some(date) = m.stockout_date {
                println!("  {:<28} {:>14}", "Stockout date", date);
            }
            let reorder = match &m.reorder {
                ReorderTiming::Immediately => "immediately".to_string(),
                ReorderTiming::On { date } => date.to_string(),
                ReorderTiming::NotNeeded => "not needed".to_string(),
            };
            println!("  {:<28} {:>14}", "Reorder", reorder);
        }
        CalculatorOutput::CodRto(m) => {
            row("Gateway fee", m.gateway_fee);
            row("Prepaid profit / order", m.prepaid.weighted_profit);
            row("COD profit / order", m.cod.weighted_profit);
            row("Blended profit / order", m.blended_profit);
            row("RTO loss impact", m.rto_loss_impact);
            row("Net realization %", m.net_realization_pct);
        }
        CalculatorOutput::BundlePricing(m) => {
            row("Single-unit profit", m.single_profit);
            row("Single-unit margin %", m.single_margin);
            row("Bundle revenue", m.bundle_revenue);
            row("Bundle cost", m.bundle_cost);
            row("Bundle profit", m.bundle_profit);
            row("Bundle margin %", m.bundle_margin);
            row("Profit multiplier", m.profit_multiplier);
        }
    }
}

fn runway_label(runway: &Runway) -> String {
    match runway {
        Runway::Finite { months } => format!("{:.1} months", months),
        Runway::Profitable => "profitable".to_string(),
    }
}

fn headline(output: &CalculatorOutput) -> String {
    match output {
        CalculatorOutput::UnitEconomics(m) => format!("margin ₹{:.2} ({:.1}%)", m.contribution_margin, m.margin_pct),
        CalculatorOutput::MarketingBudget(m) => format!("budget ₹{:.2}, {:.0} clicks", m.budget, m.clicks_needed),
        CalculatorOutput::BreakEven(a) => format!("runway {}", runway_label(&a.metrics.runway)),
        CalculatorOutput::Inventory(m) => format!("{:?}, order {:.0} units", m.status, m.suggested_order_units),
        CalculatorOutput::CodRto(m) => format!("blended profit ₹{:.2}", m.blended_profit),
        CalculatorOutput::BundlePricing(m) => format!("bundle profit ₹{:.2} (x{:.2})", m.bundle_profit, m.profit_multiplier),
    }
}
