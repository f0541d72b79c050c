use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use estate_tycoon::{
    engine::{Engine, EngineBuilder},
    save::{SaveSlot, DEFAULT_SAVE_FILE},
    scenario::{Scenario, ScenarioLoader},
    web::{self, WebServerConfig},
    world::{Money, Property, PropertyId, PropertyType},
    Dashboard, EngineError, Receipt,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Real-estate portfolio simulation")]
struct Cli {
    /// Path to a scenario YAML file (built-in rules when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Save slot file
    #[arg(long, default_value = DEFAULT_SAVE_FILE)]
    save: PathBuf,

    /// Pin the seed used by new games
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a new game, overwriting the save slot
    New,
    /// Show the dashboard
    Status,
    /// List properties, optionally of one type
    List {
        #[arg(long = "type")]
        kind: Option<PropertyType>,
    },
    /// Show one property
    Show { id: u32 },
    Buy { id: u32 },
    Sell { id: u32 },
    /// Raise the ESG score of an owned property
    Renovate { id: u32 },
    /// Advance the clock
    Next {
        #[arg(long, default_value_t = 1)]
        months: u32,
    },
    /// Overwrite cash and the risk thresholds
    Settings {
        #[arg(long, allow_negative_numbers = true)]
        cash: Money,
        #[arg(long)]
        esg: i64,
        #[arg(long = "yield")]
        target_yield: i64,
    },
    /// Print the most recent event log entries
    Log {
        #[arg(long, default_value_t = 10)]
        tail: usize,
    },
    /// Serve the game over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::default(),
    };
    init_logging(&scenario.logging.level);

    let mut builder = EngineBuilder::new(scenario)
        .with_save_slot(SaveSlot::new(&cli.save))
        .with_standard_systems();
    if let Some(seed) = cli.seed {
        builder = builder.with_seed(seed);
    }

    let mut engine = match cli.command {
        Command::New => builder.new_game()?,
        _ => builder.load_or_new()?,
    };

    match cli.command {
        Command::New => {
            println!("New game started.");
            print_dashboard(&engine.dashboard());
        }
        Command::Status => print_dashboard(&engine.dashboard()),
        Command::List { kind } => {
            engine.set_type_filter(kind);
            for property in engine.listings() {
                print_property(property);
            }
        }
        Command::Show { id } => {
            let property = engine
                .property(PropertyId::new(id))
                .with_context(|| format!("no property #{id}"))?;
            print_property(property);
            println!(
                "  location: {:.5}, {:.5}",
                property.location.lat, property.location.lng
            );
        }
        Command::Buy { id } => report_action(&mut engine, id, Engine::buy),
        Command::Sell { id } => report_action(&mut engine, id, Engine::sell),
        Command::Renovate { id } => report_action(&mut engine, id, Engine::renovate),
        Command::Next { months } => {
            for report in engine.advance_months(months)? {
                println!(
                    "Month {}: rent collected {}. {}",
                    report.month,
                    format_money(report.rent_collected),
                    report.message
                );
            }
            print_dashboard(&engine.dashboard());
        }
        Command::Settings {
            cash,
            esg,
            target_yield,
        } => {
            let dashboard = engine.apply_settings(cash, esg, target_yield)?;
            print_dashboard(&dashboard);
        }
        Command::Log { tail } => {
            for entry in engine.state().log_tail(tail) {
                println!("[{:>3}] {}", entry.month, entry.message);
            }
        }
        Command::Serve { host, port } => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(web::run(WebServerConfig { engine, host, port }))?;
        }
    }
    Ok(())
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

type Action = fn(&mut Engine, PropertyId) -> Result<Receipt, EngineError>;

// Refusals are reported to the player, not treated as process failures.
fn report_action(engine: &mut Engine, id: u32, action: Action) {
    match action(engine, PropertyId::new(id)) {
        Ok(receipt) => {
            println!("{}", receipt.message);
            print_dashboard(&receipt.dashboard);
        }
        Err(err) => println!("❌ {err}"),
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    println!("Month:       {}", dashboard.month);
    println!("Cash:        {}", format_money(dashboard.cash));
    println!("Net worth:   {}", format_money(dashboard.net_worth));
    println!("Rent/month:  {}", format_money(dashboard.total_monthly_rent));
    println!("Yield:       {}%", dashboard.average_yield);
    println!("ESG:         {}", dashboard.average_esg);
    println!("Risk:        {}", dashboard.risk.symbol());
    println!("Owned:       {}", dashboard.owned_count);
}

fn print_property(property: &Property) {
    println!(
        "{:>3} {} {:<11} {:>14} rent {:>10} ESG {:>3}{}",
        property.id.raw(),
        property.kind.icon(),
        property.kind.label(),
        format_money(property.price),
        format_money(property.rent),
        property.esg,
        if property.owner { "  [owned]" } else { "" }
    );
}

fn format_money(amount: Money) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 5);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped} MAD")
}
