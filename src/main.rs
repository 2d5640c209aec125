// cobuy - people who bought this also bought that
//
// Main entry point. Parses CLI args, loads purchases, builds the model once
// and dispatches to handlers.

use anyhow::Context;
use cobuy_lib::{
    config::{parse_top_n, Config},
    loader::{CsvLoader, LoadReport},
    service::{Lookup, Session},
    CobuyError, Database, Result,
};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Flags shared by every command
#[derive(Debug, Default)]
struct CliOptions {
    data: Option<PathBuf>,
    use_db: bool,
    top_n: Option<i64>,
    json: bool,
    out: Option<PathBuf>,
    replace: bool,
    since: Option<String>,
    until: Option<String>,
    positional: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = args[1].as_str();
    let result = match command {
        "recommend" => run(&args[2..], handle_recommend).await,
        "repl" => run(&args[2..], handle_repl).await,
        "stats" => run(&args[2..], handle_stats).await,
        "import" => run(&args[2..], handle_import).await,
        "export" => run(&args[2..], handle_export).await,
        "version" | "-v" | "--version" => {
            println!("cobuy v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("✗ {:#}", e);
        if let Some(err) = e.downcast_ref::<CobuyError>() {
            eprintln!("  {}", err.user_message());
        }
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing() {
    // stdout is for results, logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parse flags, load config, then hand off
async fn run<F, Fut>(args: &[String], handler: F) -> anyhow::Result<()>
where
    F: FnOnce(Config, CliOptions) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    let options = parse_options(args)?;
    let mut config = Config::load().context("loading configuration")?;

    if let Some(since) = &options.since {
        config.csv.since = Some(config.csv.parse_date(since)?);
    }
    if let Some(until) = &options.until {
        config.csv.until = Some(config.csv.parse_date(until)?);
    }
    if let Some(top_n) = options.top_n {
        config.top_n = top_n;
    }
    config.validate()?;

    handler(config, options).await
}

fn parse_options(args: &[String]) -> Result<CliOptions> {
    let mut options = CliOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--data" | "-d" => {
                i += 1;
                options.data = Some(PathBuf::from(flag_value(args, i, "--data")?));
            }
            "--top" | "-n" => {
                i += 1;
                options.top_n = Some(parse_top_n(flag_value(args, i, "--top")?)?);
            }
            "--out" | "-o" => {
                i += 1;
                options.out = Some(PathBuf::from(flag_value(args, i, "--out")?));
            }
            "--since" => {
                i += 1;
                options.since = Some(flag_value(args, i, "--since")?.to_string());
            }
            "--until" => {
                i += 1;
                options.until = Some(flag_value(args, i, "--until")?.to_string());
            }
            "--db" => options.use_db = true,
            "--json" => options.json = true,
            "--replace" => options.replace = true,
            arg => options.positional.push(arg.to_string()),
        }
        i += 1;
    }

    Ok(options)
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| CobuyError::Config(format!("{} needs a value", flag)))
}

/// The item to look up
///
/// Item names have spaces ("whole milk"), so unquoted words are joined.
fn query_item(options: &CliOptions) -> Result<String> {
    if options.positional.is_empty() {
        return Err(CobuyError::Config("no item given".to_string()));
    }

    Ok(options.positional.join(" "))
}

fn import_source(options: &CliOptions) -> Result<PathBuf> {
    options
        .positional
        .first()
        .map(PathBuf::from)
        .or_else(|| options.data.clone())
        .ok_or_else(|| CobuyError::Config("no CSV file given".to_string()))
}

/// Read purchases from the chosen source and build the model
async fn load_session(
    config: &Config,
    options: &CliOptions,
) -> anyhow::Result<(Session, Option<LoadReport>)> {
    if options.use_db {
        config.check_store_source()?;

        let db = Database::new(&config.database_path)
            .await
            .with_context(|| format!("opening {}", config.database_path.display()))?;
        let transactions = db.load_transactions().await?;
        db.close().await;
        return Ok((Session::from_transactions(&transactions), None));
    }

    let path = options
        .data
        .clone()
        .or_else(|| config.dataset_path.clone())
        .ok_or(CobuyError::MissingDataset)?;

    let loader = CsvLoader::new(config.csv.clone());
    let (transactions, report) = loader
        .load_file(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    Ok((Session::from_transactions(&transactions), Some(report)))
}

async fn handle_recommend(config: Config, options: CliOptions) -> anyhow::Result<()> {
    let query = query_item(&options)?;
    let (session, _) = load_session(&config, &options).await?;
    let lookup = session.lookup(&query, config.top_n);

    if options.json {
        print_json(&lookup)?;
    } else {
        print_lookup(&lookup);
    }

    Ok(())
}

async fn handle_repl(config: Config, options: CliOptions) -> anyhow::Result<()> {
    let (session, _) = load_session(&config, &options).await?;

    println!("Welcome to the product recommendation system!");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("Enter a product name (or 'exit' to quit): ");
        std::io::stdout().flush()?;

        // EOF counts as exit
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") {
            break;
        }

        print_lookup(&session.lookup(query, config.top_n));
    }

    println!("Thank you for using the recommendation system!");
    Ok(())
}

async fn handle_stats(config: Config, options: CliOptions) -> anyhow::Result<()> {
    let (session, report) = load_session(&config, &options).await?;
    let stats = session.model().stats();

    if options.json {
        let value = serde_json::json!({
            "load": report,
            "model": stats,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\ncobuy Status");
    println!("{}", "=".repeat(60));

    if let Some(report) = report {
        println!("\nDataset:");
        println!("  Rows read:     {}", report.rows_read);
        println!("  Rows used:     {}", report.rows_accepted);
        println!("  Rows skipped:  {}", report.rows_skipped);
    } else {
        println!("\nPurchase store: {}", config.database_path.display());
    }

    println!("\nModel:");
    println!("  Customers:        {}", stats.customers);
    println!("  Items:            {}", stats.distinct_items);
    println!("  Purchases:        {}", stats.item_occurrences);
    println!("  Items with pairs: {}", stats.connected_items);
    println!("  Item pairs:       {}", stats.item_pairs);

    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_import(config: Config, options: CliOptions) -> anyhow::Result<()> {
    let source = import_source(&options)?;

    let loader = CsvLoader::new(config.csv.clone());
    let (transactions, report) = loader
        .load_file(&source)
        .await
        .with_context(|| format!("reading {}", source.display()))?;

    let db = Database::new(&config.database_path)
        .await
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    if options.replace {
        let removed = db.clear_purchases().await?;
        println!("Removed {} old purchase(s)", removed);
    }

    let inserted = db.import_transactions(&transactions).await?;
    let stats = db.stats().await?;
    db.close().await;

    println!(
        "✓ Imported {} purchase(s) from {} customer(s) ({} row(s) skipped)",
        inserted, report.customers, report.rows_skipped
    );
    println!(
        "  Store now holds {} purchase(s), {} customer(s), {} item(s)",
        stats.total_purchases, stats.total_customers, stats.distinct_items
    );

    Ok(())
}

async fn handle_export(config: Config, options: CliOptions) -> anyhow::Result<()> {
    let (session, _) = load_session(&config, &options).await?;
    let json = session.model().to_json()?;

    match &options.out {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            println!("✓ Model written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn print_lookup(lookup: &Lookup) {
    match lookup {
        Lookup::Found {
            item,
            recommendations,
        } => {
            println!("People who bought '{}' also bought:", item);
            for (i, rec) in recommendations.iter().enumerate() {
                println!("{}. {}", i + 1, rec.item);
            }
        }
        Lookup::NotFound { item, suggestions } => {
            println!("Sorry, no recommendations found for '{}'.", item);
            if !suggestions.is_empty() {
                println!("Did you mean: {}?", suggestions.join(", "));
            }
        }
    }
}

fn print_json(lookup: &Lookup) -> Result<()> {
    let value = match lookup {
        Lookup::Found {
            item,
            recommendations,
        } => serde_json::json!({
            "item": item,
            "recommendations": recommendations,
        }),
        Lookup::NotFound { item, suggestions } => serde_json::json!({
            "item": item,
            "recommendations": [],
            "did_you_mean": suggestions,
        }),
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_usage() {
    println!(
        r#"cobuy v{} - People who bought this also bought that

USAGE:
    cobuy <COMMAND> [OPTIONS]

COMMANDS:
    recommend <item>       Show items most often bought with <item>
    repl                   Ask about items interactively
    stats                  Show dataset and model statistics
    import <csv>           Load a CSV into the purchase store
    export                 Dump the affinity model as JSON
    version                Show version
    help                   Show this help

OPTIONS:
    -d, --data <file>      Read purchases from this CSV
    --db                   Read purchases from the purchase store
    -n, --top <n>          How many recommendations to show (default: 5)
    --since <date>         Ignore purchases before this date
    --until <date>         Ignore purchases after this date
    --json                 Print JSON (recommend, stats)
    -o, --out <file>       Write export to a file
    --replace              Clear the purchase store before importing

EXAMPLES:
    cobuy recommend whole milk --data Groceries_dataset.csv
    cobuy repl --data Groceries_dataset.csv --top 10
    cobuy import Groceries_dataset.csv
    cobuy recommend yogurt --db --json

CONFIG:
    ~/.cobuy/config.json, COBUY_DATASET, COBUY_DB, COBUY_TOP_N
    Logs go to stderr, set RUST_LOG=info to see them.
"#,
        env!("CARGO_PKG_VERSION")
    );
}
