use std::sync::Arc;

use clap::{Parser, Subcommand};
use logex_core::{Config, Store};
use logex_feeds::Ingestor;

#[derive(Parser)]
#[command(name = "logex", about = "System log ingestion, full-text search, and tagging")]
struct Cli {
    /// Log at debug level instead of info.
    #[arg(long)]
    debug: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Ingest the journal and watched files until Enter is pressed.
    Run {
        /// Stop automatically after this many seconds instead of waiting
        /// for Enter.
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Search stored entries; an empty query lists the most recent.
    Search {
        query: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Print the full message of one entry.
    Show { id: i64 },
    /// Manage tags on an entry.
    #[command(subcommand)]
    Tag(TagCommand),
    /// Insert a few sample entries, handy for trying out search and tags.
    Seed,
}

#[derive(Subcommand)]
enum TagCommand {
    /// Attach a tag to an entry.
    Add { id: i64, name: String },
    /// Detach a tag from an entry.
    Rm { id: i64, name: String },
    /// List the tags attached to an entry.
    Ls { id: i64 },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not load config, using defaults");
        Config::defaults()
    });

    let store = Arc::new(Store::open(&config.storage.db_path)?);
    let result = dispatch(&cli.command, &store, &config);
    store.close();
    result
}

fn dispatch(command: &CliCommand, store: &Arc<Store>, config: &Config) -> anyhow::Result<()> {
    match command {
        CliCommand::Run { duration_secs } => run_ingest(store, config, *duration_secs),
        CliCommand::Search {
            query,
            limit,
            offset,
        } => {
            let entries = store.search(query.as_deref().unwrap_or(""), *limit, *offset)?;
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    entry.id,
                    entry.source,
                    entry.unit,
                    entry.timestamp,
                    preview(&entry.message)
                );
            }
            Ok(())
        }
        CliCommand::Show { id } => {
            println!("{}", store.message(*id)?);
            Ok(())
        }
        CliCommand::Tag(tag) => match tag {
            TagCommand::Add { id, name } => Ok(store.add_tag(*id, name)?),
            TagCommand::Rm { id, name } => Ok(store.remove_tag(*id, name)?),
            TagCommand::Ls { id } => {
                for name in store.list_tags(*id)? {
                    println!("{name}");
                }
                Ok(())
            }
        },
        CliCommand::Seed => seed(store),
    }
}

fn run_ingest(store: &Arc<Store>, config: &Config, duration_secs: Option<u64>) -> anyhow::Result<()> {
    let mut ingestor = Ingestor::new();
    ingestor.start(Arc::clone(store), &config.ingest);

    match duration_secs {
        Some(secs) => std::thread::sleep(std::time::Duration::from_secs(secs)),
        None => {
            eprintln!("ingesting — press Enter to stop");
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
        }
    }

    ingestor.stop();
    Ok(())
}

fn seed(store: &Arc<Store>) -> anyhow::Result<()> {
    let ts = chrono::Utc::now().to_rfc3339();
    let a = store.insert("local", "example.service", "Sample log: application started", &ts)?;
    let b = store.insert(
        "local",
        "example.service",
        "Sample log: connection established",
        &ts,
    )?;
    let c = store.insert(
        "syslog",
        "kernel",
        "Sample kernel message: usb device connected",
        &ts,
    )?;
    store.add_tag(a, "infrastructure")?;
    store.add_tag(b, "service")?;
    store.add_tag(c, "kernel")?;
    println!("Inserted 3 sample entries");
    Ok(())
}

/// Truncate long messages for one-line listing output.
fn preview(message: &str) -> String {
    const MAX: usize = 200;
    if message.chars().count() <= MAX {
        return message.to_string();
    }
    let cut: String = message.chars().take(MAX - 3).collect();
    format!("{cut}...")
}
