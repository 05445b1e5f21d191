use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use invsnap::cli::{Cli, Command, ExportArgs, LookupArgs};
use invsnap::codec::RawItemCodec;
use invsnap::config::Config;
use invsnap::report::{self, table};
use invsnap::store::Store;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const SNAPSHOT_NOT_FOUND: &str = "Could not find the requested player snapshot.";

fn lookup(store: &Store, args: &LookupArgs) -> anyhow::Result<()> {
    // an integer subject is a snapshot id, anything else must be an owner id
    if let Ok(id) = args.subject.parse::<i64>() {
        let Some(snapshot) = store.find_by_id(id)? else {
            bail!(SNAPSHOT_NOT_FOUND);
        };
        let owner = snapshot.owner_id().to_string();
        print!(
            "{}",
            // restoring needs a live actor, so the command line offers no restore hint
            table::render_details(&snapshot, &RawItemCodec, &owner, None, |payload| {
                format!("{} bytes", payload.len())
            })
        );
        return Ok(());
    }

    let Ok(owner_id) = Uuid::parse_str(&args.subject) else {
        bail!("Unknown player.");
    };
    let history = store.find_recent_by_owner(owner_id)?;
    print!("{}", table::render_history(&history, Utc::now()));
    Ok(())
}

fn export(store: &Store, args: &ExportArgs) -> anyhow::Result<()> {
    let Some(snapshot) = store.find_by_id(args.id)? else {
        bail!(SNAPSHOT_NOT_FOUND);
    };
    let json = report::json::render(&snapshot)
        .with_context(|| format!("failed to export snapshot {}", args.id))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("exported snapshot {} to {}", args.id, path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_cli(&cli)?;
    let store = Store::initialize(&config.data_dir).context("failed to start inventory snapshots")?;

    match &cli.command {
        Command::Init => {
            println!("snapshot store ready at {}", store.path().display());
        }
        Command::Lookup(args) => lookup(&store, args)?,
        Command::Export(args) => export(&store, args)?,
        Command::Prune(_) => {
            let Some(policy) = config.retention else {
                bail!("no retention window configured; pass --older-than or set `retention` in config.toml");
            };
            let removed = policy.apply(&store, Utc::now())?;
            println!(
                "pruned {removed} snapshot(s) older than {}",
                humantime::format_duration(policy.keep_for)
            );
        }
    }

    Ok(())
}
