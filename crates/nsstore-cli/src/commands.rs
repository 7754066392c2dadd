use std::sync::Arc;

use colored::Colorize;
use serde_json::{json, Value};

use nsstore::{
    migrate_legacy_key, migrate_rename_key, read_and_remove_legacy_key, LegacyOutcome,
    NamespacedStore, RenameOutcome,
};
use nsstore_engine::{FileEngine, StorageEngine};

use crate::cli::*;
use crate::config::CliConfig;

/// Everything a command needs: the opened origin and the resolved settings.
struct Context {
    engine: Arc<FileEngine>,
    config: CliConfig,
    format: OutputFormat,
}

impl Context {
    fn store(&self, app: &str) -> anyhow::Result<NamespacedStore> {
        Ok(NamespacedStore::new(
            self.engine.clone(),
            app,
            self.config.store.clone(),
        )?)
    }

    fn print_value(&self, value: &Value) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
            OutputFormat::Text => println!("{}", serde_json::to_string_pretty(value)?),
        }
        Ok(())
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    }
    .with_overrides(cli.storage.clone(), cli.quota);

    let storage = config.storage_path();
    tracing::debug!(storage = %storage.display(), cache_reads = config.store.cache_reads, "opening origin");
    let engine = FileEngine::open(&storage, config.quota())?;
    let ctx = Context {
        engine: Arc::new(engine),
        config,
        format: cli.format,
    };

    match cli.command {
        Command::Get(args) => cmd_get(&ctx, args),
        Command::Set(args) => cmd_set(&ctx, args),
        Command::Rm(args) => cmd_rm(&ctx, args),
        Command::Dump(args) => ctx.print_value(&ctx.store(&args.app)?.to_json()),
        Command::Replace(args) => cmd_replace(&ctx, args),
        Command::Clear(args) => cmd_clear(&ctx, args),
        Command::Entries => cmd_entries(&ctx),
        Command::Rename(args) => cmd_rename(&ctx, args),
        Command::Adopt(args) => cmd_adopt(&ctx, args),
        Command::Take(args) => cmd_take(&ctx, args),
    }
}

/// Parse command-line text as JSON, keeping it as a string when it does not parse.
fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn cmd_get(ctx: &Context, args: GetArgs) -> anyhow::Result<()> {
    let store = ctx.store(&args.app)?;
    match (store.get(&args.key)?, args.default) {
        (Some(value), _) => ctx.print_value(&value),
        (None, Some(default)) => ctx.print_value(&parse_value(&default)),
        (None, None) => {
            if ctx.format == OutputFormat::Json {
                println!("{}", json!({ "absent": args.key }));
            } else {
                eprintln!("{} {} has no field {}", "✗".red(), args.app.bold(), args.key.yellow());
            }
            Ok(())
        }
    }
}

fn cmd_set(ctx: &Context, args: SetArgs) -> anyhow::Result<()> {
    let store = ctx.store(&args.app)?;
    store.set(&args.key, parse_value(&args.value))?;
    println!("{} Set {}.{}", "✓".green(), args.app.bold(), args.key.yellow());
    Ok(())
}

fn cmd_rm(ctx: &Context, args: FieldArgs) -> anyhow::Result<()> {
    let store = ctx.store(&args.app)?;
    if store.remove(&args.key)? {
        println!("{} Removed {}.{}", "✓".green(), args.app.bold(), args.key.yellow());
    } else {
        println!("{}.{} was not set.", args.app.bold(), args.key.yellow());
    }
    Ok(())
}

fn cmd_replace(ctx: &Context, args: ReplaceArgs) -> anyhow::Result<()> {
    let store = ctx.store(&args.app)?;
    store.set_all(parse_value(&args.json));
    println!("{} Replaced {} ({} fields)", "✓".green(), args.app.bold(), store.len());
    Ok(())
}

fn cmd_clear(ctx: &Context, args: AppArgs) -> anyhow::Result<()> {
    ctx.store(&args.app)?.clear();
    println!("{} Cleared {}", "✓".green(), args.app.bold());
    Ok(())
}

fn cmd_entries(ctx: &Context) -> anyhow::Result<()> {
    let keys = ctx.engine.keys()?;
    let mut rows = Vec::with_capacity(keys.len());
    for key in keys {
        let units = ctx.engine.entry_units(&key)?.unwrap_or(0);
        rows.push((key, units));
    }

    if ctx.format == OutputFormat::Json {
        let listing: Vec<Value> = rows
            .iter()
            .map(|(key, units)| json!({ "key": key, "units": units }))
            .collect();
        println!("{}", Value::Array(listing));
        return Ok(());
    }

    if rows.is_empty() {
        println!("No entries in {}.", ctx.engine.path().display());
        return Ok(());
    }
    for (key, units) in &rows {
        println!("  {:<32} {}", key.bold(), format!("{units} units").dimmed());
    }
    let total: usize = rows.iter().map(|(_, units)| units).sum();
    match ctx.engine.quota().limit() {
        Some(limit) => println!("Usage: {} / {} units", total.to_string().cyan(), limit),
        None => println!("Usage: {} units", total.to_string().cyan()),
    }
    Ok(())
}

fn cmd_rename(ctx: &Context, args: RenameArgs) -> anyhow::Result<()> {
    let outcome = migrate_rename_key(ctx.engine.as_ref(), &args.old, &args.new);
    let summary = match outcome {
        RenameOutcome::Moved => format!("{} Moved {} → {}", "✓".green(), args.old.bold(), args.new.bold()),
        RenameOutcome::DestinationKept => format!(
            "{} {} already exists; discarded {}",
            "!".yellow(),
            args.new.bold(),
            args.old.bold()
        ),
        RenameOutcome::CopyFailed => format!(
            "{} Could not write {}; discarded {}",
            "✗".red(),
            args.new.bold(),
            args.old.bold()
        ),
        RenameOutcome::NothingToMigrate => format!("Nothing at {}.", args.old.bold()),
        RenameOutcome::SameKey => "Source and destination are the same key.".to_string(),
    };
    println!("{summary}");
    Ok(())
}

fn cmd_adopt(ctx: &Context, args: AdoptArgs) -> anyhow::Result<()> {
    let store = ctx.store(&args.app)?;
    let outcome = migrate_legacy_key(&store, &args.legacy, &args.sub_key)?;
    match outcome {
        LegacyOutcome::Migrated => println!(
            "{} Adopted {} as {}.{}",
            "✓".green(),
            args.legacy.bold(),
            args.app.bold(),
            args.sub_key.yellow()
        ),
        LegacyOutcome::AlreadyPresent => println!(
            "{} {}.{} already set; discarded {}",
            "!".yellow(),
            args.app.bold(),
            args.sub_key.yellow(),
            args.legacy.bold()
        ),
        LegacyOutcome::NothingToMigrate => println!("Nothing at {}.", args.legacy.bold()),
    }
    Ok(())
}

fn cmd_take(ctx: &Context, args: TakeArgs) -> anyhow::Result<()> {
    match read_and_remove_legacy_key(ctx.engine.as_ref(), &args.key) {
        Some(value) => ctx.print_value(&value),
        None => {
            eprintln!("{} No entry at {}", "✗".red(), args.key.bold());
            Ok(())
        }
    }
}
