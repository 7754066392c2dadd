use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nsstore",
    about = "Inspect and edit namespaced JSON stores in a storage origin file",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Origin file holding all storage entries
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Capacity of the origin in UTF-16 code units
    #[arg(long, global = true)]
    pub quota: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read a field from an application's store
    Get(GetArgs),
    /// Write a field into an application's store
    Set(SetArgs),
    /// Delete a field from an application's store
    Rm(FieldArgs),
    /// Print an application's whole root object
    Dump(AppArgs),
    /// Replace an application's whole root object
    Replace(ReplaceArgs),
    /// Remove an application's root entry
    Clear(AppArgs),
    /// List raw entries in the origin
    Entries,
    /// Move a raw entry to a new key without overwriting
    Rename(RenameArgs),
    /// Move a legacy flat entry into an application's store
    Adopt(AdoptArgs),
    /// Remove a raw entry and print its value
    Take(TakeArgs),
}

#[derive(Args)]
pub struct AppArgs {
    pub app: String,
}

#[derive(Args)]
pub struct FieldArgs {
    pub app: String,
    pub key: String,
}

#[derive(Args)]
pub struct GetArgs {
    pub app: String,
    pub key: String,
    /// Value printed when the field is absent (JSON, or a plain string)
    #[arg(long)]
    pub default: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    pub app: String,
    pub key: String,
    /// JSON value, or a plain string when it does not parse
    pub value: String,
}

#[derive(Args)]
pub struct ReplaceArgs {
    pub app: String,
    /// JSON object; anything else resets the store to empty
    pub json: String,
}

#[derive(Args)]
pub struct RenameArgs {
    pub old: String,
    pub new: String,
}

#[derive(Args)]
pub struct AdoptArgs {
    pub app: String,
    pub legacy: String,
    pub sub_key: String,
}

#[derive(Args)]
pub struct TakeArgs {
    pub key: String,
}
