mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dayone-cli", about = "Import Day One journal exports into a Markdown vault", version)]
struct Cli {
    /// Vault directory notes are written into (default: current directory)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Where the export JSON and its media come from
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Day One ZIP export
    #[arg(long, conflicts_with_all = ["input", "media_dir", "media_index"])]
    pub archive: Option<PathBuf>,

    /// Day One JSON file or ZIP export (default: first JSON file in the vault)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Export folder holding photos/, audios/ and videos/
    #[arg(long, conflicts_with = "media_index")]
    pub media_dir: Option<PathBuf>,

    /// Folder searched by file name for media, at any depth
    #[arg(long)]
    pub media_index: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Destination folder inside the vault, for this run only
    #[arg(long)]
    pub folder: Option<String>,

    /// Name notes after entry UUIDs, for this run only
    #[arg(long)]
    pub uuid_filenames: bool,

    /// What to do when a note already exists
    #[arg(long, value_parser = ["skip", "fail"])]
    pub on_duplicate: Option<String>,

    /// Derive date-based note names in UTC instead of local time
    #[arg(long)]
    pub utc: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Import a Day One export into the vault
    Import(ImportArgs),

    /// Show the note each entry would become, without writing anything
    Preview {
        #[command(flatten)]
        source: SourceArgs,

        /// Derive date-based note names in UTC instead of local time
        #[arg(long)]
        utc: bool,
    },

    /// Show or change saved import settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the current settings
    Show,

    /// Change one setting and save it
    Set {
        /// Setting name, e.g. importFolder or includeWeather
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    match cli.command {
        Command::Import(args) => {
            let app = app::App::new(cli.vault.as_deref())?;
            commands::import::run(&app, &args, &cli.format, use_color).await?;
        }
        Command::Preview { source, utc } => {
            let app = app::App::new(cli.vault.as_deref())?;
            commands::preview::run(&app, &source, utc, &cli.format, use_color).await?;
        }
        Command::Config(ConfigCommand::Show) => {
            let app = app::App::new(cli.vault.as_deref())?;
            commands::config::run_show(&app, &cli.format)?;
        }
        Command::Config(ConfigCommand::Set { key, value }) => {
            let app = app::App::new(cli.vault.as_deref())?;
            commands::config::run_set(&app, &key, &value, &cli.format)?;
        }
    }

    Ok(())
}
