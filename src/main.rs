use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use playlist_porter::{Res, cli, config, error, logging};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// List your playlists
    Playlists,

    /// Show the songs of a playlist
    Songs(SongsOptions),

    /// Export a playlist's songs as JSON
    Export(ExportOptions),

    /// Create a playlist from exported songs
    Import(ImportOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct SongsOptions {
    /// Playlist id
    playlist_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ExportOptions {
    /// Playlist id
    playlist_id: String,

    /// Write to this file instead of stdout
    #[clap(long, short)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ImportOptions {
    /// JSON file written by `export`
    file: PathBuf,

    /// Name of the new playlist
    #[clap(long)]
    name: String,

    /// Make the new playlist public
    #[clap(long)]
    public: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

async fn run(command: Command) -> Res<()> {
    if let Command::Completions(opt) = command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    let config = config::PlatformConfig::from_env()?;

    match command {
        Command::Auth => cli::auth(&config).await,
        Command::Playlists => {
            let client = cli::connect(&config).await?;
            cli::list_playlists(&client).await
        }
        Command::Songs(opt) => {
            let client = cli::connect(&config).await?;
            cli::list_songs(&client, &opt.playlist_id).await
        }
        Command::Export(opt) => {
            let client = cli::connect(&config).await?;
            cli::export(&client, &opt.playlist_id, opt.output.as_deref()).await
        }
        Command::Import(opt) => {
            // Fail on a bad file before sending the user through the browser.
            cli::read_songs(&opt.file).await?;
            let client = cli::connect(&config).await?;
            cli::import(&client, &opt.file, &opt.name, opt.public).await
        }
        Command::Completions(_) => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }
    logging::init_logging();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        error!("{}", e);
    }
}
