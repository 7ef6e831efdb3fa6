use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use crate_digger::{
    Res,
    cli::{self, App},
    config, error,
    types::TimeRange,
};

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
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Internal account to act as, e.g. an email address
    #[clap(long, global = true, env = "CRATE_DIGGER_ACCOUNT")]
    account: Option<String>,

    /// Answer yes to every confirmation
    #[clap(long, short = 'y', global = true)]
    yes: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth(AuthOptions),

    /// Handle cached playlists
    Playlists(PlaylistsOptions),

    /// Create a playlist from the Liked Songs of one month
    Monthly(MonthlyOptions),

    /// Single track operations
    Track(TrackOptions),

    /// Add Liked Songs missing from a playlist
    Compare(CompareOptions),

    /// Show an artist with top tracks and related artists
    Artist { artist_id: Option<String> },

    /// Show top track, top artist and recent likes
    Library(LibraryOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Drop the stored credential before authorizing
    #[clap(long)]
    reset: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "Handle cached playlists",
    args_conflicts_with_subcommands = true // disallow mixing --favorites with subcommands
)]
pub struct PlaylistsOptions {
    /// Only list favorite playlists
    #[clap(long)]
    favorites: bool,

    #[command(subcommand)]
    command: Option<PlaylistsSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PlaylistsSubcommand {
    /// Cache metadata of every playlist you own
    Cache,
    /// Show the cached tracks of a playlist
    View { playlist_id: Option<String> },
    /// Fetch a playlist and replace its cached tracks
    Sync { playlist_id: Option<String> },
    /// Re-sync every favorite playlist
    Refresh,
    /// Toggle the favorite flag of a cached playlist
    Favorite { playlist_id: Option<String> },
    /// Unfollow a playlist and remove it from the cache
    Delete { playlist_id: Option<String> },
}

#[derive(Parser, Debug, Clone)]
pub struct MonthlyOptions {
    /// Month to collect (YYYY-MM), defaults to last month
    #[clap(long)]
    month: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct TrackOptions {
    #[command(subcommand)]
    command: TrackSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TrackSubcommand {
    /// Show features, audio analysis and recommendations of a track
    Analyze { track_id: Option<String> },
    /// Add a track to one or more playlists
    Add {
        track_id: Option<String>,
        /// Target playlist; can be repeated
        #[clap(long = "playlist", num_args = 1)]
        playlists: Vec<String>,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct CompareOptions {
    playlist_id: Option<String>,

    /// Liked Songs offset to start from
    #[clap(long, default_value_t = 0)]
    offset: u32,

    /// Maximum number of Liked Songs to scan
    #[clap(long, default_value_t = 500)]
    max: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct LibraryOptions {
    /// Period for the top items: short, medium or long
    #[clap(long, default_value = "medium")]
    time_range: TimeRange,

    /// Print the recent likes as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Res<()> {
    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    let app = App::new(cli.account, cli.yes)?;

    match cli.command {
        Command::Auth(opt) => cli::auth(&app, opt.reset).await,
        Command::Playlists(opt) => match opt.command {
            None => cli::list_playlists(&app, opt.favorites).await,
            Some(PlaylistsSubcommand::Cache) => cli::cache_playlists(&app).await,
            Some(PlaylistsSubcommand::View { playlist_id }) => {
                cli::view_playlist(&app, playlist_id).await
            }
            Some(PlaylistsSubcommand::Sync { playlist_id }) => {
                cli::sync_playlist(&app, playlist_id).await
            }
            Some(PlaylistsSubcommand::Refresh) => cli::refresh_favorites(&app).await,
            Some(PlaylistsSubcommand::Favorite { playlist_id }) => {
                cli::toggle_favorite(&app, playlist_id).await
            }
            Some(PlaylistsSubcommand::Delete { playlist_id }) => {
                cli::delete_playlist(&app, playlist_id).await
            }
        },
        Command::Monthly(opt) => cli::monthly(&app, opt.month).await,
        Command::Track(opt) => match opt.command {
            TrackSubcommand::Analyze { track_id } => cli::analyze_track(&app, track_id).await,
            TrackSubcommand::Add {
                track_id,
                playlists,
            } => cli::add_track(&app, track_id, playlists).await,
        },
        Command::Compare(opt) => cli::compare(&app, opt.playlist_id, opt.offset, opt.max).await,
        Command::Artist { artist_id } => cli::artist(&app, artist_id).await,
        Command::Library(opt) => cli::library(&app, opt.time_range, opt.json).await,
        Command::Completions(_) => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
    }
}
