//! Clap derive structures for the `mangaview` CLI.
//!
//! Only clap and clap_complete may be used here: build.rs includes this
//! file directly to render man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mangaview -- read chapters from a self-hosted manga backend
#[derive(Debug, Parser)]
#[command(
    name = "mangaview",
    version,
    about = "Read manga chapters and watch anime episodes from a self-hosted backend",
    long_about = "Browse the chapter index of a series, stream its pages in order,\n\
        step to the next or previous chapter and keep reading history in sync.\n\
        Anime episodes resolve to a video URL and keep their own watch history.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "MANGAVIEW_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, short = 's', env = "MANGAVIEW_SERVER", global = true)]
    pub server: Option<String>,

    /// Session cookie sent with every request
    #[arg(long, env = "MANGAVIEW_SESSION_COOKIE", global = true, hide_env = true)]
    pub session_cookie: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MANGAVIEW_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "MANGAVIEW_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "MANGAVIEW_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Seconds to wait for the next page event before giving up
    #[arg(long, env = "MANGAVIEW_STREAM_TIMEOUT", global = true)]
    pub stream_timeout: Option<u64>,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Chapter group tab.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Group {
    Chapter,
    Volume,
    Misc,
}

/// Upstream site to search.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SiteArg {
    Manhuaren,
    Copymanga,
    Mangabat,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the chapter index of a series
    #[command(alias = "ls")]
    Chapters(ChaptersArgs),

    /// Stream a chapter's pages, optionally following on to the next ones
    Read(ReadArgs),

    /// Show series metadata
    Meta {
        /// Series id
        manga_id: i64,
    },

    /// Show the chapter last read in a series
    LastRead {
        /// Series id
        manga_id: i64,
    },

    /// List the episodes of an anime
    #[command(alias = "eps")]
    Episodes {
        /// Anime id
        anime_id: i64,
    },

    /// Resolve an episode to its video URL and record it as watched
    Watch(WatchArgs),

    /// Show the episode last watched in an anime
    LastWatched {
        /// Anime id
        anime_id: i64,
    },

    /// Manage reading (or, with --anime, watch) history
    #[command(alias = "hist")]
    History(HistoryArgs),

    /// Search an upstream site by keyword
    Search(SearchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Reading ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ChaptersArgs {
    /// Series id
    pub manga_id: i64,

    /// Only list one group
    #[arg(long, short = 'g')]
    pub group: Option<Group>,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Series id
    pub manga_id: i64,

    /// Group the chapter belongs to
    #[arg(long, short = 'g', default_value = "chapter")]
    pub group: Group,

    /// Zero-based position inside the group
    #[arg(long, default_value = "0")]
    pub position: usize,

    /// Keep reading this many following chapters
    #[arg(long, short = 'f', default_value = "0")]
    pub follow: usize,

    /// Do not record the chapter in reading history
    #[arg(long)]
    pub no_history: bool,
}

// ── Watching ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Anime id
    pub anime_id: i64,

    /// Zero-based position in the episode list
    #[arg(long, default_value = "0", conflicts_with = "next")]
    pub position: usize,

    /// Pick the episode after the last one watched
    #[arg(long, short = 'n')]
    pub next: bool,

    /// Do not record the episode in watch history
    #[arg(long)]
    pub no_history: bool,
}

// ── History ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Use anime watch history instead of manga reading history
    #[arg(long, short = 'a', global = true)]
    pub anime: bool,

    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List history entries
    #[command(alias = "ls")]
    List,

    /// Add a series to history
    Add {
        /// Series (or anime) id
        id: i64,
    },

    /// Remove a series from history
    #[command(alias = "rm")]
    Remove {
        /// Series (or anime) id
        id: i64,
    },
}

// ── Search ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search keyword
    pub keyword: String,

    /// Upstream site
    #[arg(long, default_value = "manhuaren")]
    pub site: SiteArg,

    /// Max results to show
    #[arg(long, short = 'l', default_value = "5")]
    pub limit: usize,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (e.g., "server", "public_prefix", "stream_timeout")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a session cookie in the system keyring
    SetCookie {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
