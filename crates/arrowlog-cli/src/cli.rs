use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "arrowlog")]
#[command(about = "Score archery practice sessions and sync them to a spreadsheet")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the CLI config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a new draft session
    New {
        /// Session date (YYYY-MM-DD), today when omitted
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
    /// List recent sessions
    List {
        /// Number of sessions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one session with every end
    Show {
        /// Session ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a session
    Delete {
        /// Session ID or unique ID prefix
        id: String,
    },
    /// Discard a draft that was never published
    Discard {
        /// Session ID or unique ID prefix
        id: String,
    },
    /// Add or remove ends
    End {
        #[command(subcommand)]
        command: EndCommands,
    },
    /// Set or clear the shooting distance of every end
    Distance {
        /// Session ID or unique ID prefix
        id: String,
        /// Distance in meters (1-300)
        meters: Option<i64>,
        /// Clear the distance
        #[arg(long, conflicts_with = "meters")]
        clear: bool,
    },
    /// Resize every end to a number of shots
    Shots {
        /// Session ID or unique ID prefix
        id: String,
        /// Shots per end (3-12)
        count: usize,
    },
    /// Score one shot
    Shot {
        /// Session ID or unique ID prefix
        id: String,
        /// End number, starting at 1
        end: u32,
        /// Shot number within the end, starting at 1
        shot: u32,
        /// M, 1-10 or X
        value: String,
    },
    /// Replace the session notes
    Notes {
        /// Session ID or unique ID prefix
        id: String,
        /// Note text
        text: Vec<String>,
    },
    /// Set the session location
    Location {
        /// Session ID or unique ID prefix
        id: String,
        /// Location label
        text: Vec<String>,
        #[command(flatten)]
        coordinates: CoordinateArgs,
    },
    /// Move a session to another date
    Date {
        /// Session ID or unique ID prefix
        id: String,
        /// New date (YYYY-MM-DD)
        date: String,
    },
    /// Publish a draft and sync it to the remote store
    Publish {
        /// Session ID or unique ID prefix
        id: String,
    },
    /// Connect to the remote store and merge its sessions into the local log
    Pull,
    /// Push published sessions to the remote store
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Show lifetime totals
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export sessions
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path or directory (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Inspect or change CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Forget the connected remote store
    Logout,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct CoordinateArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lng: Option<f64>,
}

#[derive(Subcommand)]
pub enum EndCommands {
    /// Append an end
    Add {
        /// Session ID or unique ID prefix
        id: String,
    },
    /// Remove an end and renumber the rest
    Remove {
        /// Session ID or unique ID prefix
        id: String,
        /// End number, starting at 1
        end: u32,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// List queued writes waiting for delivery
    Queue {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recently resolved sync conflicts
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Set the API base URL
    SetApi {
        /// Base URL, e.g. <https://archery.example.com>
        url: String,
    },
    /// Set the reference time zone
    SetZone {
        /// IANA zone name, e.g. America/Los_Angeles
        zone: String,
    },
    /// Choose when ends may still be appended
    SetEditWindow {
        #[arg(value_enum)]
        window: EditWindowArg,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum EditWindowArg {
    SameDay,
    Unrestricted,
}

impl From<ExportFormat> for arrowlog_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Csv => Self::Csv,
        }
    }
}

impl From<EditWindowArg> for arrowlog_core::clock::EditWindow {
    fn from(window: EditWindowArg) -> Self {
        match window {
            EditWindowArg::SameDay => Self::SameDay,
            EditWindowArg::Unrestricted => Self::Unrestricted,
        }
    }
}
