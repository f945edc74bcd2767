use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use focus_core::{InterruptOutcome, SessionStatus};

#[derive(Parser)]
#[command(name = "focus")]
#[command(about = "Record focus sessions and interruptions, synced to Supabase")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local data file
    #[arg(long, global = true, value_name = "PATH")]
    pub data_path: Option<PathBuf>,

    /// CLI profile name for auth/sync configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record or list focus sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Record or list interruptions
    Interrupt {
        #[command(subcommand)]
        command: InterruptCommands,
    },
    /// Show focus metrics for the last 7 days and this week
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reconcile local records with the remote store
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Export local records as a backup file
    Export {
        /// Output file or directory (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Replace local records with a backup file
    Import {
        /// Backup file produced by `focus export`
        path: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Authenticate CLI profile with Supabase
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Done,
    Partial,
    Aborted,
}

impl From<StatusArg> for SessionStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Done => Self::Done,
            StatusArg::Partial => Self::Partial,
            StatusArg::Aborted => Self::Aborted,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutcomeArg {
    ReturnToToday,
    ShortBreak,
    Quit,
}

impl From<OutcomeArg> for InterruptOutcome {
    fn from(value: OutcomeArg) -> Self {
        match value {
            OutcomeArg::ReturnToToday => Self::ReturnToToday,
            OutcomeArg::ShortBreak => Self::ShortBreak,
            OutcomeArg::Quit => Self::Quit,
        }
    }
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Record a finished session
    Add {
        /// Task identifier
        #[arg(long, value_name = "ID", default_value = "")]
        task_id: String,
        /// Task title
        #[arg(long)]
        title: String,
        /// Planned duration in minutes
        #[arg(long, default_value_t = 20)]
        minutes: u32,
        /// Start time (RFC 3339); defaults to now minus the planned minutes
        #[arg(long, value_name = "TIME")]
        started_at: Option<String>,
        /// How the session ended
        #[arg(long, value_enum, default_value_t = StatusArg::Done)]
        status: StatusArg,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
        /// Do not push to the remote store afterwards
        #[arg(long)]
        no_sync: bool,
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
}

#[derive(Subcommand)]
pub enum InterruptCommands {
    /// Record an interruption and how it was handled
    Add {
        /// What pulled you away
        #[arg(long)]
        trigger: Option<String>,
        /// The cooldown finished before choosing the outcome
        #[arg(long)]
        cooldown_done: bool,
        /// What happened next
        #[arg(long, value_enum)]
        outcome: OutcomeArg,
        /// Do not push to the remote store afterwards
        #[arg(long)]
        no_sync: bool,
    },
    /// List recent interruptions
    List {
        /// Number of interruptions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Upsert all local records to the remote store
    Push,
    /// Merge remote records into local records
    Pull {
        /// Replace local records with the remote copy, dropping local-only records
        #[arg(long)]
        overwrite: bool,
        /// Skip the confirmation prompt for --overwrite
        #[arg(long)]
        yes: bool,
    },
    /// Show the last auto-sync status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count the rows stored remotely for the signed-in user
    Remote,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Delay between a local change and the background push
        #[arg(long, value_name = "MS")]
        auto_sync_delay_ms: Option<u64>,
        /// Records kept per local collection
        #[arg(long, value_name = "COUNT")]
        history_limit: Option<usize>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Login with Supabase email/password and store session in keychain
    Login {
        /// Supabase account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Supabase account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for profile
    Status,
    /// Logout profile and clear stored session
    Logout,
}
