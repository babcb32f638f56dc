//! Clap derive structures for the `pushsync` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept
//! free of workspace crates so `build.rs` can include it for man pages.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// pushsync -- keep push topic subscriptions in line with community membership
#[derive(Debug, Parser)]
#[command(
    name = "pushsync",
    version,
    about = "Reconcile push notification topic subscriptions",
    long_about = "Derives the topic set for a subscriber from their community memberships\n\
        and issues idempotent subscribe/unsubscribe calls against a topic registry,\n\
        using a device token obtained from a notification token service.",
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
    /// Registry profile to use
    #[arg(long, short = 'p', env = "PUSHSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Topic registry base URL (overrides profile)
    #[arg(long, short = 'r', env = "PUSHSYNC_REGISTRY", global = true)]
    pub registry: Option<String>,

    /// Device-token service base URL (overrides profile)
    #[arg(long, env = "PUSHSYNC_TOKEN_SERVICE", global = true)]
    pub token_service: Option<String>,

    /// OAuth2 access token for the registry
    #[arg(long, env = "PUSHSYNC_ACCESS_TOKEN", global = true, hide_env_values = true)]
    pub access_token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PUSHSYNC_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PUSHSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PUSHSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Permission answer to simulate with `--permission`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionArg {
    Granted,
    Denied,
    /// Never answered (treated as denied)
    Default,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a single reconciliation pass for one subscriber
    #[command(alias = "sync")]
    Reconcile(ReconcileArgs),

    /// Show the topic set derived from community ids
    Topics(TopicsArgs),

    /// Reconcile continuously from JSON input lines on stdin
    Session(SessionArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Token source (shared) ────────────────────────────────────────────

/// Where device tokens come from. Without either flag the profile's
/// token service is used.
#[derive(Debug, Args)]
pub struct TokenSourceArgs {
    /// Use this device token instead of asking the token service
    #[arg(long, env = "PUSHSYNC_DEVICE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Simulated permission answer (implies a static token provider)
    #[arg(long)]
    pub permission: Option<PermissionArg>,

    /// Retained-token state file (defaults to the data directory)
    #[arg(long, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Neither load nor save retained-token state
    #[arg(long, conflicts_with = "state")]
    pub no_state: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RECONCILE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("push").required(true).args(["enable", "disable"])))]
pub struct ReconcileArgs {
    /// Subscriber (user) id; empty means signed out
    #[arg(long, short = 'u')]
    pub user: String,

    /// Community id the subscriber belongs to (repeatable)
    #[arg(long = "community", short = 'c', value_name = "ID")]
    pub communities: Vec<String>,

    /// Push notifications are enabled
    #[arg(long)]
    pub enable: bool,

    /// Push notifications are disabled
    #[arg(long)]
    pub disable: bool,

    #[command(flatten)]
    pub source: TokenSourceArgs,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOPICS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TopicsArgs {
    /// Community id (repeatable)
    #[arg(long = "community", short = 'c', value_name = "ID")]
    pub communities: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SESSION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Initial subscriber id (input lines may change it)
    #[arg(long, short = 'u', default_value = "")]
    pub user: String,

    #[command(flatten)]
    pub source: TokenSourceArgs,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display current configuration (secrets masked)
    Show,

    /// Create or update a profile
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Topic registry base URL
        #[arg(long)]
        registry_url: Option<String>,

        /// Device-token service base URL
        #[arg(long)]
        token_service_url: Option<String>,

        /// Environment variable holding the access token
        #[arg(long)]
        access_token_env: Option<String>,

        /// Make this the default profile
        #[arg(long)]
        set_default: bool,

        /// Overwrite an existing profile
        #[arg(long)]
        force: bool,
    },

    /// List configured profiles
    Profiles,

    /// Store an access token in the system keyring (read from stdin)
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
