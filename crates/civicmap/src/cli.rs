//! Clap derive structures for the `civicmap` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use civicmap_core::{ProjectStatus, ViewMode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// civicmap -- browse civic construction projects on a map
#[derive(Debug, Parser)]
#[command(
    name = "civicmap",
    version,
    about = "Browse civic construction projects on an interactive map",
    long_about = "Renders the civic project map headlessly: project footprints,\n\
        markers and popups in standard or structural view, plus location search.",
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
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "CIVICMAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// JSON project list (overrides `projects_file`)
    #[arg(long, env = "CIVICMAP_PROJECTS", global = true)]
    pub projects: Option<PathBuf>,

    /// Location search endpoint (overrides `search.endpoint`)
    #[arg(long, env = "CIVICMAP_SEARCH_URL", global = true)]
    pub search_url: Option<String>,

    /// Location search API key
    #[arg(long, env = "CIVICMAP_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CIVICMAP_OUTPUT",
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

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "CIVICMAP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Active,
    Planning,
    Review,
}

impl From<StatusArg> for ProjectStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => Self::Active,
            StatusArg::Planning => Self::Planning,
            StatusArg::Review => Self::Review,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Status colors with area fill
    Standard,
    /// Single engineering color with outline emphasis
    Structural,
}

impl From<ModeArg> for ViewMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Standard => Self::Standard,
            ModeArg::Structural => Self::Structural,
        }
    }
}

/// Which rendered layer a selection is routed through.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SelectVia {
    /// Click the project's footprint polygon
    #[default]
    Polygon,
    /// Activate the action button in the marker popup
    Popup,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect the project collection
    #[command(alias = "p")]
    Projects(ProjectsArgs),

    /// Render the map and interact with its layers
    #[command(alias = "m")]
    Map(MapArgs),

    /// Search for a location
    #[command(alias = "s")]
    Search(SearchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Projects ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    pub command: ProjectsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProjectsCommand {
    /// List projects in draw order
    #[command(alias = "ls")]
    List {
        /// Only show projects with this status
        #[arg(long)]
        status: Option<StatusArg>,
    },

    /// Show one project
    Get {
        /// Project ID
        id: String,
    },
}

// ── Map ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MapArgs {
    #[command(subcommand)]
    pub command: MapCommand,
}

#[derive(Debug, Subcommand)]
pub enum MapCommand {
    /// Mount the map, synchronize layers and print them
    Render {
        /// View mode (defaults to the configured initial mode)
        #[arg(long)]
        mode: Option<ModeArg>,
    },

    /// Activate a project's layer and print what the selection handler received
    Select {
        /// Project ID
        id: String,

        /// Route the selection through the polygon or the popup action
        #[arg(long, value_enum, default_value_t = SelectVia::Polygon)]
        via: SelectVia,
    },
}

// ── Search ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-text location query
    pub query: String,
}

// ── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Set a single configuration value
    Set {
        /// Dotted key, e.g. `search.endpoint` or `map.zoom`
        key: String,
        /// New value
        value: String,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
