use std::path::PathBuf;

use clap::{Parser, Subcommand};
use solman_core::SortKey;
use solman_dataverse::DEFAULT_TIMEOUT;

#[derive(Debug, Parser)]
#[command(name = "solman", version, about = "List and bulk-delete unmanaged Dataverse solutions")]
pub struct Cli {
    /// Organization URL, e.g. https://contoso.crm.dynamics.com. Defaults to the last one used.
    #[arg(long, env = "SOLMAN_URL", global = true)]
    pub url: Option<String>,

    /// Bearer token sent to the Web API.
    #[arg(long, env = "SOLMAN_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Directory holding persisted settings.
    #[arg(long, env = "SOLMAN_SETTINGS_DIR", global = true)]
    pub settings_dir: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs(), global = true)]
    pub timeout_secs: u64,

    /// Log filter (env-filter syntax). Logs go to stderr.
    #[arg(long, default_value = "info", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the unmanaged solutions
    List {
        /// friendly-name | unique-name | version | installed-on
        #[arg(long)]
        sort: Option<SortKey>,
        #[arg(long)]
        desc: bool,
        /// Case-insensitive match on names and description
        #[arg(long)]
        filter: Option<String>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete solutions by unique name
    Delete {
        #[arg(long = "unique-name", required = true)]
        unique_names: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Interactive select-and-delete shell
    Shell,
}
