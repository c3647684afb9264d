pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};

/// Administer the keys of an HSM key-management backend.
#[derive(Parser, Debug)]
#[command(name = "hsmctl", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the key-management API (overrides config.toml)
    #[arg(long, global = true, env = "HSMCTL_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding config.toml and the session file
    #[arg(long, global = true, env = "HSMCTL_HOME")]
    pub home: Option<String>,

    /// Path to alternative config file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with HSM crypto-user credentials
    Login {
        /// Crypto-user name
        #[arg(long, short)]
        username: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "HSMCTL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user and session expiry
    Whoami,

    /// Check and configure the HSM connection
    Hsm {
        #[command(subcommand)]
        action: HsmAction,
    },

    /// List, inspect, create and delete keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum HsmAction {
    /// Show whether the HSM is configured and reachable
    Health,
    /// Point the backend at an HSM cluster
    Configure {
        /// HSM IP address (e.g. 10.0.0.100)
        #[arg(long)]
        ip: String,
        /// Customer CA certificate (customerCA.crt)
        #[arg(long)]
        cert: String,
    },
    /// Test the current HSM connection
    Test,
}

#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// List keys, optionally filtered, one page at a time
    List {
        /// Filter token: PROPERTY=VALUE or PROPERTY!=VALUE (repeatable, AND-combined)
        #[arg(long = "filter", short = 'f')]
        filters: Vec<String>,
        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Keys per page (default from config)
        #[arg(long)]
        page_size: Option<usize>,
        /// Show full details of this row of the page
        #[arg(long)]
        show: Option<usize>,
    },

    /// Show full attributes of one key
    Show {
        /// Key class (SECRET_KEY, PRIVATE_KEY, PUBLIC_KEY)
        #[arg(long = "class")]
        key_class: String,
        /// Key type (AES, RSA, EC)
        #[arg(long = "type")]
        key_type: String,
        /// Key label
        #[arg(long)]
        label: Option<String>,
        /// Key ID
        #[arg(long)]
        id: Option<String>,
    },

    /// Generate a new key on the HSM
    Create {
        /// Key label
        #[arg(long)]
        label: String,
        /// Key class (SECRET_KEY or PRIVATE_KEY)
        #[arg(long = "class", default_value = "SECRET_KEY")]
        key_class: String,
        /// Key type (AES or RSA)
        #[arg(long = "type", default_value = "AES")]
        key_type: String,
        /// Key size: bytes for AES (e.g. 32), bits for RSA (e.g. 2048)
        #[arg(long)]
        size: Option<u32>,
    },

    /// Delete keys selected from a listing page
    Delete {
        /// Filter token narrowing the listing (repeatable)
        #[arg(long = "filter", short = 'f')]
        filters: Vec<String>,
        /// Page the rows refer to (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Keys per page (default from config)
        #[arg(long)]
        page_size: Option<usize>,
        /// Rows of the page to delete, e.g. 1,3,4
        #[arg(long, value_delimiter = ',')]
        rows: Vec<usize>,
        /// Delete every key on the page
        #[arg(long, conflicts_with = "rows")]
        all_on_page: bool,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}
