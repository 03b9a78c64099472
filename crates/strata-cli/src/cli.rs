use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata: layered component resolution and role-aware dispatch",
    version
)]
pub struct Cli {
    /// Log resolution and build decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the settings tree
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Resolve a component across the installation layers
    Resolve {
        /// Component kind: controller, service, model, helper, view or factory
        kind: String,

        /// Logical component name
        name: String,

        /// Authorized layer rank (defaults to the guest layer)
        #[arg(long)]
        layer: Option<u32>,

        /// Only consider the authorized layer itself
        #[arg(long)]
        exact: bool,

        /// List every layer implementation, most generic first
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a simulated request through authentication and dispatch
    Dispatch {
        /// Logical controller name
        controller: String,

        /// Action name
        action: String,

        /// Sign in as a demo user at this layer (guest when omitted)
        #[arg(long)]
        layer: Option<u32>,

        /// Role rank of the demo user
        #[arg(long, default_value_t = 0)]
        role: u32,

        /// Action argument; parsed as JSON when possible, else taken as a string
        #[arg(long = "param")]
        params: Vec<String>,

        /// Output the full response as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the value at a dotted path
    Get {
        /// Dotted path, e.g. `general.brandName` or `layers.0.directory`
        path: String,

        /// TOML or JSON settings file (defaults to the dealer installation)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
