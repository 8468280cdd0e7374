use clap::{Args, Parser, Subcommand};
use ferrous_dsync_application::use_cases::RolloverAction;
use ferrous_dsync_domain::{Algorithm, CliOverrides, KeyState};

#[derive(Parser, Debug)]
#[command(name = "ferrous-dsync")]
#[command(version)]
#[command(about = "Automated delegation synchronisation between child and parent DNS zones")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Key store database path (overrides the config file)
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Log level (overrides the config file)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Resolver address as ip:port (overrides the config file)
    #[arg(long, global = true)]
    pub resolver: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            database_path: self.database.clone(),
            log_level: self.log_level.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the engines until interrupted
    Serve,

    /// Manage SIG(0) and DNSSEC keys
    Keystore {
        #[command(subcommand)]
        kind: KeystoreKind,
    },

    /// Inspect keys of child zones
    Truststore {
        #[command(subcommand)]
        command: TruststoreCommand,
    },

    /// Look up the parent's DSYNC records
    Dsync {
        #[command(subcommand)]
        command: DsyncCommand,
    },

    /// Compare and synchronise a delegation with the parent
    Delegation {
        #[command(subcommand)]
        command: DelegationCommand,
    },

    /// SIG(0) key lifecycle at the parent
    Sig0 {
        #[command(subcommand)]
        command: Sig0Command,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeystoreKind {
    Sig0 {
        #[command(subcommand)]
        command: KeyCommand,
    },
    Dnssec {
        #[command(subcommand)]
        command: KeyCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// List keys, optionally for one zone
    List { zone: Option<String> },

    /// Generate a new key pair
    Generate(GenerateArgs),

    /// Import an existing key pair
    Add(AddArgs),

    /// Move a key to another state
    Setstate {
        zone: String,
        key_id: u16,
        state: KeyState,
    },

    /// Delete a key
    Delete { zone: String, key_id: u16 },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    pub zone: String,

    /// Algorithm (defaults to keygen.algorithm)
    #[arg(long)]
    pub algorithm: Option<Algorithm>,

    #[arg(long, default_value = "created")]
    pub state: KeyState,

    /// Generate a key-signing key (DNSSEC only)
    #[arg(long)]
    pub ksk: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub zone: String,

    /// Public key record in presentation format
    #[arg(long)]
    pub key_rr: String,

    /// Private key material (base64 PKCS#8)
    #[arg(long)]
    pub private_key: String,

    #[arg(long, default_value = "created")]
    pub state: KeyState,
}

#[derive(Subcommand, Debug)]
pub enum TruststoreCommand {
    /// List trusted keys, optionally for one zone
    List { zone: Option<String> },
}

#[derive(Subcommand, Debug)]
pub enum DsyncCommand {
    /// Discover the DSYNC RRset that covers a child zone
    Discover { zone: String },
}

#[derive(Subcommand, Debug)]
pub enum DelegationCommand {
    /// Report NS and glue differences with the parent
    Status { zone: String },

    /// Push the delegation to the parent regardless of zone options
    Sync { zone: String },

    /// Publish the zone's SIG(0) key and report delegation status
    Setup { zone: String },
}

#[derive(Subcommand, Debug)]
pub enum Sig0Command {
    /// Introduce the zone's SIG(0) key to the parent
    Bootstrap { zone: String },

    /// Roll the zone's active SIG(0) key
    Rollover {
        zone: String,

        /// "add" stops after the new key is known to the parent
        #[arg(long, default_value = "complete")]
        action: RolloverAction,
    },

    /// Publish the active SIG(0) KEY in the zone
    Publish { zone: String },
}
