//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pkgsig - Sign and verify software package archives
#[derive(Parser)]
#[command(name = "pkgsig")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sign and verify software package archives")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Trusted keys file (overrides config and PKGSIG_TRUSTED_KEYS)
    #[arg(long, global = true, value_name = "PATH")]
    pub keys: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Verify the signatures of a package, a directory of packages or a wildcard
    Verify {
        /// Package file, directory or file name pattern
        path: String,
    },

    /// Sign a package with a minisign secret key
    Sign {
        /// Package to sign
        package: PathBuf,

        /// Secret key file
        #[arg(short, long, value_name = "FILE")]
        key: PathBuf,

        /// Password of an encrypted secret key
        #[arg(long, env = "PKGSIG_KEY_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Write the signed package here instead of in place
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Create an unsigned package from a directory
    Pack {
        /// Directory with the package payload
        dir: PathBuf,

        /// Package file to create
        output: PathBuf,
    },

    /// Generate a signing key pair and a trust store containing its public key
    Keygen {
        /// Directory receiving the key files
        dir: PathBuf,
    },
}
