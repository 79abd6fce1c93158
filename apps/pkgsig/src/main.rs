//! pkgsig - Sign and verify software package archives

mod cli;
mod error;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::error::CliError;
use clap::Parser;
use pkgsig_archive::{create_package, embed_signature, PackageArchiveReader};
use pkgsig_config::Config;
use pkgsig_errors::{PackageError, StorageError};
use pkgsig_signing::{
    generate_keypair, load_secret_key, save_secret_key, sign_bytes, TrustStore, TrustedKey,
    TRUSTED_KEYS_FILE,
};
use pkgsig_verify::{DiagnosticBuffer, VerifyCommand};
use std::path::Path;
use std::process;
use tracing::{debug, error, info};

/// Secret key file written by `keygen`
const SECRET_KEY_FILE: &str = "pkgsig.key";
/// Public key file written by `keygen`
const PUBLIC_KEY_FILE: &str = "pkgsig.pub";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration with proper precedence:
    // 1. File config (or defaults)
    // 2. Environment variables
    // 3. CLI flags (highest precedence)
    let config = load_config(&cli.global).await;
    let log_config = config.as_ref().cloned().unwrap_or_default();
    let json_mode = cli.global.json_logs || log_config.logging.json;
    logging::init_tracing(&log_config, cli.global.debug, cli.global.json_logs);

    let result = match config {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            if json_mode {
                error!("Application error: {}", e);
            } else {
                eprintln!("Error: {e}");
            }
            process::exit(e.exit_code());
        }
    }
}

async fn load_config(global: &GlobalArgs) -> Result<Config, CliError> {
    let mut config = Config::load_or_default(global.config.as_deref()).await?;
    config.merge_env()?;
    if let Some(keys) = &global.keys {
        config.trust.keys_file.clone_from(keys);
    }
    Ok(config)
}

/// Execute a command, returning the process exit code
async fn run(command: Commands, config: Config) -> Result<i32, CliError> {
    info!("Starting pkgsig v{}", env!("CARGO_PKG_VERSION"));

    match command {
        Commands::Verify { path } => verify(&path, &config).await,
        Commands::Sign {
            package,
            key,
            password,
            output,
        } => {
            let out = output.unwrap_or_else(|| package.clone());
            sign(&package, &key, password, &out).await?;
            println!("Signed {}", out.display());
            Ok(0)
        }
        Commands::Pack { dir, output } => {
            let manifest = create_package(&dir, &output).await?;
            println!(
                "Created {} ({} files)",
                output.display(),
                manifest.entries.len()
            );
            Ok(0)
        }
        Commands::Keygen { dir } => {
            keygen(&dir).await?;
            println!("Wrote key pair and {TRUSTED_KEYS_FILE} to {}", dir.display());
            Ok(0)
        }
    }
}

async fn verify(path: &str, config: &Config) -> Result<i32, CliError> {
    let trust = TrustStore::load(&config.trust.keys_file).await?;
    debug!(
        keys = trust.len(),
        file = %config.trust.keys_file.display(),
        "loaded trust store"
    );

    let command = VerifyCommand::new(trust);
    let mut buffer = DiagnosticBuffer::new();
    let verdict = command.verify(path, &mut buffer).await?;

    print!("{buffer}");
    Ok(if verdict { 0 } else { 1 })
}

async fn sign(
    package: &Path,
    key: &Path,
    password: Option<String>,
    out: &Path,
) -> Result<(), CliError> {
    let secret_key = load_secret_key(key, password).await?;

    let manifest = {
        let reader = PackageArchiveReader::open(package).await?;
        reader
            .manifest_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| PackageError::InvalidFormat {
                message: format!("{} has no content manifest", package.display()),
            })
            .map_err(pkgsig_errors::Error::from)?
    };

    let comment = package
        .file_name()
        .map(|n| format!("file:{}", n.to_string_lossy()));
    let signature = sign_bytes(&secret_key, &manifest, comment.as_deref())?;
    embed_signature(package, &signature, out).await?;
    Ok(())
}

async fn keygen(dir: &Path) -> Result<(), CliError> {
    let secret_path = dir.join(SECRET_KEY_FILE);
    if secret_path.exists() {
        return Err(pkgsig_errors::Error::from(StorageError::AlreadyExists {
            path: secret_path.display().to_string(),
        })
        .into());
    }
    tokio::fs::create_dir_all(dir).await?;

    let pair = generate_keypair()?;
    save_secret_key(&pair.secret_key, &secret_path).await?;
    tokio::fs::write(dir.join(PUBLIC_KEY_FILE), format!("{}\n", pair.public_key_base64())).await?;

    let mut store = TrustStore::load(&dir.join(TRUSTED_KEYS_FILE)).await?;
    store.insert(TrustedKey::from_public_key(
        &pair.public_key_base64(),
        Some("generated by pkgsig keygen".to_string()),
    )?);
    store.save(&dir.join(TRUSTED_KEYS_FILE)).await?;
    Ok(())
}
