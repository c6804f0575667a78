use clap::{Parser, Subcommand};
use common::crypto::{generate_key_pair, keys::public_key_from_private};
use common::{logging, FileRecord};
use integrity_operator::{OperatorClient, OperatorError, Result};
use log::{error, info};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "integrity-operator", about = "Signed integrity queries against a file integrity monitor")]
struct Args {
    /// Base URL of the monitor
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Base64 secp256k1 private scalar used to sign challenges
    #[arg(long, global = true, env = "OPERATOR_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request a challenge and print it
    Challenge,
    /// Hash the named files (relative names resolve against the monitored root)
    Hash {
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Hash every file under the monitored root matching a glob
    Tree {
        pattern: String,
    },
    /// Generate a key pair locally
    Keygen,
}

fn print_records(records: &[FileRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| OperatorError::ConfigError(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Keygen => {
            let pair = generate_key_pair()?;
            println!("private key: {}", pair.private_key);
            println!("public key:  {}", pair.public_key);
            info!("Configure the monitor with CLIENT_PUBLIC_KEY_ECDSA set to the public key");
        }
        Command::Challenge => {
            let client = OperatorClient::new(&args.server, None)?;
            println!("{}", client.challenge("/").await?);
        }
        Command::Hash { files } => {
            if let Some(key) = &args.private_key {
                info!("Signing as {}", public_key_from_private(key)?);
            }
            let client = OperatorClient::new(&args.server, args.private_key)?;
            let records = client.hash_files(&files).await?;
            print_records(&records)?;
        }
        Command::Tree { pattern } => {
            let client = OperatorClient::new(&args.server, args.private_key)?;
            let records = client.file_tree(&pattern).await?;
            info!("{} file(s) matched", records.len());
            print_records(&records)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
