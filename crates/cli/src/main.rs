//! StudentIntro CLI
//!
//! Runs the create/update/close scenario, issues single StudentIntro
//! operations, and serves a local single-node cluster over JSON-RPC.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use intro_client::{
    run_scenario, wallet, ClusterTarget, Commitment, IntroFixture, Scenario, StudentIntroClient,
};
use intro_rpc_server::{HttpRpcServer, RpcContext, RpcServerConfig};
use intro_runtime::LocalBank;
use parking_lot::Mutex;
use solana_sdk::{pubkey::Pubkey, signature::Signer};
use student_intro_program::StudentIntro;
use std::{path::PathBuf, str::FromStr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::CliConfig;

/// StudentIntro program client
#[derive(Parser, Debug)]
#[command(name = "student-intro")]
#[command(about = "Create, update and close StudentIntro accounts", long_about = None)]
struct Args {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Use a fresh in-process cluster
    #[arg(long, global = true)]
    local: bool,

    /// Student keypair file
    #[arg(short, long, global = true)]
    keypair: Option<PathBuf>,

    /// StudentIntro program id
    #[arg(long, global = true)]
    program_id: Option<String>,

    /// Commitment to wait for (processed, confirmed, finalized)
    #[arg(long, global = true)]
    commitment: Option<Commitment>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, update and close the wallet's intro, checking each step
    Scenario {
        #[arg(long, default_value = "name")]
        name: String,
        #[arg(long, default_value = "message")]
        message: String,
        #[arg(long, default_value = "realloc")]
        new_name: String,
        #[arg(long, default_value = "realloc")]
        new_message: String,
    },
    /// Create the wallet's intro
    Add { name: String, message: String },
    /// Rewrite the wallet's intro
    Update { name: String, message: String },
    /// Close the wallet's intro and reclaim its rent
    Close,
    /// Print the wallet's intro
    Show,
    /// Print the intro address of the wallet or of `--student`
    Address {
        #[arg(long)]
        student: Option<String>,
    },
    /// Request lamports for the wallet
    Airdrop { lamports: u64 },
    /// Serve a local single-node cluster over JSON-RPC
    Validator {
        /// HTTP RPC bind address
        #[arg(long)]
        rpc_addr: Option<String>,
        /// Lamports airdropped to the wallet at startup, if one is found
        #[arg(long)]
        faucet_lamports: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = resolve_config(&args)?;

    match args.command {
        Command::Validator {
            rpc_addr,
            faucet_lamports,
        } => {
            let mut server_config = RpcServerConfig {
                http_addr: rpc_addr.unwrap_or_else(|| config.rpc_addr.clone()),
                ..Default::default()
            };
            if let Some(lamports) = faucet_lamports {
                server_config.faucet_lamports = lamports;
            }
            run_validator(&config, server_config).await
        }
        Command::Address { student } => {
            let student = match student {
                Some(s) => Pubkey::from_str(&s).with_context(|| format!("invalid pubkey {}", s))?,
                None => wallet::load_keypair(config.keypair_path.as_deref())?.pubkey(),
            };
            let (address, bump) = StudentIntro::derive_pda(&student, &config.program_id()?);
            println!("{} (bump {})", address, bump);
            Ok(())
        }
        Command::Scenario {
            name,
            message,
            new_name,
            new_message,
        } => {
            let client = connect(&config).await?;
            let scenario = Scenario {
                initial: IntroFixture::new(name, message),
                updated: IntroFixture::new(new_name, new_message),
            };
            let report = run_scenario(&client, &scenario).await?;

            println!("intro account:  {}", report.address);
            println!("create:         {} ({} bytes)", report.create_signature, report.created_size);
            println!("update:         {} ({} bytes)", report.update_signature, report.updated_size);
            println!("close:          {}", report.close_signature);
            Ok(())
        }
        Command::Add { name, message } => {
            let client = connect(&config).await?;
            println!("{}", client.add_student_intro(&name, &message).await?);
            Ok(())
        }
        Command::Update { name, message } => {
            let client = connect(&config).await?;
            println!("{}", client.update_student_intro(&name, &message).await?);
            Ok(())
        }
        Command::Close => {
            let client = connect(&config).await?;
            println!("{}", client.close_student_intro().await?);
            Ok(())
        }
        Command::Show => {
            let client = connect(&config).await?;
            let Some(intro) = client.try_fetch_student_intro().await? else {
                bail!("no intro at {}", client.student_intro_address());
            };
            println!("address: {}", client.student_intro_address());
            println!("student: {}", intro.student);
            println!("name:    {}", intro.name);
            println!("message: {}", intro.message);
            Ok(())
        }
        Command::Airdrop { lamports } => {
            let client = connect(&config).await?;
            println!("{}", client.airdrop(lamports).await?);
            Ok(())
        }
    }
}

/// Defaults, then the config file, then flags
fn resolve_config(args: &Args) -> Result<CliConfig> {
    let mut config = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    if let Some(url) = &args.url {
        config.rpc_url = url.clone();
    }
    if args.local {
        config.local = true;
    }
    if let Some(keypair) = &args.keypair {
        config.keypair_path = Some(keypair.clone());
    }
    if let Some(program_id) = &args.program_id {
        config.program_id = Some(program_id.clone());
    }
    if let Some(commitment) = args.commitment {
        config.commitment = commitment;
    }

    Ok(config)
}

/// Build a client, funding the wallet first on a fresh local cluster
async fn connect(config: &CliConfig) -> Result<StudentIntroClient> {
    let client_config = config.to_client_config()?;
    let client = StudentIntroClient::from_config(&client_config)?;

    if client_config.cluster == ClusterTarget::Local && config.local_airdrop_lamports > 0 {
        client
            .airdrop(config.local_airdrop_lamports)
            .await
            .context("funding wallet on local cluster")?;
    }

    Ok(client)
}

/// Serve a local bank until Ctrl+C
async fn run_validator(config: &CliConfig, server_config: RpcServerConfig) -> Result<()> {
    tracing::info!("Starting StudentIntro local cluster");
    tracing::info!("  HTTP RPC: {}", server_config.http_addr);
    tracing::info!("  Program: {}", student_intro_program::id());

    let bank = Arc::new(Mutex::new(LocalBank::new()));

    match wallet::load_keypair(config.keypair_path.as_deref()) {
        Ok(keypair) if server_config.faucet_lamports > 0 => {
            bank.lock()
                .airdrop(&keypair.pubkey(), server_config.faucet_lamports)
                .context("funding wallet")?;
            tracing::info!(
                "  Funded {} with {} lamports",
                keypair.pubkey(),
                server_config.faucet_lamports
            );
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("No wallet funded at startup: {}", e),
    }

    let server = HttpRpcServer::new(Arc::new(RpcContext::new(bank)));

    tokio::select! {
        result = server.run(&server_config.http_addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down...");
        }
    }

    tracing::info!("Local cluster stopped");
    Ok(())
}
