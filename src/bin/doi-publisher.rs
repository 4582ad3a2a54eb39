//! DOI Publisher CLI
//!
//! Uploads a file set to the deposition API and publishes it to obtain a DOI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doi_publisher::{
    ConfigLoadOptions, DoiPublisher, Environment, PublishError, PublishResult, PublisherConfig,
    RecordMetadata, SecureTokenManager,
};
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Deposition upload and DOI publishing assistant
#[derive(Parser)]
#[command(name = "doi-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Upload files to a deposition service and publish them with a DOI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a record, upload files and publish it
    Publish {
        /// Metadata file (YAML or JSON)
        #[arg(short, long, value_name = "FILE")]
        metadata: PathBuf,

        /// Files to attach to the record
        #[arg(value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Use the sandbox instance instead of production
        #[arg(long)]
        sandbox: bool,

        /// Per-request timeout in seconds (no timeout by default)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Write the publish result as JSON to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check that everything is ready to publish, without any network call
    Check {
        /// Metadata file (YAML or JSON)
        #[arg(short, long, value_name = "FILE")]
        metadata: PathBuf,

        /// Files to attach to the record
        #[arg(value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Use the sandbox instance instead of production
        #[arg(long)]
        sandbox: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            let manager = SecureTokenManager::new();
            eprintln!("\n❌ Error");
            eprintln!("{}", manager.mask_tokens_in_string(&format!("{:#}", e)));
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish {
            metadata,
            files,
            sandbox,
            timeout,
            output,
        } => publish_command(metadata, files, sandbox, timeout, output).await,
        Commands::Check {
            metadata,
            files,
            sandbox,
        } => check_command(metadata, files, sandbox).await,
    }
}

async fn publish_command(
    metadata_path: PathBuf,
    files: Vec<PathBuf>,
    sandbox: bool,
    timeout: Option<u64>,
    output: Option<PathBuf>,
) -> Result<i32> {
    println!("\n📦 doi-publisher\n");

    let mut options = ConfigLoadOptions::from_process_env(sandbox);
    options.timeout = timeout.map(Duration::from_secs);

    match execute_publish(options, &metadata_path, &files).await {
        Ok(result) => {
            print_result(&result);
            if let Some(path) = output {
                write_result(&path, &result).await?;
                println!("Result written to {}", path.display());
            }
            println!("\n✅ Publishing completed successfully!");
            Ok(0)
        }
        Err(e) => {
            report_error(&e);
            Ok(1)
        }
    }
}

async fn execute_publish(
    options: ConfigLoadOptions,
    metadata_path: &Path,
    files: &[PathBuf],
) -> Result<PublishResult, PublishError> {
    let config = PublisherConfig::load(options)?;
    let metadata = RecordMetadata::load(metadata_path).await?;
    let publisher = DoiPublisher::new(config)?;
    publisher.upload_and_publish(&metadata, files).await
}

async fn check_command(metadata_path: PathBuf, files: Vec<PathBuf>, sandbox: bool) -> Result<i32> {
    println!("\n🔍 Publish Check\n");

    let mut ready = true;
    let environment = Environment::from_sandbox_flag(sandbox);
    println!("Environment: {} ({})", environment, environment.base_url());

    let manager = SecureTokenManager::new();
    match manager.get_token() {
        Some(token) => println!(
            "  ✅ {} is set ({})",
            manager.token_name(),
            manager.mask_token(token.expose_secret())
        ),
        None => {
            println!("  ❌ {} is not set", manager.token_name());
            ready = false;
        }
    }

    match RecordMetadata::load(&metadata_path).await {
        Ok(metadata) => {
            println!(
                "  ✅ Metadata: {} field(s), title: {}",
                metadata.len(),
                metadata.title().unwrap_or("(none)")
            );
            if metadata.title().is_none() {
                println!("  ⚠️  No title; the remote service will likely reject the record");
            }
        }
        Err(e) => {
            println!("  ❌ {}", e);
            ready = false;
        }
    }

    let mut existing = 0;
    for file in &files {
        if tokio::fs::metadata(file).await.is_ok() {
            println!("  ✅ {}", file.display());
            existing += 1;
        } else {
            println!("  ⚠️  {} does not exist and will be skipped", file.display());
        }
    }
    if existing == 0 {
        println!("  ⚠️  No files will be uploaded");
    }

    println!();
    Ok(if ready { 0 } else { 1 })
}

fn print_result(result: &PublishResult) {
    println!("\nPublished!");
    println!("DOI: {}", result.doi.as_deref().unwrap_or("(none)"));
    println!("DOI URL: {}", result.doi_url.as_deref().unwrap_or("(none)"));
    if let Some(record_id) = &result.record_id {
        println!("Record: {}", record_id);
    }
    if let Some(created) = result.created_at() {
        println!("Created: {}", created.to_rfc3339());
    }
}

async fn write_result(path: &Path, result: &PublishResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn report_error(error: &PublishError) {
    let manager = SecureTokenManager::new();
    eprintln!(
        "\n❌ Publishing failed [{}]: {}",
        error.code(),
        manager.mask_tokens_in_string(&error.to_string())
    );
    for action in error.suggested_actions() {
        eprintln!("  - {}", action);
    }
}
