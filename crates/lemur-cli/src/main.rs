//! Lemur CLI: SVG sanitization, download tokens and asset lookup.
//!
//! Configuration is read from the environment (and `.env`), see `lemur_core::Config`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lemur_cli::{init_tracing, inspect_svg, issue_token, load_config, sanitize_file, token_secret};
use lemur_core::{download_token, AppError, AssetResolver, ErrorMetadata};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "lemur", about = "Lemur member-site tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize an SVG or SVGZ file
    Sanitize {
        /// Path to the uploaded file
        input: PathBuf,
        /// Write the sanitized file here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Report signature, compression and dimensions of an SVG
    Inspect {
        /// Path to the file
        input: PathBuf,
    },
    /// Document download tokens
    Token {
        #[command(subcommand)]
        sub: TokenCommands,
    },
    /// Resolve a Vite entry point to its public URLs
    Asset {
        /// Manifest key, e.g. src/main.js
        entry: String,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Issue a token for a member
    Issue {
        /// Document ID
        #[arg(long)]
        document: u64,
        /// Member user ID
        #[arg(long)]
        user: u64,
        /// Lifetime in seconds (defaults to DOCUMENT_TOKEN_TTL_SECS)
        #[arg(long)]
        ttl: Option<i64>,
    },
    /// Verify a token as presented by a member
    Resolve {
        /// Token from the download URL
        token: String,
        /// ID of the member presenting it
        #[arg(long)]
        user: u64,
    },
}

#[derive(Serialize)]
struct SanitizeSummary<'a> {
    output: String,
    safe_filename: &'a str,
    content_type: &'a str,
    file_size: usize,
    width: u32,
    height: u32,
    compressed: bool,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn app_error(err: AppError) -> anyhow::Error {
    tracing::debug!(
        error_code = err.error_code(),
        status = err.http_status_code(),
        "Command failed"
    );
    anyhow::anyhow!("{} [{}]", err.detailed_message(), err.error_code())
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config().map_err(app_error)?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Sanitize { input, output } => {
            let processed =
                sanitize_file(&config.svg, &input, output.as_deref()).map_err(app_error)?;

            match output {
                Some(path) => {
                    print_json(&SanitizeSummary {
                        output: path.display().to_string(),
                        safe_filename: &processed.safe_filename,
                        content_type: &processed.content_type,
                        file_size: processed.file_size,
                        width: processed.metadata.dimensions.width,
                        height: processed.metadata.dimensions.height,
                        compressed: processed.metadata.compressed,
                    })?;
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout
                        .write_all(&processed.data)
                        .context("Failed to write to stdout")?;
                    stdout.flush().context("Failed to write to stdout")?;
                }
            }
        }
        Commands::Inspect { input } => {
            let data = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let inspection = inspect_svg(&data, config.svg.max_decompressed_bytes)
                .map_err(|e| app_error(AppError::from(e)))?;
            print_json(&inspection)?;
        }
        Commands::Token { sub } => match sub {
            TokenCommands::Issue {
                document,
                user,
                ttl,
            } => {
                let now = chrono::Utc::now().timestamp();
                let issued =
                    issue_token(&config, document, user, ttl, now).map_err(app_error)?;
                print_json(&issued)?;
            }
            TokenCommands::Resolve { token, user } => {
                let secret = token_secret(&config).map_err(app_error)?;
                let now = chrono::Utc::now().timestamp();
                let claims = download_token::resolve(&token, user, secret, now)
                    .map_err(|e| app_error(AppError::from(e)))?;
                print_json(&claims)?;
            }
        },
        Commands::Asset { entry } => {
            let mut resolver = AssetResolver::from_config(&config.assets);
            let asset = resolver.resolve(&entry).ok_or_else(|| {
                app_error(AppError::NotFound(format!(
                    "No manifest entry for {}",
                    entry
                )))
            })?;
            print_json(&asset)?;
        }
    }

    Ok(())
}
