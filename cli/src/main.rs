//! CLI for the repository retriever.
//!
//! Fetches a bounded, prioritised snapshot of a GitHub repository's text
//! files and prints a summary, or the whole snapshot as JSON.

use clap::{Parser, ValueEnum};
use repo_retriever::{
    BranchSelection, ConfigError, Credential, HttpTransport, RepositoryError, RepositoryHandle,
    RetrievalConfig, RetrievalFailure, RetrievalMethod, RetrievalOutcome, RetrievalRequest,
    RetrievedRepository, Retriever, TransportError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Retrieve the text files of a GitHub repository.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Repository URL or `owner/name`.
    repository: String,

    /// GitHub token; `GH_TOKEN` is consulted if neither this nor `GITHUB_TOKEN` is set.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Branch to retrieve instead of probing the usual default branches.
    #[arg(long)]
    branch: Option<String>,

    /// Which retrieval path to use.
    #[arg(long, value_enum, default_value_t = Method::Auto)]
    method: Method,

    /// Path to a TOML file with a `[retrieval]` table.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full result as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    /// Archive first, API fallback when credentialed.
    Auto,
    /// Archive download only.
    Archive,
    /// API tree listing only.
    Api,
}

impl From<Method> for RetrievalMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Auto => Self::Auto,
            Method::Archive => Self::Archive,
            Method::Api => Self::Api,
        }
    }
}

/// Problems found before any request is made.
#[derive(Debug, Error)]
enum CliError {
    #[error("Invalid repository or branch: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] TransportError),
}

#[tokio::main]
async fn main() -> ExitCode {
    // More than one rustls provider may be linked in; pick one for the process.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    init_tracing();
    let args = Args::parse();
    let json = args.json;

    let (retriever, request) = match prepare(args) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!(error = %e, "Cannot start retrieval");
            return ExitCode::from(2);
        }
    };

    let outcome = retriever.retrieve(&request).await;
    if json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                error!(error = %e, "Failed to serialize result");
                return ExitCode::from(1);
            }
        }
    }

    match outcome {
        RetrievalOutcome::Success(repository) => {
            if !json {
                print_summary(&repository);
            }
            ExitCode::from(0)
        }
        RetrievalOutcome::Failure(failure) => {
            if !json {
                print_failure(&failure);
            }
            ExitCode::from(1)
        }
    }
}

/// Initializes tracing on stderr, filtered by `RUST_LOG` (default "info").
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Validates arguments and builds the retriever.
fn prepare(args: Args) -> Result<(Retriever<HttpTransport>, RetrievalRequest), CliError> {
    let handle = RepositoryHandle::parse(&args.repository)?;
    let branch = BranchSelection::from_option(args.branch.as_deref())?;

    let config = match &args.config {
        Some(path) => RetrievalConfig::load(path)?,
        None => RetrievalConfig::default(),
    };

    let credential = Credential::resolve(args.token.as_deref());
    let retriever = Retriever::from_config(config, credential)?;
    let request = RetrievalRequest::new(handle)
        .with_branch(branch)
        .with_method(args.method.into());

    Ok((retriever, request))
}

fn print_summary(repository: &RetrievedRepository) {
    let info = &repository.repo_info;
    println!("\nRetrieved {}:", info.full_name);
    println!("  Source: {:?}", repository.source);
    println!("  Branch: {}", repository.branch);
    if let Some(language) = &info.language {
        println!("  Language: {language}");
    }
    println!("  Files: {}", repository.files.len());
    println!("  Bytes: {}", repository.total_size());

    if repository.skipped + repository.dropped + repository.failed > 0 {
        println!("  Skipped (quota): {}", repository.skipped);
        println!("  Dropped: {}", repository.dropped);
        println!("  Failed: {}", repository.failed);
    }

    let mut files: Vec<_> = repository.files.iter().collect();
    files.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.path.cmp(&b.path)));
    for file in files.iter().take(20) {
        println!("    {:>8}  {}", file.size, file.path);
    }
    if files.len() > 20 {
        println!("    ... and {} more", files.len() - 20);
    }
}

fn print_failure(failure: &RetrievalFailure) {
    eprintln!("\nRetrieval failed ({}): {}", failure.kind, failure.detail);
    if let Some(fallback) = &failure.fallback {
        eprintln!("  API fallback also failed ({}): {}", fallback.kind, fallback.detail);
    }
    if let Some(reset_at) = failure.reset_at {
        eprintln!("  Quota resets at Unix time {reset_at}");
    }
    if let Some(guidance) = &failure.guidance {
        eprintln!("\n{guidance}");
    }
    if failure.retriable {
        eprintln!("\nRetrying later may succeed.");
    }
}
