//! phish-relay command line
//!
//! ```bash
//! phish-relay extract suspicious.eml
//! phish-relay submit suspicious.eml --sender user@example.com
//! cat suspicious.eml | phish-relay submit - --sender user@example.com
//! phish-relay health
//! ```

use clap::{Args, Parser, Subcommand};
use phish_relay::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_MAX_EMAIL_SIZE_MB, DEFAULT_MAX_RETRIES,
    DEFAULT_RATE_LIMIT_PER_HOUR, DEFAULT_TIMEOUT_SECS, Intake, SubmissionClient, decode_email,
    extract_phishing_email,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "phish-relay")]
#[command(version)]
#[command(about = "Recover forwarded phishing emails and relay them for analysis", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Settings {
    /// Base URL of the submission API
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_API_BASE_URL, global = true)]
    api_base_url: String,

    /// Largest accepted raw message, in MiB
    #[arg(long, env = "MAX_EMAIL_SIZE_MB", default_value_t = DEFAULT_MAX_EMAIL_SIZE_MB, global = true)]
    max_email_size_mb: u64,

    /// Successful submissions allowed per sender per hour
    #[arg(long, env = "RATE_LIMIT_PER_HOUR", default_value_t = DEFAULT_RATE_LIMIT_PER_HOUR, global = true)]
    rate_limit_per_hour: u32,

    /// Retries after a failed submission attempt
    #[arg(long, env = "MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES, global = true)]
    max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,
}

impl From<Settings> for Config {
    fn from(settings: Settings) -> Self {
        Self {
            api_base_url: settings.api_base_url,
            max_email_size_mb: settings.max_email_size_mb,
            rate_limit_per_hour: settings.rate_limit_per_hour,
            max_retries: settings.max_retries,
            request_timeout: Duration::from_secs(settings.timeout_secs),
            ..Self::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and submit the recovered email
    Submit {
        /// Raw message file, or `-` for stdin
        input: PathBuf,
        /// Address of whoever forwarded the message
        #[arg(long)]
        sender: String,
    },
    /// Recover the phishing email and print it without submitting
    Extract {
        /// Raw message file, or `-` for stdin
        input: PathBuf,
    },
    /// Check whether the API is up
    Health,
}

async fn read_input(path: &Path) -> std::io::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        Ok(buf)
    } else {
        tokio::fs::read(path).await
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from(cli.settings);

    match cli.command {
        Commands::Submit { input, sender } => {
            let raw = read_input(&input).await?;
            let intake = Intake::new(config)?;
            let result = intake.handle(&sender, &raw).await?;

            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Extract { input } => {
            let raw = read_input(&input).await?;
            let email = decode_email(&raw)?;
            let phishing = extract_phishing_email(&email);

            println!("{}", serde_json::to_string_pretty(&phishing)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Health => {
            let client = SubmissionClient::new(&config)?;
            let up = client.check_health().await;

            println!("{}", if up { "healthy" } else { "unhealthy" });
            Ok(if up { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
