//! # Screenshot CLI
//!
//! Command-line interface for the screenshot rendering service.
//!
//! This module provides CLI commands for:
//! - Signing screenshot URLs offline
//! - Verifying captured webhook deliveries
//! - Taking screenshots
//! - Managing batch jobs and the render cache

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use screenshot_sdk::client::{BatchRequest, CacheListQuery, PurgeRequest};
use screenshot_sdk::clock::{Clock, FixedClock, SystemClock};
use screenshot_sdk::webhook::{parse_event, verify_with_tolerance};
use screenshot_sdk::{
    ApiError, ClientConfig, ImageFormat, ParamValue, ScreenshotClient, ScreenshotOptions,
    WebhookError,
};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the optional configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "screenshot.toml";

/// Prefix for configuration environment variables, e.g. `SCREENSHOT__API_KEY`.
pub const ENV_PREFIX: &str = "SCREENSHOT";

const REDACTED: &str = "<REDACTED>";

// ============================================================================
// CLI Structure
// ============================================================================

/// Screenshot CLI - render web pages through the screenshot service
#[derive(Parser)]
#[command(name = "screenshot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for the screenshot rendering service")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SCREENSHOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// API key, overriding configuration
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Service base URL, overriding configuration
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Logging level
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print a signed screenshot URL
    #[command(group(ArgGroup::new("expiry").required(true).args(["expires_at", "expires_in"])))]
    SignUrl {
        #[command(flatten)]
        options: CaptureArgs,

        /// Expiry as Unix seconds
        #[arg(long)]
        expires_at: Option<i64>,

        /// Expiry as seconds from now
        #[arg(long)]
        expires_in: Option<u64>,
    },

    /// Verify a captured webhook delivery
    VerifyWebhook {
        /// File holding the raw request body, or `-` for stdin
        #[arg(long)]
        payload: String,

        /// Value of the X-Webhook-Signature header
        #[arg(long)]
        signature: String,

        /// Value of the X-Webhook-Timestamp header
        #[arg(long)]
        timestamp: String,

        /// Webhook secret, overriding configuration
        #[arg(long)]
        secret: Option<String>,

        /// Evaluate freshness as of this Unix time instead of now
        #[arg(long)]
        now: Option<i64>,

        /// Freshness window in seconds, overriding configuration
        #[arg(long)]
        tolerance: Option<u64>,
    },

    /// Take a screenshot and save it to a file
    Capture {
        #[command(flatten)]
        options: CaptureArgs,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Batch job commands
    Batch {
        #[command(subcommand)]
        action: BatchCommands,
    },

    /// Render cache commands
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Screenshot options shared by `capture` and `sign-url`.
#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Page to capture
    #[arg(long)]
    pub url: String,

    /// Viewport width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Capture the full scrollable page
    #[arg(long)]
    pub full_page: bool,

    /// Additional option as key=value; may be repeated
    #[arg(long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

impl CaptureArgs {
    /// Convert command-line arguments into request options.
    pub fn to_options(&self) -> ScreenshotOptions {
        let mut options = ScreenshotOptions::new(&self.url);
        for (key, value) in &self.params {
            options = options.with_param(key, ParamValue::infer(value));
        }
        if let Some(width) = self.width {
            options = options.with_width(width);
        }
        if let Some(height) = self.height {
            options = options.with_height(height);
        }
        if let Some(format) = self.format {
            options = options.with_format(format.into());
        }
        if self.full_page {
            options = options.with_full_page(true);
        }
        options
    }
}

/// Image format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Png,
    Jpeg,
    Webp,
    Pdf,
}

impl From<FormatArg> for ImageFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpeg => ImageFormat::Jpeg,
            FormatArg::Webp => ImageFormat::Webp,
            FormatArg::Pdf => ImageFormat::Pdf,
        }
    }
}

/// Batch subcommands
#[derive(Subcommand)]
pub enum BatchCommands {
    /// Submit a batch from a file of URLs, one per line
    Submit {
        /// File of URLs; blank lines and `#` comments are ignored
        #[arg(short, long)]
        file: PathBuf,

        /// Completion webhook URL
        #[arg(long)]
        webhook_url: Option<String>,
    },

    /// Show batch status
    Status {
        /// Batch ID
        batch_id: String,
    },
}

/// Cache subcommands
#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cache entries
    List {
        /// Maximum entries to return
        #[arg(short, long)]
        limit: Option<u32>,

        /// Cursor from a previous page
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Show one cache entry
    Get {
        /// Cache key
        key: String,
    },

    /// Delete one cache entry
    Delete {
        /// Cache key
        key: String,
    },

    /// Purge cache entries
    #[command(group(ArgGroup::new("selector").required(true).multiple(true).args(["url_prefix", "keys", "all"])))]
    Purge {
        /// Purge entries whose source URL starts with this prefix
        #[arg(long)]
        url_prefix: Option<String>,

        /// Purge this key; may be repeated
        #[arg(long = "key")]
        keys: Vec<String>,

        /// Purge everything
        #[arg(long)]
        all: bool,
    },
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration with secrets redacted
    Show,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    #[error("Webhook signature is invalid")]
    InvalidWebhook,
}

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

// ============================================================================
// Configuration Types
// ============================================================================

/// CLI configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// API key for the screenshot service
    pub api_key: Option<String>,

    /// Service base URL
    pub base_url: String,

    /// Secret used to verify webhook deliveries
    pub webhook_secret: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Retries for transient failures
    pub max_retries: u32,

    /// Webhook freshness window in seconds
    pub webhook_tolerance_seconds: u64,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: screenshot_sdk::client::DEFAULT_BASE_URL.to_string(),
            webhook_secret: None,
            timeout_seconds: 60,
            max_retries: 3,
            webhook_tolerance_seconds: screenshot_sdk::webhook::DEFAULT_TOLERANCE.as_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CliConfig {
    /// Copy with secrets replaced by a placeholder.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api_key.is_some() {
            copy.api_key = Some(REDACTED.to_string());
        }
        if copy.webhook_secret.is_some() {
            copy.webhook_secret = Some(REDACTED.to_string());
        }
        copy
    }

    /// The API key, or an error naming the missing setting.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "api_key".to_string(),
            })
    }

    /// SDK client configuration derived from these settings.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig::new(self.require_api_key()?)
            .with_base_url(&self.base_url)
            .with_timeout(Duration::from_secs(self.timeout_seconds))
            .with_max_retries(self.max_retries))
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LogFormat {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "json")]
    Json,
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    run(Cli::parse()).await
}

/// Execute an already parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = load_configuration(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    initialize_logging(&cli, &config.logging)?;

    match cli.command {
        Commands::SignUrl {
            options,
            expires_at,
            expires_in,
        } => execute_sign_url_command(&options, expires_at, expires_in, &config),
        Commands::VerifyWebhook {
            payload,
            signature,
            timestamp,
            secret,
            now,
            tolerance,
        } => {
            let request = VerifyRequest {
                payload,
                signature,
                timestamp,
                secret,
                now,
                tolerance,
            };
            execute_verify_webhook_command(request, &config).await
        }
        Commands::Capture { options, output } => {
            execute_capture_command(&options, &output, &config).await
        }
        Commands::Batch { action } => execute_batch_command(action, &config).await,
        Commands::Cache { action } => execute_cache_command(action, &config).await,
        Commands::Config { action } => execute_config_command(action, &config),
    }
}

/// Initialize logging based on CLI arguments and configuration.
///
/// Logs go to stderr; stdout is reserved for command output.
fn initialize_logging(cli: &Cli, logging: &LoggingConfig) -> Result<(), CliError> {
    let level = cli.log_level.as_deref().unwrap_or(&logging.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cli.json_logs || logging.format == LogFormat::Json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::CommandFailed {
        message: format!("failed to initialize logging: {}", e),
    })
}

/// Load configuration from defaults, files and the environment.
///
/// Sources, later overriding earlier:
///  1. built-in defaults
///  2. `screenshot.toml` in the working directory, if present
///  3. `explicit_path`, which must exist when given
///  4. `SCREENSHOT__*` environment variables, e.g. `SCREENSHOT__LOGGING__LEVEL`
pub fn load_configuration(explicit_path: Option<&Path>) -> Result<CliConfig, ConfigError> {
    let mut builder = config::Config::builder().add_source(
        config::File::new(DEFAULT_CONFIG_FILE, config::FileFormat::Toml).required(false),
    );

    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        builder = builder.add_source(
            config::File::new(&path.to_string_lossy(), config::FileFormat::Toml).required(true),
        );
    }

    let config = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Apply command-line overrides on top of loaded configuration.
fn apply_overrides(config: &mut CliConfig, cli: &Cli) {
    if let Some(api_key) = &cli.api_key {
        config.api_key = Some(api_key.clone());
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn execute_sign_url_command(
    args: &CaptureArgs,
    expires_at: Option<i64>,
    expires_in: Option<u64>,
    config: &CliConfig,
) -> Result<(), CliError> {
    let client = ScreenshotClient::new(config.client_config()?)?;
    let options = args.to_options();

    let url = match (expires_at, expires_in) {
        (Some(at), _) => {
            let at = Utc
                .timestamp_opt(at, 0)
                .single()
                .ok_or_else(|| CliError::InvalidArgument {
                    arg: "expires-at".to_string(),
                    message: format!("{} is not a valid Unix time", at),
                })?;
            client.signed_url(&options, at)
        }
        (None, Some(secs)) => client.signed_url_expiring_in(&options, Duration::from_secs(secs)),
        (None, None) => {
            return Err(CliError::InvalidArgument {
                arg: "expires-at".to_string(),
                message: "one of --expires-at or --expires-in is required".to_string(),
            })
        }
    };

    info!(target_url = %options.url(), "Signed URL created");
    println!("{}", url);
    Ok(())
}

struct VerifyRequest {
    payload: String,
    signature: String,
    timestamp: String,
    secret: Option<String>,
    now: Option<i64>,
    tolerance: Option<u64>,
}

async fn execute_verify_webhook_command(
    request: VerifyRequest,
    config: &CliConfig,
) -> Result<(), CliError> {
    let secret = request
        .secret
        .or_else(|| config.webhook_secret.clone())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingRequired {
            key: "webhook_secret".to_string(),
        })?;

    let clock: Box<dyn Clock> = match request.now {
        Some(now) => Box::new(FixedClock::from_unix(now).ok_or_else(|| {
            CliError::InvalidArgument {
                arg: "now".to_string(),
                message: format!("{} is not a valid Unix time", now),
            }
        })?),
        None => Box::new(SystemClock),
    };

    let tolerance = Duration::from_secs(
        request
            .tolerance
            .unwrap_or(config.webhook_tolerance_seconds),
    );

    let payload = read_payload(&request.payload).await?;
    debug!(size = payload.len(), "Webhook payload read");

    let valid = verify_with_tolerance(
        &payload,
        &request.signature,
        &request.timestamp,
        &secret,
        clock.as_ref(),
        tolerance,
    );

    if !valid {
        println!("invalid");
        return Err(CliError::InvalidWebhook);
    }

    let event = parse_event(payload.as_slice())?;
    println!("valid");
    println!("{}", to_json(&event)?);
    Ok(())
}

async fn read_payload(source: &str) -> Result<Vec<u8>, CliError> {
    if source == "-" {
        let mut buffer = Vec::new();
        tokio::io::stdin().read_to_end(&mut buffer).await?;
        Ok(buffer)
    } else {
        Ok(tokio::fs::read(source).await?)
    }
}

async fn execute_capture_command(
    args: &CaptureArgs,
    output: &Path,
    config: &CliConfig,
) -> Result<(), CliError> {
    let client = ScreenshotClient::new(config.client_config()?)?;
    let shot = client.screenshot(&args.to_options()).await?;

    tokio::fs::write(output, &shot.bytes).await?;

    info!(
        output = %output.display(),
        size = shot.bytes.len(),
        cache_status = ?shot.cache_status,
        "Screenshot saved"
    );
    println!("{} ({} bytes)", output.display(), shot.bytes.len());
    Ok(())
}

/// Read a URL list, skipping blank lines and `#` comments.
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

async fn execute_batch_command(action: BatchCommands, config: &CliConfig) -> Result<(), CliError> {
    let client = ScreenshotClient::new(config.client_config()?)?;

    match action {
        BatchCommands::Submit { file, webhook_url } => {
            let contents = tokio::fs::read_to_string(&file).await?;
            let urls = parse_url_list(&contents);
            if urls.is_empty() {
                return Err(CliError::InvalidArgument {
                    arg: "file".to_string(),
                    message: format!("{} contains no URLs", file.display()),
                });
            }

            let mut request = urls
                .into_iter()
                .fold(BatchRequest::new(), |request, url| {
                    request.with_request(ScreenshotOptions::new(url))
                });
            request.webhook_url = webhook_url;

            let job = client.submit_batch(&request).await?;
            println!("{}", to_json(&job)?);
        }
        BatchCommands::Status { batch_id } => {
            let job = client.batch_status(&batch_id).await?;
            println!("{}", to_json(&job)?);
        }
    }
    Ok(())
}

async fn execute_cache_command(action: CacheCommands, config: &CliConfig) -> Result<(), CliError> {
    let client = ScreenshotClient::new(config.client_config()?)?;

    match action {
        CacheCommands::List { limit, cursor } => {
            let query = CacheListQuery {
                limit,
                cursor,
                url_prefix: None,
            };
            let page = client.list_cache(&query).await?;
            println!("{}", to_json(&page)?);
        }
        CacheCommands::Get { key } => {
            let entry = client.get_cache_entry(&key).await?;
            println!("{}", to_json(&entry)?);
        }
        CacheCommands::Delete { key } => {
            client.delete_cache_entry(&key).await?;
            println!("deleted {}", key);
        }
        CacheCommands::Purge {
            url_prefix,
            keys,
            all,
        } => {
            let request = PurgeRequest {
                keys,
                url_prefix,
                all,
            };
            let result = client.purge_cache(&request).await?;
            println!("{}", to_json(&result)?);
        }
    }
    Ok(())
}

fn execute_config_command(action: ConfigCommands, config: &CliConfig) -> Result<(), CliError> {
    match action {
        ConfigCommands::Show => {
            let rendered = toml::to_string_pretty(&config.redacted()).map_err(ConfigError::from)?;
            print!("{}", rendered);
        }
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::CommandFailed {
        message: format!("failed to render output: {}", e),
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
