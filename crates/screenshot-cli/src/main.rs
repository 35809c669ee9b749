use screenshot_cli::run_cli;
use tracing::error;

#[tokio::main]
async fn main() {
    // Run CLI and handle errors
    if let Err(e) = run_cli().await {
        error!("CLI error: {}", e);
        eprintln!("error: {}", e);

        // Exit with appropriate code based on error type
        let exit_code = match e {
            screenshot_cli::CliError::Configuration(_) => 1,
            screenshot_cli::CliError::Api(_) => 2,
            screenshot_cli::CliError::Webhook(_) => 3,
            screenshot_cli::CliError::InvalidArgument { .. } => 4,
            screenshot_cli::CliError::Io(_) => 5,
            screenshot_cli::CliError::CommandFailed { .. } => 6,
            screenshot_cli::CliError::InvalidWebhook => 7,
        };

        std::process::exit(exit_code);
    }
}
