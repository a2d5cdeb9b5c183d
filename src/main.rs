use anyhow::Result;
use clap::Parser;
use ledgerbook::application::AppError;
use ledgerbook::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    ledgerbook::logging::init(cli.verbose);

    let result = cli.run().await;
    if let Err(err) = &result {
        if let Some(app_err) = err.downcast_ref::<AppError>() {
            if !app_err.is_user_error() {
                tracing::error!(error = %app_err, "ledger operation failed");
            }
        }
    }
    result
}
