use clap::Args;

use crate::application::{AppError, LedgerService, DEFAULT_CASH_ACCOUNTS};

pub const DEFAULT_APP_NAME: &str = "PixiePinks Ledger";
pub const DEFAULT_DATABASE: &str = "ledger.db";
pub const DEFAULT_CURRENCY: &str = "LKR";

/// Runtime settings. Each value comes from a flag, then the environment,
/// then the default.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Database file path
    #[arg(short, long, global = true, env = "LEDGER_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Currency code used when displaying amounts (display only)
    #[arg(long, global = true, env = "LEDGER_CURRENCY", default_value = DEFAULT_CURRENCY)]
    pub currency: String,

    /// Name shown in report headers
    #[arg(long, global = true, env = "LEDGER_APP_NAME", default_value = DEFAULT_APP_NAME)]
    pub app_name: String,

    /// Account codes summed into the dashboard cash balance
    #[arg(
        long,
        global = true,
        env = "LEDGER_CASH_ACCOUNTS",
        value_delimiter = ',',
        default_values = ["1000", "1010"]
    )]
    pub cash_accounts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            cash_accounts: DEFAULT_CASH_ACCOUNTS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Create the database if needed and open a service over it.
    pub async fn init_service(&self) -> Result<LedgerService, AppError> {
        Ok(self.configure(LedgerService::init(&self.database).await?))
    }

    /// Open a service over an existing database.
    pub async fn open_service(&self) -> Result<LedgerService, AppError> {
        Ok(self.configure(LedgerService::connect(&self.database).await?))
    }

    fn configure(&self, service: LedgerService) -> LedgerService {
        let codes = self
            .cash_accounts
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        service.with_cash_accounts(codes)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.currency, "LKR");
        assert_eq!(settings.database, "ledger.db");
        assert_eq!(settings.cash_accounts, vec!["1000", "1010"]);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::try_parse_from([
            "ledgerbook",
            "--database",
            "books.db",
            "--currency",
            "USD",
            "--cash-accounts",
            "1000,1020",
        ])
        .unwrap();

        assert_eq!(cli.settings.database, "books.db");
        assert_eq!(cli.settings.currency, "USD");
        assert_eq!(cli.settings.cash_accounts, vec!["1000", "1020"]);
    }
}
