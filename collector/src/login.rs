use std::path::Path;

use batch_fleet_common::{accounts_file_name, read_accounts, Batch};
use tracing::{error, info};
use twscrape::{NewAccount, ScrapeClient};

use crate::error::CollectError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoginSummary {
    pub total: usize,
    pub logged_in: Vec<String>,
}

impl LoginSummary {
    pub fn failed(&self) -> usize {
        self.total - self.logged_in.len()
    }
}

/// Add every account of `batch` to the pool and log them all in.
pub async fn login(
    client: &dyn ScrapeClient,
    batch: Batch,
    dir: impl AsRef<Path>,
) -> Result<LoginSummary, CollectError> {
    let accounts =
        read_accounts(dir.as_ref().join(accounts_file_name(batch))).map_err(CollectError::Accounts)?;
    info!(accounts = accounts.len(), "starting login process");

    for account in &accounts {
        let new_account = NewAccount {
            username: account.username.clone(),
            password: account.password.clone(),
            email: account.email.clone(),
            email_password: account.password.clone(),
        };
        match client.add_account(&new_account).await {
            Ok(()) => info!(username = %account.username, "added account"),
            Err(e) => error!(username = %account.username, "unable to add account: {}", e),
        }
    }

    info!("logging in all accounts");
    client.login_all().await?;

    let pool = client.accounts_info().await?;
    let logged_in: Vec<String> = accounts
        .iter()
        .filter(|a| {
            pool.iter()
                .any(|p| p.logged_in && p.username.eq_ignore_ascii_case(&a.username))
        })
        .map(|a| a.username.clone())
        .collect();

    let summary = LoginSummary {
        total: accounts.len(),
        logged_in,
    };

    info!(
        total = summary.total,
        logged_in = summary.logged_in.len(),
        failed = summary.failed(),
        "login results"
    );
    if !summary.logged_in.is_empty() {
        info!("logged in accounts: {}", summary.logged_in.join(", "));
    }

    Ok(summary)
}
