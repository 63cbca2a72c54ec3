use async_trait::async_trait;

use crate::error::ScrapeError;

/// Credentials handed to the account pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: String,
    pub email_password: String,
}

/// State of one pooled account as reported by the scraping client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub username: String,
    pub logged_in: bool,
    pub active: bool,
    pub last_used: Option<String>,
    pub total_req: Option<u64>,
    pub error_msg: Option<String>,
}

impl AccountInfo {
    /// Whether requests can currently be made with this account
    pub fn usable(&self) -> bool {
        self.active && self.logged_in
    }
}

/// Authenticated scraping operations backed by a pool of logged in accounts.
///
/// Fetch methods return the item serialized as one JSON object per string,
/// or `None`/empty when the item does not exist.
#[async_trait]
pub trait ScrapeClient: Send + Sync {
    async fn add_account(&self, account: &NewAccount) -> Result<(), ScrapeError>;

    async fn login_all(&self) -> Result<(), ScrapeError>;

    async fn accounts_info(&self) -> Result<Vec<AccountInfo>, ScrapeError>;

    async fn tweet_details(&self, tweet_id: u64) -> Result<Option<String>, ScrapeError>;

    async fn user_by_id(&self, user_id: u64) -> Result<Option<String>, ScrapeError>;

    async fn user_tweets_and_replies(
        &self,
        user_id: u64,
        limit: usize,
    ) -> Result<Vec<String>, ScrapeError>;

    /// Whether the pool has at least one account requests can be made with
    async fn has_usable_account(&self) -> Result<bool, ScrapeError> {
        Ok(self.accounts_info().await?.iter().any(AccountInfo::usable))
    }
}
