//! In-memory [`ScrapeClient`] for tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use twscrape::{AccountInfo, NewAccount, ScrapeClient, ScrapeError};

#[derive(Default)]
pub(crate) struct FakeClient {
    /// Ids whose fetch returns an error
    pub failing: HashSet<u64>,
    /// Ids that do not exist
    pub missing: HashSet<u64>,
    /// Usernames whose login fails
    pub bad_logins: HashSet<String>,
    /// Usernames rejected by the pool
    pub rejected: HashSet<String>,
    /// Number of availability checks answered with `true`, unlimited if `None`
    pub usable_checks: Option<usize>,

    pub added: Mutex<Vec<NewAccount>>,
    pub fetched: Mutex<Vec<u64>>,
    pub checks: AtomicUsize,
    pub calls: AtomicUsize,
    pub logged_in: AtomicBool,
}

impl FakeClient {
    pub fn with_usable_checks(n: usize) -> Self {
        Self {
            usable_checks: Some(n),
            ..Default::default()
        }
    }

    pub fn fetched(&self) -> Vec<u64> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn added(&self) -> Vec<NewAccount> {
        self.added.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fetch(&self, id: u64) -> Result<bool, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(id);
        if self.failing.contains(&id) {
            return Err(ScrapeError::Command {
                command: "fetch".to_owned(),
                status: "code 1".to_owned(),
                stderr: "rate limited".to_owned(),
            });
        }
        Ok(!self.missing.contains(&id))
    }
}

#[async_trait]
impl ScrapeClient for FakeClient {
    async fn add_account(&self, account: &NewAccount) -> Result<(), ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rejected.contains(&account.username) {
            return Err(ScrapeError::InvalidAccount {
                username: account.username.clone(),
                msg: "rejected".to_owned(),
            });
        }
        self.added.lock().unwrap().push(account.clone());
        Ok(())
    }

    async fn login_all(&self) -> Result<(), ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.logged_in.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn accounts_info(&self) -> Result<Vec<AccountInfo>, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let logged_in = self.logged_in.load(Ordering::SeqCst);
        Ok(self
            .added()
            .into_iter()
            .map(|a| AccountInfo {
                logged_in: logged_in && !self.bad_logins.contains(&a.username),
                active: true,
                username: a.username,
                last_used: None,
                total_req: None,
                error_msg: None,
            })
            .collect())
    }

    async fn tweet_details(&self, tweet_id: u64) -> Result<Option<String>, ScrapeError> {
        Ok(self
            .fetch(tweet_id)?
            .then(|| format!("{{\"id\":{}}}", tweet_id)))
    }

    async fn user_by_id(&self, user_id: u64) -> Result<Option<String>, ScrapeError> {
        Ok(self.fetch(user_id)?.then(|| format!("{{\"id\":{}}}", user_id)))
    }

    async fn user_tweets_and_replies(
        &self,
        user_id: u64,
        _limit: usize,
    ) -> Result<Vec<String>, ScrapeError> {
        if !self.fetch(user_id)? {
            return Ok(vec![]);
        }
        Ok((0..2)
            .map(|n| format!("{{\"id\":{},\"n\":{}}}", user_id, n))
            .collect())
    }

    async fn has_usable_account(&self) -> Result<bool, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let checks = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(self.usable_checks.map_or(true, |n| checks <= n))
    }
}
