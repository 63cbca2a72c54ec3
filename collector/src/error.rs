use std::path::PathBuf;

use thiserror::Error;
use twscrape::ScrapeError;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("unable to read id list {}: {source}", .path.display())]
    ReadIds {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid id {value:?} on line {line} of {}", .path.display())]
    InvalidId {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("unable to prepare output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to load accounts: {0:#}")]
    Accounts(anyhow::Error),

    #[error("no active accounts available")]
    NoAccounts,

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}
