mod cli;
mod client;
mod error;

pub use cli::TwscrapeCli;
pub use client::{AccountInfo, NewAccount, ScrapeClient};
pub use error::ScrapeError;
