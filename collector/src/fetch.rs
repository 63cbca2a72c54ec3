use std::path::Path;

use batch_fleet_common::{write_atomic, Batch, DataType};
use tracing::{error, info, warn};
use twscrape::{ScrapeClient, ScrapeError};

use crate::error::CollectError;
use crate::ids::{collected_ids, load_ids, remaining_ids, remove_partial_files};

/// Most tweets and replies fetched per user timeline
pub const TIMELINE_LIMIT: usize = 3200;
const PROGRESS_EVERY: usize = 1_000;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectSummary {
    /// Ids in the batch list
    pub total: usize,
    /// Ids without output when the run started
    pub remaining: usize,
    pub saved: usize,
    /// Fetched successfully but the item does not exist
    pub not_found: usize,
    pub failed: usize,
    /// Stopped early because every account was used up
    pub exhausted: bool,
}

enum Fetched {
    Saved,
    NotFound,
}

/// Fetch every id of `batch` that has no output file yet in `dir/<data_type>`.
///
/// Ids are processed one at a time in list order. A failure for one id is
/// logged and the loop moves on; a rerun picks it up again.
pub async fn collect(
    client: &dyn ScrapeClient,
    data_type: DataType,
    batch: Batch,
    dir: impl AsRef<Path>,
) -> Result<CollectSummary, CollectError> {
    let dir = dir.as_ref();
    let ids = load_ids(dir.join(data_type.id_list_file(batch)))?;

    let out_dir = dir.join(data_type.as_str());
    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|source| CollectError::OutputDir {
            path: out_dir.clone(),
            source,
        })?;
    remove_partial_files(&out_dir)?;
    let collected = collected_ids(&out_dir, data_type.extension())?;
    let remaining = remaining_ids(&ids, &collected);

    let mut summary = CollectSummary {
        total: ids.len(),
        remaining: remaining.len(),
        ..Default::default()
    };

    if remaining.is_empty() {
        info!(total = summary.total, "no new {} to fetch", data_type);
        return Ok(summary);
    }
    info!(
        total = summary.total,
        remaining = summary.remaining,
        "loaded {} ids",
        data_type
    );

    if data_type == DataType::UserTweets && !client.has_usable_account().await? {
        return Err(CollectError::NoAccounts);
    }

    for (idx, id) in remaining.into_iter().enumerate() {
        let processed = idx + 1;
        if processed % PROGRESS_EVERY == 0 {
            info!(processed, "{} ids processed so far", processed);
        }

        if data_type == DataType::UserTweets {
            match client.has_usable_account().await {
                Ok(true) => {}
                Ok(false) => {
                    error!(processed = idx, "all accounts are exhausted, stopping");
                    summary.exhausted = true;
                    break;
                }
                Err(e) => {
                    error!(id, "unable to check accounts: {}", e);
                    summary.failed += 1;
                    continue;
                }
            }
        }

        match fetch_one(client, data_type, id, &out_dir).await {
            Ok(Fetched::Saved) => summary.saved += 1,
            Ok(Fetched::NotFound) => summary.not_found += 1,
            Err(e) => {
                error!(id, "error fetching {}: {}", data_type, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        saved = summary.saved,
        not_found = summary.not_found,
        failed = summary.failed,
        exhausted = summary.exhausted,
        "finished fetching {}, files saved to {}",
        data_type,
        out_dir.display()
    );

    Ok(summary)
}

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("unable to write output: {0}")]
    Write(#[from] std::io::Error),
}

async fn fetch_one(
    client: &dyn ScrapeClient,
    data_type: DataType,
    id: u64,
    out_dir: &Path,
) -> Result<Fetched, FetchError> {
    let path = out_dir.join(data_type.artifact_file(id));
    let item = match data_type {
        DataType::Tweets => client.tweet_details(id).await?,
        DataType::UserInfos => client.user_by_id(id).await?,
        DataType::UserTweets => {
            let tweets = client.user_tweets_and_replies(id, TIMELINE_LIMIT).await?;
            if tweets.is_empty() {
                info!(id, "user has no tweets, writing an empty file");
            }
            Some(tweets.join("\n"))
        }
    };

    match item {
        Some(contents) => {
            write_atomic(&path, contents).await?;
            Ok(Fetched::Saved)
        }
        None => {
            warn!(id, "{} not found", data_type);
            Ok(Fetched::NotFound)
        }
    }
}
