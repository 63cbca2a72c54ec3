//! Credential splitter: one account spreadsheet in, one credential file per batch out.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use batch_fleet_common::{accounts_file_name, streamed_download, write_accounts, Account, Batch};
use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;

static COLUMNS: [&str; 6] = ["name", "username", "email", "password", "birthday", "gender"];

/// Sizes of `files` contiguous slices of `accounts` items: every slice holds
/// `ceil(accounts / files)` or one fewer, the larger slices first.
pub fn partition_sizes(accounts: usize, files: usize) -> Vec<usize> {
    if files == 0 {
        return vec![];
    }
    let base = accounts / files;
    let extra = accounts % files;
    (0..files).map(|i| base + usize::from(i < extra)).collect()
}

/// Split `accounts` into `files` contiguous batches, see [`partition_sizes`].
pub fn split_accounts(accounts: &[Account], files: usize) -> Vec<&[Account]> {
    let mut start = 0;
    partition_sizes(accounts.len(), files)
        .into_iter()
        .map(|size| {
            let slice = &accounts[start..start + size];
            start += size;
            slice
        })
        .collect()
}

/// Build accounts from spreadsheet rows, the first row being the header.
///
/// Fails if any expected column is missing. Takes at most `limit` rows.
pub fn accounts_from_rows<'a>(
    mut rows: impl Iterator<Item = &'a [Data]>,
    limit: usize,
) -> Result<Vec<Account>> {
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| anyhow!("Spreadsheet is empty"))?
        .iter()
        .map(|c| cell_string(c).trim().to_owned())
        .collect();

    let mut idx = [0; COLUMNS.len()];
    for (i, column) in COLUMNS.iter().enumerate() {
        idx[i] = header
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| anyhow!("Missing expected column in the spreadsheet: '{}'", column))?;
    }

    let accounts = rows
        .take(limit)
        .map(|row| {
            let cell = |i: usize| row.get(idx[i]).map(cell_string).unwrap_or_default();
            Account {
                name: cell(0),
                username: cell(1).trim_start_matches('@').to_owned(),
                email: cell(2),
                password: cell(3),
                birthday: cell(4),
                gender: cell(5),
            }
        })
        .collect();

    Ok(accounts)
}

fn cell_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

pub fn read_spreadsheet(path: impl AsRef<Path>, limit: usize) -> Result<Vec<Account>> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Error reading spreadsheet '{}'", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Spreadsheet '{}' has no worksheets", path.display()))?
        .with_context(|| format!("Error reading spreadsheet '{}'", path.display()))?;
    accounts_from_rows(range.rows(), limit)
}

/// Write one credential file per batch into `dir`, numbered from 001
pub fn write_batches(dir: impl AsRef<Path>, batches: &[&[Account]]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Unable to create '{}'", dir.display()))?;

    let mut written = vec![];
    for (i, accounts) in batches.iter().enumerate() {
        let path = dir.join(accounts_file_name(Batch::new(i as u32 + 1)));
        write_accounts(&path, accounts)?;
        info!(file = %path.display(), accounts = accounts.len(), "created credential file");
        written.push(path);
    }
    Ok(written)
}

fn download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={}", file_id)
}

/// Download the account spreadsheet and split its first `num_accounts` rows
/// into `num_files` credential files under `output/twitter_accounts`.
pub async fn split(config: &Config, num_accounts: usize, num_files: usize) -> Result<()> {
    if num_files == 0 {
        bail!("<num_files> must be at least 1");
    }
    let file_id = config.accounts_file_id()?;

    let output = config.output_dir();
    tokio::fs::create_dir_all(&output).await?;
    let sheet = output.join("twitter_accounts.xlsx");
    streamed_download(&Client::new(), download_url(file_id), &sheet)
        .await
        .context("Failed to download the account spreadsheet")?;
    info!(file = %sheet.display(), "downloaded account spreadsheet");

    let accounts = read_spreadsheet(&sheet, num_accounts)?;
    info!(accounts = accounts.len(), "extracted accounts");
    if accounts.is_empty() {
        warn!("no accounts found in the spreadsheet");
        return Ok(());
    }

    let batches = split_accounts(&accounts, num_files);
    write_batches(output.join("twitter_accounts"), &batches)?;
    Ok(())
}
