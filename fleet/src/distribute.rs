//! File distributor: pushes scripts, credentials and per-batch ID lists to the fleet.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use batch_fleet_common::{accounts_file_name, Batch};
use clap::ValueEnum;
use tracing::{error, info, warn};

use crate::machines::Machine;
use crate::remote::{remote_join, Remote};

/// Kinds of files to push; `all` means every per-batch ID list
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Scripts,
    Accounts,
    User,
    Tweet,
    Keyword,
    All,
}

/// One `scp` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub machine: String,
    pub host: String,
    pub sources: Vec<PathBuf>,
    pub destination: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferSummary {
    pub succeeded: usize,
    pub failed: usize,
}

fn wants(categories: &[Category], category: Category) -> bool {
    categories.contains(&category)
        || (categories.contains(&Category::All)
            && matches!(category, Category::User | Category::Tweet | Category::Keyword))
}

/// Every regular file in `<source_path>/remote-bin/`, sorted
pub fn find_scripts(source_path: &Path) -> Result<Vec<PathBuf>> {
    let pattern = source_path.join("remote-bin").join("*");
    let pattern = pattern.to_string_lossy();
    let mut scripts = vec![];
    for entry in glob::glob(&pattern).context("Invalid script directory")? {
        let path = entry?;
        if path.is_file() {
            scripts.push(path);
        }
    }
    scripts.sort();
    Ok(scripts)
}

/// Work out every copy for `categories`, in order: scripts to every machine,
/// then credentials to every machine, then the ID lists machine by machine.
pub fn plan_transfers(
    machines: &[Machine],
    categories: &[Category],
    output_dir: &Path,
    destination: &str,
    scripts: &[PathBuf],
) -> Vec<Transfer> {
    let transfer = |machine: &Machine, sources: Vec<PathBuf>, destination: String| Transfer {
        machine: machine.name.clone(),
        host: machine.ip.clone(),
        sources,
        destination,
    };

    let batched: Vec<(&Machine, Batch)> = machines
        .iter()
        .filter_map(|m| match m.batch() {
            Ok(batch) => Some((m, batch)),
            Err(e) => {
                warn!(machine = %m.name, "skipping machine: {}", e);
                None
            }
        })
        .collect();

    let mut plan = vec![];

    if wants(categories, Category::Scripts) {
        if scripts.is_empty() {
            warn!("no scripts found in remote-bin");
        } else {
            for machine in machines {
                plan.push(transfer(machine, scripts.to_vec(), destination.to_owned()));
            }
        }
    }

    if wants(categories, Category::Accounts) {
        for &(machine, batch) in &batched {
            let file = output_dir
                .join("twitter_accounts")
                .join(accounts_file_name(batch));
            plan.push(transfer(machine, vec![file], destination.to_owned()));
        }
    }

    for &(machine, batch) in &batched {
        if wants(categories, Category::User) {
            let file = output_dir
                .join("user_batches")
                .join(format!("user_ids_{}.txt", batch));
            plan.push(transfer(machine, vec![file], destination.to_owned()));
        }
        if wants(categories, Category::Tweet) {
            let file = output_dir
                .join("tweet_batches")
                .join(format!("tweet_ids_{}.txt", batch));
            plan.push(transfer(machine, vec![file], destination.to_owned()));
        }
        if wants(categories, Category::Keyword) {
            let file = output_dir
                .join("keyword_batches")
                .join(format!("keyword_batch_{}.json", batch));
            plan.push(transfer(
                machine,
                vec![file],
                remote_join(destination, "keyword_batches/"),
            ));
        }
    }

    plan
}

/// Run every transfer; a failed copy is logged and the rest still run
pub async fn run_transfers(remote: &dyn Remote, plan: &[Transfer]) -> TransferSummary {
    let mut summary = TransferSummary::default();
    for t in plan {
        match remote.copy(&t.sources, &t.host, &t.destination).await {
            Ok(()) => {
                info!(machine = %t.machine, sources = ?t.sources, destination = %t.destination, "transferred");
                summary.succeeded += 1;
            }
            Err(e) => {
                error!(machine = %t.machine, sources = ?t.sources, "transfer failed: {}", e);
                summary.failed += 1;
            }
        }
    }
    summary
}

pub async fn transfer_files(
    remote: &dyn Remote,
    machines: &[Machine],
    categories: &[Category],
    source_path: &Path,
    destination: &str,
) -> Result<TransferSummary> {
    info!(?categories, "starting file transfer");
    let scripts = if wants(categories, Category::Scripts) {
        find_scripts(source_path)?
    } else {
        vec![]
    };

    let plan = plan_transfers(
        machines,
        categories,
        &source_path.join("output"),
        destination,
        &scripts,
    );
    let summary = run_transfers(remote, &plan).await;
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "file transfer finished"
    );
    Ok(summary)
}
