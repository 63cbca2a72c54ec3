//! Data collector: mirrors every machine's output and log back to the controller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use batch_fleet_common::DataType;
use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::machines::Machine;
use crate::remote::{remote_join, Remote};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GatherSummary {
    pub synced: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// `<base>/data/<YYMMDD>_<desc>`
pub fn gather_folder(base: &Path, date: NaiveDate, desc: &str) -> PathBuf {
    base.join("data")
        .join(format!("{}_{}", date.format("%y%m%d"), desc))
}

/// Create the local folder and its `logs` subfolder
pub fn create_gather_folder(folder: &Path) -> Result<()> {
    let logs = folder.join("logs");
    std::fs::create_dir_all(&logs)
        .with_context(|| format!("Unable to create '{}'", logs.display()))?;
    info!(folder = %folder.display(), "created local data folder");
    Ok(())
}

/// Sync `data_type` from every machine into `folder`.
///
/// The data directory and the log file are synced independently, and a
/// failure on one machine does not stop the others.
pub async fn gather(
    remote: &dyn Remote,
    machines: &[Machine],
    data_type: DataType,
    destination: &str,
    folder: &Path,
) -> Result<GatherSummary> {
    let data_dir = folder.join(data_type.as_str());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Unable to create '{}'", data_dir.display()))?;
    let logs_dir = folder.join("logs");

    let mut summary = GatherSummary::default();
    let remote_data = format!("{}/", remote_join(destination, data_type.as_str()));

    for machine in machines {
        let batch = match machine.batch() {
            Ok(batch) => batch,
            Err(e) => {
                warn!(machine = %machine.name, "skipping machine: {}", e);
                summary.skipped += 1;
                continue;
            }
        };

        info!(machine = %machine.name, ip = %machine.ip, %batch, "syncing {} data", data_type);
        let mut ok = true;
        if let Err(e) = remote.sync(&machine.ip, &remote_data, &data_dir).await {
            error!(machine = %machine.name, ip = %machine.ip, "error syncing data: {}", e);
            ok = false;
        }

        let remote_log = remote_join(destination, &format!("logs/{}", data_type.log_file(batch)));
        info!(machine = %machine.name, "syncing {} log file", data_type);
        if let Err(e) = remote.sync(&machine.ip, &remote_log, &logs_dir).await {
            error!(machine = %machine.name, ip = %machine.ip, "error syncing log file: {}", e);
            ok = false;
        }

        if ok {
            summary.synced += 1;
        } else {
            summary.failed += 1;
        }
    }

    info!(folder = %folder.display(), "data gathering completed");
    Ok(summary)
}
