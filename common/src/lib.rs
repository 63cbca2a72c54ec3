use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;
use futures::stream::StreamExt;
use reqwest::{Client, IntoUrl};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

mod account;
mod batch;
mod data_type;
pub mod logging;
mod script;

pub use account::{accounts_file_name, read_accounts, write_accounts, Account};
pub use batch::{Batch, BatchError};
pub use data_type::{DataType, DataTypeError};
pub use script::{Script, ScriptError};

/// Suffix of in-progress files. Readers treat anything ending in it as absent.
pub const PARTIAL_SUFFIX: &str = ".tmp";

/// Path a file is staged at before being renamed into place
pub fn partial_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut name = path
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(OsString::new);
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Write `contents` next to `path` and rename it into place once fully written.
pub async fn write_atomic(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> std::io::Result<()> {
    let path = path.as_ref();
    let tmp = partial_path(path);
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(contents.as_ref()).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&tmp, path).await
}

pub async fn streamed_download(
    client: &Client,
    url: impl IntoUrl,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let tmp = partial_path(path);
    debug!(url = url.as_str(), path = %path.display(), "download");
    let resp = client.get(url.as_str()).send().await?.error_for_status()?;
    let mut file = fs::File::create(&tmp).await?;
    let mut stream = resp.bytes_stream();
    while let Some(b) = stream.next().await {
        let chunk = b?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);
    fs::rename(&tmp, path).await?;

    Ok(())
}
