use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::Batch;

/// Login credentials and profile details of one social media account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub birthday: String,
    pub gender: String,
}

/// Credential file of one batch, `twitter_accounts_<batch>.json`
pub fn accounts_file_name(batch: Batch) -> String {
    format!("twitter_accounts_{}.json", batch)
}

/// Read a credential file, a JSON array of accounts
pub fn read_accounts(path: impl AsRef<Path>) -> Result<Vec<Account>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Unable to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write accounts as a JSON array indented by four spaces
pub fn write_accounts(path: impl AsRef<Path>, accounts: &[Account]) -> Result<()> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    accounts.serialize(&mut ser)?;
    std::fs::write(path, buf).with_context(|| format!("Unable to write {}", path.display()))
}
