use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use hetzner::ImageRef;
use home_dir::HomeDirExt;
use serde::de::Error;
use serde::{Deserialize, Deserializer};

/// Controller configuration, `config/config.json` by default.
///
/// Every subcommand only needs some of the keys, so most are optional here and
/// checked by the accessor that needs them.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub hetzner_api_token: Option<String>,
    #[serde(deserialize_with = "deserialize_option_path")]
    #[serde(default)]
    pub ssh_path: Option<PathBuf>,
    #[serde(default = "default_ssh_user")]
    pub ssh_user: String,
    #[serde(deserialize_with = "deserialize_path")]
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
    pub destination_path: Option<String>,
    pub twitter_accounts_file_id: Option<String>,
    pub server_type: Option<String>,
    pub image_id: Option<ImageRef>,
    pub ssh_key_name: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "deserialize_path")]
    #[serde(default = "default_machine_table")]
    pub machine_table: PathBuf,
    #[serde(default = "default_remote_command")]
    pub remote_command: String,
}

/// What every provisioned server is created from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTemplate {
    pub server_type: String,
    pub image: ImageRef,
    pub ssh_key: String,
    pub location: String,
}

impl Config {
    /// Read a JSON config file, or TOML if the file name ends in `.toml`
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conf_contents = std::fs::read_to_string(path)
            .with_context(|| format!("Configuration file '{}' not found", path.display()))?;
        let conf = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&conf_contents).map_err(anyhow::Error::from),
            _ => serde_json::from_str(&conf_contents).map_err(anyhow::Error::from),
        };
        conf.with_context(|| format!("Failed to parse the configuration file '{}'", path.display()))
    }

    pub fn api_token(&self) -> Result<&str> {
        require(&self.hetzner_api_token, "hetzner_api_token").map(String::as_str)
    }

    pub fn ssh_path(&self) -> Result<&Path> {
        require(&self.ssh_path, "ssh_path").map(PathBuf::as_path)
    }

    pub fn destination_path(&self) -> Result<&str> {
        require(&self.destination_path, "destination_path").map(String::as_str)
    }

    pub fn accounts_file_id(&self) -> Result<&str> {
        require(&self.twitter_accounts_file_id, "twitter_accounts_file_id").map(String::as_str)
    }

    /// Local directory holding generated batch files
    pub fn output_dir(&self) -> PathBuf {
        self.source_path.join("output")
    }

    pub fn server_template(&self) -> Result<ServerTemplate> {
        Ok(ServerTemplate {
            server_type: require(&self.server_type, "server_type")?.clone(),
            image: require(&self.image_id, "image_id")?.clone(),
            ssh_key: require(&self.ssh_key_name, "ssh_key_name")?.clone(),
            location: require(&self.location, "location")?.clone(),
        })
    }
}

fn require<'a, T>(value: &'a Option<T>, key: &str) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| anyhow!("Missing `{}` in config file", key))
}

fn default_ssh_user() -> String {
    "root".to_owned()
}

fn default_source_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_machine_table() -> PathBuf {
    PathBuf::from("output/hetzner_servers.csv")
}

fn default_remote_command() -> String {
    "./collect".to_owned()
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let s: PathBuf = Deserialize::deserialize(deserializer)?;
    s.expand_home().map_err(D::Error::custom)
}

fn deserialize_option_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<PathBuf> = Deserialize::deserialize(deserializer)?;
    s.map(|p| p.expand_home().map_err(D::Error::custom))
        .transpose()
}
