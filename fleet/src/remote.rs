use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use batch_fleet_common::PARTIAL_SUFFIX;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("unable to run {program}: {source}")]
    Spawn {
        program: &'static str,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed {
        program: &'static str,
        status: String,
    },

    #[error("ssh key path {} must not contain a single quote", .0.display())]
    KeyPath(PathBuf),
}

/// Moving files to and from fleet machines and running commands on them
#[async_trait]
pub trait Remote: Send + Sync {
    /// Copy local `sources` into `destination` on `host`
    async fn copy(&self, sources: &[PathBuf], host: &str, destination: &str) -> Result<(), RemoteError>;

    /// Run a shell command on `host`
    async fn exec(&self, host: &str, command: &str) -> Result<(), RemoteError>;

    /// Mirror `source` on `host` into the local `destination`, recursively,
    /// leaving unrelated local files alone
    async fn sync(&self, host: &str, source: &str, destination: &Path) -> Result<(), RemoteError>;
}

/// [`Remote`] over `ssh`, `scp` and `rsync` authenticated with a private key
#[derive(Debug, Clone)]
pub struct SshRemote {
    key: PathBuf,
    user: String,
}

impl SshRemote {
    /// The key path ends up quoted inside rsync's `-e` command, so it may
    /// not contain `'`
    pub fn new(key: impl AsRef<Path>, user: &str) -> Result<Self, RemoteError> {
        let key = key.as_ref();
        if key.to_string_lossy().contains('\'') {
            return Err(RemoteError::KeyPath(key.to_owned()));
        }
        Ok(Self {
            key: key.to_owned(),
            user: user.to_owned(),
        })
    }

    fn target(&self, host: &str) -> String {
        format!("{}@{}", self.user, host)
    }

    fn key_args(&self) -> Vec<OsString> {
        vec![
            "-i".into(),
            self.key.as_os_str().to_owned(),
            "-o".into(),
            "StrictHostKeyChecking=accept-new".into(),
        ]
    }

    fn scp_args(&self, sources: &[PathBuf], host: &str, destination: &str) -> Vec<OsString> {
        let mut args = self.key_args();
        args.extend(sources.iter().map(|s| s.as_os_str().to_owned()));
        args.push(format!("{}:{}", self.target(host), destination).into());
        args
    }

    fn ssh_args(&self, host: &str, command: &str) -> Vec<OsString> {
        let mut args = self.key_args();
        args.push(self.target(host).into());
        args.push(command.into());
        args
    }

    fn rsync_args(&self, host: &str, source: &str, destination: &Path) -> Vec<OsString> {
        vec![
            "-avz".into(),
            format!("--exclude=*{}", PARTIAL_SUFFIX).into(),
            "-e".into(),
            format!(
                "ssh -i '{}' -o StrictHostKeyChecking=accept-new",
                self.key.display()
            )
            .into(),
            format!("{}:{}", self.target(host), source).into(),
            destination.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl Remote for SshRemote {
    async fn copy(&self, sources: &[PathBuf], host: &str, destination: &str) -> Result<(), RemoteError> {
        run("scp", self.scp_args(sources, host, destination)).await
    }

    async fn exec(&self, host: &str, command: &str) -> Result<(), RemoteError> {
        run("ssh", self.ssh_args(host, command)).await
    }

    async fn sync(&self, host: &str, source: &str, destination: &Path) -> Result<(), RemoteError> {
        run("rsync", self.rsync_args(host, source, destination)).await
    }
}

async fn run(program: &'static str, args: Vec<OsString>) -> Result<(), RemoteError> {
    debug!(program, ?args, "spawn");
    let status = Command::new(program)
        .args(&args)
        .status()
        .await
        .map_err(|source| RemoteError::Spawn { program, source })?;

    if status.success() {
        Ok(())
    } else {
        Err(RemoteError::Failed {
            program,
            status: status.to_string(),
        })
    }
}

/// Join a relative path onto a remote base directory with exactly one `/`
pub fn remote_join(base: &str, path: &str) -> String {
    if base.is_empty() {
        path.to_owned()
    } else if base.ends_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
