//! In-memory cloud and remote doubles for tests

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use hetzner::{CloudProvider, CreateServer, HetznerError, Ipv4, PublicNet, Server};

use crate::machines::Machine;
use crate::remote::{Remote, RemoteError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Copy {
        host: String,
        sources: Vec<PathBuf>,
        destination: String,
    },
    Exec {
        host: String,
        command: String,
    },
    Sync {
        host: String,
        source: String,
        destination: PathBuf,
    },
}

/// Records every call; calls for hosts in `failing` return an error
#[derive(Default)]
pub(crate) struct FakeRemote {
    pub failing: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRemote {
    pub fn failing(hosts: &[&str]) -> Self {
        Self {
            failing: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, host: &str, call: Call) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(host) {
            return Err(RemoteError::Failed {
                program: "fake",
                status: "exit status: 1".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Remote for FakeRemote {
    async fn copy(&self, sources: &[PathBuf], host: &str, destination: &str) -> Result<(), RemoteError> {
        self.record(
            host,
            Call::Copy {
                host: host.to_owned(),
                sources: sources.to_vec(),
                destination: destination.to_owned(),
            },
        )
    }

    async fn exec(&self, host: &str, command: &str) -> Result<(), RemoteError> {
        self.record(
            host,
            Call::Exec {
                host: host.to_owned(),
                command: command.to_owned(),
            },
        )
    }

    async fn sync(&self, host: &str, source: &str, destination: &Path) -> Result<(), RemoteError> {
        self.record(
            host,
            Call::Sync {
                host: host.to_owned(),
                source: source.to_owned(),
                destination: destination.to_owned(),
            },
        )
    }
}

pub(crate) fn machines(names: &[&str]) -> Vec<Machine> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Machine {
            name: name.to_string(),
            ip: format!("203.0.113.{}", i + 1),
        })
        .collect()
}

pub(crate) fn server(id: u64, name: &str) -> Server {
    Server {
        id,
        name: name.to_owned(),
        status: "running".to_owned(),
        public_net: PublicNet {
            ipv4: Some(Ipv4 {
                ip: format!("198.51.100.{}", id),
            }),
        },
    }
}

/// Cloud project holding `servers`; creating or deleting a name in
/// `failing` returns an error
#[derive(Default)]
pub(crate) struct FakeCloud {
    pub failing: HashSet<String>,
    pub servers: Mutex<Vec<Server>>,
    pub created: Mutex<Vec<CreateServer>>,
    pub deleted: Mutex<Vec<u64>>,
}

impl FakeCloud {
    pub fn with_servers(servers: Vec<Server>) -> Self {
        Self {
            servers: Mutex::new(servers),
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<CreateServer> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().unwrap().clone()
    }

    fn error() -> HetznerError {
        HetznerError::Api {
            status: 422,
            code: "resource_limit_exceeded".to_owned(),
            message: "server limit reached".to_owned(),
        }
    }
}

#[async_trait]
impl CloudProvider for FakeCloud {
    async fn create_server(&self, request: &CreateServer) -> Result<Server, HetznerError> {
        self.created.lock().unwrap().push(request.clone());
        if self.failing.contains(&request.name) {
            return Err(Self::error());
        }
        let mut servers = self.servers.lock().unwrap();
        let created = server(servers.len() as u64 + 1, &request.name);
        servers.push(created.clone());
        Ok(created)
    }

    async fn servers(&self) -> Result<Vec<Server>, HetznerError> {
        Ok(self.servers.lock().unwrap().clone())
    }

    async fn delete_server(&self, id: u64) -> Result<(), HetznerError> {
        self.deleted.lock().unwrap().push(id);
        let mut servers = self.servers.lock().unwrap();
        let failing = servers
            .iter()
            .any(|s| s.id == id && self.failing.contains(&s.name));
        if failing {
            return Err(Self::error());
        }
        servers.retain(|s| s.id != id);
        Ok(())
    }
}
