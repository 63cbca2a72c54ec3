use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use batch_fleet_common::Batch;
use hetzner::{CloudProvider, CreateServer, Server};
use tracing::{error, info, warn};

use crate::config::ServerTemplate;
use crate::machines::{write_machines, Machine};

pub fn create_request(template: &ServerTemplate, prefix: &str, batch: Batch) -> CreateServer {
    CreateServer {
        name: batch.machine_name(prefix),
        server_type: template.server_type.clone(),
        image: template.image.clone(),
        ssh_keys: vec![template.ssh_key.clone()],
        location: template.location.clone(),
        labels: BTreeMap::from([
            ("role".to_owned(), "data-collection".to_owned()),
            ("batch".to_owned(), format!("batch-{}", batch)),
        ]),
    }
}

/// Create servers `<prefix>-001` to `<prefix>-<count>`. A failed creation is
/// logged and skipped. Returns the names of the servers that were created.
pub async fn create_servers(
    provider: &dyn CloudProvider,
    template: &ServerTemplate,
    count: u32,
    prefix: &str,
) -> Vec<String> {
    let mut created = vec![];

    for i in 1..=count {
        let request = create_request(template, prefix, Batch::new(i));
        match provider.create_server(&request).await {
            Ok(server) => {
                info!(server = %server.name, status = %server.status, "created server");
                created.push(server.name);
            }
            Err(e) => error!(server = %request.name, "error creating server: {}", e),
        }
    }

    created
}

/// Servers whose name starts with `prefix`, with their first public IPv4 address
pub fn machines_with_prefix(servers: &[Server], prefix: &str) -> Vec<Machine> {
    servers
        .iter()
        .filter(|s| s.name.starts_with(prefix))
        .filter_map(|s| match s.ipv4() {
            Some(ip) => Some(Machine {
                name: s.name.clone(),
                ip: ip.to_owned(),
            }),
            None => {
                warn!(server = %s.name, "server has no public ipv4 address, leaving it out");
                None
            }
        })
        .collect()
}

/// Create the fleet and record its machine table at `table`.
///
/// The table is only written if at least one server was created.
pub async fn provision(
    provider: &dyn CloudProvider,
    template: &ServerTemplate,
    count: u32,
    prefix: &str,
    table: impl AsRef<Path>,
) -> Result<Vec<Machine>> {
    let created = create_servers(provider, template, count, prefix).await;
    if created.is_empty() {
        warn!("no servers were created");
        return Ok(vec![]);
    }
    info!(created = created.len(), requested = count, "server creation finished");

    let servers = provider
        .servers()
        .await
        .context("Error fetching server data")?;
    let machines = machines_with_prefix(&servers, prefix);
    write_machines(&table, &machines)?;
    info!(file = %table.as_ref().display(), machines = machines.len(), "server details saved");

    Ok(machines)
}
