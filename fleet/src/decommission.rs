use anyhow::{Context, Result};
use hetzner::{CloudProvider, Server};
use tracing::{error, info};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteSummary {
    pub candidates: usize,
    pub deleted: usize,
    pub failed: usize,
    pub aborted: bool,
}

/// Only a literal `yes` (any case, surrounding whitespace ignored) confirms
pub fn is_confirmed(answer: &str) -> bool {
    answer.trim().to_lowercase() == "yes"
}

/// Delete every server whose name starts with `prefix`.
///
/// `confirm` is shown the candidates and must return `true` before anything
/// is deleted. A failed deletion is logged and the remaining servers are
/// still deleted.
pub async fn delete_servers<F>(
    provider: &dyn CloudProvider,
    prefix: &str,
    confirm: F,
) -> Result<DeleteSummary>
where
    F: FnOnce(&[Server]) -> Result<bool>,
{
    let servers = provider
        .servers()
        .await
        .context("Error fetching server data")?;
    let candidates: Vec<Server> = servers
        .into_iter()
        .filter(|s| s.name.starts_with(prefix))
        .collect();

    let mut summary = DeleteSummary {
        candidates: candidates.len(),
        ..Default::default()
    };

    if candidates.is_empty() {
        info!(prefix, "no servers found with prefix");
        return Ok(summary);
    }

    if !confirm(&candidates)? {
        info!("server deletion aborted by user");
        summary.aborted = true;
        return Ok(summary);
    }

    for server in &candidates {
        match provider.delete_server(server.id).await {
            Ok(()) => {
                info!(server = %server.name, id = server.id, "deleted server");
                summary.deleted += 1;
            }
            Err(e) => {
                error!(server = %server.name, id = server.id, "failed to delete server: {}", e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
