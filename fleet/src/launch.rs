use batch_fleet_common::{Batch, Script};
use tracing::{error, info, warn};

use crate::machines::Machine;
use crate::remote::Remote;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LaunchSummary {
    pub started: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Shell command starting `script` for `batch` in a detached `screen` session
/// named after the script. The session stays open after the script exits.
pub fn launch_command(script: Script, batch: Batch, destination: &str, remote_command: &str) -> String {
    format!(
        "screen -dmS {script} bash -c 'cd {destination} && {remote_command} {script} {batch}; exec bash'"
    )
}

/// Start `script` on every machine with the machine's own batch number.
///
/// Success only means `ssh` accepted the command.
pub async fn launch(
    remote: &dyn Remote,
    machines: &[Machine],
    script: Script,
    destination: &str,
    remote_command: &str,
) -> LaunchSummary {
    let mut summary = LaunchSummary::default();

    for machine in machines {
        let batch = match machine.batch() {
            Ok(batch) => batch,
            Err(e) => {
                warn!(machine = %machine.name, "skipping machine: {}", e);
                summary.skipped += 1;
                continue;
            }
        };

        info!(machine = %machine.name, ip = %machine.ip, %batch, %script, "starting script");
        let command = launch_command(script, batch, destination, remote_command);
        match remote.exec(&machine.ip, &command).await {
            Ok(()) => {
                info!(machine = %machine.name, %command, "executed command");
                summary.started += 1;
            }
            Err(e) => {
                error!(machine = %machine.name, ip = %machine.ip, "failed to execute command: {}", e);
                summary.failed += 1;
            }
        }
    }

    summary
}
