use std::path::Path;

use anyhow::{Context, Result};
use batch_fleet_common::{partial_path, Batch, BatchError};
use serde::{Deserialize, Serialize};

/// One row of the machine table
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "IP")]
    pub ip: String,
}

impl Machine {
    pub fn batch(&self) -> Result<Batch, BatchError> {
        Batch::from_machine_name(&self.name)
    }
}

pub fn read_machines(path: impl AsRef<Path>) -> Result<Vec<Machine>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Server details file '{}' not found", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<Machine>, _>>()
        .with_context(|| format!("Error loading server details from '{}'", path.display()))
}

pub fn write_machines(path: impl AsRef<Path>, machines: &[Machine]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = partial_path(path);
    let mut writer = csv::Writer::from_path(&tmp)?;
    if machines.is_empty() {
        writer.write_record(["Name", "IP"])?;
    }
    for machine in machines {
        writer.serialize(machine)?;
    }
    writer.flush()?;
    drop(writer);

    std::fs::rename(&tmp, path)
        .with_context(|| format!("Unable to write server details to '{}'", path.display()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output/hetzner_servers.csv");
        let machines = vec![
            Machine {
                name: "collector-001".to_owned(),
                ip: "203.0.113.1".to_owned(),
            },
            Machine {
                name: "collector-002".to_owned(),
                ip: "203.0.113.2".to_owned(),
            },
        ];
        write_machines(&path, &machines).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Name,IP\ncollector-001,203.0.113.1\n"));
        assert_eq!(read_machines(&path).unwrap(), machines);
        assert_eq!(machines[1].batch().unwrap().to_string(), "002");
    }

    #[test]
    fn missing_table() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_machines(dir.path().join("hetzner_servers.csv")).is_err());
    }
}
