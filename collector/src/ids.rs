use std::collections::HashSet;
use std::path::Path;

use batch_fleet_common::PARTIAL_SUFFIX;
use itertools::Itertools;
use tracing::{info, warn};

use crate::error::CollectError;

/// Read a newline separated list of numeric ids. Blank lines are skipped.
pub fn load_ids(path: impl AsRef<Path>) -> Result<Vec<u64>, CollectError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| CollectError::ReadIds {
        path: path.to_owned(),
        source,
    })?;

    contents
        .lines()
        .enumerate()
        .map(|(i, l)| (i, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .map(|(i, l)| {
            l.parse::<u64>().map_err(|_| CollectError::InvalidId {
                path: path.to_owned(),
                line: i + 1,
                value: l.to_owned(),
            })
        })
        .collect()
}

/// Ids that already have an output file `<id>.<extension>` in `dir`
pub fn collected_ids(dir: impl AsRef<Path>, extension: &str) -> Result<HashSet<u64>, CollectError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|source| CollectError::OutputDir {
        path: dir.to_owned(),
        source,
    })?;

    let suffix = format!(".{}", extension);
    let mut collected = HashSet::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(stem) = name.strip_suffix(&suffix) else {
            continue;
        };
        match stem.parse::<u64>() {
            Ok(id) => {
                collected.insert(id);
            }
            Err(_) => warn!(file = name, dir = %dir.display(), "invalid file name in output directory"),
        }
    }

    Ok(collected)
}

/// Delete files left half written in `dir` by an interrupted run
pub fn remove_partial_files(dir: impl AsRef<Path>) -> Result<usize, CollectError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|source| CollectError::OutputDir {
        path: dir.to_owned(),
        source,
    })?;

    let mut removed = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let partial = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(PARTIAL_SUFFIX));
        if !partial || !path.is_file() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(file = %path.display(), "removed partial file");
                removed += 1;
            }
            Err(e) => warn!(file = %path.display(), "unable to remove partial file: {}", e),
        }
    }

    Ok(removed)
}

/// Ids still to fetch, in list order, each at most once
pub fn remaining_ids(ids: &[u64], collected: &HashSet<u64>) -> Vec<u64> {
    ids.iter()
        .filter(|id| !collected.contains(*id))
        .unique()
        .copied()
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn skips_collected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20.json"), "{}").unwrap();

        let collected = collected_ids(dir.path(), "json").unwrap();
        assert_eq!(remaining_ids(&[10, 20, 30], &collected), vec![10, 30]);
    }

    #[test]
    fn ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["1.json", "2.jsonl", "3.json.tmp", "notes.json", "4.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let json = collected_ids(dir.path(), "json").unwrap();
        assert_eq!(json, HashSet::from([1]));
        let jsonl = collected_ids(dir.path(), "jsonl").unwrap();
        assert_eq!(jsonl, HashSet::from([2]));
    }

    #[test]
    fn partial_files_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["1.json", "2.json.tmp", "3.jsonl.tmp"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        assert_eq!(remove_partial_files(dir.path()).unwrap(), 2);
        assert!(dir.path().join("1.json").exists());
        assert!(!dir.path().join("2.json.tmp").exists());
        assert!(!dir.path().join("3.jsonl.tmp").exists());
        assert_eq!(remove_partial_files(dir.path()).unwrap(), 0);
    }

    #[test]
    fn duplicates_fetched_once() {
        assert_eq!(remaining_ids(&[5, 6, 5, 7, 6], &HashSet::new()), vec![5, 6, 7]);
    }

    #[test]
    fn id_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweet_ids_001.txt");
        std::fs::write(&path, "10\n 20 \n\n30\n").unwrap();
        assert_eq!(load_ids(&path).unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn bad_id_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_ids_001.txt");
        std::fs::write(&path, "10\nabc\n").unwrap();
        assert!(matches!(
            load_ids(&path),
            Err(CollectError::InvalidId { line: 2, .. })
        ));
        assert!(matches!(
            load_ids(dir.path().join("missing.txt")),
            Err(CollectError::ReadIds { .. })
        ));
    }
}
