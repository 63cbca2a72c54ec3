use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch number must be an integer, got {0:?}")]
    NotANumber(String),

    #[error("machine name {name:?} does not end in a batch number")]
    MachineName { name: String },
}

/// A numbered partition of accounts or ids, rendered zero-padded to three digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Batch(u32);

impl Batch {
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    /// Batch of a machine named `<prefix>-<batch>`, i.e. the text after the last hyphen.
    pub fn from_machine_name(name: &str) -> Result<Self, BatchError> {
        let suffix = name.rsplit('-').next().unwrap_or(name);
        suffix.parse().map_err(|_| BatchError::MachineName {
            name: name.to_owned(),
        })
    }

    /// Name of the machine that works on this batch.
    pub fn machine_name(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self)
    }
}

impl FromStr for Batch {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BatchError::NotANumber(s.to_owned()));
        }
        s.parse()
            .map(Self)
            .map_err(|_| BatchError::NotANumber(s.to_owned()))
    }
}

impl Display for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn machine_name_suffix() {
        let batch = Batch::from_machine_name("batch-data-collect-007").unwrap();
        assert_eq!(batch, Batch::new(7));
        assert_eq!(batch.to_string(), "007");
    }

    #[test]
    fn machine_name_round_trip() {
        let name = Batch::new(12).machine_name("collector");
        assert_eq!(name, "collector-012");
        assert_eq!(Batch::from_machine_name(&name).unwrap().to_string(), "012");
    }

    #[test]
    fn wide_batch_is_not_truncated() {
        assert_eq!(Batch::new(1234).to_string(), "1234");
    }

    #[test]
    fn command_line_batch_is_padded() {
        assert_eq!("7".parse::<Batch>().unwrap().to_string(), "007");
        assert_eq!("007".parse::<Batch>().unwrap().to_string(), "007");
    }

    #[test]
    fn rejects_non_digits() {
        assert!("-1".parse::<Batch>().is_err());
        assert!("seven".parse::<Batch>().is_err());
        assert!("".parse::<Batch>().is_err());
        assert!(Batch::from_machine_name("collector-abc").is_err());
        assert!(Batch::from_machine_name("collector-").is_err());
    }
}
