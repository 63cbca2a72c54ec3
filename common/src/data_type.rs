use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

use crate::Batch;

#[derive(Error, Debug)]
#[error("unknown data type {0:?}, expected tweets, user_infos or user_tweets")]
pub struct DataTypeError(String);

/// Kind of item a collection script produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Tweets,
    UserInfos,
    UserTweets,
}

impl DataType {
    pub const NAMES: [&'static str; 3] = ["tweets", "user_infos", "user_tweets"];

    /// Output directory name, on the remote machine and in gathered data.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tweets => "tweets",
            Self::UserInfos => "user_infos",
            Self::UserTweets => "user_tweets",
        }
    }

    /// Extension of one output artifact, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Tweets | Self::UserInfos => "json",
            Self::UserTweets => "jsonl",
        }
    }

    pub fn id_list_file(&self, batch: Batch) -> String {
        match self {
            Self::Tweets => format!("tweet_ids_{}.txt", batch),
            Self::UserInfos | Self::UserTweets => format!("user_ids_{}.txt", batch),
        }
    }

    pub fn log_file(&self, batch: Batch) -> String {
        format!("{}_{}.log", self.as_str(), batch)
    }

    pub fn artifact_file(&self, id: u64) -> String {
        format!("{}.{}", id, self.extension())
    }
}

impl FromStr for DataType {
    type Err = DataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tweets" => Ok(Self::Tweets),
            "user_infos" => Ok(Self::UserInfos),
            "user_tweets" => Ok(Self::UserTweets),
            _ => Err(DataTypeError(s.to_owned())),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
