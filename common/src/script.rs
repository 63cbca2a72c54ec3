use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

use crate::{Batch, DataType};

#[derive(Error, Debug)]
#[error("unknown script {0:?}")]
pub struct ScriptError(String);

/// A collection program run on every machine of the fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Login,
    GetTweetInfo,
    GetUserInfo,
    GetUserTweets,
}

impl Script {
    pub const NAMES: [&'static str; 4] = ["login", "get_tweet_info", "get_user_info", "get_user_tweets"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::GetTweetInfo => "get_tweet_info",
            Self::GetUserInfo => "get_user_info",
            Self::GetUserTweets => "get_user_tweets",
        }
    }

    /// Kind of artifact the script writes, `None` for login
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Login => None,
            Self::GetTweetInfo => Some(DataType::Tweets),
            Self::GetUserInfo => Some(DataType::UserInfos),
            Self::GetUserTweets => Some(DataType::UserTweets),
        }
    }

    pub fn log_file(&self, batch: Batch) -> String {
        match self.data_type() {
            Some(data_type) => data_type.log_file(batch),
            None => format!("login_{}.log", batch),
        }
    }
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "get_tweet_info" => Ok(Self::GetTweetInfo),
            "get_user_info" => Ok(Self::GetUserInfo),
            "get_user_tweets" => Ok(Self::GetUserTweets),
            _ => Err(ScriptError(s.to_owned())),
        }
    }
}

impl Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
