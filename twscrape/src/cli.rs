use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::client::{AccountInfo, NewAccount, ScrapeClient};
use crate::error::ScrapeError;

static ACCOUNT_LINE_FORMAT: &str = "username:password:email:email_password";

/// [`ScrapeClient`] driving the `twscrape` command line, one process per call.
///
/// Accounts live in the sqlite database at `db`, which is shared by every
/// invocation on the machine.
#[derive(Debug, Clone)]
pub struct TwscrapeCli {
    program: PathBuf,
    db: PathBuf,
}

impl TwscrapeCli {
    pub fn new(db: impl AsRef<Path>) -> Self {
        Self {
            program: PathBuf::from("twscrape"),
            db: db.as_ref().to_owned(),
        }
    }

    pub fn with_program(mut self, program: impl AsRef<Path>) -> Self {
        self.program = program.as_ref().to_owned();
        self
    }

    fn command_args(&self, args: &[OsString]) -> Vec<OsString> {
        let mut all = vec![OsString::from("--db"), self.db.as_os_str().to_owned()];
        all.extend_from_slice(args);
        all
    }

    async fn run(&self, args: &[OsString]) -> Result<String, ScrapeError> {
        let command = args
            .first()
            .map(|a| a.to_string_lossy().into_owned())
            .unwrap_or_default();
        trace!(%command, "spawn twscrape");

        let output = Command::new(&self.program)
            .args(self.command_args(args))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ScrapeError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|c| format!("code {}", c))
                .unwrap_or_else(|| "signal".to_owned());
            debug!(%command, %status, "twscrape failed");
            return Err(ScrapeError::Command {
                command,
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ScrapeError::InvalidOutput {
            command,
            msg: "stdout is not utf-8".to_owned(),
        })
    }
}

#[async_trait]
impl ScrapeClient for TwscrapeCli {
    async fn add_account(&self, account: &NewAccount) -> Result<(), ScrapeError> {
        let line = account_line(account)?;
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "{}", line)?;
        file.flush()?;

        self.run(&[
            "add_accounts".into(),
            file.path().as_os_str().to_owned(),
            ACCOUNT_LINE_FORMAT.into(),
        ])
        .await?;
        Ok(())
    }

    async fn login_all(&self) -> Result<(), ScrapeError> {
        self.run(&["login_accounts".into()]).await?;
        Ok(())
    }

    async fn accounts_info(&self) -> Result<Vec<AccountInfo>, ScrapeError> {
        let out = self.run(&["accounts".into()]).await?;
        parse_accounts_table(&out).ok_or_else(|| ScrapeError::InvalidOutput {
            command: "accounts".to_owned(),
            msg: "missing username column".to_owned(),
        })
    }

    async fn tweet_details(&self, tweet_id: u64) -> Result<Option<String>, ScrapeError> {
        let out = self
            .run(&["tweet_details".into(), tweet_id.to_string().into()])
            .await?;
        Ok(json_items("tweet_details", &out)?.into_iter().next())
    }

    async fn user_by_id(&self, user_id: u64) -> Result<Option<String>, ScrapeError> {
        let out = self
            .run(&["user_by_id".into(), user_id.to_string().into()])
            .await?;
        Ok(json_items("user_by_id", &out)?.into_iter().next())
    }

    async fn user_tweets_and_replies(
        &self,
        user_id: u64,
        limit: usize,
    ) -> Result<Vec<String>, ScrapeError> {
        let out = self
            .run(&[
                "user_tweets_and_replies".into(),
                user_id.to_string().into(),
                format!("--limit={}", limit).into(),
            ])
            .await?;
        json_items("user_tweets_and_replies", &out)
    }
}

fn account_line(account: &NewAccount) -> Result<String, ScrapeError> {
    let fields = [
        &account.username,
        &account.password,
        &account.email,
        &account.email_password,
    ];
    if fields.iter().any(|f| f.contains(':') || f.contains('\n')) {
        return Err(ScrapeError::InvalidAccount {
            username: account.username.clone(),
            msg: "fields must not contain ':' or newlines".to_owned(),
        });
    }
    Ok(fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(":"))
}

/// twscrape prints this instead of JSON when the item does not exist
static NOT_FOUND_PREFIX: &str = "Not Found";

/// JSON items printed by a fetch command, empty if the item does not exist
fn json_items(command: &str, out: &str) -> Result<Vec<String>, ScrapeError> {
    let mut lines = out.lines().map(str::trim).filter(|l| !l.is_empty());
    if let (Some(only), None) = (lines.next(), lines.next()) {
        if only.starts_with(NOT_FOUND_PREFIX) {
            return Ok(vec![]);
        }
    }
    json_lines(command, out)
}

/// Non-empty stdout lines, each required to be a JSON value
fn json_lines(command: &str, out: &str) -> Result<Vec<String>, ScrapeError> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| match serde_json::from_str::<serde_json::Value>(l) {
            Ok(_) => Ok(l.to_owned()),
            Err(e) => Err(ScrapeError::InvalidOutput {
                command: command.to_owned(),
                msg: e.to_string(),
            }),
        })
        .collect()
}

/// Parse the fixed width table printed by `twscrape accounts`.
///
/// Columns are located by their offset in the header line. Returns `None` if
/// there is no username column; an empty pool prints nothing and yields an
/// empty list.
pub(crate) fn parse_accounts_table(out: &str) -> Option<Vec<AccountInfo>> {
    let mut lines = out
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter(|l| !l.trim().chars().all(|c| c == '─' || c == '-'));

    let header: Vec<char> = match lines.next() {
        Some(h) => h.chars().collect(),
        None => return Some(vec![]),
    };
    let header_str: String = header.iter().collect();

    let mut columns: Vec<(usize, String)> = header_str
        .split_whitespace()
        .filter_map(|name| {
            let byte_pos = header_str.find(name)?;
            Some((header_str[..byte_pos].chars().count(), name.to_owned()))
        })
        .collect();
    columns.sort();
    if !columns.iter().any(|(_, n)| n == "username") {
        return None;
    }

    let accounts = lines
        .map(|line| {
            let chars: Vec<char> = line.chars().collect();
            let cell = |name: &str| -> Option<String> {
                let idx = columns.iter().position(|(_, n)| n == name)?;
                let start = columns[idx].0.min(chars.len());
                let end = columns
                    .get(idx + 1)
                    .map(|(p, _)| *p)
                    .unwrap_or(chars.len())
                    .min(chars.len());
                let value: String = chars[start..end].iter().collect();
                let value = value.trim();
                (!value.is_empty() && value != "None").then(|| value.to_owned())
            };

            AccountInfo {
                username: cell("username").unwrap_or_default(),
                logged_in: cell("logged_in").map(|v| truthy(&v)).unwrap_or(false),
                active: cell("active").map(|v| truthy(&v)).unwrap_or(false),
                last_used: cell("last_used"),
                total_req: cell("total_req").and_then(|v| v.replace(',', "").parse().ok()),
                error_msg: cell("error_msg"),
            }
        })
        .filter(|a| !a.username.is_empty())
        .collect();

    Some(accounts)
}

fn truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accounts_table() {
        let out = "\
username  logged_in active last_used           total_req error_msg
alice     True      True   2025-03-01 10:00:00 1,204
bob       False     False                      0         Login failed: bad password
";
        let accounts = parse_accounts_table(out).unwrap();
        assert_eq!(accounts.len(), 2);

        assert_eq!(accounts[0].username, "alice");
        assert!(accounts[0].usable());
        assert_eq!(accounts[0].last_used.as_deref(), Some("2025-03-01 10:00:00"));
        assert_eq!(accounts[0].total_req, Some(1204));
        assert_eq!(accounts[0].error_msg, None);

        assert_eq!(accounts[1].username, "bob");
        assert!(!accounts[1].usable());
        assert_eq!(accounts[1].last_used, None);
        assert_eq!(
            accounts[1].error_msg.as_deref(),
            Some("Login failed: bad password")
        );
    }

    #[test]
    fn empty_pool() {
        assert!(parse_accounts_table("").unwrap().is_empty());
        assert!(parse_accounts_table("\n\n").unwrap().is_empty());
    }

    #[test]
    fn table_without_usernames() {
        assert!(parse_accounts_table("No accounts found\n").is_none());
    }

    #[test]
    fn account_line_format() {
        let account = NewAccount {
            username: "alice".to_owned(),
            password: "hunter2".to_owned(),
            email: "alice@example.com".to_owned(),
            email_password: "hunter2".to_owned(),
        };
        assert_eq!(
            account_line(&account).unwrap(),
            "alice:hunter2:alice@example.com:hunter2"
        );

        let bad = NewAccount {
            password: "a:b".to_owned(),
            ..account
        };
        assert!(matches!(
            account_line(&bad),
            Err(ScrapeError::InvalidAccount { .. })
        ));
    }

    #[test]
    fn json_output_lines() {
        let lines = json_lines("user_tweets_and_replies", "{\"id\":1}\n\n{\"id\":2}\n").unwrap();
        assert_eq!(lines, vec!["{\"id\":1}", "{\"id\":2}"]);
        assert!(json_lines("tweet_details", "").unwrap().is_empty());
        assert!(json_lines("tweet_details", "not json").is_err());
    }

    #[test]
    fn not_found_is_no_item() {
        let out = "Not Found. See --raw for more details.\n";
        assert!(json_items("tweet_details", out).unwrap().is_empty());
        assert!(json_items("user_by_id", out).unwrap().is_empty());
        assert_eq!(
            json_items("user_by_id", "{\"id\":5}\n").unwrap(),
            vec!["{\"id\":5}"]
        );
        // anything else that is not json is still an error
        assert!(json_items("tweet_details", "Rate limited\n").is_err());
        assert!(json_items("tweet_details", "{\"id\":1}\nNot Found\n").is_err());
    }

    #[test]
    fn db_flag_comes_first() {
        let cli = TwscrapeCli::new("accounts.db");
        let args = cli.command_args(&["accounts".into()]);
        assert_eq!(args, vec!["--db", "accounts.db", "accounts"]);
    }

    #[tokio::test]
    async fn missing_program() {
        let cli = TwscrapeCli::new("accounts.db").with_program("/nonexistent/twscrape");
        assert!(matches!(
            cli.login_all().await,
            Err(ScrapeError::Spawn { .. })
        ));
    }
}
