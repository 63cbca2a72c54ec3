use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("unable to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from {command}: {msg}")]
    InvalidOutput { command: String, msg: String },

    #[error("account {username} cannot be imported: {msg}")]
    InvalidAccount { username: String, msg: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
