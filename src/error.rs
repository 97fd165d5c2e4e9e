use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ToolError> = std::result::Result<T, E>;

/// Errors raised by the collectors.
///
/// Transient variants are retried by the fetch loops. Everything else aborts
/// the run.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("rpc query failed: {0}")]
    Rpc(String),

    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line_no}: expected `key,value`, got {line:?}")]
    MalformedLine {
        path: PathBuf,
        line_no: usize,
        line: String,
    },

    #[error("failed to decode {event} log in tx {tx:?}: {reason}")]
    LogDecode {
        event: &'static str,
        tx: Option<ethers::types::H256>,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("csv output failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("giving up after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ToolError> },
}

impl ToolError {
    /// Whether the fetch loops should sleep and re-issue the request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ToolError::Transport(_) | ToolError::Decode(_) | ToolError::Rpc(_)
        )
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        ToolError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::Decode(e.to_string())
    }
}
