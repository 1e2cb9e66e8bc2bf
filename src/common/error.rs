use std::path::PathBuf;

use crate::pam::PamError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required environment variable is absent or unusable. Raised while
    /// loading the configuration, before any remote state is touched.
    #[error("environment misconfigured: {0}")]
    Environment(String),
    /// The identity server answered a command with a non-success status or
    /// a fault.
    #[error("remote command `{method}` failed with status {status}: {message}")]
    Remote {
        method: String,
        status: u32,
        message: String,
    },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed remote payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{}", display_io(.0, .1))]
    Io(Option<PathBuf>, #[source] std::io::Error),
    #[error("PAM error: {0}")]
    Pam(#[from] PamError),
    /// The harness was driven in a way that cannot work, e.g. a rule
    /// dimension without any member.
    #[error("invalid usage: {0}")]
    Usage(String),
}

fn display_io(path: &Option<PathBuf>, err: &std::io::Error) -> String {
    match path {
        Some(path) => format!("cannot access '{}': {err}", path.display()),
        None => format!("IO error: {err}"),
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(None, err)
    }
}

impl Error {
    pub(crate) fn env(message: impl Into<String>) -> Self {
        Self::Environment(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |err| Error::Io(Some(path), err)
    }

    /// Returns `true` for errors raised before the scenario touched anything.
    pub fn is_setup(&self) -> bool {
        matches!(self, Error::Environment(_) | Error::Usage(_))
    }
}
