use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the cookie the identity server hands out on login.
pub const SESSION_COOKIE: &str = "ipa_session";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TlsMode {
    /// verify the server against the trust certificate stored at `ca_cert`
    Verify { ca_cert: PathBuf },
    /// accept any certificate; test setups only
    Insecure,
}

impl TlsMode {
    pub fn ca_cert(&self) -> Option<&Path> {
        match self {
            TlsMode::Verify { ca_cert } => Some(ca_cert),
            TlsMode::Insecure => None,
        }
    }
}

/// The identity server a test run talks to, and who it talks to it as.
#[derive(Clone)]
pub struct ServerIdentity {
    pub hostname: String,
    pub domain: String,
    pub realm: String,
    pub admin: String,
    pub password: String,
    pub tls: TlsMode,
}

impl ServerIdentity {
    /// Qualify a short host name with the configured domain.
    ///
    /// Names that already carry the domain suffix are returned unchanged.
    pub fn qualify(&self, host: &str) -> String {
        let suffix = format!(".{}", self.domain);
        if host.to_lowercase().ends_with(&suffix) {
            host.to_string()
        } else {
            format!("{host}{suffix}")
        }
    }
}

impl fmt::Debug for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerIdentity")
            .field("hostname", &self.hostname)
            .field("domain", &self.domain)
            .field("realm", &self.realm)
            .field("admin", &self.admin)
            .field("password", &"<redacted>")
            .field("tls", &self.tls)
            .finish()
    }
}

/// Authentication state shared by every command of a run.
///
/// Empty until the first command that needs it; from then on the same
/// credential is reused.
#[derive(Default)]
pub struct Session {
    credential: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// The value for a `Cookie` request header.
    pub fn cookie(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub(super) fn store(&mut self, credential: String) {
        self.credential = Some(credential);
    }

    pub fn clear(&mut self) {
        self.credential = None;
    }
}

/// Pick the session cookie out of a `Set-Cookie` header value, dropping
/// its attributes.
pub(super) fn session_cookie(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    if name.trim() == SESSION_COOKIE && !value.is_empty() {
        Some(pair.to_string())
    } else {
        None
    }
}
