use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::log::{rpc_debug, rpc_warn};

use super::ServerIdentity;

const CA_CERT_PATH: &str = "/ipa/config/ca.crt";

/// A locally cached copy of the server's trust certificate.
///
/// The file exists for as long as this value does; `release` removes it and
/// reports failures, dropping removes it on a best-effort basis.
#[must_use]
pub struct TrustCert {
    path: PathBuf,
    released: bool,
}

impl TrustCert {
    /// Download the certificate of `server` to `path`.
    pub fn fetch(server: &ServerIdentity, path: impl Into<PathBuf>) -> Result<Self> {
        Self::fetch_from(&format!("http://{}{CA_CERT_PATH}", server.hostname), path)
    }

    pub fn fetch_from(url: &str, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        rpc_debug!("fetching trust certificate from {url}");

        let response = reqwest::blocking::get(url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Remote {
                method: "GET ca.crt".to_string(),
                status: status.as_u16().into(),
                message: format!("cannot fetch {url}"),
            });
        }

        let pem = response.bytes()?;
        fs::write(&path, &pem).map_err(Error::io(&path))?;

        Ok(TrustCert {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the cached certificate.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_file(&self.path).map_err(Error::io(&self.path))
    }
}

impl Drop for TrustCert {
    fn drop(&mut self) {
        if !self.released {
            if let Err(err) = fs::remove_file(&self.path) {
                rpc_warn!("cannot remove {}: {err}", self.path.display());
            }
        }
    }
}
