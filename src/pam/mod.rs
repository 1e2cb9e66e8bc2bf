//! Drives the PAM account phase of the module under test against a
//! generated service description.

use std::path::{Path, PathBuf};

use crate::common::config::VAR_HOST_NAME;
use crate::common::{Error, HarnessConfig, Result};
use crate::log::{pam_debug, pam_info};
use crate::rpc::ServerIdentity;
use crate::system::{EnvOverride, TransientFile};

pub use client::TestClient;
#[cfg(feature = "libpam")]
pub use context::{LibPam, PamContext};
pub use error::{PamError, PamErrorType, PamResult};
pub use service::{service_line, ScenarioConfig};

mod client;
#[cfg(feature = "libpam")]
mod context;
mod error;
mod service;
pub mod sys;

/// Something that can run the account phase for a user and service and
/// report the raw PAM result code.
///
/// An `Err` means no code was produced at all; a denial is an `Ok`.
pub trait AccountCheck {
    fn acct_mgmt(&self, user: &str, service: &str) -> PamResult<i32>;
}

pub struct PamHarness {
    service_dir: PathBuf,
    module_path: PathBuf,
    config_path: Option<PathBuf>,
    directory: ScenarioConfig,
    server: ServerIdentity,
    default_host: String,
    checker: Box<dyn AccountCheck>,
}

impl PamHarness {
    pub fn new(config: &HarnessConfig, checker: impl AccountCheck + 'static) -> Self {
        PamHarness {
            service_dir: config.service_dir.clone(),
            module_path: config.module_path.clone(),
            config_path: config.config_path.clone(),
            directory: config.directory_params(),
            server: config.server.clone(),
            default_host: config.server.qualify(&config.default_host),
            checker: Box::new(checker),
        }
    }

    /// A harness that runs the configured shim program.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config, TestClient::new(&config.test_client))
    }

    /// The fully qualified host checks run against when no host is given.
    pub fn default_host(&self) -> &str {
        &self.default_host
    }

    /// `host` qualified within the server's domain, or the default host.
    pub fn effective_host(&self, host: Option<&str>) -> String {
        match host {
            Some(host) => self.server.qualify(host),
            None => self.default_host.clone(),
        }
    }

    pub fn service_file_path(&self, service: &str) -> PathBuf {
        self.service_dir.join(service)
    }

    /// Run the account phase for `user` on `service`, as seen from `host`
    /// (the run's default host if `None`), and return the PAM result code.
    ///
    /// The host name variable is overridden for the duration of the call
    /// only. The generated service description and configuration file are
    /// removed before this returns, whether or not the check itself worked.
    pub fn check(&self, user: &str, service: &str, host: Option<&str>) -> Result<i32> {
        if service.is_empty() || service.contains('/') {
            return Err(Error::Usage(format!("'{service}' is not a usable service name")));
        }

        let host = self.effective_host(host);
        let _host_slot = EnvOverride::set(VAR_HOST_NAME, &host);

        let config_file = match &self.config_path {
            Some(path) => {
                let contents = self.directory.clone().with_host(host.as_str()).render();
                Some(TransientFile::create(path, &contents)?)
            }
            None => None,
        };

        let service_file = TransientFile::create(
            self.service_file_path(service),
            &service_line(&self.module_path, config_file.as_ref().map(TransientFile::path)),
        )?;
        pam_debug!("wrote {}", service_file.path().display());

        let outcome = self.checker.acct_mgmt(user, service);

        let service_removed = service_file.remove();
        let config_removed = config_file.map(TransientFile::remove).transpose();

        let code = outcome?;
        service_removed?;
        config_removed?;

        pam_info!("account check for {user} on {service} from {host}: {code}");
        Ok(code)
    }

    /// Files left in the service directory, other than trust certificates.
    pub fn leftovers(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.service_dir.join("*");
        let pattern = pattern
            .to_str()
            .ok_or_else(|| Error::Usage(format!("{} is not valid UTF-8", pattern.display())))?;

        let entries = glob::glob(pattern).map_err(|err| Error::Usage(err.to_string()))?;
        let mut found = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| {
                let path = err.path().to_path_buf();
                Error::Io(Some(path), err.into())
            })?;
            if !is_certificate(&path) {
                found.push(path);
            }
        }

        Ok(found)
    }
}

fn is_certificate(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "crt")
}
