use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{AccountCheck, PamError, PamResult};
use crate::log::pam_debug;

/// Runs the account check through a separate shim program, invoked as
/// `<program> <user> <service>`, whose exit status is the PAM result code.
///
/// The shim inherits the environment, so the service directory and host
/// name overrides reach the module it loads.
#[derive(Debug, Clone)]
pub struct TestClient {
    program: PathBuf,
}

impl TestClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        TestClient {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl AccountCheck for TestClient {
    fn acct_mgmt(&self, user: &str, service: &str) -> PamResult<i32> {
        let output = Command::new(&self.program)
            .arg(user)
            .arg(service)
            .output()?;

        pam_debug!(
            "{} {user} {service}: {}",
            self.program.display(),
            String::from_utf8_lossy(&output.stdout).trim_end()
        );

        match (output.status.code(), output.status.signal()) {
            (Some(code), _) => Ok(code),
            (None, Some(signal)) => Err(PamError::Terminated(format!("killed by signal {signal}"))),
            (None, None) => Err(PamError::Terminated(output.status.to_string())),
        }
    }
}
