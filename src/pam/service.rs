use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

const KEY_URI: &str = "URI";
const KEY_BASE: &str = "BASE";
const KEY_BIND_DN: &str = "BIND_DN";
const KEY_BIND_PW: &str = "BIND_PW";
const KEY_CA_CERT: &str = "CA_CERT";
const KEY_HOST_NAME: &str = "HOST_NAME";

/// The one-line service description that puts the module under test in
/// charge of the account phase.
pub fn service_line(module: &Path, config: Option<&Path>) -> String {
    match config {
        Some(config) => format!(
            "account required {} config={}\n",
            module.display(),
            config.display()
        ),
        None => format!("account required {}\n", module.display()),
    }
}

/// Connection parameters for the module under test, as written to its
/// configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScenarioConfig {
    pub uri: Option<String>,
    pub base: Option<String>,
    pub bind_dn: Option<String>,
    pub bind_pw: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub host_name: Option<String>,
}

impl ScenarioConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host_name = Some(host.into());
        self
    }

    /// `KEY = value` lines in a fixed order; absent values are left out.
    pub fn render(&self) -> String {
        let ca_cert = self.ca_cert.as_ref().map(|path| path.display().to_string());
        let entries = [
            (KEY_URI, self.uri.as_deref()),
            (KEY_BASE, self.base.as_deref()),
            (KEY_BIND_DN, self.bind_dn.as_deref()),
            (KEY_BIND_PW, self.bind_pw.as_deref()),
            (KEY_CA_CERT, ca_cert.as_deref()),
            (KEY_HOST_NAME, self.host_name.as_deref()),
        ];

        let mut out = String::new();
        for (key, value) in entries {
            if let Some(value) = value {
                let _ = writeln!(out, "{key} = {value}");
            }
        }
        out
    }

    /// Read a configuration the way the module does: keys are
    /// case-insensitive, `#` lines are comments, unknown keys are skipped
    /// and a line without `=` is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = ScenarioConfig::default();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::Usage(format!(
                    "malformed line {}: no separator",
                    number + 1
                )));
            };
            let value = Some(value.trim().to_string());

            match key.trim().to_ascii_uppercase().as_str() {
                KEY_URI => config.uri = value,
                KEY_BASE => config.base = value,
                KEY_BIND_DN => config.bind_dn = value,
                KEY_BIND_PW => config.bind_pw = value,
                KEY_CA_CERT => config.ca_cert = value.map(PathBuf::from),
                KEY_HOST_NAME => config.host_name = value,
                _ => {}
            }
        }

        Ok(config)
    }
}
