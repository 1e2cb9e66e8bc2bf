use std::env;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::pam::ScenarioConfig;
use crate::rpc::{ServerIdentity, TlsMode};

use super::{Error, Result};

pub const VAR_PAM_WRAPPER: &str = "PAM_WRAPPER";
pub const VAR_SERVICE_DIR: &str = "PAM_WRAPPER_SERVICE_DIR";
pub const VAR_MODULE_PATH: &str = "PAM_HBAC_ABS_PATH";
pub const VAR_IPA_HOSTNAME: &str = "IPA_HOSTNAME";
pub const VAR_IPA_DOMAIN: &str = "IPA_DOMAIN";
pub const VAR_IPA_REALM: &str = "IPA_REALM";
pub const VAR_IPA_ADMIN: &str = "IPA_ADMIN";
pub const VAR_IPA_PASSWORD: &str = "IPA_ADMIN_PASSWD";
pub const VAR_IPA_INSECURE: &str = "IPA_INSECURE";
pub const VAR_CONFIG_PATH: &str = "PAM_HBAC_CONFIG_PATH";
pub const VAR_BASE_DN: &str = "IPA_BASEDN";
pub const VAR_TEST_CLIENT: &str = "PAM_HBAC_TEST_CLIENT";
/// The slot the module under test consults for the target host name.
pub const VAR_HOST_NAME: &str = "HOST_NAME";

const DEFAULT_ADMIN: &str = "admin";
const CA_CERT_FILE_NAME: &str = "ca.crt";

/// Everything a test run needs to know about its surroundings, read once
/// from the environment.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// directory the PAM wrapper loads service descriptions from
    pub service_dir: PathBuf,
    /// absolute path of the module under test
    pub module_path: PathBuf,
    pub server: ServerIdentity,
    /// where to write the per-scenario module configuration, if at all
    pub config_path: Option<PathBuf>,
    pub base_dn: String,
    /// host name checks run against unless a scenario overrides it
    pub default_host: String,
    pub test_client: PathBuf,
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            match lookup(name) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(Error::env(format!("the {name} variable is unset"))),
            }
        };
        let optional = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if required(VAR_PAM_WRAPPER)? != "1" {
            return Err(Error::env(format!("{VAR_PAM_WRAPPER} is not initialized")));
        }

        let service_dir = PathBuf::from(required(VAR_SERVICE_DIR)?);
        check_read_write(&service_dir)?;

        let module_path = PathBuf::from(required(VAR_MODULE_PATH)?);
        if !module_path.is_absolute() {
            return Err(Error::env(format!(
                "{VAR_MODULE_PATH} must be an absolute path, got '{}'",
                module_path.display()
            )));
        }

        let hostname = required(VAR_IPA_HOSTNAME)?;
        let domain = required(VAR_IPA_DOMAIN)?.to_lowercase();
        let password = required(VAR_IPA_PASSWORD)?;
        let realm = optional(VAR_IPA_REALM).unwrap_or_else(|| domain.to_uppercase());
        let admin = optional(VAR_IPA_ADMIN).unwrap_or_else(|| DEFAULT_ADMIN.to_string());

        let tls = if parse_flag(VAR_IPA_INSECURE, optional(VAR_IPA_INSECURE))? {
            TlsMode::Insecure
        } else {
            TlsMode::Verify {
                ca_cert: service_dir.join(CA_CERT_FILE_NAME),
            }
        };

        let base_dn = optional(VAR_BASE_DN).unwrap_or_else(|| base_dn_from_domain(&domain));
        let default_host = optional(VAR_HOST_NAME).unwrap_or_else(|| hostname.clone());
        let test_client = optional(VAR_TEST_CLIENT)
            .unwrap_or_else(|| env!("PAM_HBAC_DEFAULT_TEST_CLIENT").to_string())
            .into();

        Ok(HarnessConfig {
            service_dir,
            module_path,
            server: ServerIdentity {
                hostname,
                domain,
                realm,
                admin,
                password,
                tls,
            },
            config_path: optional(VAR_CONFIG_PATH).map(PathBuf::from),
            base_dn,
            default_host,
            test_client,
        })
    }

    /// The connection parameters handed to the module under test, without a
    /// target host.
    pub fn directory_params(&self) -> ScenarioConfig {
        ScenarioConfig {
            uri: Some(format!("ldap://{}", self.server.hostname)),
            base: Some(self.base_dn.clone()),
            bind_dn: Some(format!(
                "uid={},cn=users,cn=accounts,{}",
                self.server.admin, self.base_dn
            )),
            bind_pw: Some(self.server.password.clone()),
            ca_cert: self.server.tls.ca_cert().map(Path::to_path_buf),
            host_name: None,
        }
    }
}

/// `ipa.example.test` becomes `dc=ipa,dc=example,dc=test`
pub fn base_dn_from_domain(domain: &str) -> String {
    domain
        .split('.')
        .filter(|label| !label.is_empty())
        .map(|label| format!("dc={label}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };

    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(Error::env(format!(
            "{name} must be one of 1, true, yes, 0, false, no; got '{value}'"
        ))),
    }
}

fn check_read_write(dir: &Path) -> Result<()> {
    let c_path = CString::new(dir.as_os_str().as_bytes())
        .map_err(|_| Error::env(format!("{VAR_SERVICE_DIR} contains a nul byte")))?;

    // SAFETY: access only reads the null-terminated path passed to it
    let res = unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) };
    if res != 0 || !dir.is_dir() {
        return Err(Error::env(format!("cannot access {}", dir.display())));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn vars(service_dir: &Path) -> HashMap<&'static str, String> {
        HashMap::from([
            (VAR_PAM_WRAPPER, "1".to_string()),
            (VAR_SERVICE_DIR, service_dir.display().to_string()),
            (VAR_MODULE_PATH, "/usr/lib/security/pam_hbac.so".to_string()),
            (VAR_IPA_HOSTNAME, "ipa.ipa.test".to_string()),
            (VAR_IPA_DOMAIN, "IPA.test".to_string()),
            (VAR_IPA_PASSWORD, "Secret123".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<HarnessConfig> {
        HarnessConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn minimal_environment_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&vars(dir.path())).unwrap();

        assert_eq!(config.server.domain, "ipa.test");
        assert_eq!(config.server.realm, "IPA.TEST");
        assert_eq!(config.server.admin, "admin");
        assert_eq!(config.base_dn, "dc=ipa,dc=test");
        assert_eq!(config.default_host, "ipa.ipa.test");
        assert_eq!(config.config_path, None);
        assert_eq!(config.test_client, PathBuf::from("pam_test_client"));
        assert_eq!(
            config.server.tls,
            TlsMode::Verify {
                ca_cert: dir.path().join("ca.crt")
            }
        );
    }

    #[test]
    fn missing_marker_is_an_environment_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut vars = vars(dir.path());
        vars.remove(VAR_PAM_WRAPPER);

        let err = load(&vars).unwrap_err();
        assert!(err.is_setup());
        assert!(err.to_string().contains(VAR_PAM_WRAPPER));

        vars.insert(VAR_PAM_WRAPPER, "0".to_string());
        assert!(load(&vars).unwrap_err().to_string().contains("not initialized"));
    }

    #[test]
    fn every_required_variable_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            VAR_SERVICE_DIR,
            VAR_MODULE_PATH,
            VAR_IPA_HOSTNAME,
            VAR_IPA_DOMAIN,
            VAR_IPA_PASSWORD,
        ] {
            let mut vars = vars(dir.path());
            vars.remove(name);
            let err = load(&vars).unwrap_err();
            assert!(err.to_string().contains(name), "{err}");
        }
    }

    #[test]
    fn unusable_service_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut vars = vars(dir.path());
        vars.insert(VAR_SERVICE_DIR, dir.path().join("missing").display().to_string());

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("cannot access"));
    }

    #[test]
    fn relative_module_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut vars = vars(dir.path());
        vars.insert(VAR_MODULE_PATH, "pam_hbac.so".to_string());

        assert!(load(&vars).is_err());
    }

    #[test]
    fn optional_variables_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut vars = vars(dir.path());
        vars.insert(VAR_IPA_INSECURE, "Yes".to_string());
        vars.insert(VAR_CONFIG_PATH, "/tmp/pam_hbac.conf".to_string());
        vars.insert(VAR_BASE_DN, "dc=example,dc=com".to_string());
        vars.insert(VAR_HOST_NAME, "client.ipa.test".to_string());
        vars.insert(VAR_IPA_ADMIN, "hbacadmin".to_string());

        let config = load(&vars).unwrap();
        assert_eq!(config.server.tls, TlsMode::Insecure);
        assert_eq!(config.config_path, Some(PathBuf::from("/tmp/pam_hbac.conf")));
        assert_eq!(config.default_host, "client.ipa.test");

        let params = config.directory_params();
        assert_eq!(params.base.as_deref(), Some("dc=example,dc=com"));
        assert_eq!(
            params.bind_dn.as_deref(),
            Some("uid=hbacadmin,cn=users,cn=accounts,dc=example,dc=com")
        );
        assert_eq!(params.ca_cert, None);
    }

    #[test]
    fn insecure_flag_must_be_boolean() {
        let dir = tempfile::tempdir().unwrap();
        let mut vars = vars(dir.path());
        vars.insert(VAR_IPA_INSECURE, "maybe".to_string());

        assert!(load(&vars).unwrap_err().is_setup());
    }

    #[test]
    fn base_dn_follows_domain_labels() {
        assert_eq!(base_dn_from_domain("ipa.example.test"), "dc=ipa,dc=example,dc=test");
        assert_eq!(base_dn_from_domain("localhost"), "dc=localhost");
    }
}
