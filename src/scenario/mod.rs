//! Expected-outcome assertions on top of the account check.

use std::fmt;

use crate::common::Result;
use crate::pam::sys::{PAM_PERM_DENIED, PAM_SUCCESS, PAM_USER_UNKNOWN};
use crate::pam::{PamErrorType, PamHarness};

/// The result of an account check, named where a scenario cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allowed,
    Denied,
    /// the user is not in the directory, or is `root`
    UserUnknown,
    Code(i32),
}

impl Outcome {
    pub fn code(self) -> i32 {
        match self {
            Outcome::Allowed => PAM_SUCCESS,
            Outcome::Denied => PAM_PERM_DENIED,
            Outcome::UserUnknown => PAM_USER_UNKNOWN,
            Outcome::Code(code) => code,
        }
    }
}

impl From<i32> for Outcome {
    fn from(code: i32) -> Self {
        match code {
            PAM_SUCCESS => Outcome::Allowed,
            PAM_PERM_DENIED => Outcome::Denied,
            PAM_USER_UNKNOWN => Outcome::UserUnknown,
            other => Outcome::Code(other),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", PamErrorType::from_int(self.code()))
    }
}

/// Assertions over one harness. A mismatch panics like `assert_eq!`; every
/// other failure is returned, so setup problems and remote errors are never
/// reported as a wrong outcome.
pub struct Scenario<'h> {
    harness: &'h PamHarness,
}

impl<'h> Scenario<'h> {
    pub fn new(harness: &'h PamHarness) -> Self {
        Scenario { harness }
    }

    pub fn harness(&self) -> &'h PamHarness {
        self.harness
    }

    pub fn returns(&self, user: &str, service: &str, host: Option<&str>) -> Result<Outcome> {
        self.harness.check(user, service, host).map(Outcome::from)
    }

    #[track_caller]
    pub fn assert_returns(
        &self,
        user: &str,
        service: &str,
        expected: impl Into<Outcome>,
        host: Option<&str>,
    ) -> Result<()> {
        let expected = expected.into();
        let observed = self.returns(user, service, host)?;

        if observed.code() != expected.code() {
            panic!(
                "account check for {user} on {service} from {}: expected {expected}, observed {observed}",
                self.harness.effective_host(host),
            );
        }

        Ok(())
    }

    #[track_caller]
    pub fn assert_allowed(&self, user: &str, service: &str, host: Option<&str>) -> Result<()> {
        self.assert_returns(user, service, Outcome::Allowed, host)
    }

    #[track_caller]
    pub fn assert_denied(&self, user: &str, service: &str, host: Option<&str>) -> Result<()> {
        self.assert_returns(user, service, Outcome::Denied, host)
    }
}
