//! End-to-end harness for host-based access control decisions made by a
//! PAM account module against rules held by an identity server.
//!
//! A run loads a [`HarnessConfig`] from the environment, provisions
//! directory objects through an [`IpaClient`] wrapped in [`Fixtures`], and
//! asserts on the account phase through a [`Scenario`] over a
//! [`PamHarness`].

pub mod log;

pub mod common;
pub mod fixture;
pub mod pam;
pub mod rpc;
pub mod scenario;
pub mod system;

pub use common::{Error, HarnessConfig, Result};
pub use fixture::{
    Fixtures, Host, HostGroup, Members, RemoteObject, Rule, ServiceGroup, User, UserGroup,
};
pub use pam::{AccountCheck, PamHarness, TestClient};
pub use rpc::{IpaClient, TrustCert};
pub use scenario::{Outcome, Scenario};
