//! HBAC scenarios against a live identity server and the module under test.
//!
//! These need a prepared environment (see `HarnessConfig`) and run with
//! `cargo test -- --ignored`.

use std::env;
use std::sync::{Mutex, MutexGuard, PoisonError};

use pam_hbac_harness::common::config::VAR_HOST_NAME;
use pam_hbac_harness::{
    Fixtures, HarnessConfig, IpaClient, Members, Outcome, PamHarness, Result, Rule, Scenario,
    TrustCert,
};

const USERNAME: &str = "tuser";
const RULE_HOST: &str = "rulehost";
const SERVICE: &str = "sshd";
/// the rule a fresh server ships with, granting everyone everything
const ALLOW_ALL: &str = "allow_all";

/// One run against the shared server; scenarios must not overlap.
struct Run {
    client: IpaClient,
    harness: PamHarness,
    _cert: Option<TrustCert>,
    _serial: MutexGuard<'static, ()>,
}

impl Run {
    fn start() -> Result<Run> {
        static SERIAL: Mutex<()> = Mutex::new(());
        let serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);

        pam_hbac_harness::log::init();
        let config = HarnessConfig::from_env()?;

        let cert = match config.server.tls.ca_cert() {
            Some(path) => Some(TrustCert::fetch(&config.server, path)?),
            None => None,
        };
        let client = IpaClient::new(config.server.clone())?;
        let harness = PamHarness::from_config(&config);

        Ok(Run {
            client,
            harness,
            _cert: cert,
            _serial: serial,
        })
    }

    /// Fixtures with the server's catch-all rule switched off until
    /// teardown, so that only the scenario's own rules grant access.
    fn fixtures(&self) -> Result<Fixtures<'_>> {
        let mut fixtures = Fixtures::new(&self.client);
        fixtures.disable_rule(ALLOW_ALL)?;
        Ok(fixtures)
    }

    fn scenario(&self) -> Scenario<'_> {
        Scenario::new(&self.harness)
    }
}

/// `trule`: `tuser` may use `sshd` on `rulehost`, all members direct.
fn direct_rule<'c>(fixtures: &mut Fixtures<'c>) -> Result<Rule<'c>> {
    fixtures.host(RULE_HOST)?;
    fixtures.user(USERNAME)?;

    let rule = fixtures.rule("trule")?;
    rule.add_user(Members::direct(USERNAME))?;
    rule.add_host(Members::direct(RULE_HOST))?;
    rule.add_service(Members::direct(SERVICE))?;
    Ok(rule)
}

#[ignore]
#[test]
fn disabling_rule_denies_and_enabling_restores() -> Result<()> {
    let run = Run::start()?;
    let mut fixtures = run.fixtures()?;
    let rule = direct_rule(&mut fixtures)?;
    let scenario = run.scenario();

    scenario.assert_allowed(USERNAME, SERVICE, Some(RULE_HOST))?;

    rule.disable()?;
    scenario.assert_denied(USERNAME, SERVICE, Some(RULE_HOST))?;

    rule.enable()?;
    scenario.assert_allowed(USERNAME, SERVICE, Some(RULE_HOST))?;

    fixtures.teardown()
}

#[ignore]
#[test]
fn user_allowed_through_group() -> Result<()> {
    let run = Run::start()?;
    let mut fixtures = run.fixtures()?;
    fixtures.host(RULE_HOST)?;
    fixtures.user(USERNAME)?;
    fixtures.user("otheruser")?;
    let group = fixtures.user_group("tgroup")?;
    group.add_member(Members::direct(USERNAME))?;

    let rule = fixtures.rule("trule")?;
    rule.add_user(Members::group("tgroup"))?;
    rule.add_host(Members::direct(RULE_HOST))?;
    rule.add_service(Members::direct(SERVICE))?;

    let scenario = run.scenario();
    scenario.assert_allowed(USERNAME, SERVICE, Some(RULE_HOST))?;
    scenario.assert_denied("otheruser", SERVICE, Some(RULE_HOST))?;

    fixtures.teardown()
}

#[ignore]
#[test]
fn host_allowed_through_group() -> Result<()> {
    let run = Run::start()?;
    let mut fixtures = run.fixtures()?;
    fixtures.host(RULE_HOST)?;
    fixtures.host("otherhost")?;
    fixtures.user(USERNAME)?;
    let group = fixtures.host_group("thostgroup")?;
    group.add_member(Members::direct(RULE_HOST))?;

    let rule = fixtures.rule("trule")?;
    rule.add_user(Members::direct(USERNAME))?;
    rule.add_host(Members::group("thostgroup"))?;
    rule.add_service(Members::direct(SERVICE))?;

    let scenario = run.scenario();
    scenario.assert_allowed(USERNAME, SERVICE, Some(RULE_HOST))?;
    scenario.assert_denied(USERNAME, SERVICE, Some("otherhost"))?;

    fixtures.teardown()
}

#[ignore]
#[test]
fn service_allowed_through_group() -> Result<()> {
    let run = Run::start()?;
    let mut fixtures = run.fixtures()?;
    fixtures.host(RULE_HOST)?;
    fixtures.user(USERNAME)?;
    let group = fixtures.service_group("tsvcgroup")?;
    group.add_member(Members::direct(SERVICE))?;

    let rule = fixtures.rule("trule")?;
    rule.add_user(Members::direct(USERNAME))?;
    rule.add_host(Members::direct(RULE_HOST))?;
    rule.add_service(Members::group("tsvcgroup"))?;

    let scenario = run.scenario();
    scenario.assert_allowed(USERNAME, SERVICE, Some(RULE_HOST))?;
    scenario.assert_denied(USERNAME, "login", Some(RULE_HOST))?;

    fixtures.teardown()
}

#[ignore]
#[test]
fn rule_without_service_denies() -> Result<()> {
    let run = Run::start()?;
    let mut fixtures = run.fixtures()?;
    fixtures.host(RULE_HOST)?;
    fixtures.user(USERNAME)?;

    let rule = fixtures.rule("trule")?;
    rule.add_user(Members::direct(USERNAME))?;
    rule.add_host(Members::direct(RULE_HOST))?;

    run.scenario().assert_denied(USERNAME, SERVICE, Some(RULE_HOST))?;

    fixtures.teardown()
}

#[ignore]
#[test]
fn unknown_user_is_reported_as_such() -> Result<()> {
    let run = Run::start()?;
    let mut fixtures = run.fixtures()?;
    direct_rule(&mut fixtures)?;
    let scenario = run.scenario();

    scenario.assert_returns("nosuchuser", SERVICE, Outcome::UserUnknown, Some(RULE_HOST))?;
    scenario.assert_returns("root", SERVICE, 10, Some(RULE_HOST))?;

    fixtures.teardown()
}

#[ignore]
#[test]
fn unknown_service_is_denied() -> Result<()> {
    let run = Run::start()?;
    let mut fixtures = run.fixtures()?;
    direct_rule(&mut fixtures)?;

    run.scenario()
        .assert_returns(USERNAME, "nosuchservice", 6, Some(RULE_HOST))?;

    fixtures.teardown()
}

#[ignore]
#[test]
fn unknown_host_is_denied() -> Result<()> {
    let run = Run::start()?;
    let mut fixtures = run.fixtures()?;
    direct_rule(&mut fixtures)?;

    run.scenario().assert_denied(USERNAME, SERVICE, Some("nosuchhost"))?;

    fixtures.teardown()
}

#[ignore]
#[test]
fn checks_leave_nothing_behind() -> Result<()> {
    let run = Run::start()?;
    let mut fixtures = run.fixtures()?;
    direct_rule(&mut fixtures)?;

    let before = env::var_os(VAR_HOST_NAME);
    let scenario = run.scenario();
    scenario.assert_allowed(USERNAME, SERVICE, Some(RULE_HOST))?;
    scenario.assert_denied(USERNAME, SERVICE, Some("otherhost"))?;

    assert_eq!(env::var_os(VAR_HOST_NAME), before);
    assert!(run.harness.leftovers()?.is_empty());

    fixtures.teardown()
}
