use serde_json::Value;

use crate::common::Result;
use crate::log::{fixture_info, fixture_warn};
use crate::rpc::{IpaClient, Options};

use super::{run, Host, HostGroup, RemoteObject, Rule, ServiceGroup, User, UserGroup};

/// The objects a scenario created, removed again in reverse order, along
/// with any change it made to objects it did not create.
///
/// Undoing happens on `teardown`, or on drop if the scenario bailed out
/// early (an error or a failed assertion).
pub struct Fixtures<'c> {
    client: &'c IpaClient,
    undo: Vec<Undo>,
}

/// `<kind>_<action> <name>` reverts one step.
struct Undo {
    kind: &'static str,
    action: &'static str,
    name: String,
}

const ALREADY_INACTIVE: &str = "AlreadyInactive";

impl<'c> Fixtures<'c> {
    pub fn new(client: &'c IpaClient) -> Self {
        Fixtures {
            client,
            undo: Vec::new(),
        }
    }

    pub fn client(&self) -> &'c IpaClient {
        self.client
    }

    /// Create `object` and remember to remove it.
    pub fn add<O: RemoteObject>(&mut self, object: O) -> Result<O> {
        object.add()?;
        self.undo.push(Undo {
            kind: O::KIND,
            action: "del",
            name: object.name().to_string(),
        });
        Ok(object)
    }

    /// Disable an existing rule, such as the server's `allow_all`, and
    /// enable it again on teardown. A rule that is already disabled is left
    /// as it is.
    pub fn disable_rule(&mut self, name: &str) -> Result<()> {
        let method = format!("{}_disable", Rule::KIND);
        let reply = self
            .client
            .call(&method, &[Value::from(name)], &Options::new())?;

        let fault_name = reply.fault.as_ref().and_then(|fault| fault.name.as_deref());
        if fault_name == Some(ALREADY_INACTIVE) {
            fixture_info!("rule {name} is already disabled");
            return Ok(());
        }
        reply.check(&method)?;

        self.undo.push(Undo {
            kind: Rule::KIND,
            action: "enable",
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn host(&mut self, name: &str) -> Result<Host<'c>> {
        self.add(Host::new(self.client, name))
    }

    pub fn host_group(&mut self, name: &str) -> Result<HostGroup<'c>> {
        self.add(HostGroup::new(self.client, name))
    }

    pub fn user(&mut self, name: &str) -> Result<User<'c>> {
        self.add(User::new(self.client, name))
    }

    pub fn user_group(&mut self, name: &str) -> Result<UserGroup<'c>> {
        self.add(UserGroup::new(self.client, name))
    }

    pub fn service_group(&mut self, name: &str) -> Result<ServiceGroup<'c>> {
        self.add(ServiceGroup::new(self.client, name))
    }

    pub fn rule(&mut self, name: &str) -> Result<Rule<'c>> {
        self.add(Rule::new(self.client, name))
    }

    /// Undo everything, newest first. Every step is attempted; the first
    /// failure is reported.
    pub fn teardown(mut self) -> Result<()> {
        self.undo_all()
    }

    fn undo_all(&mut self) -> Result<()> {
        let mut first_error = None;
        while let Some(Undo { kind, action, name }) = self.undo.pop() {
            if let Err(err) = run(self.client, kind, action, &name, &Options::new()) {
                fixture_warn!("cannot {action} {kind} {name}: {err}");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

impl Drop for Fixtures<'_> {
    fn drop(&mut self) {
        if !self.undo.is_empty() {
            fixture_info!("undoing {} leftover fixture steps", self.undo.len());
            // errors were logged, and there is no caller left to report them to
            let _ = self.undo_all();
        }
    }
}
