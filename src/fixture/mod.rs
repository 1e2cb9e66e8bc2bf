//! Handles for directory objects that scenarios create and remove.
//!
//! A handle is nothing but a name and a reference to the shared client: the
//! harness keeps no copy of remote state, and every operation is exactly one
//! remote command whose effect is visible to the next one.

use serde_json::{json, Value};

use crate::common::Result;
use crate::log::fixture_debug;
use crate::rpc::{IpaClient, Options};

pub use members::Members;
pub use teardown::Fixtures;

mod members;
mod teardown;

/// A directory object addressed by name.
pub trait RemoteObject {
    /// command prefix, e.g. `hostgroup` for `hostgroup_add`
    const KIND: &'static str;

    fn name(&self) -> &str;

    fn client(&self) -> &IpaClient;

    /// named arguments the server requires on creation
    fn add_options(&self) -> Options {
        Options::new()
    }

    /// Create the object. Creating it twice is reported by the server.
    fn add(&self) -> Result<()> {
        run(self.client(), Self::KIND, "add", self.name(), &self.add_options())
    }

    fn remove(&self) -> Result<()> {
        run(self.client(), Self::KIND, "del", self.name(), &Options::new())
    }
}

/// Issue `<kind>_<action>` for `name`.
fn run(client: &IpaClient, kind: &str, action: &str, name: &str, options: &Options) -> Result<()> {
    let method = format!("{kind}_{action}");
    fixture_debug!("{method} {name}");
    client.command(&method, &[Value::from(name)], options)
}

macro_rules! remote_object {
    ($(#[$meta:meta])* $object:ident is $kind:literal) => {
        $(#[$meta])*
        pub struct $object<'c> {
            client: &'c IpaClient,
            name: String,
        }

        impl<'c> $object<'c> {
            pub fn new(client: &'c IpaClient, name: impl Into<String>) -> Self {
                Self {
                    client,
                    name: name.into(),
                }
            }
        }

        impl RemoteObject for $object<'_> {
            const KIND: &'static str = $kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn client(&self) -> &IpaClient {
                self.client
            }
        }
    };
}

/// A host, always addressed by its fully-qualified name.
pub struct Host<'c> {
    client: &'c IpaClient,
    name: String,
}

impl<'c> Host<'c> {
    /// `name` is qualified with the run's domain unless it already is.
    pub fn new(client: &'c IpaClient, name: &str) -> Self {
        Host {
            client,
            name: client.identity().qualify(name),
        }
    }
}

impl RemoteObject for Host<'_> {
    const KIND: &'static str = "host";

    fn name(&self) -> &str {
        &self.name
    }

    fn client(&self) -> &IpaClient {
        self.client
    }

    fn add_options(&self) -> Options {
        // test hosts have no DNS records
        let mut options = Options::new();
        options.insert("force".into(), json!(true));
        options
    }
}

pub struct User<'c> {
    client: &'c IpaClient,
    name: String,
}

impl<'c> User<'c> {
    pub fn new(client: &'c IpaClient, name: impl Into<String>) -> Self {
        User {
            client,
            name: name.into(),
        }
    }
}

impl RemoteObject for User<'_> {
    const KIND: &'static str = "user";

    fn name(&self) -> &str {
        &self.name
    }

    fn client(&self) -> &IpaClient {
        self.client
    }

    fn add_options(&self) -> Options {
        let mut options = Options::new();
        options.insert("givenname".into(), json!("HBAC"));
        options.insert("sn".into(), json!(self.name));
        options
    }
}

remote_object!(HostGroup is "hostgroup");
remote_object!(
    /// A group of users, possibly containing other user groups.
    UserGroup is "group"
);
remote_object!(
    /// A group of HBAC services, e.g. `sshd` and `login`.
    ServiceGroup is "hbacsvcgroup"
);
remote_object!(
    /// An HBAC rule. Rules are created enabled.
    Rule is "hbacrule"
);

impl HostGroup<'_> {
    pub fn add_member(&self, members: Members) -> Result<()> {
        let members = members.map_direct(|host| self.client.identity().qualify(host));
        let options = members.options("host", Some("hostgroup"))?;
        run(self.client, Self::KIND, "add_member", &self.name, &options)
    }
}

impl UserGroup<'_> {
    pub fn add_member(&self, members: Members) -> Result<()> {
        let options = members.options("user", Some("group"))?;
        run(self.client, Self::KIND, "add_member", &self.name, &options)
    }
}

impl ServiceGroup<'_> {
    pub fn add_member(&self, members: Members) -> Result<()> {
        let options = members.options("hbacsvc", None)?;
        run(self.client, Self::KIND, "add_member", &self.name, &options)
    }
}

impl Rule<'_> {
    pub fn add_user(&self, members: Members) -> Result<()> {
        let options = members.options("user", Some("group"))?;
        run(self.client, Self::KIND, "add_user", &self.name, &options)
    }

    pub fn add_host(&self, members: Members) -> Result<()> {
        let members = members.map_direct(|host| self.client.identity().qualify(host));
        let options = members.options("host", Some("hostgroup"))?;
        run(self.client, Self::KIND, "add_host", &self.name, &options)
    }

    pub fn add_service(&self, members: Members) -> Result<()> {
        let options = members.options("hbacsvc", Some("hbacsvcgroup"))?;
        run(self.client, Self::KIND, "add_service", &self.name, &options)
    }

    pub fn enable(&self) -> Result<()> {
        run(self.client, Self::KIND, "enable", &self.name, &Options::new())
    }

    pub fn disable(&self) -> Result<()> {
        run(self.client, Self::KIND, "disable", &self.name, &Options::new())
    }
}
