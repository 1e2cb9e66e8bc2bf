use serde_json::Value;

use crate::common::{Error, Result};
use crate::rpc::Options;

/// Who to add to a group or rule dimension: direct members, groups, or both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Members {
    direct: Vec<String>,
    groups: Vec<String>,
}

impl Members {
    pub fn direct(name: impl Into<String>) -> Self {
        Members::default().and_direct(name)
    }

    pub fn group(name: impl Into<String>) -> Self {
        Members::default().and_group(name)
    }

    pub fn and_direct(mut self, name: impl Into<String>) -> Self {
        self.direct.push(name.into());
        self
    }

    pub fn and_group(mut self, name: impl Into<String>) -> Self {
        self.groups.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.groups.is_empty()
    }

    pub(super) fn map_direct(mut self, f: impl Fn(&str) -> String) -> Self {
        self.direct = self.direct.iter().map(|name| f(name)).collect();
        self
    }

    /// The named arguments of a membership command, e.g.
    /// `{"user": [..], "group": [..]}`. `group_key` is `None` for
    /// containers that cannot nest groups.
    pub(super) fn options(&self, direct_key: &str, group_key: Option<&str>) -> Result<Options> {
        if self.is_empty() {
            return Err(Error::Usage(format!(
                "no members given for `{direct_key}`"
            )));
        }

        let mut options = Options::new();
        if !self.direct.is_empty() {
            options.insert(direct_key.to_string(), list(&self.direct));
        }
        if !self.groups.is_empty() {
            let Some(group_key) = group_key else {
                return Err(Error::Usage(format!(
                    "`{direct_key}` members cannot be given as groups"
                )));
            };
            options.insert(group_key.to_string(), list(&self.groups));
        }

        Ok(options)
    }
}

fn list(names: &[String]) -> Value {
    Value::Array(names.iter().cloned().map(Value::String).collect())
}
