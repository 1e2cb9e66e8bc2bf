use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::{Error, Result};

/// Named arguments of a remote command.
pub type Options = Map<String, Value>;

/// Body of a command posted to the session endpoint:
/// `{"method": .., "params": [[positional..], {named..}], "id": "0"}`
#[derive(Serialize, Debug)]
pub struct Request<'a> {
    method: &'a str,
    params: (&'a [Value], &'a Options),
    id: &'static str,
}

impl<'a> Request<'a> {
    pub fn new(method: &'a str, args: &'a [Value], options: &'a Options) -> Self {
        Request {
            method,
            params: (args, options),
            id: "0",
        }
    }
}

/// A fault reported inside an otherwise successful HTTP exchange.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// 0 when the server gave none
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl Fault {
    fn from_error(error: Value) -> Self {
        match serde_json::from_value(error.clone()) {
            Ok(fault) => fault,
            Err(_) => Fault {
                code: 0,
                name: None,
                message: error.to_string(),
            },
        }
    }

    /// Membership commands report refused members in `result.failed`
    /// while `error` stays null.
    fn from_result(result: &Value) -> Option<Self> {
        let mut rejected = Vec::new();
        collect_failures("member", result.get("failed")?, &mut rejected);
        if rejected.is_empty() {
            return None;
        }

        let completed = result.get("completed").and_then(Value::as_u64).unwrap_or(0);
        Some(Fault {
            code: 0,
            name: None,
            message: format!(
                "{completed} members added, rejected: {}",
                rejected.join(", ")
            ),
        })
    }
}

/// `failed` nests `{"memberuser": {"user": [["tusr", "no such entry"]]}}`.
fn collect_failures(kind: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                collect_failures(key, value, out);
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                match entry.as_array().map(Vec::as_slice) {
                    Some([Value::String(name), Value::String(reason)]) => {
                        out.push(format!("{kind} {name} ({reason})"))
                    }
                    _ => out.push(format!("{kind} {entry}")),
                }
            }
        }
        _ => {}
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
}

/// What a command produced: the HTTP status and, if the server sent one,
/// its fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub fault: Option<Fault>,
}

impl Reply {
    pub(super) fn from_body(status: u16, body: &[u8]) -> Self {
        // bodies that are not a JSON object carry no fault
        let Ok(envelope) = serde_json::from_slice::<Envelope>(body) else {
            return Reply::status_only(status);
        };

        let fault = match envelope.error {
            Some(error) => Some(Fault::from_error(error)),
            None => envelope.result.as_ref().and_then(Fault::from_result),
        };
        Reply { status, fault }
    }

    pub(super) fn status_only(status: u16) -> Self {
        Reply {
            status,
            fault: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.fault.is_none()
    }

    /// Turn a non-success reply into `Error::Remote`.
    pub fn check(self, method: &str) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }

        let (status, message) = match self.fault {
            Some(Fault {
                code,
                name: Some(name),
                message,
            }) => (code, format!("{name}: {message}")),
            Some(Fault { code, message, .. }) => (code, message),
            None => (0, "unexpected HTTP status".to_string()),
        };
        let status = if status == 0 { self.status.into() } else { status };

        Err(Error::Remote {
            method: method.to_string(),
            status,
            message,
        })
    }
}
