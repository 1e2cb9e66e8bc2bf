//! Session-authenticated command client for the identity server.

use std::cell::RefCell;
use std::fs;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, REFERER, SET_COOKIE};
use serde_json::Value;

use crate::common::{Error, Result};
use crate::log::{rpc_debug, rpc_info, rpc_warn};

pub use cert::TrustCert;
pub use request::{Fault, Options, Reply};
pub use session::{ServerIdentity, Session, TlsMode, SESSION_COOKIE};

use request::Request;
use session::session_cookie;

mod cert;
mod request;
mod session;
#[cfg(test)]
pub(crate) mod stub;

const LOGIN_PATH: &str = "/ipa/session/login_password";
const SESSION_PATH: &str = "/ipa/session/json";
const LOGIN_METHOD: &str = "login_password";

/// Issues commands against the identity server on behalf of one test run.
///
/// The client logs in lazily, on the first command that needs a session,
/// and reuses that session for the rest of the run.
pub struct IpaClient {
    identity: ServerIdentity,
    base_url: String,
    http: Client,
    session: RefCell<Session>,
}

impl IpaClient {
    /// Connect to `https://<hostname>` of the given server.
    ///
    /// With `TlsMode::Verify` the trust certificate must already be on disk,
    /// see [`TrustCert::fetch`].
    pub fn new(identity: ServerIdentity) -> Result<Self> {
        let base_url = format!("https://{}", identity.hostname);
        Self::with_base_url(identity, base_url)
    }

    pub fn with_base_url(identity: ServerIdentity, base_url: impl Into<String>) -> Result<Self> {
        let http = http_client(&identity.tls)?;

        Ok(IpaClient {
            identity,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            session: RefCell::new(Session::default()),
        })
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    /// Log in unless a session is already held.
    pub fn authenticate(&self) -> Result<()> {
        match self.ensure_authenticated()? {
            None => Ok(()),
            Some(failed) => failed.check(LOGIN_METHOD),
        }
    }

    /// Drop the current session, if any, and log in again.
    pub fn reauthenticate(&self) -> Result<()> {
        self.session.borrow_mut().clear();
        self.authenticate()
    }

    /// Send one command and report its status.
    ///
    /// A failed login is not an error at this level: its status is returned
    /// as the reply of the command that needed it.
    pub fn call(&self, method: &str, args: &[Value], options: &Options) -> Result<Reply> {
        if let Some(failed) = self.ensure_authenticated()? {
            return Ok(failed);
        }

        let body = serde_json::to_vec(&Request::new(method, args, options))?;
        let cookie = self.session.borrow().cookie().map(str::to_owned);

        let mut request = self
            .http
            .post(format!("{}{SESSION_PATH}", self.base_url))
            .header(REFERER, self.referer())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let reply = Reply::from_body(status, &response.bytes()?);

        match &reply.fault {
            None => rpc_debug!("{method} {args:?} -> {status}"),
            Some(fault) => rpc_info!("{method} {args:?} -> {status}, fault: {}", fault.message),
        }

        Ok(reply)
    }

    /// Like [`call`](Self::call), but any non-success is an `Error::Remote`.
    pub fn command(&self, method: &str, args: &[Value], options: &Options) -> Result<()> {
        self.call(method, args, options)?.check(method)
    }

    /// `Some(reply)` if logging in was needed and failed.
    fn ensure_authenticated(&self) -> Result<Option<Reply>> {
        if self.is_authenticated() {
            return Ok(None);
        }

        let reply = self.login()?;
        if reply.is_success() {
            Ok(None)
        } else {
            Ok(Some(reply))
        }
    }

    fn login(&self) -> Result<Reply> {
        rpc_debug!(
            "logging in to {} as {}",
            self.base_url,
            self.identity.admin
        );

        let response = self
            .http
            .post(format!("{}{LOGIN_PATH}", self.base_url))
            .header(REFERER, self.referer())
            .header(ACCEPT, "text/plain")
            .form(&[
                ("user", self.identity.admin.as_str()),
                ("password", self.identity.password.as_str()),
            ])
            .send()?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            rpc_warn!("login as {} failed with {status}", self.identity.admin);
            return Ok(Reply::status_only(status));
        }

        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(session_cookie);

        match cookie {
            Some(cookie) => {
                self.session.borrow_mut().store(cookie);
                Ok(Reply::status_only(status))
            }
            None => Err(Error::Remote {
                method: LOGIN_METHOD.to_string(),
                status: status.into(),
                message: format!("no {SESSION_COOKIE} cookie in login response"),
            }),
        }
    }

    fn referer(&self) -> String {
        format!("{}/ipa", self.base_url)
    }
}

fn http_client(tls: &TlsMode) -> Result<Client> {
    let builder = Client::builder();
    let builder = match tls {
        TlsMode::Insecure => builder.danger_accept_invalid_certs(true),
        TlsMode::Verify { ca_cert } => {
            let pem = fs::read(ca_cert).map_err(Error::io(ca_cert))?;
            builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?)
        }
    };

    Ok(builder.build()?)
}
