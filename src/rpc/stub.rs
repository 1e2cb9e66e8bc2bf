//! A canned-response HTTP server for exercising the client without an
//! identity server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

pub(crate) struct Canned {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Canned {
    pub(crate) fn ok(body: &str) -> Self {
        Canned {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub(crate) fn status(status: u16) -> Self {
        Canned {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// a successful login handing out `ipa_session=<token>`
    pub(crate) fn login(token: &str) -> Self {
        Canned::ok("").header(
            "Set-Cookie",
            &format!("ipa_session={token}; Domain=localhost; Path=/ipa; HttpOnly"),
        )
    }

    pub(crate) fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Recorded {
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: String,
}

impl Recorded {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub(crate) struct Stub {
    pub(crate) url: String,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }
}

/// Answer one connection per canned response, in order. Requests beyond
/// the canned ones are recorded and answered with a 500 naming the surplus.
pub(crate) fn serve(responses: Vec<Canned>) -> Stub {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let recorded = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&recorded);
    thread::spawn(move || {
        let count = responses.len();
        let mut responses = responses.into_iter();
        loop {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let canned = responses.next().unwrap_or_else(|| Canned {
                status: 500,
                headers: Vec::new(),
                body: format!(
                    r#"{{"error": {{"code": 500, "name": "StubExhausted", "message": "no canned response left after {count}"}}}}"#
                ),
            });
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let path = request_line
                .split_whitespace()
                .nth(1)
                .unwrap_or_default()
                .to_string();

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    headers.push((name.trim().to_string(), value.trim().to_string()));
                }
            }

            let length = headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.parse().ok())
                .unwrap_or(0);
            let mut body = vec![0; length];
            reader.read_exact(&mut body).unwrap();

            log.lock().unwrap().push(Recorded {
                path,
                headers,
                body: String::from_utf8_lossy(&body).into_owned(),
            });

            let mut response = format!("HTTP/1.1 {} Canned\r\n", canned.status);
            for (name, value) in &canned.headers {
                response.push_str(&format!("{name}: {value}\r\n"));
            }
            response.push_str(&format!(
                "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                canned.body.len(),
                canned.body
            ));

            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
    });

    Stub { url, recorded }
}
