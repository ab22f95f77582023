//! Authenticated access to the LMS REST API
//!
//! Every call carries `Authorization: Bearer <token>`. List calls ask for
//! 100 entries per page and follow `Link: <...>; rel="next"` headers until
//! the listing is exhausted.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result, excerpt};
use crate::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};

/// Entries requested per page for list calls
pub const PAGE_SIZE: &str = "100";

/// Upper bound on followed pages, guarding against a server that keeps
/// linking to itself.
const MAX_PAGES: usize = 10_000;

/// A handle on one LMS account: base URL, credentials and transport.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct Api {
    base_url: String,
    token: String,
    client: Arc<dyn HttpClient>,
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Api {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, client: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: token.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &Arc<dyn HttpClient> {
        &self.client
    }

    /// Absolute URL for a path below the API root.
    pub fn url<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment.as_ref()));
        }
        url
    }

    /// An authenticated request for a path below the API root.
    pub fn request<S: AsRef<str>>(&self, method: HttpMethod, segments: &[S]) -> HttpRequest {
        self.authorize(HttpRequest::new(method, self.url(segments)))
    }

    /// Attach this account's credentials to a request for an arbitrary URL.
    pub fn authorize(&self, request: HttpRequest) -> HttpRequest {
        request.bearer_token(&self.token)
    }

    /// Execute a request, returning the response whatever its status.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.client.execute(request)
    }

    /// Execute a request and require a 2xx status.
    pub fn send_checked(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method;
        let url = request.full_url();
        let response = self.client.execute(request)?;
        if response.is_success() {
            return Ok(response);
        }
        let body = excerpt(&response.text());
        if method.is_mutating() {
            warn!(method = method.as_str(), url = %url, status = response.status, body = %body, "Remote write rejected");
        } else {
            debug!(method = method.as_str(), url = %url, status = response.status, "Remote read failed");
        }
        Err(Error::Status {
            method: method.as_str().to_string(),
            url,
            status: response.status,
            body,
        })
    }

    /// Execute a request and decode its JSON body. An empty body decodes
    /// as `null`.
    pub fn send_json(&self, request: HttpRequest) -> Result<Value> {
        let url = request.full_url();
        let response = self.send_checked(request)?;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        response.json().map_err(|e| Error::decode(url, e))
    }

    /// GET a single JSON document.
    pub fn get_json<S: AsRef<str>>(&self, segments: &[S], query: &[(&str, &str)]) -> Result<Value> {
        let mut request = self.request(HttpMethod::Get, segments);
        for (k, v) in query {
            request = request.query(*k, *v);
        }
        self.send_json(request)
    }

    /// GET every page of a listing and concatenate the entries.
    pub fn get_all<S: AsRef<str>>(&self, segments: &[S], query: &[(&str, &str)]) -> Result<Vec<Value>> {
        let mut request = self
            .request(HttpMethod::Get, segments)
            .query("per_page", PAGE_SIZE);
        for (k, v) in query {
            request = request.query(*k, *v);
        }

        let mut entries = Vec::new();
        for _ in 0..MAX_PAGES {
            let url = request.full_url();
            let response = self.send_checked(request)?;
            let page: Value = response.json().map_err(|e| Error::decode(&url, e))?;
            match page {
                Value::Array(items) => entries.extend(items),
                other => {
                    return Err(Error::unexpected(
                        url,
                        format!("expected a list, got {}", type_name(&other)),
                    ));
                }
            }

            match response.header("link").and_then(next_link) {
                Some(next) => {
                    request = self.authorize(HttpRequest::new(HttpMethod::Get, next));
                }
                None => return Ok(entries),
            }
        }

        warn!(url = %self.url(segments), "Pagination limit reached");
        Ok(entries)
    }

    /// POST a JSON body and decode the JSON reply.
    pub fn post_json<S: AsRef<str>>(&self, segments: &[S], body: &Value) -> Result<Value> {
        self.send_json(self.request(HttpMethod::Post, segments).json(body)?)
    }

    /// PUT a JSON body and decode the JSON reply.
    pub fn put_json<S: AsRef<str>>(&self, segments: &[S], body: &Value) -> Result<Value> {
        self.send_json(self.request(HttpMethod::Put, segments).json(body)?)
    }

    /// DELETE a resource and decode the JSON reply.
    pub fn delete<S: AsRef<str>>(&self, segments: &[S]) -> Result<Value> {
        self.send_json(self.request(HttpMethod::Delete, segments))
    }

    /// Probe `users/self` and return the raw response.
    ///
    /// Used to validate configuration: 404 points at a wrong base URL, 401
    /// at a bad token.
    pub fn whoami(&self) -> Result<HttpResponse> {
        self.send(self.request(HttpMethod::Get, &["users", "self"]))
    }
}

/// Extract the `rel="next"` target from an RFC 5988 `Link` header.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == r#"rel="next""# || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
