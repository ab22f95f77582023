//! HTTP client implementation using reqwest

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm};

/// Reqwest-based blocking HTTP client.
///
/// Redirects are not followed: the file upload protocol needs to see the
/// redirect and follow it with credentials attached.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a client with default timeouts.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(60))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("coursework/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::transport("<client>", e))?;
        Ok(Self { client })
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    fn convert_form(form: MultipartForm, url: &str) -> Result<Form> {
        let file = Part::bytes(form.content)
            .file_name(form.filename)
            .mime_str("application/octet-stream")
            .map_err(|e| Error::transport(url, e))?;
        Ok(form
            .fields
            .into_iter()
            .fold(Form::new(), |acc, (key, value)| acc.text(key, value))
            .part(form.file_field, file))
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.full_url();
        debug!(method = request.method.as_str(), url = %url, "HTTP request");

        let mut builder = self
            .client
            .request(Self::convert_method(request.method), &url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(form) = request.multipart {
            builder = builder.multipart(Self::convert_form(form, &url)?);
        } else if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().map_err(|e| Error::transport(&url, e))?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.as_str().to_lowercase(), s.to_string())))
            .collect();
        let body = response
            .bytes()
            .map_err(|e| Error::transport(&url, e))?
            .to_vec();

        debug!(status, url = %url, "HTTP response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_form_is_built_for_any_file_name() {
        let form = MultipartForm::new("file", "deck \"v2\"\r\n.html", b"<html/>".to_vec()).text("key", "abc");
        let form = ReqwestHttpClient::convert_form(form, "https://files.test/upload/1").unwrap();
        assert!(!form.boundary().is_empty());
    }
}
