//! Blocking REST session for the Nexus API
//!
//! One session is built per invocation and carries the base URL, basic-auth
//! credentials, and default XML headers for every call. All I/O is
//! synchronous; callers see either the response body (when the status matches
//! the operation's expectation) or a typed error.

use crate::config::Environment;
use crate::error::{CliError, Result};
use reqwest::blocking::{Body, Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;

/// Synchronous HTTP session against one Nexus server
pub struct Session {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
    debug: bool,
}

impl Session {
    /// Build a session for the given environment
    pub fn new(environment: &Environment, name: &str, debug: bool) -> Result<Self> {
        // Staging and group endpoints speak XML unless a call overrides the
        // headers; request-level headers take precedence over these.
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!environment.ssl_verify)
            .build()?;

        Ok(Self {
            client,
            base_url: environment.url.trim_end_matches('/').to_string(),
            credentials: environment.credentials(name)?,
            debug,
        })
    }

    /// Whether debug tracing is enabled
    pub fn debug(&self) -> bool {
        self.debug
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((username, password)) => builder.basic_auth(username, Some(password)),
            None => builder,
        }
    }

    fn trace(&self, method: &str, path: &str) {
        if self.debug {
            println!("{method} {}", self.url(path));
        }
    }

    /// GET expecting 200; returns the response body
    pub fn get(&self, path: &str) -> Result<String> {
        self.trace("GET", path);
        let response = self.authorize(self.client.get(self.url(path))).send()?;
        self.expect_body("GET", path, response, StatusCode::OK)
    }

    /// GET expecting 200, tolerating 404 as `None`
    pub fn get_optional(&self, path: &str) -> Result<Option<String>> {
        self.trace("GET", path);
        let response = self.authorize(self.client.get(self.url(path))).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.expect_body("GET", path, response, StatusCode::OK)
            .map(Some)
    }

    /// GET a JSON document expecting 200
    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.trace("GET", path);
        let response = self
            .authorize(self.client.get(self.url(path)))
            .header(ACCEPT, "application/json")
            .send()?;
        let body = self.expect_body("GET", path, response, StatusCode::OK)?;
        serde_json::from_str(&body).map_err(|e| CliError::InvalidResponse(e.to_string()))
    }

    /// HEAD existence check: 200 → true, 404 → false, anything else fails
    pub fn exists(&self, path: &str) -> Result<bool> {
        self.trace("HEAD", path);
        let response = self.authorize(self.client.head(self.url(path))).send()?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(CliError::UnexpectedStatus {
                method: "HEAD",
                path: path.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    /// POST an XML body expecting 201; returns the response body
    pub fn post(&self, path: &str, body: String) -> Result<String> {
        self.trace("POST", path);
        let response = self
            .authorize(self.client.post(self.url(path)))
            .body(body)
            .send()?;
        self.expect_body("POST", path, response, StatusCode::CREATED)
    }

    /// POST an XML body without status validation, returning status and body.
    ///
    /// Only transport failures are errors; callers inspect the status
    /// themselves. Used where a rejection carries server-reported messages
    /// that should be surfaced rather than turned into a hard failure.
    pub fn post_lenient(&self, path: &str, body: String) -> Result<(u16, String)> {
        self.trace("POST", path);
        let response = self
            .authorize(self.client.post(self.url(path)))
            .header(ACCEPT, "application/json")
            .body(body)
            .send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        Ok((status, text))
    }

    /// POST a JSON body expecting 201
    pub fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        self.trace("POST", path);
        let response = self
            .authorize(self.client.post(self.url(path)))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()?;
        self.expect_body("POST", path, response, StatusCode::CREATED)
    }

    /// POST a file's bytes expecting 201, streaming from disk
    pub fn post_file(&self, path: &str, file: &Path, content_type: &str) -> Result<()> {
        self.trace("POST", path);
        let handle = File::open(file).map_err(|e| CliError::File {
            path: file.to_path_buf(),
            reason: e.to_string(),
        })?;
        let len = handle
            .metadata()
            .map_err(|e| CliError::File {
                path: file.to_path_buf(),
                reason: e.to_string(),
            })?
            .len();

        let response = self
            .authorize(self.client.post(self.url(path)))
            .header(CONTENT_TYPE, content_type)
            .body(Body::sized(handle, len))
            .send()?;
        self.expect_body("POST", path, response, StatusCode::CREATED)?;
        Ok(())
    }

    /// PUT an XML body expecting 200; returns the response body
    pub fn put(&self, path: &str, body: String) -> Result<String> {
        self.trace("PUT", path);
        let response = self
            .authorize(self.client.put(self.url(path)))
            .body(body)
            .send()?;
        self.expect_body("PUT", path, response, StatusCode::OK)
    }

    /// DELETE expecting 204
    pub fn delete(&self, path: &str) -> Result<()> {
        self.trace("DELETE", path);
        let response = self.authorize(self.client.delete(self.url(path))).send()?;
        self.expect_body("DELETE", path, response, StatusCode::NO_CONTENT)?;
        Ok(())
    }

    fn expect_body(
        &self,
        method: &'static str,
        path: &str,
        response: reqwest::blocking::Response,
        expect: StatusCode,
    ) -> Result<String> {
        let status = response.status();
        if status != expect {
            if self.debug {
                let body = response.text().unwrap_or_default();
                println!("Response ({status}):\n{body}");
            }
            return Err(CliError::UnexpectedStatus {
                method,
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text()?;
        if self.debug {
            println!("Response ({status}):\n{body}");
        }
        Ok(body)
    }
}
