//! HTTP client for CalDAV operations.
//!
//! Wraps a reqwest client with the WebDAV verbs the source needs
//! (PROPFIND and REPORT), Basic authentication and status mapping to
//! source errors.

use reqwest::{Client, Method, Response, StatusCode};
use tracing::{trace, warn};

use crate::error::{SourceError, SourceResult};

use super::config::CalDavConfig;

/// HTTP client for CalDAV operations.
pub struct CalDavClient {
    client: Client,
    config: CalDavConfig,
}

impl CalDavClient {
    /// Creates a new CalDAV client with the given configuration.
    pub fn new(config: CalDavConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| SourceError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Performs a PROPFIND request.
    ///
    /// Used for calendar discovery.
    pub async fn propfind(&self, url: &str, body: &str, depth: u8) -> SourceResult<String> {
        self.request("PROPFIND", url, body, depth).await
    }

    /// Performs a REPORT request.
    ///
    /// Used for calendar-query.
    pub async fn report(&self, url: &str, body: &str) -> SourceResult<String> {
        self.request("REPORT", url, body, 1).await
    }

    async fn request(&self, method: &str, url: &str, body: &str, depth: u8) -> SourceResult<String> {
        let http_method = Method::from_bytes(method.as_bytes())
            .map_err(|_| SourceError::internal(format!("Invalid HTTP method: {}", method)))?;

        let mut request = self
            .client
            .request(http_method, url)
            .header("Content-Type", "application/xml; charset=utf-8")
            .header("Depth", depth.to_string())
            .body(body.to_string());

        // Credentials go on every request; CalDAV servers validate each one.
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            request = request.basic_auth(username, Some(password));
        }

        trace!(method = %method, url = %url, "Sending request");

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::network(format!("Request failed: {}", e)))?;

        self.handle_response(response).await
    }

    /// Handles the HTTP response and extracts the body.
    async fn handle_response(&self, response: Response) -> SourceResult<String> {
        let status = response.status();
        trace!(status = %status, "Received response");

        match status {
            StatusCode::OK | StatusCode::MULTI_STATUS => response
                .text()
                .await
                .map_err(|e| SourceError::network(format!("Failed to read response: {}", e))),
            StatusCode::UNAUTHORIZED => Err(SourceError::authentication(
                "Authentication failed: invalid credentials",
            )),
            StatusCode::FORBIDDEN => Err(SourceError::authorization("Access denied to calendar")),
            StatusCode::NOT_FOUND => Err(SourceError::not_found("Calendar or resource not found")),
            s if s.is_server_error() => {
                let body = response.text().await.unwrap_or_default();
                Err(SourceError::server(format!(
                    "Server error ({}): {}",
                    s, body
                )))
            }
            s => {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %s, body = %body, "Unexpected response status");
                Err(SourceError::invalid_response(format!(
                    "Unexpected status {}: {}",
                    s, body
                )))
            }
        }
    }

    /// Returns the base URL from the configuration.
    pub fn base_url(&self) -> &str {
        self.config.url_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn client_creation() {
        let config = CalDavConfig::new("https://caldav.example.com/")
            .unwrap()
            .with_credentials("user", "pass")
            .with_timeout(Duration::from_secs(10));

        let client = CalDavClient::new(config);
        assert!(client.is_ok());
    }

    #[test]
    fn client_base_url() {
        let config = CalDavConfig::new("https://caldav.example.com/calendars/").unwrap();
        let client = CalDavClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://caldav.example.com/calendars/");
    }
}
