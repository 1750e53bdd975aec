use std::time::Duration;

use reqwest::{
    Client, ClientBuilder,
    header::{self, HeaderMap, HeaderValue},
    redirect,
};

use crate::{Error, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

/// Builder for the shared portal HTTP client
pub struct PortalClientBuilder {
    pub client_builder: ClientBuilder,
    pub name: String,
}

/// Built client plus the portal name used in error messages
pub struct PortalClient {
    pub client: Client,
    pub name: String,
}

impl PortalClientBuilder {
    /// Browser-like client that never follows redirects; the login flow
    /// reads cookies and `Location` headers off the redirect responses.
    pub fn new(name: impl Into<String>) -> Self {
        let client_builder = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(
                    header::ACCEPT,
                    HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,\
                         image/avif,image/webp,image/apng,*/*;q=0.8",
                    ),
                );
                headers.insert(
                    header::ACCEPT_LANGUAGE,
                    HeaderValue::from_static("en-US,en;q=0.9"),
                );
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
                headers.insert(header::DNT, HeaderValue::from_static("1"));
                headers.insert(
                    header::UPGRADE_INSECURE_REQUESTS,
                    HeaderValue::from_static("1"),
                );
                headers
            });

        Self {
            client_builder,
            name: name.into(),
        }
    }

    pub fn timeout(mut self, timeout_secs: Option<u64>) -> Self {
        if let Some(secs) = timeout_secs {
            self.client_builder = self.client_builder.timeout(Duration::from_secs(secs));
        }
        self
    }

    pub fn build(self) -> Result<PortalClient> {
        let client = self.client_builder.build()?;

        Ok(PortalClient {
            client,
            name: self.name,
        })
    }
}

impl PortalClient {
    /// Common request error mapping
    pub fn handle_error_req(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout
        } else if error.is_request() || error.is_connect() {
            Error::Portal(format!("{}: request failed: {}", self.name, error))
        } else {
            Error::Http(error)
        }
    }

    /// Portal error tagged with the client name
    pub fn custom_error(&self, message: impl Into<String>) -> Error {
        Error::Portal(format!("{}: {}", self.name, message.into()))
    }
}

/// `name=value` pairs from every `Set-Cookie` header of a response
pub fn response_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Render cookie pairs as a `Cookie` request header value
pub fn cookie_header<'a>(cookies: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    cookies
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}
