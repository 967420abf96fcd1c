//! Session cookie reading and emission.
//!
//! The cookie only carries the identifier; everything else lives in the
//! session record.

use crate::domain::config::SessionConfig;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use shared_types::SessionId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    secure: bool,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.cookie_name.clone(), config.cookie_secure)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the session cookie, if the request carries one.
    ///
    /// The first occurrence wins when a client sends the name twice.
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim_matches('"').to_string())
            .filter(|value| !value.is_empty())
    }

    /// `Set-Cookie` value binding the client to `id`.
    pub fn issue(&self, id: &SessionId) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!("{}={}{}", self.name, id.as_str(), self.attributes())).ok()
    }

    /// `Set-Cookie` value deleting the cookie.
    pub fn expire(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!("{}=; Max-Age=0{}", self.name, self.attributes())).ok()
    }

    pub fn attach(&self, response: &mut Response, id: &SessionId) {
        if let Some(value) = self.issue(id) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    pub fn attach_expired(&self, response: &mut Response) {
        if let Some(value) = self.expire() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    fn attributes(&self) -> &'static str {
        if self.secure {
            "; Path=/; HttpOnly; SameSite=Strict; Secure"
        } else {
            "; Path=/; HttpOnly; SameSite=Strict"
        }
    }
}
