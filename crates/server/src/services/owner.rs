//! Owner resolution.
//!
//! An explicit customer id always wins. Otherwise the anonymous session id
//! is taken from, in order: the `x-session-id` header, the `mb_session`
//! cookie, the body's `session_id`, the query's `session_id`.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use tower_sessions::cookie::Cookie;

use moonbox_core::Owner;

/// Header carrying the anonymous session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Cookie carrying the anonymous session id.
pub const SESSION_COOKIE: &str = "mb_session";

/// Request locations that may carry a session id.
#[derive(Debug, Default, Clone)]
pub struct SessionSources {
    pub header: Option<String>,
    pub cookie: Option<String>,
    pub body: Option<String>,
    pub query: Option<String>,
}

impl SessionSources {
    /// Header and cookie sources from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Self {
            header,
            cookie: session_cookie(headers),
            body: None,
            query: None,
        }
    }

    /// Attach a `session_id` taken from the request body.
    #[must_use]
    pub fn with_body(mut self, session_id: Option<String>) -> Self {
        self.body = session_id;
        self
    }

    /// Attach a `session_id` taken from the query string.
    #[must_use]
    pub fn with_query(mut self, session_id: Option<String>) -> Self {
        self.query = session_id;
        self
    }

    /// First non-empty source in priority order.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        [&self.header, &self.cookie, &self.body, &self.query]
            .into_iter()
            .filter_map(Option::as_deref)
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

/// Produce the owner for a request, or `None` if no identity is present.
#[must_use]
pub fn resolve_owner(customer_id: Option<&str>, sources: &SessionSources) -> Option<Owner> {
    if let Some(customer) = customer_id.map(str::trim).filter(|c| !c.is_empty()) {
        return Some(Owner::Customer(customer.to_owned()));
    }
    sources
        .session_id()
        .map(|session| Owner::Session(session.to_owned()))
}
