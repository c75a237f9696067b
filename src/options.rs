use reqwest::header::HeaderMap;

/// Configures the connection context behind a [`Session`](crate::Session).
#[derive(Clone, Debug, PartialEq)]
pub struct SessionOptions {
    /// Connect timeout in milliseconds. `None` leaves it unbounded.
    pub connect_timeout_ms: Option<u64>,
    /// How long idle keep-alive connections stay pooled, in milliseconds.
    pub pool_idle_timeout_ms: Option<u64>,
    /// Value of the `User-Agent` header sent with every request.
    pub user_agent: Option<String>,
    /// Keeps cookies set by responses and replays them on later requests.
    pub cookie_store: bool,
    /// Headers merged into every request sent through the session.
    pub default_headers: HeaderMap,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: None,
            pool_idle_timeout_ms: Some(90_000),
            user_agent: Some(concat!("reqwrap/", env!("CARGO_PKG_VERSION")).to_owned()),
            cookie_store: true,
            default_headers: HeaderMap::new(),
        }
    }
}
