use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::{ReqwrapError, Result, SessionOptions};

/// Reusable connection context: keep-alive pool, cookie store and default
/// headers shared by every request sent through it.
///
/// Cloning is cheap and every clone refers to the same underlying pool.
/// A session handed to [`wrapped_request`](crate::wrapped_request) by the
/// caller is never closed by this crate.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: reqwest::Client,
    options: SessionOptions,
    closed: AtomicBool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.inner.options)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Session {
    /// Creates a session with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(SessionOptions::default())
    }

    /// Creates a session from explicit options.
    pub fn with_options(options: SessionOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(options.cookie_store)
            .default_headers(options.default_headers.clone());
        if let Some(ms) = options.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = options.pool_idle_timeout_ms {
            builder = builder.pool_idle_timeout(Duration::from_millis(ms));
        }
        if let Some(user_agent) = &options.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let http = builder.build().map_err(ReqwrapError::Build)?;

        tracing::debug!(cookie_store = options.cookie_store, "session created");
        Ok(Self {
            inner: Arc::new(SessionInner {
                http,
                options,
                closed: AtomicBool::new(false),
            }),
        })
    }

    pub fn options(&self) -> &SessionOptions {
        &self.inner.options
    }

    /// Closes the session. New fetches fail with
    /// [`ReqwrapError::SessionClosed`]; responses already handed out stay
    /// readable until they are dropped.
    ///
    /// Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        let first = !self.inner.closed.swap(true, Ordering::AcqRel);
        if first {
            tracing::debug!("session closed");
        }
        first
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub(crate) fn http(&self) -> Result<&reqwest::Client> {
        if self.is_closed() {
            return Err(ReqwrapError::SessionClosed);
        }
        Ok(&self.inner.http)
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::{ReqwrapError, SessionOptions};

    #[test]
    fn close_is_idempotent_and_shared_across_clones() {
        let session = Session::new().expect("default session must build");
        let clone = session.clone();

        assert!(!clone.is_closed());
        assert!(session.close());
        assert!(!session.close());
        assert!(clone.is_closed());
        assert!(matches!(clone.http(), Err(ReqwrapError::SessionClosed)));
    }

    #[test]
    fn options_are_kept() {
        let session = Session::with_options(SessionOptions {
            user_agent: Some("custom-agent/1".to_owned()),
            ..SessionOptions::default()
        })
        .unwrap();
        assert_eq!(session.options().user_agent.as_deref(), Some("custom-agent/1"));
    }

    #[test]
    fn invalid_user_agent_fails_to_build() {
        let err = Session::with_options(SessionOptions {
            user_agent: Some("bad\nagent".to_owned()),
            ..SessionOptions::default()
        })
        .expect_err("newline is not a valid header value");
        assert!(matches!(err, ReqwrapError::Build(_)));
    }

    #[test]
    fn debug_shows_closed_state() {
        let session = Session::new().unwrap();
        session.close();
        assert!(format!("{session:?}").contains("closed: true"));
    }
}
