use tokio::time::sleep;

use crate::{
    pretty::{prettify_request, prettify_response},
    transport::fetch_attempt,
    ReqwrapError, RequestSpec, Response, Result, RetryPolicy, Session,
};

/// Where a [`RequestContext`] is in its lifecycle.
///
/// `Init -> Fetching -> (RetryWait -> Fetching)* -> Success | Exhausted | TransportFailed`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttemptState {
    /// Created, nothing sent yet.
    Init,
    /// An attempt is in flight.
    Fetching,
    /// A flagged response is held while the delay and callback run.
    RetryWait,
    /// A response was accepted and handed to the caller.
    Success,
    /// Every attempt was flagged.
    Exhausted,
    /// An attempt failed below the HTTP response level.
    TransportFailed,
}

impl AttemptState {
    /// Returns `true` once no further attempt can follow.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Success | Self::Exhausted | Self::TransportFailed
        )
    }
}

enum SessionSlot<'a> {
    Borrowed(&'a Session),
    Owned(Session),
}

impl SessionSlot<'_> {
    fn get(&self) -> &Session {
        match self {
            Self::Borrowed(session) => session,
            Self::Owned(session) => session,
        }
    }
}

/// One execution of a request under a retry policy.
///
/// The context is the cleanup scope: when it is dropped, on any path
/// including errors, panics in caller hooks and cancellation of the
/// [`execute`](RequestContext::execute) future, it releases the response it
/// still holds and closes the session if it created it. A response returned
/// by `execute` belongs to the caller and is not touched.
pub struct RequestContext<'a> {
    spec: &'a RequestSpec,
    policy: &'a RetryPolicy,
    session: SessionSlot<'a>,
    response: Option<Response>,
    attempt: usize,
    state: AttemptState,
    failure: Option<(&'static str, String)>,
}

impl<'a> RequestContext<'a> {
    /// Creates a context. Without a caller session a fresh one is created and
    /// closed again when the context goes away.
    pub fn new(
        spec: &'a RequestSpec,
        policy: &'a RetryPolicy,
        session: Option<&'a Session>,
    ) -> Result<Self> {
        let session = match session {
            Some(session) => SessionSlot::Borrowed(session),
            None => SessionSlot::Owned(owned_session(Session::new())?),
        };
        Ok(Self::with_slot(spec, policy, session))
    }

    /// Creates a context that takes ownership of `session` and closes it on
    /// scope exit.
    pub fn owning(spec: &'a RequestSpec, policy: &'a RetryPolicy, session: Session) -> Self {
        Self::with_slot(spec, policy, SessionSlot::Owned(session))
    }

    fn with_slot(
        spec: &'a RequestSpec,
        policy: &'a RetryPolicy,
        session: SessionSlot<'a>,
    ) -> Self {
        tracing::debug!(
            request = %spec,
            max_attempts = policy.attempts(),
            owns_session = matches!(session, SessionSlot::Owned(_)),
            "request context created"
        );
        Self {
            spec,
            policy,
            session,
            response: None,
            attempt: 0,
            state: AttemptState::Init,
            failure: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// Number of attempts flagged for retry so far.
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Session the attempts are sent through, owned or borrowed.
    pub fn session(&self) -> &Session {
        self.session.get()
    }

    /// Runs the request to a terminal state.
    ///
    /// Returns the first response the policy does not flag. Fails with
    /// [`ReqwrapError::RetryExhausted`] once every attempt was flagged, and
    /// with the transport error, unretried, if an attempt could not complete.
    pub async fn execute(mut self) -> Result<Response> {
        let result = self.run().await;
        if let Err(err) = &result {
            self.failure = Some((err.kind(), err.to_string()));
        }
        result
    }

    async fn run(&mut self) -> Result<Response> {
        let max_attempts = self.policy.attempts();
        loop {
            self.state = AttemptState::Fetching;
            tracing::info!(
                attempt = self.attempt + 1,
                max_attempts,
                "sending attempt {}/{}",
                self.attempt + 1,
                max_attempts
            );

            let response = match fetch_attempt(self.spec, self.session(), self.attempt + 1).await
            {
                Ok(response) => response,
                Err(err) => {
                    self.state = AttemptState::TransportFailed;
                    return Err(err);
                }
            };

            if !self.policy.wants_retry(&response) {
                self.state = AttemptState::Success;
                tracing::debug!(response = %prettify_response(&response), "request succeeded");
                return Ok(response);
            }

            self.attempt += 1;
            let status = response.status().as_u16();

            if self.attempt >= max_attempts {
                self.state = AttemptState::Exhausted;
                response.close();
                tracing::warn!(
                    attempts = self.attempt,
                    status,
                    "retry attempts exhausted"
                );
                return Err(ReqwrapError::RetryExhausted {
                    attempts: self.attempt,
                    status,
                    request: prettify_request(self.spec),
                });
            }

            self.state = AttemptState::RetryWait;
            self.response = Some(response);
            tracing::warn!(
                attempt = self.attempt,
                max_attempts,
                status,
                "retrying request ({}/{})",
                self.attempt,
                max_attempts
            );

            if let Some(delay) = self.policy.delay() {
                tracing::debug!(?delay, "sleeping before retry");
                sleep(delay).await;
            }

            if let Some(response) = &self.response {
                if self.policy.notify_retry(response) {
                    tracing::debug!(status, "pre-retry callback invoked");
                }
            }

            self.release_response();
        }
    }

    fn release_response(&mut self) {
        if let Some(response) = self.response.take() {
            response.close();
        }
    }
}

impl Drop for RequestContext<'_> {
    fn drop(&mut self) {
        self.release_response();
        if let SessionSlot::Owned(session) = &self.session {
            session.close();
        }

        if std::thread::panicking() {
            tracing::error!(state = ?self.state, "request scope unwound by a panic");
        } else if let Some((kind, message)) = &self.failure {
            tracing::error!(kind = *kind, "error during request: {message}");
        } else if !self.state.is_terminal() && self.state != AttemptState::Init {
            tracing::warn!(state = ?self.state, "request scope dropped before completion");
        }
    }
}

fn owned_session(built: Result<Session>) -> Result<Session> {
    built.map_err(|err| {
        tracing::error!(kind = err.kind(), "error during request: {err}");
        err
    })
}

/// Executes `spec` under `policy`, retrying flagged responses, and cleans up
/// everything it opened before returning.
///
/// Pass `Some(session)` to reuse a connection context (and its cookies); it is
/// never closed here. With `None` a session is created for this call and
/// closed once the call ends, though the returned response stays readable.
///
/// ```no_run
/// use reqwrap::{wrapped_request, RequestSpec, RetryPolicy};
///
/// # async fn run() -> reqwrap::Result<()> {
/// let spec = RequestSpec::get("https://example.com/gainers");
/// let policy = RetryPolicy::new().should_retry(|r| r.status() != 200);
/// let response = wrapped_request(&spec, &policy, None).await?;
/// println!("{}", response.text().await?);
/// # Ok(())
/// # }
/// ```
pub async fn wrapped_request(
    spec: &RequestSpec,
    policy: &RetryPolicy,
    session: Option<&Session>,
) -> Result<Response> {
    RequestContext::new(spec, policy, session)?.execute().await
}
