use crate::{pretty::prettify_request, ReqwrapError, RequestSpec, Response, Result, Session};

/// Sends `spec` once over `session`, with no retry of any kind.
///
/// A timeout on `spec` bounds the time from dispatch until the
/// response headers arrive; reading the body afterwards is not bounded.
pub async fn fetch(spec: &RequestSpec, session: &Session) -> Result<Response> {
    fetch_attempt(spec, session, 1).await
}

pub(crate) async fn fetch_attempt(
    spec: &RequestSpec,
    session: &Session,
    attempt: usize,
) -> Result<Response> {
    let http = session.http()?;

    let mut builder = http
        .request(spec.method().clone(), spec.url())
        .headers(spec.headers().clone());
    if !spec.query_pairs().is_empty() {
        builder = builder.query(spec.query_pairs());
    }
    if let Some(body) = spec.body_bytes() {
        builder = builder.body(body.clone());
    }
    let request = builder.build().map_err(ReqwrapError::InvalidRequest)?;

    tracing::debug!(attempt, request = %spec, "sending request");

    let pending = http.execute(request);
    let sent = match spec.timeout_duration() {
        Some(timeout) => match tokio::time::timeout(timeout, pending).await {
            Ok(sent) => sent,
            Err(_) => {
                return Err(ReqwrapError::Timeout {
                    timeout: Some(timeout),
                    request: prettify_request(spec),
                })
            }
        },
        None => pending.await,
    };

    let response = sent.map_err(|err| classify_send_error(err, spec))?;
    tracing::debug!(
        attempt,
        status = response.status().as_u16(),
        "received response"
    );
    Ok(Response::new(response, attempt, session.clone()))
}

fn classify_send_error(err: reqwest::Error, spec: &RequestSpec) -> ReqwrapError {
    if err.is_timeout() {
        ReqwrapError::Timeout {
            timeout: None,
            request: prettify_request(spec),
        }
    } else if err.is_builder() {
        ReqwrapError::InvalidRequest(err)
    } else {
        ReqwrapError::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::fetch;
    use crate::{ReqwrapError, RequestSpec, Session};

    #[tokio::test]
    async fn unparsable_url_is_invalid_request() {
        let session = Session::new().unwrap();
        let err = fetch(&RequestSpec::get("not a url"), &session)
            .await
            .expect_err("url must be rejected");
        assert!(matches!(err, ReqwrapError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn closed_session_refuses_fetch() {
        let session = Session::new().unwrap();
        session.close();
        let err = fetch(&RequestSpec::get("http://127.0.0.1:9/"), &session)
            .await
            .expect_err("closed session must not send");
        assert!(matches!(err, ReqwrapError::SessionClosed));
    }
}
