//! `reqwrap` runs one logical HTTP request with predicate-driven retries and
//! guaranteed cleanup.
//!
//! - [`wrapped_request`] sends a [`RequestSpec`] under a [`RetryPolicy`],
//!   re-attempting every response the policy flags, and returns the first one
//!   it accepts.
//! - [`RequestContext`] is the scope behind it: dropping it, on any path,
//!   releases intermediate responses and closes the [`Session`] it created.
//! - [`logging::configure_logger`] installs a process-wide log subscriber.
//!
//! Transport failures and timeouts are never retried; only completed
//! responses are judged by the predicate.

mod context;
mod error;
pub mod logging;
mod options;
mod policy;
pub mod pretty;
mod request;
mod response;
mod session;
mod transport;

pub use context::{wrapped_request, AttemptState, RequestContext};
pub use error::ReqwrapError;
pub use options::SessionOptions;
pub use policy::RetryPolicy;
pub use pretty::{prettify_request, prettify_response};
pub use request::RequestSpec;
pub use response::Response;
pub use session::Session;
pub use transport::fetch;

pub use reqwest::{header, Method, StatusCode};

pub type Result<T> = std::result::Result<T, ReqwrapError>;
