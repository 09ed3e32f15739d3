//! Deadlines around calls to external collaborators.
//!
//! A flow fixes one [`Instant`] when it starts and every call it makes is
//! bounded by that same instant, so the budget is shared across the flow.

use crate::error::AuthError;
use crate::notifier::NotifierError;
use auth_data::AuthDataError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, warn};

/// Earliest of `now + limit` and the caller's deadline, if any.
pub(crate) fn flow_deadline(limit: Duration, external: Option<Instant>) -> Instant {
    let own = Instant::now() + limit;
    external.map_or(own, |external| external.min(own))
}

/// Run `call` until `deadline`. Passing the deadline is `InternalError`.
pub(crate) async fn within<T, F>(
    deadline: Instant,
    operation: &'static str,
    call: F,
) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthError>>,
{
    match tokio::time::timeout_at(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            error!(operation, "deadline passed");
            Err(AuthError::InternalError(format!("{operation} timed out")))
        }
    }
}

/// Run a store call until `deadline`.
pub(crate) async fn store_call<T, F>(
    deadline: Instant,
    operation: &'static str,
    call: F,
) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthDataError>>,
{
    within(deadline, operation, async {
        call.await.map_err(|e| {
            error!(operation, error = %e, "store call failed");
            AuthError::from(e)
        })
    })
    .await
}

/// Run a notifier call until `deadline`. Never fails the caller: errors and
/// timeouts are reported through tracing and dropped.
pub(crate) async fn notify<F>(deadline: Instant, operation: &'static str, email: &str, call: F)
where
    F: Future<Output = Result<(), NotifierError>>,
{
    match tokio::time::timeout_at(deadline, call).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(operation, email, error = %e, "notification failed"),
        Err(_) => warn!(operation, email, "notification deadline passed"),
    }
}
