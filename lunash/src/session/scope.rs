//! Scoped session use: open, run, always close.

use log::warn;

use super::{Session, SessionFactory};
use crate::error::Result;

/// Open a session, hand it to `body`, then close it on every exit path.
///
/// An error from `body` wins over an error from closing the session; a
/// close error is only returned when `body` succeeded.
pub async fn with_session<F, T>(
    factory: &F,
    body: impl AsyncFnOnce(&mut F::Session) -> Result<T>,
) -> Result<T>
where
    F: SessionFactory,
{
    let mut session = factory.open_session().await?;
    let result = body(&mut session).await;
    let closed = session.close().await;

    match (result, closed) {
        (Err(e), Err(close_err)) => {
            warn!("ignoring session close error after failure: {}", close_err);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Ok(value), Ok(())) => Ok(value),
    }
}
