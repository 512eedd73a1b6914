use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::domain::DomainError;

/// Races `operation` against `cancel`.
///
/// A token that is already cancelled never starts the operation. When the token
/// fires first, the operation future is dropped, which aborts its in-flight I/O.
pub(crate) async fn cancellable<T, F>(
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    if cancel.is_cancelled() {
        return Err(DomainError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DomainError::Cancelled),
        result = operation => result,
    }
}
