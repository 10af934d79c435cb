use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Run one external step under a deadline, giving up early on cancellation.
/// Dropping `fut` must release whatever it holds; child processes rely on `kill_on_drop`.
pub(crate) async fn bounded<T, F>(
    step: &'static str,
    after: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled { step }),
        result = tokio::time::timeout(after, fut) => match result {
            Ok(inner) => inner,
            Err(_) => Err(Error::Timeout { step, after }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let cancel = CancellationToken::new();
        let value = bounded("noop", Duration::from_secs(1), &cancel, async { Ok(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let cancel = CancellationToken::new();
        let result: Result<()> = bounded("sleep", Duration::from_millis(10), &cancel, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout { step: "sleep", .. })));
    }

    #[tokio::test]
    async fn test_bounded_stops_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<()> = bounded("sleep", Duration::from_secs(5), &cancel, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::Cancelled { step: "sleep" })));
    }
}
