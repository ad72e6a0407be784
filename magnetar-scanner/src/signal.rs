use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resolves on the first interrupt, terminate, hangup or quit signal.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let kinds = [
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ];

        let mut streams = Vec::new();
        for kind in kinds {
            match signal(kind) {
                Ok(stream) => streams.push(stream),
                Err(e) => warn!("Failed to register signal handler: {}", e),
            }
        }

        if streams.is_empty() {
            std::future::pending::<()>().await;
        }

        let waits = streams.iter_mut().map(|s| Box::pin(s.recv()));
        futures::future::select_all(waits).await;
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Exit status used when a second signal arrives mid-shutdown.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Cancel `shutdown` on the first signal and exit the process on a second
/// one. The listener returns as soon as `finished` is cancelled.
pub fn cancel_on_signal(
    shutdown: CancellationToken,
    finished: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => {
                info!("Shutdown signal received, finishing in-flight requests");
                shutdown.cancel();
            }
            _ = finished.cancelled() => return,
        }

        tokio::select! {
            _ = shutdown_signal() => {
                warn!("Second shutdown signal received, exiting immediately");
                std::process::exit(FORCED_EXIT_CODE);
            }
            _ = finished.cancelled() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_listener_exits_when_crawl_finishes() {
        let shutdown = CancellationToken::new();
        let finished = CancellationToken::new();
        let listener = cancel_on_signal(shutdown.clone(), finished.clone());

        finished.cancel();

        tokio::time::timeout(Duration::from_secs(1), listener)
            .await
            .expect("listener should stop")
            .unwrap();
        assert!(!shutdown.is_cancelled());
    }
}
