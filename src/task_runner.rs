/// Periodic Task Runner
///
/// Drives the fixed-cadence background tasks. No retry-with-backoff:
/// a failed iteration is logged and the next scheduled tick is the
/// retry.

use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, warn};

/// Run a task on a fixed cadence until the surrounding runtime shuts
/// down.
///
/// The first run happens one full period after start. An iteration is
/// awaited to completion before the next is scheduled, so a slow cycle
/// delays rather than overlaps the following one.
///
/// # Arguments
/// * `task_name` - Name of the task for logging purposes
/// * `period` - Cadence between iterations
/// * `task_fn` - Async function that executes one iteration of the task
pub async fn run_periodic<F, Fut>(task_name: &str, period: Duration, mut task_fn: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut consecutive_failures: u32 = 0;

    loop {
        interval.tick().await;

        match task_fn().await {
            Ok(()) => {
                if consecutive_failures > 0 {
                    warn!(
                        "Task '{}' recovered after {} failures",
                        task_name, consecutive_failures
                    );
                }
                consecutive_failures = 0;
            }
            Err(e) => {
                consecutive_failures += 1;
                error!(
                    "Task '{}' failed ({} consecutive): {}",
                    task_name, consecutive_failures, e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_runs_on_cadence() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let run_count_clone = run_count.clone();

        let handle = tokio::spawn(async move {
            run_periodic("test_task", Duration::from_millis(10), || {
                let count = run_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(run_count.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_keeps_running_through_failures() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let attempt_count_clone = attempt_count.clone();

        let handle = tokio::spawn(async move {
            run_periodic("failing_task", Duration::from_millis(10), || {
                let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count < 2 {
                        Err("Simulated failure".to_string())
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        // Failures did not stop the cadence.
        assert!(attempt_count.load(Ordering::SeqCst) >= 4);
    }
}
