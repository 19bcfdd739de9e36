use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{DashboardSnapshot, TaskDashboard};

/// Refresh the dashboard every `interval` until `cancel` fires. Ticks are
/// skipped while polling is suspended. `on_refresh` receives a snapshot after
/// each refresh.
pub fn spawn_poller<F>(
    dashboard: TaskDashboard,
    interval: Duration,
    cancel: CancellationToken,
    on_refresh: F,
) -> JoinHandle<()>
where
    F: Fn(DashboardSnapshot) + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Dashboard poller stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if !dashboard.should_poll() {
                        continue;
                    }
                    dashboard.refresh().await;
                    on_refresh(dashboard.snapshot());
                }
            }
        }
    })
}

/// Poller for a foreground live view. Auto refresh is switched on first, so
/// a config that disables it still gets an immediate render and updates.
pub fn spawn_live_view<F>(
    dashboard: TaskDashboard,
    interval: Duration,
    cancel: CancellationToken,
    on_refresh: F,
) -> JoinHandle<()>
where
    F: Fn(DashboardSnapshot) + Send + 'static,
{
    dashboard.set_auto_refresh(true);
    spawn_poller(dashboard, interval, cancel, on_refresh)
}
