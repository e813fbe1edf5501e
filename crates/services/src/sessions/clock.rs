use std::time::Duration;

use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

use super::runtime::RuntimeEvent;

/// The one timer task behind a running session.
///
/// Each tick is posted to the runtime queue tagged with the generation the
/// clock was started for. Stopping aborts the task; a tick already queued is
/// then dropped by the controller's generation check.
#[derive(Debug, Default)]
pub(super) struct SessionClock {
    running: Option<(u64, JoinHandle<()>)>,
}

impl SessionClock {
    pub(super) fn is_running_for(&self, generation: u64) -> bool {
        matches!(&self.running, Some((current, _)) if *current == generation)
    }

    /// Start ticking for `generation`, replacing any previous timer.
    pub(super) fn start(
        &mut self,
        generation: u64,
        period: Duration,
        events: WeakUnboundedSender<RuntimeEvent>,
    ) {
        self.stop();
        let period = period.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(events) = events.upgrade() else {
                    break;
                };
                if events.send(RuntimeEvent::Tick { generation }).is_err() {
                    break;
                }
            }
        });

        debug!(generation, ?period, "session clock started");
        self.running = Some((generation, task));
    }

    pub(super) fn stop(&mut self) {
        if let Some((generation, task)) = self.running.take() {
            task.abort();
            debug!(generation, "session clock stopped");
        }
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.stop();
    }
}
