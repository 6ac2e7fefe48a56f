use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::domain::EnquiryId;
use super::notification::{MarkerStore, NotificationSink};
use super::repository::EnquiryRepository;
use super::service::{EnquiryService, SweepReport};
use crate::workflows::audit::Actor;

/// Recurring reminder-expiry sweep owned by whichever process hosts the engine.
///
/// The poller holds no global state: it can be stepped by hand with [`ReminderPoller::tick`]
/// or driven by a tokio interval via [`ReminderPoller::spawn`].
pub struct ReminderPoller<R, M, N> {
    service: Arc<EnquiryService<R, M, N>>,
    actor: Actor,
    focus: Option<EnquiryId>,
    unattended: bool,
}

impl<R, M, N> ReminderPoller<R, M, N>
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(service: Arc<EnquiryService<R, M, N>>, actor: Actor) -> Self {
        Self {
            service,
            actor,
            focus: None,
            unattended: false,
        }
    }

    /// Sweep on behalf of a process with no one watching its alerts. Expiries are published
    /// but never counted as shown.
    pub fn unattended(mut self) -> Self {
        self.unattended = true;
        self
    }

    /// Only raise alerts for one record.
    pub fn focused_on(mut self, id: EnquiryId) -> Self {
        self.focus = Some(id);
        self
    }

    /// Run one sweep. Failures are logged and retried on the next tick.
    pub fn tick(&self) -> Option<SweepReport> {
        let result = if self.unattended {
            self.service.sweep_unattended(&self.actor)
        } else {
            self.service
                .sweep_expired_reminders(self.focus.as_ref(), &self.actor)
        };
        match result {
            Ok(report) => Some(report),
            Err(err) => {
                error!(error = %err, "reminder sweep failed");
                None
            }
        }
    }

    /// Start sweeping every `period`, beginning immediately.
    pub fn spawn(self, period: Duration) -> PollerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            info!(period_secs = period.as_secs(), "starting reminder poller");
            let mut interval = tokio::time::interval(period);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        self.tick();
                    }
                }
            }

            info!("reminder poller stopped");
        });

        PollerHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Owner of a running poller. Dropping the handle aborts the task; `shutdown` stops it
/// cleanly.
#[derive(Debug)]
pub struct PollerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(error = %err, "reminder poller task ended abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
