use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::domain::EnquiryId;
use super::notification::{MarkerStore, NotificationSink};
use super::poller::{PollerHandle, ReminderPoller};
use super::repository::{EnquiryRepository, RecordChange};
use super::service::EnquiryService;
use crate::workflows::audit::Actor;

/// Everything a viewer keeps running while one enquiry is open: the focused expiry poll and
/// a live subscription that re-runs the load-time check whenever the record changes.
/// Closing the session (navigation away, sign-out) tears both down.
pub struct ViewingSession {
    record: EnquiryId,
    poller: Option<PollerHandle>,
    stop_watch: Option<oneshot::Sender<()>>,
    watcher: Option<JoinHandle<()>>,
}

impl ViewingSession {
    pub fn open<R, M, N>(
        service: Arc<EnquiryService<R, M, N>>,
        viewer: Actor,
        record: EnquiryId,
        poll_period: Duration,
    ) -> Self
    where
        R: EnquiryRepository + 'static,
        M: MarkerStore + 'static,
        N: NotificationSink + 'static,
    {
        let poller = ReminderPoller::new(service.clone(), viewer.clone())
            .focused_on(record.clone())
            .spawn(poll_period);

        let changes = service.subscribe();
        let (stop_tx, stop_rx) = oneshot::channel();
        let watcher = tokio::spawn(watch_record(
            service,
            viewer,
            record.clone(),
            changes,
            stop_rx,
        ));

        Self {
            record,
            poller: Some(poller),
            stop_watch: Some(stop_tx),
            watcher: Some(watcher),
        }
    }

    pub fn record(&self) -> &EnquiryId {
        &self.record
    }

    pub async fn close(mut self) {
        if let Some(stop) = self.stop_watch.take() {
            let _ = stop.send(());
        }
        if let Some(watcher) = self.watcher.take() {
            if let Err(err) = watcher.await {
                error!(error = %err, "record watcher ended abnormally");
            }
        }
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
    }
}

impl Drop for ViewingSession {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

async fn watch_record<R, M, N>(
    service: Arc<EnquiryService<R, M, N>>,
    viewer: Actor,
    record: EnquiryId,
    mut changes: broadcast::Receiver<RecordChange>,
    mut stop: oneshot::Receiver<()>,
) where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    check(&service, &viewer, &record);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            change = changes.recv() => match change {
                Ok(RecordChange::Upserted(updated)) if updated.id == record => {
                    check(&service, &viewer, &record);
                }
                Ok(RecordChange::Deleted(id)) if id == record => {
                    debug!(enquiry_id = %record, "viewed enquiry was deleted");
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(enquiry_id = %record, skipped, "record watcher lagged; re-checking");
                    check(&service, &viewer, &record);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

fn check<R, M, N>(service: &EnquiryService<R, M, N>, viewer: &Actor, record: &EnquiryId)
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    if let Err(err) = service.check_on_load(record, viewer) {
        warn!(enquiry_id = %record, error = %err, "load-time reminder check failed");
    }
}
