//! Shared handle passed to every workflow and background task.

use super::actor::Envelope;
use super::notice::{Notice, NoticeSender};
use super::reducer::Reduction;
use super::state::DashboardState;
use crate::errors::{AppError, AppResult};
use crate::tasks::TaskScope;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tessera_bus::BusClient;
use tessera_store::Stores;
use tokio::sync::{mpsc, oneshot, watch};

/// Everything a workflow needs: collaborators, the owner task's inbox, the
/// notice channel and the task scopes.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) stores: Stores,
    pub(crate) bus: Arc<dyn BusClient>,
    pub(crate) scope: TaskScope,
    notices: NoticeSender,
    inbox: mpsc::Sender<Envelope>,
    state_rx: watch::Receiver<Arc<DashboardState>>,
    session: Arc<Mutex<Option<TaskScope>>>,
    observing_connectivity: Arc<AtomicBool>,
    listing_environments: Arc<AtomicBool>,
}

impl AppContext {
    pub(crate) fn new(
        stores: Stores,
        bus: Arc<dyn BusClient>,
        scope: TaskScope,
        notices: NoticeSender,
        inbox: mpsc::Sender<Envelope>,
        state_rx: watch::Receiver<Arc<DashboardState>>,
    ) -> Self {
        Self {
            stores,
            bus,
            scope,
            notices,
            inbox,
            state_rx,
            session: Arc::new(Mutex::new(None)),
            observing_connectivity: Arc::new(AtomicBool::new(false)),
            listing_environments: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Apply a reduction and wait until its snapshot is published.
    pub(crate) async fn reduce(&self, reduction: Reduction) -> AppResult<()> {
        let (ack, done) = oneshot::channel();
        self.inbox
            .send(Envelope {
                reduction,
                ack: Some(ack),
            })
            .await
            .map_err(|_| AppError::Shutdown)?;
        done.await.map_err(|_| AppError::Shutdown)
    }

    /// Queue a reduction without waiting for it to be applied.
    pub(crate) async fn reduce_detached(&self, reduction: Reduction) -> AppResult<()> {
        self.inbox
            .send(Envelope {
                reduction,
                ack: None,
            })
            .await
            .map_err(|_| AppError::Shutdown)
    }

    /// Latest published snapshot.
    pub(crate) fn snapshot(&self) -> Arc<DashboardState> {
        self.state_rx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.state_rx.clone()
    }

    pub(crate) fn post(&self, notice: Notice) {
        self.notices.post(notice);
    }

    /// Cancel the current session scope and open a fresh one.
    pub(crate) fn replace_session(&self) -> TaskScope {
        let mut slot = self.session.lock();
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        let session = self.scope.child("session");
        *slot = Some(session.clone());
        session
    }

    /// Cancel the current session scope, if any.
    pub(crate) fn cancel_session(&self) {
        if let Some(previous) = self.session.lock().take() {
            previous.cancel();
        }
    }

    /// Returns `true` the first time it is called.
    pub(crate) fn start_connectivity_observer(&self) -> bool {
        !self.observing_connectivity.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` the first time it is called.
    pub(crate) fn start_environment_listing(&self) -> bool {
        !self.listing_environments.swap(true, Ordering::SeqCst)
    }
}
