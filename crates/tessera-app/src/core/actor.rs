//! The owner task.
//!
//! Holds the only mutable copy of [`DashboardState`] and the live-value
//! cache. Reductions arrive on a bounded inbox and are applied strictly one
//! after another; each applied change is published as a fresh snapshot
//! before its notices are posted and before its sender is acknowledged.

use super::notice::NoticeSender;
use super::reducer::{apply, LiveValues, Reduction};
use super::state::DashboardState;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// A reduction plus an optional completion signal.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub reduction: Reduction,
    pub ack: Option<oneshot::Sender<()>>,
}

/// Run until every inbox sender is gone or the task is cancelled.
pub(crate) async fn run(
    mut inbox: mpsc::Receiver<Envelope>,
    state_tx: watch::Sender<Arc<DashboardState>>,
    notices: NoticeSender,
) {
    let mut state = DashboardState::default();
    let mut live = LiveValues::default();

    tracing::debug!("Dashboard owner task started");
    while let Some(Envelope { reduction, ack }) = inbox.recv().await {
        let applied = apply(&mut state, &mut live, reduction);
        if applied.changed {
            state_tx.send_replace(Arc::new(state.clone()));
        }
        for notice in applied.notices {
            notices.post(notice);
        }
        if let Some(ack) = ack {
            // The requester may have given up waiting.
            let _ = ack.send(());
        }
    }
    tracing::debug!("Dashboard owner task stopped");
}
