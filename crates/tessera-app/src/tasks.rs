//! Scoped background tasks.
//!
//! A [`TaskScope`] owns the tasks spawned into it. Cancelling a scope signals
//! shutdown to its tasks, aborts them, and cancels every child scope, so
//! tearing down the container (or one environment session) takes all of its
//! standing subscriptions with it.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct ScopeInner {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    children: Mutex<Vec<TaskScope>>,
}

/// Cancellable group of background tasks.
#[derive(Debug, Clone)]
pub struct TaskScope {
    inner: Arc<ScopeInner>,
}

impl TaskScope {
    /// Create a root scope.
    pub fn new(name: &'static str) -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            inner: Arc::new(ScopeInner {
                name,
                shutdown_tx,
                handles: Mutex::new(Vec::new()),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a scope cancelled together with this one.
    pub fn child(&self, name: &'static str) -> Self {
        let child = Self::new(name);
        let mut children = self.inner.children.lock();
        if self.is_cancelled() {
            child.cancel();
        } else {
            children.retain(|c| !c.is_cancelled());
            children.push(child.clone());
        }
        child
    }

    /// Scope name, for logs.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.shutdown_tx.borrow()
    }

    /// Spawn a task that stops when the scope is cancelled.
    ///
    /// Spawning into a cancelled scope does nothing.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut handles = self.inner.handles.lock();
        if self.is_cancelled() {
            tracing::debug!(scope = self.inner.name, "Dropping task spawned into cancelled scope");
            return;
        }
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = fut => {}
            }
        });
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tasks still running.
    pub fn active_tasks(&self) -> usize {
        self.inner
            .handles
            .lock()
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Cancel every task and child scope.
    pub fn cancel(&self) {
        let children = {
            let mut handles = self.inner.handles.lock();
            self.inner.shutdown_tx.send_replace(true);
            for handle in handles.drain(..) {
                handle.abort();
            }
            std::mem::take(&mut *self.inner.children.lock())
        };
        for child in children {
            child.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn cancelling_parent_stops_child_tasks() {
        let root = TaskScope::new("root");
        let session = root.child("session");
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = ticks.clone();
        session.spawn(async move {
            loop {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        root.cancel();
        assert!(session.is_cancelled());

        tokio::time::sleep(Duration::from_millis(10)).await;
        let frozen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), frozen);
        assert_eq!(session.active_tasks(), 0);
    }

    #[tokio::test]
    async fn spawning_into_cancelled_scope_is_a_no_op() {
        let root = TaskScope::new("root");
        root.cancel();
        let ran = Arc::new(AtomicUsize::new(0));
        let flag = ran.clone();
        root.spawn(async move {
            flag.fetch_add(1, Ordering::SeqCst);
        });
        tokio::task::yield_now().await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(root.child("late").is_cancelled());
    }
}
