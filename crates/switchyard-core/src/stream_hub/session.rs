//! Broadcast session state and the owner's finisher handle

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::Instant;
use tracing::{debug, warn};

/// What a subscriber queue carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent<T> {
    Item(T),
    /// Terminal marker; nothing follows it
    Complete,
}

#[derive(Debug)]
struct SessionState<T> {
    subscribers: Vec<mpsc::Sender<HubEvent<T>>>,
    /// Items published so far, replayed to late subscribers
    backlog: Vec<T>,
    /// Creation time, reset on completion
    touched: Instant,
    completed: bool,
    done: bool,
}

#[derive(Debug)]
pub(crate) struct StreamSession<T> {
    key: String,
    queue_capacity: usize,
    state: Mutex<SessionState<T>>,
}

impl<T: Clone + Send + 'static> StreamSession<T> {
    /// Create a session whose first subscriber is the owner
    pub(crate) fn open(
        key: impl Into<String>,
        queue_capacity: usize,
        now: Instant,
    ) -> (Arc<Self>, mpsc::Receiver<HubEvent<T>>) {
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(queue_capacity);
        let session = Self {
            key: key.into(),
            queue_capacity,
            state: Mutex::new(SessionState {
                subscribers: vec![tx],
                backlog: Vec::new(),
                touched: now,
                completed: false,
                done: false,
            }),
        };
        (Arc::new(session), rx)
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.state.lock().touched) > ttl
    }

    pub(crate) fn is_done(&self) -> bool {
        self.state.lock().done
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Attach a new subscriber queue, replaying the backlog into it.
    ///
    /// Returns `None` once the session is done.
    pub(crate) fn attach(&self) -> Option<mpsc::Receiver<HubEvent<T>>> {
        let mut state = self.state.lock();
        if state.done {
            return None;
        }

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        for item in &state.backlog {
            if tx.try_send(HubEvent::Item(item.clone())).is_err() {
                warn!(key = %self.key, "backlog exceeds queue capacity, truncating replay");
                break;
            }
        }
        if state.completed {
            let _ = tx.try_send(HubEvent::Complete);
        }
        state.subscribers.push(tx);
        Some(rx)
    }

    /// Broadcast to every subscriber without blocking.
    ///
    /// A full queue drops the item for that subscriber only; closed queues are
    /// removed. Returns how many subscribers received the item.
    pub(crate) fn publish(&self, item: T) -> usize {
        let mut state = self.state.lock();
        if state.completed {
            debug!(key = %self.key, "publish after completion ignored");
            return 0;
        }

        let mut delivered = 0;
        state.subscribers.retain(|tx| match tx.try_send(HubEvent::Item(item.clone())) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(key = %self.key, "subscriber queue full, dropping item");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        state.backlog.push(item);
        delivered
    }

    /// Send the terminal marker to every subscriber, once
    pub(crate) fn complete(&self) {
        let mut state = self.state.lock();
        if state.completed {
            return;
        }
        state.completed = true;
        for tx in &state.subscribers {
            if let Err(TrySendError::Full(_)) = tx.try_send(HubEvent::Complete) {
                warn!(key = %self.key, "subscriber queue full, dropping completion");
            }
        }
    }

    /// Mark done and restart the expiry clock
    pub(crate) fn finish(&self, now: Instant) {
        self.complete();
        let mut state = self.state.lock();
        state.done = true;
        state.touched = now;
        state.backlog.clear();
        state.subscribers.clear();
    }
}

/// Move-only handle the owner uses to publish and close its session.
///
/// Dropping it without calling [`Finisher::finish`] completes and finishes the
/// session, so followers never wait on an owner that went away.
#[derive(Debug)]
pub struct Finisher<T: Clone + Send + 'static> {
    session: Arc<StreamSession<T>>,
    finished: bool,
}

impl<T: Clone + Send + 'static> Finisher<T> {
    pub(crate) fn new(session: Arc<StreamSession<T>>) -> Self {
        Self {
            session,
            finished: false,
        }
    }

    pub fn key(&self) -> &str {
        self.session.key()
    }

    pub fn publish(&self, item: T) -> usize {
        self.session.publish(item)
    }

    pub fn complete(&self) {
        self.session.complete();
    }

    /// Complete (if not already) and mark the session done
    pub fn finish(mut self) {
        self.finished = true;
        self.session.finish(Instant::now());
    }
}

impl<T: Clone + Send + 'static> Drop for Finisher<T> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(key = %self.session.key(), "finisher dropped before finish");
            self.session.finish(Instant::now());
        }
    }
}
