//! Keyed session registry

use super::session::{Finisher, HubEvent, StreamSession};
use crate::config::StreamSettings;
use futures::{Stream, StreamExt, future};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// Registry of in-flight broadcast sessions.
///
/// The registry lock only guards session lookup and replacement; publishing
/// goes through the session itself.
#[derive(Debug)]
pub struct StreamHub<T: Clone + Send + 'static> {
    sessions: Mutex<HashMap<String, Arc<StreamSession<T>>>>,
    ttl: Duration,
    queue_capacity: usize,
}

/// A subscriber's view of a session
#[derive(Debug)]
pub struct Subscription<T: Clone + Send + 'static> {
    pub key: String,
    pub receiver: mpsc::Receiver<HubEvent<T>>,
    /// True for the subscriber that created the session
    pub is_owner: bool,
    /// Present only for the owner
    pub finisher: Option<Finisher<T>>,
}

impl<T: Clone + Send + 'static> Subscription<T> {
    pub fn take_finisher(&mut self) -> Option<Finisher<T>> {
        self.finisher.take()
    }

    /// Items until the terminal marker (or until the session goes away)
    pub fn into_items(self) -> impl Stream<Item = T> + Send {
        ReceiverStream::new(self.receiver)
            .take_while(|event| future::ready(matches!(event, HubEvent::Item(_))))
            .filter_map(|event| {
                future::ready(match event {
                    HubEvent::Item(item) => Some(item),
                    HubEvent::Complete => None,
                })
            })
    }
}

impl<T: Clone + Send + 'static> StreamHub<T> {
    pub fn new(ttl: Duration, queue_capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn from_settings(settings: &StreamSettings) -> Self {
        Self::new(settings.ttl(), settings.queue_capacity)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Join the live session for `key`, or start a new one as its owner.
    ///
    /// Only sessions that are neither done nor expired are shared; anything
    /// else is replaced.
    pub fn subscribe(&self, key: &str) -> Subscription<T> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        sessions.retain(|_, session| !session.is_expired(now, self.ttl));

        if let Some(receiver) = sessions.get(key).and_then(|session| session.attach()) {
            debug!(key, "joined in-flight session");
            return Subscription {
                key: key.to_string(),
                receiver,
                is_owner: false,
                finisher: None,
            };
        }

        let (session, receiver) = StreamSession::open(key, self.queue_capacity, now);
        sessions.insert(key.to_string(), Arc::clone(&session));
        debug!(key, "started session");

        Subscription {
            key: key.to_string(),
            receiver,
            is_owner: true,
            finisher: Some(Finisher::new(session)),
        }
    }

    fn live_session(&self, key: &str) -> Option<Arc<StreamSession<T>>> {
        self.sessions.lock().get(key).cloned()
    }

    /// Broadcast an item on the session for `key`; returns deliveries
    pub fn publish(&self, key: &str, item: T) -> usize {
        match self.live_session(key) {
            Some(session) => session.publish(item),
            None => 0,
        }
    }

    /// Send the terminal marker on the session for `key`
    pub fn complete(&self, key: &str) {
        if let Some(session) = self.live_session(key) {
            session.complete();
        }
    }

    /// Whether a shareable session exists for `key` right now
    pub fn is_active(&self, key: &str) -> bool {
        let now = Instant::now();
        self.live_session(key)
            .is_some_and(|session| !session.is_done() && !session.is_expired(now, self.ttl))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn subscriber_count(&self, key: &str) -> usize {
        self.live_session(key)
            .map(|session| session.subscriber_count())
            .unwrap_or(0)
    }

    /// Forget every session
    pub fn reset(&self) {
        self.sessions.lock().clear();
    }
}
