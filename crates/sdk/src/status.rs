//! Connection status and the subscriber registry behind `on_status_change`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

/// Connection state of an [`McpClient`](crate::McpClient).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback invoked on every status transition.
pub type StatusCallback = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;

#[derive(Default)]
pub(crate) struct StatusListeners {
    next_id: u64,
    callbacks: BTreeMap<u64, StatusCallback>,
}

impl StatusListeners {
    pub(crate) fn insert(&mut self, callback: StatusCallback) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.callbacks.insert(id, callback);
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        self.callbacks.remove(&id).is_some()
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.callbacks.contains_key(&id)
    }

    pub(crate) fn snapshot(&self) -> Vec<(u64, StatusCallback)> {
        self.callbacks
            .iter()
            .map(|(id, cb)| (*id, cb.clone()))
            .collect()
    }
}

/// Deliver `status` to every registered callback.
///
/// Callbacks run without any lock held. A callback removed by an earlier
/// callback in the same round is skipped.
pub(crate) fn notify(listeners: &Mutex<StatusListeners>, status: ConnectionStatus) {
    let snapshot = match listeners.lock() {
        Ok(guard) => guard.snapshot(),
        Err(poisoned) => poisoned.into_inner().snapshot(),
    };

    for (id, callback) in snapshot {
        let live = match listeners.lock() {
            Ok(guard) => guard.contains(id),
            Err(poisoned) => poisoned.into_inner().contains(id),
        };
        if live {
            callback(status);
        }
    }
}

/// Handle returned by [`McpClient::on_status_change`](crate::McpClient::on_status_change).
///
/// Dropping the handle keeps the callback registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[must_use = "dropping a Subscription does not unsubscribe; keep it to call unsubscribe()"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<StatusListeners>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, listeners: &Arc<Mutex<StatusListeners>>) -> Self {
        Self {
            id,
            listeners: Arc::downgrade(listeners),
        }
    }

    /// Remove exactly this callback. Takes effect for every later transition.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut guard = match listeners.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ConnectionStatus::Connected).unwrap(),
            "\"connected\""
        );
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
        assert_eq!(ConnectionStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_notify_reaches_all_listeners() {
        let listeners = Arc::new(Mutex::new(StatusListeners::default()));
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            listeners.lock().unwrap().insert(Arc::new(move |_: ConnectionStatus| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }

        notify(&listeners, ConnectionStatus::Connecting);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_listener() {
        let listeners = Arc::new(Mutex::new(StatusListeners::default()));
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let a = {
            let first = first.clone();
            listeners.lock().unwrap().insert(Arc::new(move |_: ConnectionStatus| {
                first.fetch_add(1, Ordering::SeqCst);
            }))
        };
        {
            let second = second.clone();
            listeners.lock().unwrap().insert(Arc::new(move |_: ConnectionStatus| {
                second.fetch_add(1, Ordering::SeqCst);
            }));
        }

        Subscription::new(a, &listeners).unsubscribe();
        notify(&listeners, ConnectionStatus::Connected);

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(listeners.lock().unwrap().snapshot().len(), 1);
    }

    #[test]
    fn test_listener_removed_mid_round_is_skipped() {
        let listeners = Arc::new(Mutex::new(StatusListeners::default()));
        let late = Arc::new(AtomicUsize::new(0));

        // Registered first, so it runs first and removes the second one
        let weak = Arc::downgrade(&listeners);
        listeners.lock().unwrap().insert(Arc::new(move |_: ConnectionStatus| {
            if let Some(l) = weak.upgrade() {
                l.lock().unwrap().remove(1);
            }
        }));
        {
            let late = late.clone();
            listeners.lock().unwrap().insert(Arc::new(move |_: ConnectionStatus| {
                late.fetch_add(1, Ordering::SeqCst);
            }));
        }

        notify(&listeners, ConnectionStatus::Disconnected);
        assert_eq!(late.load(Ordering::SeqCst), 0);
    }
}
