//! Trailing-edge debouncing of per-key commits.

use std::{collections::HashMap, hash::Hash, time::Duration};

use tokio::{sync::mpsc, task::AbortHandle};

/// Quiet period used by the calculator form.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

const COMMIT_CHANNEL_CAPACITY: usize = 64;

/// A deferred value whose quiet period elapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit<K, V> {
    /// Key the value was scheduled for.
    pub key: K,
    /// Latest value scheduled for `key`.
    pub value: V,
    generation: u64,
}

struct Pending<V> {
    generation: u64,
    value: V,
    task: AbortHandle,
}

/// Holds at most one cancellable deferred commit per key.
///
/// Expired commits are delivered on the receiver returned by
/// [`Debouncer::new`] and must be passed back through
/// [`Debouncer::settle`], which drops commits superseded after they fired.
pub struct Debouncer<K, V> {
    delay: Duration,
    sender: mpsc::Sender<Commit<K, V>>,
    pending: HashMap<K, Pending<V>>,
    next_generation: u64,
}

impl<K, V> Debouncer<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Create a debouncer and the receiver its commits are delivered on.
    pub fn new(delay: Duration) -> (Self, mpsc::Receiver<Commit<K, V>>) {
        let (sender, receiver) = mpsc::channel(COMMIT_CHANNEL_CAPACITY);
        let debouncer = Self {
            delay,
            sender,
            pending: HashMap::new(),
            next_generation: 0,
        };
        (debouncer, receiver)
    }

    /// Quiet period before a scheduled value is delivered.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `value` for `key`, replacing and cancelling any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, key: K, value: V) {
        self.cancel(&key);

        self.next_generation += 1;
        let generation = self.next_generation;
        let commit = Commit {
            key: key.clone(),
            value: value.clone(),
            generation,
        };
        let sender = self.sender.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(commit).await;
        })
        .abort_handle();

        self.pending.insert(
            key,
            Pending {
                generation,
                value,
                task,
            },
        );
    }

    /// Accept a delivered commit if it is still the latest for its key.
    pub fn settle(&mut self, commit: &Commit<K, V>) -> bool {
        match self.pending.get(&commit.key) {
            Some(pending) if pending.generation == commit.generation => {
                self.pending.remove(&commit.key);
                true
            }
            _ => false,
        }
    }

    /// Drop the pending commit for `key`, if any.
    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|pending| {
            pending.task.abort();
            pending.value
        })
    }

    /// Cancel every timer and hand back the pending values immediately.
    pub fn flush(&mut self) -> Vec<(K, V)> {
        self.pending
            .drain()
            .map(|(key, pending)| {
                pending.task.abort();
                (key, pending.value)
            })
            .collect()
    }

    /// Whether a commit is waiting for `key`.
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Number of keys with a waiting commit.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl<K, V> Drop for Debouncer<K, V> {
    fn drop(&mut self) {
        for pending in self.pending.values() {
            pending.task.abort();
        }
    }
}
