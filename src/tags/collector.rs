//! Waits for the next message from a given author in a given channel.
//!
//! Each waiter is single-shot. A waiter is registered before the prompt that asks for
//! the reply goes out, so a reply that races the prompt is still captured. Dropping a
//! [`PendingReply`] (or the future waiting on it) deregisters the waiter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::errors::AppError;
use crate::models::InboundMessage;

/// Which message a waiter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyFilter {
    pub channel_id: u64,
    pub author_id: u64,
}

impl ReplyFilter {
    pub fn matches(&self, message: &InboundMessage) -> bool {
        message.channel_id == self.channel_id && message.author_id == self.author_id
    }
}

struct Waiter {
    id: u64,
    filter: ReplyFilter,
    sender: oneshot::Sender<InboundMessage>,
}

#[derive(Default)]
pub struct ReplyCollector {
    next_id: AtomicU64,
    waiters: Mutex<Vec<Waiter>>,
}

impl ReplyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Waiter>> {
        self.waiters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start listening for a matching message. Nothing is missed between this call and
    /// [`PendingReply::wait`].
    pub fn register(&self, filter: ReplyFilter) -> PendingReply<'_> {
        let (sender, receiver) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push(Waiter { id, filter, sender });
        PendingReply {
            collector: self,
            id,
            filter,
            receiver,
        }
    }

    /// Suspend until a matching message arrives or `deadline` passes.
    #[cfg(test)]
    pub async fn wait_for(
        &self,
        filter: ReplyFilter,
        deadline: Instant,
    ) -> Result<InboundMessage, AppError> {
        self.register(filter).wait(deadline).await
    }

    /// Hand a message to every waiter it matches. Returns how many were resolved.
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        let matched: Vec<Waiter> = {
            let mut waiters = self.lock();
            let (matched, rest): (Vec<Waiter>, Vec<Waiter>) = waiters
                .drain(..)
                .partition(|waiter| waiter.filter.matches(message));
            *waiters = rest;
            matched
        };

        matched
            .into_iter()
            .filter_map(|waiter| waiter.sender.send(message.clone()).ok())
            .count()
    }

    /// Number of registered waiters.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn deregister(&self, id: u64) {
        self.lock().retain(|waiter| waiter.id != id);
    }
}

/// A registered waiter. Deregisters itself when dropped.
pub struct PendingReply<'a> {
    collector: &'a ReplyCollector,
    id: u64,
    filter: ReplyFilter,
    receiver: oneshot::Receiver<InboundMessage>,
}

impl PendingReply<'_> {
    /// Suspend until the matching message arrives or `deadline` passes.
    pub async fn wait(mut self, deadline: Instant) -> Result<InboundMessage, AppError> {
        match tokio::time::timeout_at(deadline, &mut self.receiver).await {
            Ok(Ok(message)) => Ok(message),
            // Sender dropped without a message: only happens on shutdown.
            Ok(Err(_)) => Err(AppError::CollectionTimedOut),
            Err(_) => {
                tracing::debug!(
                    channel_id = self.filter.channel_id,
                    author_id = self.filter.author_id,
                    "Reply collection timed out"
                );
                Err(AppError::CollectionTimedOut)
            }
        }
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        self.collector.deregister(self.id);
    }
}
