//! Bounded work queue for branch positions.
//!
//! Explorers hand the extra candidates of a branch point to this queue so idle workers can pick
//! them up. The queue has a fixed capacity: when it is full the offer is refused and the offering
//! explorer keeps the branch on its own backlog instead of blocking (backpressure).

use std::{
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::types::Position;

/// How long an idle worker waits for a task before re-checking for completion.
pub(crate) const IDLE_POLL: Duration = Duration::from_millis(2);

/// Counters describing how branches moved through the queue.
#[derive(Debug, Default)]
pub(crate) struct QueueStats {
    /// Branches accepted by the queue.
    pub(crate) enqueued: AtomicU64,
    /// Branches taken off the queue by a worker.
    pub(crate) dequeued: AtomicU64,
    /// Offers refused because the queue was full.
    pub(crate) backpressure_events: AtomicU64,
}

/// Multi-producer, multi-consumer queue of positions still to explore.
///
/// The queue also tracks how many tasks are outstanding, meaning queued or being explored. Only a
/// running task can add work, so once that count reaches zero the search is exhausted.
pub(crate) struct WorkQueue {
    /// Sending half, used to offer branches.
    sender: Sender<Position>,
    /// Receiving half, shared by every worker.
    receiver: Receiver<Position>,
    /// Queued plus in-flight tasks.
    outstanding: AtomicUsize,
    /// Queue statistics.
    stats: QueueStats,
}

impl WorkQueue {
    /// Creates an empty queue holding at most `capacity` pending positions.
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));

        Self {
            sender,
            receiver,
            outstanding: AtomicUsize::new(0),
            stats: QueueStats::default(),
        }
    }

    /// Offers a position to the queue without blocking.
    ///
    /// Returns `false` if the queue is full; the caller is expected to explore the position
    /// itself.
    pub(crate) fn offer(&self, position: Position) -> bool {
        // Count the task before it becomes visible to workers.
        let _ = self.outstanding.fetch_add(1, Ordering::SeqCst);

        match self.sender.try_send(position) {
            Ok(()) => {
                let _ = self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                let _ = self.outstanding.fetch_sub(1, Ordering::SeqCst);
                let _ = self.stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Waits for the next position to explore.
    ///
    /// Returns `None` once no task is queued or running anywhere. The returned guard must be kept
    /// alive until the task finishes.
    pub(crate) fn next(&self) -> Option<(Position, TaskGuard<'_>)> {
        loop {
            match self.receiver.recv_timeout(IDLE_POLL) {
                Ok(position) => {
                    let _ = self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                    return Some((position, TaskGuard { queue: self }));
                }
                Err(RecvTimeoutError::Timeout) if self.is_complete() => return None,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Returns `true` when nothing is queued and no task is running.
    pub(crate) fn is_complete(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) == 0
    }

    /// Returns the queue statistics.
    pub(crate) const fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

/// Marks a dequeued task as finished when dropped.
pub(crate) struct TaskGuard<'queue> {
    /// Queue the task came from.
    queue: &'queue WorkQueue,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        let _ = self.queue.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}
