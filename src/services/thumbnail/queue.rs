//! In-memory job queue
//!
//! Multiple-producer, single-consumer FIFO hand-off between ingest and the
//! background worker. Purely an efficiency/wake-up mechanism: the durable
//! job state lives in the record store, and pending jobs are recovered from
//! there on startup, not from this queue.

use crate::models::ThumbnailJob;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Thread-safe FIFO of jobs awaiting the worker
#[derive(Default)]
pub struct JobQueue {
    inner: Mutex<VecDeque<ThumbnailJob>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job to the back of the queue. Never blocks.
    pub fn enqueue(&self, job: ThumbnailJob) {
        self.inner
            .lock()
            .expect("job queue lock poisoned")
            .push_back(job);
    }

    /// Remove and return the oldest job, if any
    pub fn try_dequeue(&self) -> Option<ThumbnailJob> {
        self.inner
            .lock()
            .expect("job queue lock poisoned")
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("job queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn test_fifo_order() {
        let queue = JobQueue::new();
        let first = ThumbnailJob::pending(Uuid::new_v4());
        let second = ThumbnailJob::pending(Uuid::new_v4());

        queue.enqueue(first.clone());
        queue.enqueue(second.clone());

        assert_eq!(queue.try_dequeue().unwrap().id, first.id);
        assert_eq!(queue.try_dequeue().unwrap().id, second.id);
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_concurrent_producers() {
        let queue = Arc::new(JobQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        queue.enqueue(ThumbnailJob::pending(Uuid::new_v4()));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 800);
        let mut drained = 0;
        while queue.try_dequeue().is_some() {
            drained += 1;
        }
        assert_eq!(drained, 800);
        assert!(queue.is_empty());
    }
}
